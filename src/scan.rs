//! Input scanning and glyph manifest generation.
//!
//! First stage of a generation cycle. Lists the vector sources in the input
//! directory and produces the ordered glyph manifest that both the font and
//! template stages consume.
//!
//! ## Eligible files
//!
//! ```text
//! icons/
//! ├── home.svg           # glyph "home"       U+F100
//! ├── Star Filled.svg    # glyph "star-filled" U+F101
//! ├── user.eps           # glyph "user"       U+F102
//! ├── notes.txt          # ignored
//! ├── .draft.svg         # ignored (hidden)
//! └── old/               # ignored (not descended into)
//!     └── legacy.svg
//! ```
//!
//! Only `.svg` and `.eps` files directly inside the input directory are used.
//! Entries are sorted by file name so the manifest, and therefore the
//! fingerprint and codepoints, are deterministic.
//!
//! ## Validation
//!
//! - At least one eligible file must exist
//! - Every file must yield a non-empty glyph name
//! - Glyph names must be unique (`Home.svg` and `home.eps` collide)

use crate::naming;
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Vector formats the converter accepts.
pub const SOURCE_EXTENSIONS: &[&str] = &["svg", "eps"];

/// Codepoint of the first glyph (Private Use Area).
pub const FIRST_CODEPOINT: u32 = 0xF100;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Cannot read input directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("No SVG or EPS files found in {0}")]
    NoSources(PathBuf),
    #[error("Glyph name '{name}' is produced by both {} and {}", first.display(), second.display())]
    DuplicateGlyph {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("Cannot derive a glyph name from {0}")]
    InvalidName(PathBuf),
}

/// One entry of the glyph manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Glyph {
    /// Sanitized, unique name used for CSS classes.
    pub name: String,
    /// Absolute path of the vector source.
    pub source: PathBuf,
    pub codepoint: u32,
}

impl Glyph {
    /// Source file name, e.g. `home.svg`.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Whether a path looks like an eligible vector source.
///
/// Checks the name only; callers that list directories also check the
/// entry is a file.
pub fn is_source_path(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether the directory holds at least one eligible source.
pub fn has_sources(dir: &Path) -> io::Result<bool> {
    Ok(!source_files(dir)?.is_empty())
}

/// Scan the input directory into an ordered glyph manifest.
pub fn scan(input: &Path) -> Result<Vec<Glyph>, ScanError> {
    let files = source_files(input)?;
    if files.is_empty() {
        return Err(ScanError::NoSources(input.to_path_buf()));
    }

    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut glyphs = Vec::with_capacity(files.len());

    for (index, source) in files.into_iter().enumerate() {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = naming::glyph_name(&stem);
        if name.is_empty() {
            return Err(ScanError::InvalidName(source));
        }
        if let Some(first) = seen.get(&name) {
            return Err(ScanError::DuplicateGlyph {
                name,
                first: first.clone(),
                second: source,
            });
        }
        seen.insert(name.clone(), source.clone());

        log::debug!("Glyph {} ← {}", name, source.display());
        glyphs.push(Glyph {
            name,
            source,
            codepoint: FIRST_CODEPOINT + index as u32,
        });
    }

    Ok(glyphs)
}

/// Eligible source files directly inside `dir`, sorted by file name.
fn source_files(dir: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_source_path(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
