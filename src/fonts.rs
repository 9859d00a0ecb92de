//! Font generation stage.
//!
//! Second stage of a cycle. Fingerprints the glyph manifest, derives the
//! output base name, and asks the converter for one file per configured
//! format.
//!
//! ## Naming
//!
//! ```text
//! icons_3f2a9c01d4e5b678.ttf     # default: font name + 16 hex fingerprint chars
//! icons.ttf                      # no_hash = true
//! ```
//!
//! The fingerprint is a SHA-256 over, per glyph in manifest order: the source
//! file name, a NUL byte, the content length (u64 LE), and the content. Equal
//! inputs always produce equal names; editing, adding, removing, or renaming a
//! source changes the name, which is what busts browser caches.
//!
//! ## Staging
//!
//! The converter writes into `<fonts>/.glyphpack-staging/`. Only when it has
//! produced every requested file are they renamed into place, so a failed
//! conversion never leaves a partial font set next to the previous good one.

use crate::config::Config;
use crate::font::{ConvertError, ConvertRequest, FontConverter, FontFormat};
use crate::scan::Glyph;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of fingerprint hex characters used in file names.
pub const FINGERPRINT_LEN: usize = 16;

const STAGING_DIR: &str = ".glyphpack-staging";

#[derive(Error, Debug)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Font conversion failed: {0}")]
    Convert(#[from] ConvertError),
    #[error("Converter did not produce {}", .0.display())]
    MissingOutput(PathBuf),
}

/// The font files produced by one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontOutput {
    /// File stem shared by every format, e.g. `icons_3f2a9c01d4e5b678`.
    pub base_name: String,
    /// Full hex SHA-256 of the glyph sources.
    pub fingerprint: String,
    pub files: BTreeMap<FontFormat, PathBuf>,
    pub glyphs: Vec<Glyph>,
}

impl FontOutput {
    pub fn file_name(&self, format: FontFormat) -> String {
        format!("{}.{}", self.base_name, format.extension())
    }

    pub fn formats(&self) -> impl Iterator<Item = FontFormat> + '_ {
        self.files.keys().copied()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.values().map(PathBuf::as_path)
    }
}

/// SHA-256 fingerprint of the glyph sources, as lowercase hex.
pub fn fingerprint(glyphs: &[Glyph]) -> io::Result<String> {
    let mut hasher = Sha256::new();
    for glyph in glyphs {
        let bytes = fs::read(&glyph.source)?;
        hasher.update(glyph.file_name().as_bytes());
        hasher.update(b"\0");
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// File stem for the font files.
pub fn font_base_name(font_name: &str, fingerprint: &str, no_hash: bool) -> String {
    if no_hash {
        font_name.to_string()
    } else {
        let short = &fingerprint[..FINGERPRINT_LEN.min(fingerprint.len())];
        format!("{}_{}", font_name, short)
    }
}

/// Final path of each configured format.
pub fn font_paths(
    fonts_dir: &Path,
    base_name: &str,
    formats: &[FontFormat],
) -> BTreeMap<FontFormat, PathBuf> {
    formats
        .iter()
        .map(|f| (*f, fonts_dir.join(format!("{}.{}", base_name, f.extension()))))
        .collect()
}

/// Build the font files for `glyphs`.
pub fn generate_fonts(
    converter: &impl FontConverter,
    config: &Config,
    glyphs: Vec<Glyph>,
) -> Result<FontOutput, FontError> {
    let fingerprint = fingerprint(&glyphs)?;
    let base_name = font_base_name(&config.font_name, &fingerprint, config.no_hash);
    let files = font_paths(&config.output.fonts, &base_name, &config.formats);
    log::debug!("Font fingerprint {} → {}", fingerprint, base_name);

    fs::create_dir_all(&config.output.fonts)?;
    let staging = Staging::create(&config.output.fonts)?;

    let request = ConvertRequest {
        font_name: config.font_name.clone(),
        glyphs: glyphs.clone(),
        outputs: font_paths(staging.path(), &base_name, &config.formats),
    };
    converter.convert(&request)?;

    for staged in request.outputs.values() {
        if !staged.is_file() {
            return Err(FontError::MissingOutput(staged.clone()));
        }
    }
    for (format, staged) in &request.outputs {
        fs::rename(staged, &files[format])?;
    }

    Ok(FontOutput {
        base_name,
        fingerprint,
        files,
        glyphs,
    })
}

/// Scratch directory removed on drop, whatever the outcome.
struct Staging(PathBuf);

impl Staging {
    fn create(fonts_dir: &Path) -> io::Result<Self> {
        let dir = fonts_dir.join(STAGING_DIR);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        Ok(Self(dir))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.0) {
            log::warn!("Could not remove {}: {}", self.0.display(), e);
        }
    }
}
