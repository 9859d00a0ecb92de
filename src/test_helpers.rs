//! Shared test utilities.
//!
//! Builds throwaway icon projects in temp directories and resolves a default
//! [`Config`] for them.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = project_with_icons(&["home", "star"]);
//! let config = test_config(tmp.path());
//! let glyphs = scan(&config.input).unwrap();
//! assert_eq!(glyph_names(&glyphs), vec!["home", "star"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::{self, Config, ResolveRequest};
use crate::scan::Glyph;

// =========================================================================
// Fixture setup
// =========================================================================

/// Temp project root holding one `<name>.svg` per name.
///
/// Each file gets distinct content so fingerprints differ per icon set.
pub fn project_with_icons(names: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for name in names {
        write_file(&tmp.path().join(format!("{name}.svg")), &icon_svg(name));
    }
    tmp
}

/// A small valid SVG whose path data depends on `seed`.
pub fn icon_svg(seed: &str) -> String {
    let n = seed.bytes().map(u32::from).sum::<u32>() % 12 + 2;
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M0 0H{n}V{n}H0Z"/><!-- {seed} --></svg>"#
    )
}

/// Write a file, creating parent directories.
pub fn write_file(path: &Path, content: &str) {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Resolve options for `root` with no overrides.
pub fn test_config(root: &Path) -> Config {
    config::resolve(&ResolveRequest::new(root)).unwrap()
}

// =========================================================================
// Extractors
// =========================================================================

pub fn glyph_names(glyphs: &[Glyph]) -> Vec<&str> {
    glyphs.iter().map(|g| g.name.as_str()).collect()
}
