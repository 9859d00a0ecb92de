//! # glyphpack
//!
//! Turns a directory of SVG/EPS icons into a webfont bundle: font files in
//! several formats, stylesheets that map CSS classes to glyphs, and an HTML
//! preview page. In watch mode it keeps the bundle in sync as icons change.
//!
//! # Architecture: One Cycle, Four Stages
//!
//! ```text
//! 1. Scan       icons/         →  glyph manifest     (sorted, named, codepoints)
//! 2. Fonts      manifest       →  icons_<fp>.{ttf,woff,eot,svg}
//! 3. Templates  manifest+fonts →  icons.css, _icons.scss, icons-preview.html, ...
//! 4. Cleanup    data cache     →  delete the previous cycle's stale files
//! ```
//!
//! Font file names carry a fingerprint of the sources, so browsers never see
//! a stale font under a cached URL. The flip side is that every change leaves
//! old files behind, which the data cache tracks and removes.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Defaults + `glyphpack.toml` + CLI overrides → immutable [`config::Config`] |
//! | [`scan`] | Stage 1: lists the icon sources, produces the glyph manifest |
//! | [`naming`] | Glyph names from file stems, CSS codepoint escapes |
//! | [`font`] | Converter trait, the FontForge converter, in-process EOT wrapping |
//! | [`fonts`] | Stage 2: fingerprinting, output naming, staged conversion |
//! | [`templates`] | Stage 3: CSS/SCSS/Bootstrap stylesheets and the Maud preview page |
//! | [`cache`] | Stage 4: the on-disk output record and stale-file reconcile |
//! | [`pipeline`] | Runs one full cycle |
//! | [`watch`] | Debounced regeneration on file changes |
//! | [`error`] | Crate-level [`Error`] and its categories |
//! | [`output`] | CLI status lines |
//!
//! # Design Decisions
//!
//! ## Converter Behind a Trait
//!
//! Outline import and font compilation are delegated to FontForge, driven
//! through [`font::FontConverter`]. Everything else (fingerprints, naming,
//! EOT headers, stylesheets, cleanup) is plain Rust, and the test suite runs
//! the whole pipeline against a mock converter.
//!
//! ## Fail Whole, Not Partial
//!
//! A font set is all-or-nothing: the converter writes into a staging
//! directory and files are moved into place only after every format exists.
//! Templates are the opposite: each one is independent, and a failure is
//! reported without stopping the others.
//!
//! ## Cleanup Only From Records
//!
//! The cache deletes only files it recorded itself. A lost or corrupt cache
//! makes cleanup a no-op, never a guess.

pub mod cache;
pub mod config;
pub mod error;
pub mod font;
pub mod fonts;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod scan;
pub mod templates;
pub mod watch;

pub use error::{Error, ErrorCategory};

#[cfg(test)]
pub(crate) mod test_helpers;
