//! Converter capability trait and shared types.
//!
//! A converter receives the glyph manifest plus the exact file path each
//! requested format must be written to. It either writes all of them or
//! fails; the font stage treats any error as fatal for the whole cycle.

use super::FontFormat;
use crate::scan::Glyph;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("{} was rejected: {reason}", path.display())]
    Rejected { path: PathBuf, reason: String },
    #[error("Converter failed: {0}")]
    Failed(String),
    #[error("Converter is not available: {0}")]
    Unavailable(String),
}

/// What to build: a font named `font_name` from `glyphs`, one file per entry
/// of `outputs`.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub font_name: String,
    pub glyphs: Vec<Glyph>,
    pub outputs: BTreeMap<FontFormat, PathBuf>,
}

/// Turns vector glyph sources into font files.
pub trait FontConverter: Sync {
    fn convert(&self, request: &ConvertRequest) -> Result<(), ConvertError>;
}

impl<T: FontConverter + ?Sized> FontConverter for &T {
    fn convert(&self, request: &ConvertRequest) -> Result<(), ConvertError> {
        (**self).convert(request)
    }
}
