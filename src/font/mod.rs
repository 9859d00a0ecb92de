//! Vector-to-font conversion.
//!
//! | Piece | Role |
//! |---|---|
//! | [`FontConverter`] | Capability trait: glyph sources in, font files out |
//! | [`FontForgeConverter`] | Production converter (drives the `fontforge` binary) |
//! | [`eot`] | TrueType → Embedded OpenType wrapper, done in-process |
//!
//! The pipeline only ever talks to the trait, so tests run against a mock
//! converter and never need FontForge installed.

pub mod converter;
pub mod eot;
pub mod fontforge;

pub use converter::{ConvertError, ConvertRequest, FontConverter};
pub use fontforge::FontForgeConverter;

use std::fmt;
use std::str::FromStr;

/// A binary font format the bundle can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontFormat {
    Ttf,
    Woff,
    Eot,
    Svg,
}

impl FontFormat {
    pub const ALL: [FontFormat; 4] = [
        FontFormat::Ttf,
        FontFormat::Woff,
        FontFormat::Eot,
        FontFormat::Svg,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            FontFormat::Ttf => "ttf",
            FontFormat::Woff => "woff",
            FontFormat::Eot => "eot",
            FontFormat::Svg => "svg",
        }
    }

    /// The `format()` hint used in `@font-face` declarations.
    pub fn css_format(self) -> &'static str {
        match self {
            FontFormat::Ttf => "truetype",
            FontFormat::Woff => "woff",
            FontFormat::Eot => "embedded-opentype",
            FontFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for FontFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl FromStr for FontFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == name)
            .ok_or(UnknownFormat(name))
    }
}
