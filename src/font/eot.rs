//! Embedded OpenType (EOT 2.1) wrapper around a TrueType font.
//!
//! FontForge cannot write EOT, so the header is built here from the TTF's own
//! tables and the TrueType bytes are appended uncompressed.
//!
//! ```text
//! EOTSize           u32   total file size
//! FontDataSize      u32   length of the appended TTF
//! Version           u32   0x00020001
//! Flags             u32   0 (no subsetting, no compression)
//! FontPANOSE        [10]  OS/2.panose
//! Charset           u8    1 (DEFAULT_CHARSET)
//! Italic            u8    OS/2.fsSelection bit 0
//! Weight            u32   OS/2.usWeightClass
//! fsType            u16   OS/2.fsType
//! MagicNumber       u16   0x504C
//! UnicodeRange1..4  u32   OS/2.ulUnicodeRange*
//! CodePageRange1..2 u32   OS/2.ulCodePageRange* (0 for OS/2 v0)
//! CheckSumAdjustment u32  head.checkSumAdjustment
//! Reserved1..4      u32   0
//! Padding1          u16   0
//! FamilyName, StyleName, VersionName, FullName
//!                   each: u16 padding, u16 byte size, UTF-16LE bytes
//! Padding5, RootStringSize  u16 0, u16 0
//! FontData
//! ```
//!
//! All EOT integers are little-endian. The table directory and the `name`
//! strings are read with `ttf_parser`; the remaining OS/2 and head fields
//! come straight from the big-endian table bytes.

use thiserror::Error;
use ttf_parser::name::{Name, Table as NameTable};
use ttf_parser::{FaceParsingError, PlatformId, RawFace, Tag};

const EOT_VERSION: u32 = 0x0002_0001;
const MAGIC_NUMBER: u16 = 0x504C;
const DEFAULT_CHARSET: u8 = 1;
const LANGUAGE_EN_US: u16 = 0x0409;

const NAME_FAMILY: u16 = ttf_parser::name_id::FAMILY;
const NAME_STYLE: u16 = ttf_parser::name_id::SUBFAMILY;
const NAME_FULL: u16 = ttf_parser::name_id::FULL_NAME;
const NAME_VERSION: u16 = ttf_parser::name_id::VERSION;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EotError {
    #[error("Malformed TrueType data: {0}")]
    Parse(#[from] FaceParsingError),
    #[error("Malformed TrueType data: {0}")]
    Malformed(&'static str),
    #[error("TrueType font has no '{0}' table")]
    MissingTable(&'static str),
}

// ============================================================================
// sfnt reading
// ============================================================================

fn table<'a>(face: &RawFace<'a>, tag: &'static str) -> Result<&'a [u8], EotError> {
    let bytes: [u8; 4] = tag
        .as_bytes()
        .try_into()
        .map_err(|_| EotError::MissingTable(tag))?;
    face.table(Tag::from_bytes(&bytes))
        .ok_or(EotError::MissingTable(tag))
}

fn be_u16(data: &[u8], at: usize) -> Result<u16, EotError> {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(EotError::Malformed("read past end of table"))
}

fn be_u32(data: &[u8], at: usize) -> Result<u32, EotError> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(EotError::Malformed("read past end of table"))
}

/// A name table string as UTF-16LE bytes.
///
/// Prefers the Windows English (US) record, then any record `ttf_parser`
/// can decode. Missing names are empty.
fn name_string(names: &[Name<'_>], name_id: u16) -> Vec<u8> {
    let candidates = || names.iter().filter(|n| n.name_id == name_id);
    let windows = candidates()
        .filter(|n| n.platform_id == PlatformId::Windows && n.language_id == LANGUAGE_EN_US)
        .find_map(|n| n.to_string());
    windows
        .or_else(|| candidates().find_map(|n| n.to_string()))
        .map(|s| s.encode_utf16().flat_map(u16::to_le_bytes).collect())
        .unwrap_or_default()
}

// ============================================================================
// EOT writing
// ============================================================================

/// Wrap TrueType bytes in an EOT 2.1 header.
pub fn ttf_to_eot(ttf: &[u8]) -> Result<Vec<u8>, EotError> {
    let face = RawFace::parse(ttf, 0)?;
    let os2 = table(&face, "OS/2")?;
    let head = table(&face, "head")?;
    let name = NameTable::parse(table(&face, "name")?)
        .ok_or(EotError::Malformed("unreadable name table"))?;
    let records: Vec<Name<'_>> = name.names.into_iter().collect();

    let os2_version = be_u16(os2, 0)?;
    let panose = os2
        .get(32..42)
        .ok_or(EotError::Malformed("OS/2 table too short"))?;
    let (code_page_1, code_page_2) = if os2_version >= 1 {
        (be_u32(os2, 78)?, be_u32(os2, 82)?)
    } else {
        (0, 0)
    };

    let names = [
        name_string(&records, NAME_FAMILY),
        name_string(&records, NAME_STYLE),
        name_string(&records, NAME_VERSION),
        name_string(&records, NAME_FULL),
    ];

    let mut out = Vec::with_capacity(ttf.len() + 256);
    // EOTSize is patched once the header is complete.
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(ttf.len() as u32).to_le_bytes());
    out.extend_from_slice(&EOT_VERSION.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(panose);
    out.push(DEFAULT_CHARSET);
    out.push((be_u16(os2, 62)? & 1) as u8);
    out.extend_from_slice(&(be_u16(os2, 4)? as u32).to_le_bytes());
    out.extend_from_slice(&be_u16(os2, 8)?.to_le_bytes());
    out.extend_from_slice(&MAGIC_NUMBER.to_le_bytes());
    for at in [42, 46, 50, 54] {
        out.extend_from_slice(&be_u32(os2, at)?.to_le_bytes());
    }
    out.extend_from_slice(&code_page_1.to_le_bytes());
    out.extend_from_slice(&code_page_2.to_le_bytes());
    out.extend_from_slice(&be_u32(head, 8)?.to_le_bytes());
    out.extend_from_slice(&[0u8; 16]);
    out.extend_from_slice(&0u16.to_le_bytes());

    for string in &names {
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&(string.len() as u16).to_le_bytes());
        out.extend_from_slice(string);
    }
    // Padding5 and an empty RootString.
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());

    out.extend_from_slice(ttf);
    let total = out.len() as u32;
    out[0..4].copy_from_slice(&total.to_le_bytes());
    Ok(out)
}
