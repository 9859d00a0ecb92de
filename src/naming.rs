//! Glyph naming.
//!
//! Every source file becomes one glyph, and the glyph name ends up in CSS
//! class names (`.icon-arrow-left`), so it has to be a safe identifier.
//! The name is derived from the file stem:
//!
//! - `Arrow Left.svg` → `arrow-left`
//! - `home.svg` → `home`
//! - `chevron--up!.eps` → `chevron-up`
//! - `add_circle.svg` → `add_circle`

/// Derive a glyph name from a source file stem.
///
/// - Trims surrounding whitespace and lowercases ASCII letters
/// - Replaces every run of characters outside `[a-z0-9_]` with a single dash
/// - Strips leading and trailing dashes
///
/// Returns an empty string when nothing usable is left (e.g. `"!!!"`); the
/// scanner reports that as an error.
pub fn glyph_name(stem: &str) -> String {
    let mut name = String::with_capacity(stem.len());
    let mut prev_dash = false;
    for c in stem.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' {
            name.push(c);
            prev_dash = false;
        } else if !prev_dash {
            name.push('-');
            prev_dash = true;
        }
    }
    name.trim_matches('-').to_string()
}

/// Format a codepoint the way CSS `content` expects it: `\f100`.
pub fn css_codepoint(codepoint: u32) -> String {
    format!("\\{:x}", codepoint)
}
