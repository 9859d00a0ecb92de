//! FontForge-backed converter.
//!
//! Runs `fontforge -lang=py -c <script> <job>` once per cycle. The script
//! (embedded at compile time) imports every glyph outline and writes the
//! native formats (TTF, WOFF, SVG). EOT is derived afterwards from the TTF
//! by [`super::eot`].

use super::converter::{ConvertError, ConvertRequest, FontConverter};
use super::{FontFormat, eot};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

const SCRIPT: &str = include_str!("../../scripts/fontforge_generate.py");

/// Prefix the script puts on the stderr line naming an unimportable glyph.
const REJECT_PREFIX: &str = "REJECT\t";

#[derive(Debug, Clone)]
pub struct FontForgeConverter {
    program: PathBuf,
}

impl Default for FontForgeConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl FontForgeConverter {
    /// Use `fontforge` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("fontforge")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(
        &self,
        request: &ConvertRequest,
        outputs: &BTreeMap<FontFormat, PathBuf>,
    ) -> Result<(), ConvertError> {
        let job = job_json(request, outputs);
        log::debug!(
            "Running {} for {} glyph(s) → {:?}",
            self.program.display(),
            request.glyphs.len(),
            outputs.keys().collect::<Vec<_>>()
        );

        let output = Command::new(&self.program)
            .arg("-lang=py")
            .arg("-c")
            .arg(SCRIPT)
            .arg(job.to_string())
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ConvertError::Unavailable(format!(
                    "{} not found; install FontForge or put it on PATH",
                    self.program.display()
                )),
                _ => ConvertError::Io(e),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() {
            if !stderr.trim().is_empty() {
                log::trace!("fontforge: {}", stderr.trim());
            }
            return Ok(());
        }

        Err(rejection(&stderr).unwrap_or_else(|| {
            ConvertError::Failed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            ))
        }))
    }
}

impl FontConverter for FontForgeConverter {
    fn convert(&self, request: &ConvertRequest) -> Result<(), ConvertError> {
        let eot_target = request.outputs.get(&FontFormat::Eot);
        let mut native: BTreeMap<FontFormat, PathBuf> = request
            .outputs
            .iter()
            .filter(|(format, _)| **format != FontFormat::Eot)
            .map(|(format, path)| (*format, path.clone()))
            .collect();

        // EOT wraps a TTF; produce a throwaway one when TTF itself was not asked for.
        let scratch_ttf = match eot_target {
            Some(eot_path) if !native.contains_key(&FontFormat::Ttf) => {
                let scratch = eot_path.with_extension("eot.ttf");
                native.insert(FontFormat::Ttf, scratch.clone());
                Some(scratch)
            }
            _ => None,
        };

        if !native.is_empty() {
            self.run(request, &native)?;
        }

        if let (Some(eot_path), Some(ttf_path)) = (eot_target, native.get(&FontFormat::Ttf)) {
            write_eot(ttf_path, eot_path)?;
        }
        if let Some(scratch) = scratch_ttf {
            fs::remove_file(scratch)?;
        }
        Ok(())
    }
}

fn write_eot(ttf_path: &Path, eot_path: &Path) -> Result<(), ConvertError> {
    let ttf = fs::read(ttf_path)?;
    let wrapped = eot::ttf_to_eot(&ttf).map_err(|e| ConvertError::Failed(e.to_string()))?;
    fs::write(eot_path, wrapped)?;
    Ok(())
}

fn job_json(
    request: &ConvertRequest,
    outputs: &BTreeMap<FontFormat, PathBuf>,
) -> serde_json::Value {
    let glyphs: Vec<_> = request
        .glyphs
        .iter()
        .map(|g| {
            json!({
                "name": g.name,
                "source": g.source,
                "codepoint": g.codepoint,
            })
        })
        .collect();
    let outputs: serde_json::Map<String, serde_json::Value> = outputs
        .iter()
        .map(|(format, path)| (format.to_string(), json!(path)))
        .collect();

    json!({
        "font_name": request.font_name,
        "glyphs": glyphs,
        "outputs": outputs,
    })
}

/// Parse the script's rejection line, if there is one.
fn rejection(stderr: &str) -> Option<ConvertError> {
    let line = stderr.lines().find_map(|l| l.strip_prefix(REJECT_PREFIX))?;
    let (path, reason) = line
        .split_once('\t')
        .unwrap_or((line, "outlines could not be imported"));
    Some(ConvertError::Rejected {
        path: PathBuf::from(path),
        reason: reason.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Glyph;
    use tempfile::TempDir;

    fn request(dir: &Path, formats: &[FontFormat]) -> ConvertRequest {
        let source = dir.join("home.svg");
        fs::write(
            &source,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M0 8 8 0 16 8V16H0Z"/></svg>"#,
        )
        .unwrap();
        ConvertRequest {
            font_name: "icons".into(),
            glyphs: vec![Glyph {
                name: "home".into(),
                source,
                codepoint: 0xF100,
            }],
            outputs: formats
                .iter()
                .map(|f| (*f, dir.join(format!("icons.{}", f.extension()))))
                .collect(),
        }
    }

    #[test]
    fn job_lists_glyphs_and_outputs() {
        let tmp = TempDir::new().unwrap();
        let req = request(tmp.path(), &[FontFormat::Ttf, FontFormat::Svg]);
        let job = job_json(&req, &req.outputs);

        assert_eq!(job["font_name"], "icons");
        assert_eq!(job["glyphs"][0]["name"], "home");
        assert_eq!(job["glyphs"][0]["codepoint"], 0xF100);
        assert!(job["outputs"]["ttf"].as_str().unwrap().ends_with("icons.ttf"));
        assert!(job["outputs"]["svg"].as_str().unwrap().ends_with("icons.svg"));
        assert!(job["outputs"].get("woff").is_none());
    }

    #[test]
    fn rejection_line_names_source() {
        let stderr = "Copyright...\nREJECT\t/icons/star.svg\tbad path data\n";
        match rejection(stderr) {
            Some(ConvertError::Rejected { path, reason }) => {
                assert_eq!(path, PathBuf::from("/icons/star.svg"));
                assert_eq!(reason, "bad path data");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(rejection("Segmentation fault").is_none());
    }

    #[test]
    fn missing_program_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let req = request(tmp.path(), &[FontFormat::Ttf]);
        let converter = FontForgeConverter::with_program(tmp.path().join("no-such-fontforge"));

        let err = converter.convert(&req).unwrap_err();
        assert!(matches!(err, ConvertError::Unavailable(_)), "{err:?}");
    }

    #[test]
    #[ignore = "requires fontforge on PATH"]
    fn fontforge_writes_all_formats() {
        let tmp = TempDir::new().unwrap();
        let req = request(tmp.path(), &FontFormat::ALL);
        FontForgeConverter::new().convert(&req).unwrap();

        for format in FontFormat::ALL {
            let path = &req.outputs[&format];
            assert!(fs::metadata(path).unwrap().len() > 0, "{}", path.display());
        }
        assert!(!tmp.path().join("icons.eot.ttf").exists());
    }

    #[test]
    #[ignore = "requires fontforge on PATH"]
    fn fontforge_eot_only_cleans_scratch_ttf() {
        let tmp = TempDir::new().unwrap();
        let req = request(tmp.path(), &[FontFormat::Eot]);
        FontForgeConverter::new().convert(&req).unwrap();

        assert!(tmp.path().join("icons.eot").exists());
        assert!(!tmp.path().join("icons.eot.ttf").exists());
        assert!(!tmp.path().join("icons.ttf").exists());
    }
}
