//! One generation cycle.
//!
//! ```text
//! scan ──▶ fonts ──▶ templates ──▶ reconcile cache ──▶ save cache
//!  │         │           │                │
//!  │         │           └ per-template failures collected, not fatal
//!  │         └ any converter failure aborts the cycle here
//!  └ no sources / name collisions abort the cycle here
//! ```
//!
//! A cycle that aborts before the font stage finishes leaves the data cache,
//! and therefore every previously generated file, untouched.

use crate::cache::{self, CacheError, DataCache, ProjectRecord, Reconciled};
use crate::config::{self, Config, ResolveRequest};
use crate::error::Error;
use crate::font::FontConverter;
use crate::fonts::{self, FontOutput};
use crate::scan::{self, Glyph};
use crate::templates::{self, TemplateReport};
use std::io;
use std::path::{Path, PathBuf};

/// Everything one successful cycle did.
#[derive(Debug)]
pub struct CycleReport {
    pub fonts: FontOutput,
    pub templates: TemplateReport,
    pub cleanup: Reconciled,
    /// The record of this cycle could not be saved. The outputs are in place
    /// but won't be cleaned up by the next cycle.
    pub cache_error: Option<CacheError>,
}

impl CycleReport {
    /// No template or cache failures.
    pub fn is_clean(&self) -> bool {
        self.templates.is_ok() && self.cache_error.is_none()
    }
}

/// Every file a cycle with font base name `base_name` writes.
pub fn output_paths(config: &Config, base_name: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> =
        fonts::font_paths(&config.output.fonts, base_name, &config.formats)
            .into_values()
            .collect();
    paths.extend(
        config
            .templates
            .iter()
            .map(|kind| templates::template_path(config, *kind)),
    );
    paths
}

/// Files a cycle over `glyphs` would write, without writing anything.
pub fn planned_outputs(config: &Config, glyphs: &[Glyph]) -> io::Result<Vec<PathBuf>> {
    let fingerprint = fonts::fingerprint(glyphs)?;
    let base_name = fonts::font_base_name(&config.font_name, &fingerprint, config.no_hash);
    Ok(output_paths(config, &base_name))
}

/// Run a full cycle with an already resolved config.
pub fn run_cycle(converter: &impl FontConverter, config: &Config) -> Result<CycleReport, Error> {
    let glyphs = scan::scan(&config.input)?;
    log::info!(
        "Compiling {} glyph(s) from {}",
        glyphs.len(),
        config.input.display()
    );

    let mut data = DataCache::load(&config.data_cache);
    let fonts = fonts::generate_fonts(converter, config, glyphs)?;
    let templates = templates::render_templates(config, &fonts);

    let previous = data.project(&config.project_root);
    let outputs = written_outputs(&previous, config, &fonts, &templates);
    let cleanup = data.reconcile_project(&config.project_root, &outputs);
    let cache_error = data.save(&config.data_cache).err();
    if let Some(e) = &cache_error {
        log::warn!(
            "Could not save data cache {}: {}",
            config.data_cache.display(),
            e
        );
    }

    Ok(CycleReport {
        fonts,
        templates,
        cleanup,
        cache_error,
    })
}

/// Files to record for a finished cycle: the fonts, the templates written,
/// and failed templates that were already recorded, so their previous file
/// isn't treated as stale.
fn written_outputs(
    previous: &ProjectRecord,
    config: &Config,
    fonts: &FontOutput,
    templates: &TemplateReport,
) -> Vec<PathBuf> {
    let recorded = previous.paths(&config.project_root);
    let mut outputs: Vec<PathBuf> = fonts.paths().map(Path::to_path_buf).collect();
    outputs.extend(templates.written.iter().map(|(_, path)| path.clone()));
    outputs.extend(
        templates
            .failures
            .iter()
            .map(|failure| failure.path())
            .filter(|path| recorded.contains(*path))
            .map(Path::to_path_buf),
    );
    outputs
}

/// Resolve options and run one cycle.
pub fn compile(
    converter: &impl FontConverter,
    request: &ResolveRequest,
) -> Result<CycleReport, Error> {
    let config = config::resolve(request)?;
    run_cycle(converter, &config)
}

/// Delete recorded outputs the current sources no longer produce, without
/// generating anything.
///
/// The record keeps only the outputs that are still planned, so the next
/// full cycle doesn't try to delete them twice.
pub fn reconcile_only(config: &Config) -> Result<Reconciled, Error> {
    let glyphs = scan::scan(&config.input)?;
    let planned = planned_outputs(config, &glyphs).map_err(scan::ScanError::from)?;
    let root = &config.project_root;

    let mut data = DataCache::load(&config.data_cache);
    let previous = data.project(root);
    let (_, result) = cache::reconcile(root, &previous, &planned);

    let kept: Vec<PathBuf> = previous
        .paths(root)
        .into_iter()
        .filter(|p| planned.contains(p))
        .collect();
    data.set_project(root, ProjectRecord::from_paths(root, kept.iter().map(PathBuf::as_path)));
    data.save(&config.data_cache)?;
    Ok(result)
}
