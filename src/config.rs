//! Options resolution.
//!
//! Turns built-in defaults, an optional `glyphpack.toml`, and explicit caller
//! overrides into one immutable [`Config`]. Every invocation (and every watch
//! cycle) resolves a fresh value; nothing here is process-global.
//!
//! ## Layering
//!
//! Lowest to highest precedence:
//!
//! ```text
//! stock defaults            (ConfigFile::default(), serialized to TOML)
//!   └─ glyphpack.toml       (explicit --config path, or discovered)
//!        └─ overrides       (CLI flags; only the ones actually given)
//! ```
//!
//! Each layer is a `toml::Value`; [`merge_toml`] folds them together and the
//! result deserializes into [`ConfigFile`], which rejects unknown keys.
//!
//! ## Config File Location
//!
//! An explicit path always wins. Without one, these are tried in order and the
//! first existing file is used:
//!
//! ```text
//! <project_root>/glyphpack.toml
//! <project_root>/config/glyphpack.toml
//! ```
//!
//! All relative paths (input, output, data cache, config) are resolved against
//! the project root.
//!
//! ## Configuration Options
//!
//! ```toml
//! input = "."                  # Directory holding *.svg / *.eps sources
//! output = "fonts"             # Or a table: { fonts = "...", css = "...", preview = "..." }
//! data_cache = ".glyphpack-data"
//! font_name = "icons"
//! css_prefix = "icon-"
//! # preprocessor_path = "/assets/fonts"
//! templates = ["css", "preview"]
//! formats = ["ttf", "woff", "eot", "svg"]
//! no_hash = false
//! debug = false
//! quiet = false
//!
//! [watch]
//! debounce_ms = 250
//! skip_first = false
//! skip_first_cleanup = "skip"  # or "reconcile"
//! ```

use crate::font::FontFormat;
use crate::scan;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Conventional config file name, looked up in the project root and `config/`.
pub const CONFIG_FILENAME: &str = "glyphpack.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Project root does not exist: {0}")]
    MissingProjectRoot(PathBuf),
    #[error("Input directory does not exist: {0}")]
    MissingInput(PathBuf),
    #[error("No SVG or EPS files found in {0}")]
    NoSources(PathBuf),
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unknown template '{0}'. Recognized templates: {known}", known = TemplateKind::names())]
    UnknownTemplate(String),
}

// =============================================================================
// Template kinds
// =============================================================================

/// A built-in template that can be rendered next to the fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateKind {
    Preview,
    Css,
    Scss,
    ScssRails,
    Bootstrap,
    BootstrapScss,
    BootstrapIe7,
    BootstrapIe7Scss,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 8] = [
        TemplateKind::Preview,
        TemplateKind::Css,
        TemplateKind::Scss,
        TemplateKind::ScssRails,
        TemplateKind::Bootstrap,
        TemplateKind::BootstrapScss,
        TemplateKind::BootstrapIe7,
        TemplateKind::BootstrapIe7Scss,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateKind::Preview => "preview",
            TemplateKind::Css => "css",
            TemplateKind::Scss => "scss",
            TemplateKind::ScssRails => "scss-rails",
            TemplateKind::Bootstrap => "bootstrap",
            TemplateKind::BootstrapScss => "bootstrap-scss",
            TemplateKind::BootstrapIe7 => "bootstrap-ie7",
            TemplateKind::BootstrapIe7Scss => "bootstrap-ie7-scss",
        }
    }

    fn names() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == name)
            .ok_or_else(|| ConfigError::UnknownTemplate(name.to_string()))
    }
}

// =============================================================================
// On-disk config file
// =============================================================================

/// The `glyphpack.toml` document. All keys are optional; unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Directory with the vector sources, relative to the project root.
    pub input: String,
    /// Where generated files go.
    pub output: OutputSetting,
    /// JSON record of previously generated files, used for cleanup.
    pub data_cache: String,
    pub font_name: String,
    /// Prefix for each glyph's CSS class.
    pub css_prefix: String,
    /// Font path used by the SCSS templates instead of the relative path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preprocessor_path: Option<String>,
    pub templates: Vec<String>,
    pub formats: Vec<String>,
    /// Disable fingerprint suffixes on font file names.
    pub no_hash: bool,
    pub debug: bool,
    pub quiet: bool,
    pub watch: WatchFileConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            input: ".".to_string(),
            output: OutputSetting::Dir("fonts".to_string()),
            data_cache: ".glyphpack-data".to_string(),
            font_name: "icons".to_string(),
            css_prefix: "icon-".to_string(),
            preprocessor_path: None,
            templates: vec!["css".to_string(), "preview".to_string()],
            formats: FontFormat::ALL.iter().map(|f| f.to_string()).collect(),
            no_hash: false,
            debug: false,
            quiet: false,
            watch: WatchFileConfig::default(),
        }
    }
}

/// `output` is either one directory for everything, or split per artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputSetting {
    Dir(String),
    Split(SplitOutput),
}

/// Per-artifact output directories. `css` and `preview` default to `fonts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitOutput {
    #[serde(default = "default_fonts_dir")]
    pub fonts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

fn default_fonts_dir() -> String {
    "fonts".to_string()
}

/// `[watch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchFileConfig {
    pub debounce_ms: u64,
    pub skip_first: bool,
    pub skip_first_cleanup: SkipFirstCleanup,
}

impl Default for WatchFileConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            skip_first: false,
            skip_first_cleanup: SkipFirstCleanup::Skip,
        }
    }
}

/// What happens to stale outputs when the watcher skips its first cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipFirstCleanup {
    /// No generation and no garbage collection until the first change.
    Skip,
    /// Delete recorded outputs the current sources would no longer produce.
    Reconcile,
}

// =============================================================================
// Resolved configuration
// =============================================================================

/// Resolved output directories (absolute).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    pub fonts: PathBuf,
    pub css: PathBuf,
    pub preview: PathBuf,
}

impl OutputDirs {
    /// Directory a template kind is written to.
    pub fn for_template(&self, kind: TemplateKind) -> &Path {
        match kind {
            TemplateKind::Preview => &self.preview,
            _ => &self.css,
        }
    }

    /// All distinct output directories.
    pub fn all(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = vec![&self.fonts, &self.css, &self.preview];
        dirs.sort();
        dirs.dedup();
        dirs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    pub debounce: Duration,
    pub skip_first: bool,
    pub skip_first_cleanup: SkipFirstCleanup,
}

/// Fully resolved, immutable configuration for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub project_root: PathBuf,
    pub input: PathBuf,
    pub output: OutputDirs,
    /// The config file that was actually loaded, if any.
    pub config_file: Option<PathBuf>,
    pub data_cache: PathBuf,
    pub font_name: String,
    pub css_prefix: String,
    pub preprocessor_path: Option<String>,
    /// Requested templates, deduplicated in declaration order.
    pub templates: Vec<TemplateKind>,
    /// Requested font formats, deduplicated in declaration order.
    pub formats: Vec<FontFormat>,
    pub no_hash: bool,
    pub debug: bool,
    pub quiet: bool,
    pub watch: WatchSettings,
}

/// Explicit caller overrides. Only `Some` fields take effect.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output: Option<String>,
    pub data_cache: Option<String>,
    pub font_name: Option<String>,
    pub css_prefix: Option<String>,
    pub preprocessor_path: Option<String>,
    pub templates: Option<Vec<String>>,
    pub formats: Option<Vec<String>>,
    pub no_hash: Option<bool>,
    pub debug: Option<bool>,
    pub quiet: Option<bool>,
    pub skip_first: Option<bool>,
}

impl Overrides {
    /// Sparse TOML table holding just the given overrides.
    pub fn to_toml(&self) -> toml::Value {
        let mut table = toml::map::Map::new();
        let strings = [
            ("output", &self.output),
            ("data_cache", &self.data_cache),
            ("font_name", &self.font_name),
            ("css_prefix", &self.css_prefix),
            ("preprocessor_path", &self.preprocessor_path),
        ];
        for (key, value) in strings {
            if let Some(v) = value {
                table.insert(key.to_string(), toml::Value::String(v.clone()));
            }
        }
        for (key, value) in [("templates", &self.templates), ("formats", &self.formats)] {
            if let Some(list) = value {
                let items = list.iter().cloned().map(toml::Value::String).collect();
                table.insert(key.to_string(), toml::Value::Array(items));
            }
        }
        for (key, value) in [
            ("no_hash", self.no_hash),
            ("debug", self.debug),
            ("quiet", self.quiet),
        ] {
            if let Some(v) = value {
                table.insert(key.to_string(), toml::Value::Boolean(v));
            }
        }
        if let Some(skip) = self.skip_first {
            let mut watch = toml::map::Map::new();
            watch.insert("skip_first".to_string(), toml::Value::Boolean(skip));
            table.insert("watch".to_string(), toml::Value::Table(watch));
        }
        toml::Value::Table(table)
    }
}

/// Everything needed to resolve a [`Config`]. Kept by the watcher so each
/// cycle can re-resolve from scratch.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub project_root: PathBuf,
    /// Explicit config file; wins over discovery.
    pub config_file: Option<PathBuf>,
    /// Input directory override (the positional `INPUT` argument).
    pub input: Option<PathBuf>,
    pub overrides: Overrides,
}

impl ResolveRequest {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            config_file: None,
            input: None,
            overrides: Overrides::default(),
        }
    }
}

// =============================================================================
// Loading, merging, and validation
// =============================================================================

/// Stock defaults as a TOML table; the base layer for merging.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ConfigFile::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Find the config file to load.
///
/// An explicit path must exist. Otherwise the conventional locations are
/// checked in order and `Ok(None)` means defaults only.
pub fn locate_config_file(
    project_root: &Path,
    explicit: Option<&Path>,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        let path = absolutize(project_root, path);
        if !path.is_file() {
            return Err(ConfigError::ConfigNotFound(path));
        }
        return Ok(Some(path));
    }
    let candidates = [
        project_root.join(CONFIG_FILENAME),
        project_root.join("config").join(CONFIG_FILENAME),
    ];
    Ok(candidates.into_iter().find(|p| p.is_file()))
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(value)
}

/// Resolve a complete [`Config`].
pub fn resolve(request: &ResolveRequest) -> Result<Config, ConfigError> {
    let project_root = fs::canonicalize(&request.project_root)
        .map_err(|_| ConfigError::MissingProjectRoot(request.project_root.clone()))?;
    if !project_root.is_dir() {
        return Err(ConfigError::MissingProjectRoot(request.project_root.clone()));
    }

    let config_file = locate_config_file(&project_root, request.config_file.as_deref())?;

    let mut merged = stock_defaults_value();
    if let Some(path) = &config_file {
        log::debug!("Loading config from {}", path.display());
        merged = merge_toml(merged, load_raw_config(path)?);
    }
    merged = merge_toml(merged, request.overrides.to_toml());
    let file: ConfigFile = merged.try_into().map_err(|e: toml::de::Error| {
        if e.message().contains("OutputSetting") {
            ConfigError::Validation(
                "output must be a directory, or an [output] table with fonts, css and preview keys"
                    .into(),
            )
        } else {
            ConfigError::Toml(e)
        }
    })?;

    let input = match &request.input {
        Some(dir) => absolutize(&project_root, dir),
        None => absolutize(&project_root, Path::new(&file.input)),
    };
    if !input.is_dir() {
        return Err(ConfigError::MissingInput(input));
    }
    if !scan::has_sources(&input)? {
        return Err(ConfigError::NoSources(input));
    }

    let config = Config {
        output: resolve_output(&project_root, &file.output),
        data_cache: absolutize(&project_root, Path::new(&file.data_cache)),
        templates: parse_templates(&file.templates)?,
        formats: parse_formats(&file.formats)?,
        font_name: file.font_name.trim().to_string(),
        css_prefix: file.css_prefix,
        preprocessor_path: file.preprocessor_path,
        no_hash: file.no_hash,
        debug: file.debug,
        quiet: file.quiet,
        watch: WatchSettings {
            debounce: Duration::from_millis(file.watch.debounce_ms),
            skip_first: file.watch.skip_first,
            skip_first_cleanup: file.watch.skip_first_cleanup,
        },
        config_file,
        input,
        project_root,
    };
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate values that deserialization alone can't check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.font_name.is_empty() {
            return Err(ConfigError::Validation("font_name must not be empty".into()));
        }
        // Both end up verbatim in file names, CSS strings and the preview's
        // <style> block.
        if !is_css_identifier(&self.font_name) {
            return Err(ConfigError::Validation(format!(
                "font_name '{}' may only contain letters, digits, '-' and '_'",
                self.font_name
            )));
        }
        if !self.css_prefix.is_empty() && !is_css_identifier(&self.css_prefix) {
            return Err(ConfigError::Validation(format!(
                "css_prefix '{}' may only contain letters, digits, '-' and '_'",
                self.css_prefix
            )));
        }
        if self.formats.is_empty() {
            return Err(ConfigError::Validation("formats must not be empty".into()));
        }
        // A generated SVG font would be picked up as an icon by the next scan.
        if self.formats.contains(&FontFormat::Svg) && self.output.fonts == self.input {
            return Err(ConfigError::Validation(
                "the font output directory must differ from the input directory when generating svg fonts".into(),
            ));
        }
        Ok(())
    }

    /// Log level implied by the `debug` and `quiet` options.
    pub fn log_level(&self) -> log::LevelFilter {
        log_level(self.debug, self.quiet)
    }
}

/// `debug` wins over `quiet`.
pub fn log_level(debug: bool, quiet: bool) -> log::LevelFilter {
    if debug {
        log::LevelFilter::Debug
    } else if quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    }
}

fn is_css_identifier(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn resolve_output(root: &Path, setting: &OutputSetting) -> OutputDirs {
    match setting {
        OutputSetting::Dir(dir) => {
            let dir = absolutize(root, Path::new(dir));
            OutputDirs {
                fonts: dir.clone(),
                css: dir.clone(),
                preview: dir,
            }
        }
        OutputSetting::Split(split) => {
            let fonts = absolutize(root, Path::new(&split.fonts));
            let or_fonts = |dir: &Option<String>| {
                dir.as_deref()
                    .map(|d| absolutize(root, Path::new(d)))
                    .unwrap_or_else(|| fonts.clone())
            };
            OutputDirs {
                css: or_fonts(&split.css),
                preview: or_fonts(&split.preview),
                fonts,
            }
        }
    }
}

/// Parse template names, rejecting unknown ones and dropping duplicates.
pub fn parse_templates(names: &[String]) -> Result<Vec<TemplateKind>, ConfigError> {
    let mut kinds = Vec::new();
    for name in names {
        let kind: TemplateKind = name.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

fn parse_formats(names: &[String]) -> Result<Vec<FontFormat>, ConfigError> {
    let mut formats = Vec::new();
    for name in names {
        let format: FontFormat = name
            .parse()
            .map_err(|_| ConfigError::Validation(format!("unknown font format '{name}'")))?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    Ok(formats)
}

fn absolutize(root: &Path, path: &Path) -> PathBuf {
    if path == Path::new(".") {
        root.to_path_buf()
    } else if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Annotated starter `glyphpack.toml`, written by `glyphpack config`.
pub fn stock_config_toml() -> &'static str {
    r##"# glyphpack configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Relative paths are resolved against the project root (--project-root).
# Unknown keys will cause an error.

# Directory holding the *.svg and *.eps icon sources.
input = "."

# Where generated files are saved. Either a single directory:
output = "fonts"
# ...or a table to place each artifact separately (css/preview default to fonts):
# [output]
# fonts = "app/assets/fonts"
# css = "app/assets/stylesheets"
# preview = "docs"

# Record of previously generated files. Used to delete stale outputs.
data_cache = ".glyphpack-data"

# Font family name, also the base name of every generated file.
font_name = "icons"

# Prefix for each glyph's CSS class: .icon-home, .icon-star, ...
css_prefix = "icon-"

# Font path used in the SCSS templates instead of the computed relative path.
# preprocessor_path = "/assets/fonts"

# Templates to generate alongside the fonts. Recognized values:
#   preview, css, scss, scss-rails, bootstrap, bootstrap-scss,
#   bootstrap-ie7, bootstrap-ie7-scss
templates = ["css", "preview"]

# Font formats to generate.
formats = ["ttf", "woff", "eot", "svg"]

# Generate fonts without cache-busting fingerprints in their file names.
no_hash = false

# Display debugging messages.
debug = false

# Hide status messages.
quiet = false

# ---------------------------------------------------------------------------
# Watch mode
# ---------------------------------------------------------------------------
[watch]
# Quiet period after the last change before regenerating.
debounce_ms = 250

# Don't compile when the watcher starts; wait for the first change.
skip_first = false

# When skip_first is set: "skip" leaves old outputs alone until the first
# change, "reconcile" deletes recorded outputs the current icons no longer
# produce.
skip_first_cleanup = "skip"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{project_with_icons, write_file};
    use tempfile::TempDir;

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn defaults_resolve_against_project_root() {
        let tmp = project_with_icons(&["home", "star"]);
        let config = resolve(&ResolveRequest::new(tmp.path())).unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();

        assert_eq!(config.project_root, root);
        assert_eq!(config.input, root);
        assert_eq!(config.output.fonts, root.join("fonts"));
        assert_eq!(config.output.css, root.join("fonts"));
        assert_eq!(config.data_cache, root.join(".glyphpack-data"));
        assert_eq!(config.font_name, "icons");
        assert_eq!(config.css_prefix, "icon-");
        assert_eq!(
            config.templates,
            vec![TemplateKind::Css, TemplateKind::Preview]
        );
        assert_eq!(config.formats, FontFormat::ALL.to_vec());
        assert!(!config.no_hash);
        assert_eq!(config.watch.debounce, Duration::from_millis(250));
        assert_eq!(config.config_file, None);
    }

    #[test]
    fn missing_project_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let request = ResolveRequest::new(tmp.path().join("nope"));
        assert!(matches!(
            resolve(&request),
            Err(ConfigError::MissingProjectRoot(_))
        ));
    }

    #[test]
    fn missing_input_is_error() {
        let tmp = project_with_icons(&["home"]);
        let mut request = ResolveRequest::new(tmp.path());
        request.input = Some("vectors".into());
        assert!(matches!(resolve(&request), Err(ConfigError::MissingInput(_))));
    }

    #[test]
    fn input_without_sources_is_error() {
        let tmp = TempDir::new().unwrap();
        write_file(&tmp.path().join("readme.txt"), "not an icon");
        assert!(matches!(
            resolve(&ResolveRequest::new(tmp.path())),
            Err(ConfigError::NoSources(_))
        ));
    }

    // =========================================================================
    // Config file discovery and precedence
    // =========================================================================

    #[test]
    fn discovers_root_config_file() {
        let tmp = project_with_icons(&["home"]);
        write_file(&tmp.path().join(CONFIG_FILENAME), "font_name = \"glyphs\"\n");

        let config = resolve(&ResolveRequest::new(tmp.path())).unwrap();
        assert_eq!(config.font_name, "glyphs");
        assert!(config.config_file.unwrap().ends_with(CONFIG_FILENAME));
    }

    #[test]
    fn discovers_config_dir_file() {
        let tmp = project_with_icons(&["home"]);
        write_file(
            &tmp.path().join("config").join(CONFIG_FILENAME),
            "css_prefix = \"gl-\"\n",
        );

        let config = resolve(&ResolveRequest::new(tmp.path())).unwrap();
        assert_eq!(config.css_prefix, "gl-");
    }

    #[test]
    fn root_config_wins_over_config_dir() {
        let tmp = project_with_icons(&["home"]);
        write_file(&tmp.path().join(CONFIG_FILENAME), "font_name = \"root\"\n");
        write_file(
            &tmp.path().join("config").join(CONFIG_FILENAME),
            "font_name = \"nested\"\n",
        );

        let config = resolve(&ResolveRequest::new(tmp.path())).unwrap();
        assert_eq!(config.font_name, "root");
    }

    #[test]
    fn explicit_config_path_wins_over_discovery() {
        let tmp = project_with_icons(&["home"]);
        write_file(&tmp.path().join(CONFIG_FILENAME), "font_name = \"discovered\"\n");
        write_file(&tmp.path().join("custom.toml"), "font_name = \"explicit\"\n");

        let mut request = ResolveRequest::new(tmp.path());
        request.config_file = Some("custom.toml".into());
        let config = resolve(&request).unwrap();

        assert_eq!(config.font_name, "explicit");
        assert!(config.config_file.unwrap().ends_with("custom.toml"));
    }

    #[test]
    fn explicit_config_path_missing_is_error_even_with_discoverable_file() {
        let tmp = project_with_icons(&["home"]);
        write_file(&tmp.path().join(CONFIG_FILENAME), "font_name = \"discovered\"\n");

        let mut request = ResolveRequest::new(tmp.path());
        request.config_file = Some("missing.toml".into());
        assert!(matches!(
            resolve(&request),
            Err(ConfigError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn overrides_beat_config_file() {
        let tmp = project_with_icons(&["home"]);
        write_file(
            &tmp.path().join(CONFIG_FILENAME),
            "font_name = \"file\"\ncss_prefix = \"f-\"\n",
        );

        let mut request = ResolveRequest::new(tmp.path());
        request.overrides.font_name = Some("cli".into());
        let config = resolve(&request).unwrap();

        assert_eq!(config.font_name, "cli");
        // Not overridden, so the file value survives
        assert_eq!(config.css_prefix, "f-");
    }

    #[test]
    fn skip_first_override_keeps_other_watch_settings() {
        let tmp = project_with_icons(&["home"]);
        write_file(
            &tmp.path().join(CONFIG_FILENAME),
            "[watch]\ndebounce_ms = 40\n",
        );

        let mut request = ResolveRequest::new(tmp.path());
        request.overrides.skip_first = Some(true);
        let config = resolve(&request).unwrap();

        assert!(config.watch.skip_first);
        assert_eq!(config.watch.debounce, Duration::from_millis(40));
    }

    #[test]
    fn input_override_resolves_against_root() {
        let tmp = TempDir::new().unwrap();
        write_file(&tmp.path().join("vectors/home.svg"), "<svg/>");

        let mut request = ResolveRequest::new(tmp.path());
        request.input = Some("vectors".into());
        let config = resolve(&request).unwrap();
        assert!(config.input.ends_with("vectors"));
    }

    #[test]
    fn svg_fonts_cannot_be_written_into_the_input_dir() {
        let tmp = project_with_icons(&["home"]);
        let mut request = ResolveRequest::new(tmp.path());
        request.overrides.output = Some(".".into());
        assert!(matches!(resolve(&request), Err(ConfigError::Validation(_))));

        request.overrides.formats = Some(vec!["ttf".into(), "woff".into()]);
        assert!(resolve(&request).is_ok());
    }

    #[test]
    fn invalid_toml_is_error() {
        let tmp = project_with_icons(&["home"]);
        write_file(&tmp.path().join(CONFIG_FILENAME), "this is not [[[ toml");
        assert!(matches!(
            resolve(&ResolveRequest::new(tmp.path())),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = project_with_icons(&["home"]);
        write_file(&tmp.path().join(CONFIG_FILENAME), "font_nme = \"typo\"\n");
        let err = resolve(&ResolveRequest::new(tmp.path())).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn unknown_watch_key_rejected() {
        let toml_str = "[watch]\ndebounce = 10\n";
        let result: Result<ConfigFile, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    // =========================================================================
    // Output settings
    // =========================================================================

    #[test]
    fn split_output_falls_back_to_fonts_dir() {
        let tmp = project_with_icons(&["home"]);
        write_file(
            &tmp.path().join(CONFIG_FILENAME),
            "[output]\nfonts = \"public/fonts\"\ncss = \"styles\"\n",
        );

        let config = resolve(&ResolveRequest::new(tmp.path())).unwrap();
        let root = &config.project_root;
        assert_eq!(config.output.fonts, root.join("public/fonts"));
        assert_eq!(config.output.css, root.join("styles"));
        assert_eq!(config.output.preview, root.join("public/fonts"));
        assert_eq!(config.output.all().len(), 2);
    }

    #[test]
    fn output_override_replaces_split_table() {
        let tmp = project_with_icons(&["home"]);
        write_file(
            &tmp.path().join(CONFIG_FILENAME),
            "[output]\nfonts = \"a\"\ncss = \"b\"\n",
        );

        let mut request = ResolveRequest::new(tmp.path());
        request.overrides.output = Some("out".into());
        let config = resolve(&request).unwrap();
        let out = config.project_root.join("out");
        assert_eq!(config.output.all(), vec![out.as_path()]);
    }

    #[test]
    fn template_kind_picks_output_dir() {
        let dirs = OutputDirs {
            fonts: "f".into(),
            css: "c".into(),
            preview: "p".into(),
        };
        assert_eq!(dirs.for_template(TemplateKind::Preview), Path::new("p"));
        assert_eq!(dirs.for_template(TemplateKind::ScssRails), Path::new("c"));
    }

    // =========================================================================
    // Templates and formats
    // =========================================================================

    #[test]
    fn all_template_names_parse() {
        for kind in TemplateKind::ALL {
            assert_eq!(kind.as_str().parse::<TemplateKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_template_rejected() {
        let tmp = project_with_icons(&["home"]);
        let mut request = ResolveRequest::new(tmp.path());
        request.overrides.templates = Some(vec!["css".into(), "less".into()]);

        match resolve(&request) {
            Err(ConfigError::UnknownTemplate(name)) => assert_eq!(name, "less"),
            other => panic!("expected UnknownTemplate, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_templates_are_dropped_in_order() {
        let names: Vec<String> = ["scss", "css", "scss", "preview", "css"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            parse_templates(&names).unwrap(),
            vec![TemplateKind::Scss, TemplateKind::Css, TemplateKind::Preview]
        );
    }

    #[test]
    fn unknown_format_rejected() {
        let tmp = project_with_icons(&["home"]);
        let mut request = ResolveRequest::new(tmp.path());
        request.overrides.formats = Some(vec!["otf".into()]);
        assert!(matches!(resolve(&request), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn empty_formats_rejected() {
        let tmp = project_with_icons(&["home"]);
        let mut request = ResolveRequest::new(tmp.path());
        request.overrides.formats = Some(vec![]);
        assert!(matches!(resolve(&request), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn empty_font_name_rejected() {
        let tmp = project_with_icons(&["home"]);
        let mut request = ResolveRequest::new(tmp.path());
        request.overrides.font_name = Some("   ".into());
        assert!(matches!(resolve(&request), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn names_that_would_break_css_or_html_rejected() {
        let tmp = project_with_icons(&["home"]);
        for bad in ["my\"font", "a</style>", "two words", "../up"] {
            let mut request = ResolveRequest::new(tmp.path());
            request.overrides.font_name = Some(bad.into());
            assert!(
                matches!(resolve(&request), Err(ConfigError::Validation(_))),
                "font_name {bad:?}"
            );

            let mut request = ResolveRequest::new(tmp.path());
            request.overrides.css_prefix = Some(bad.into());
            assert!(
                matches!(resolve(&request), Err(ConfigError::Validation(_))),
                "css_prefix {bad:?}"
            );
        }

        let mut request = ResolveRequest::new(tmp.path());
        request.overrides.font_name = Some("my_icons-2".into());
        request.overrides.css_prefix = Some(String::new());
        assert!(resolve(&request).is_ok());
    }

    #[test]
    fn output_table_without_fonts_uses_default_fonts_dir() {
        let tmp = project_with_icons(&["home"]);
        write_file(
            &tmp.path().join(CONFIG_FILENAME),
            "[output]\ncss = \"styles\"\n",
        );
        let config = resolve(&ResolveRequest::new(tmp.path())).unwrap();
        assert_eq!(config.output.fonts, config.project_root.join("fonts"));
        assert_eq!(config.output.css, config.project_root.join("styles"));
        assert_eq!(config.output.preview, config.project_root.join("fonts"));
    }

    #[test]
    fn malformed_output_is_explained() {
        let tmp = project_with_icons(&["home"]);
        write_file(&tmp.path().join(CONFIG_FILENAME), "output = 3\n");
        match resolve(&ResolveRequest::new(tmp.path())) {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("output"), "{msg}"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn log_level_follows_debug_and_quiet_from_file() {
        let tmp = project_with_icons(&["home"]);
        assert_eq!(test_config_level(tmp.path(), ""), log::LevelFilter::Info);
        assert_eq!(
            test_config_level(tmp.path(), "debug = true\n"),
            log::LevelFilter::Debug
        );
        assert_eq!(
            test_config_level(tmp.path(), "quiet = true\n"),
            log::LevelFilter::Warn
        );
        assert_eq!(
            test_config_level(tmp.path(), "debug = true\nquiet = true\n"),
            log::LevelFilter::Debug
        );
    }

    fn test_config_level(root: &Path, toml: &str) -> log::LevelFilter {
        write_file(&root.join(CONFIG_FILENAME), toml);
        resolve(&ResolveRequest::new(root)).unwrap().log_level()
    }

    // =========================================================================
    // Overrides / merge
    // =========================================================================

    #[test]
    fn empty_overrides_are_empty_table() {
        let value = Overrides::default().to_toml();
        assert!(value.as_table().unwrap().is_empty());
    }

    #[test]
    fn merge_toml_preserves_nested_base_keys() {
        let base: toml::Value =
            toml::from_str("[watch]\ndebounce_ms = 250\nskip_first = false\n").unwrap();
        let overlay: toml::Value = toml::from_str("[watch]\nskip_first = true\n").unwrap();
        let merged = merge_toml(base, overlay);
        let watch = merged.get("watch").unwrap();
        assert_eq!(watch.get("debounce_ms").unwrap().as_integer(), Some(250));
        assert_eq!(watch.get("skip_first").unwrap().as_bool(), Some(true));
    }

    // =========================================================================
    // stock_config_toml
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let parsed: ConfigFile = toml::from_str(stock_config_toml()).unwrap();
        let defaults = ConfigFile::default();
        assert_eq!(parsed.input, defaults.input);
        assert_eq!(parsed.font_name, defaults.font_name);
        assert_eq!(parsed.css_prefix, defaults.css_prefix);
        assert_eq!(parsed.templates, defaults.templates);
        assert_eq!(parsed.formats, defaults.formats);
        assert_eq!(parsed.watch.debounce_ms, defaults.watch.debounce_ms);
        assert_eq!(parsed.watch.skip_first_cleanup, SkipFirstCleanup::Skip);
        assert!(matches!(parsed.output, OutputSetting::Dir(ref d) if d == "fonts"));
    }

    #[test]
    fn stock_defaults_value_has_all_keys() {
        let val = stock_defaults_value();
        for key in ["input", "output", "font_name", "templates", "formats", "watch"] {
            assert!(val.get(key).is_some(), "missing {key}");
        }
        assert!(val.get("preprocessor_path").is_none());
    }
}
