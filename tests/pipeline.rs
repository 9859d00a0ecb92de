//! End-to-end cycles through the public API.
//!
//! Font conversion is replaced by a converter that writes one small text
//! file per format, so these run without FontForge installed.

use glyphpack::config::{self, ResolveRequest};
use glyphpack::font::{ConvertError, ConvertRequest, FontConverter, FontFormat};
use glyphpack::pipeline::{self, CycleReport};
use glyphpack::{ErrorCategory, cache::DataCache};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct TextConverter;

impl FontConverter for TextConverter {
    fn convert(&self, request: &ConvertRequest) -> Result<(), ConvertError> {
        for (format, path) in &request.outputs {
            let names: Vec<&str> = request.glyphs.iter().map(|g| g.name.as_str()).collect();
            fs::write(path, format!("{} {}: {}", request.font_name, format, names.join(",")))?;
        }
        Ok(())
    }
}

fn project(icons: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (name, body) in icons {
        write(tmp.path(), &format!("{name}.svg"), body);
    }
    tmp
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn compile(root: &Path) -> CycleReport {
    pipeline::compile(&TextConverter, &ResolveRequest::new(root)).unwrap()
}

fn font_files(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(root.join("fonts"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("icons_"))
        .collect();
    names.sort();
    names
}

const HOME: &str = r#"<svg viewBox="0 0 16 16"><path d="M8 1L1 8h2v7h10V8h2z"/></svg>"#;
const STAR: &str = r#"<svg viewBox="0 0 16 16"><path d="M8 0l2 6h6l-5 4 2 6-5-4-5 4 2-6-5-4h6z"/></svg>"#;

#[test]
fn home_and_star_produce_fonts_stylesheet_and_preview() {
    let tmp = project(&[("home", HOME), ("star", STAR)]);
    let report = compile(tmp.path());
    let base = &report.fonts.base_name;

    assert!(report.is_clean());
    assert_eq!(report.fonts.fingerprint.len(), 64);
    assert_eq!(base.len(), "icons_".len() + 16);
    assert_eq!(
        font_files(tmp.path()),
        ["eot", "svg", "ttf", "woff"].map(|ext| format!("{base}.{ext}"))
    );

    let css = fs::read_to_string(tmp.path().join("fonts/icons.css")).unwrap();
    assert!(css.contains(".icon-home:before { content: \"\\f100\"; }"));
    assert!(css.contains(".icon-star:before { content: \"\\f101\"; }"));
    assert!(css.contains(&format!("url(\"{base}.woff\") format(\"woff\")")));

    let html = fs::read_to_string(tmp.path().join("fonts/icons-preview.html")).unwrap();
    assert!(html.contains("icon-home"));
    assert!(html.contains("icon-star"));
}

#[test]
fn same_icons_give_same_names() {
    let a = project(&[("home", HOME), ("star", STAR)]);
    let b = project(&[("star", STAR), ("home", HOME)]);
    assert_eq!(compile(a.path()).fonts.base_name, compile(b.path()).fonts.base_name);
}

#[test]
fn any_icon_change_renames_fonts() {
    let tmp = project(&[("home", HOME), ("star", STAR)]);
    let before = compile(tmp.path()).fonts.base_name;

    write(tmp.path(), "star.svg", &STAR.replace("h6z", "h5z"));
    let after = compile(tmp.path()).fonts.base_name;
    assert_ne!(before, after);

    fs::rename(tmp.path().join("star.svg"), tmp.path().join("favorite.svg")).unwrap();
    assert_ne!(compile(tmp.path()).fonts.base_name, after);
}

#[test]
fn previous_generation_is_collected() {
    let tmp = project(&[("home", HOME), ("star", STAR)]);
    let first = compile(tmp.path());

    fs::remove_file(tmp.path().join("star.svg")).unwrap();
    let second = compile(tmp.path());

    let mut expected: Vec<String> = FontFormat::ALL
        .iter()
        .map(|f| format!("{}.{}", second.fonts.base_name, f.extension()))
        .collect();
    expected.sort();
    assert_eq!(font_files(tmp.path()), expected);
    assert_eq!(second.cleanup.deleted.len(), FontFormat::ALL.len());
    assert!(first.fonts.paths().all(|p| !p.exists()));
    assert!(tmp.path().join("fonts/icons.css").exists());
}

#[test]
fn files_not_in_the_record_are_never_deleted() {
    let tmp = project(&[("home", HOME)]);
    write(tmp.path(), "fonts/icons_0000000000000000.ttf", "hand made");
    write(tmp.path(), "fonts/README", "keep");

    compile(tmp.path());
    compile(tmp.path());

    assert!(tmp.path().join("fonts/icons_0000000000000000.ttf").exists());
    assert!(tmp.path().join("fonts/README").exists());
}

#[test]
fn corrupt_data_cache_deletes_nothing() {
    let tmp = project(&[("home", HOME)]);
    let first = compile(tmp.path());
    write(tmp.path(), ".glyphpack-data", "not a record");

    write(tmp.path(), "home.svg", &HOME.replace("h2", "h3"));
    let second = compile(tmp.path());

    assert!(second.cleanup.deleted.is_empty());
    assert!(first.fonts.paths().all(|p| p.exists()));
}

#[test]
fn one_failing_template_does_not_stop_the_others() {
    let tmp = project(&[("home", HOME)]);
    write(
        tmp.path(),
        "glyphpack.toml",
        "templates = [\"css\", \"preview\"]\n\n[output]\nfonts = \"fonts\"\ncss = \"styles\"\n",
    );
    // A file where the css directory should be.
    write(tmp.path(), "styles", "blocking file");

    let report = compile(tmp.path());

    assert!(!report.is_clean());
    assert_eq!(report.templates.failures.len(), 1);
    assert!(tmp.path().join("fonts/icons-preview.html").is_file());
    assert!(report.fonts.paths().all(|p| p.exists()));
}

#[test]
fn explicit_config_file_wins_over_discovered() {
    let tmp = project(&[("home", HOME)]);
    write(tmp.path(), "glyphpack.toml", "font_name = \"discovered\"\n");
    write(tmp.path(), "alt/custom.toml", "font_name = \"explicit\"\n");

    let mut request = ResolveRequest::new(tmp.path());
    request.config_file = Some(PathBuf::from("alt/custom.toml"));
    let report = pipeline::compile(&TextConverter, &request).unwrap();

    assert!(report.fonts.base_name.starts_with("explicit_"));
    assert!(tmp.path().join("fonts/explicit.css").exists());
}

#[test]
fn missing_explicit_config_file_is_a_configuration_error() {
    let tmp = project(&[("home", HOME)]);
    let mut request = ResolveRequest::new(tmp.path());
    request.config_file = Some(PathBuf::from("nope.toml"));

    let err = pipeline::compile(&TextConverter, &request).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn outputs_are_recorded_per_project() {
    let tmp = project(&[("home", HOME)]);
    let report = compile(tmp.path());
    let config = config::resolve(&ResolveRequest::new(tmp.path())).unwrap();

    let record = DataCache::load(&config.data_cache).project(&config.project_root);
    let recorded = record.paths(&config.project_root);
    assert!(report.fonts.paths().all(|p| recorded.contains(p)));
    assert!(recorded.contains(&config.project_root.join("fonts/icons.css")));
}
