//! Stylesheet and preview rendering.
//!
//! Third stage of a cycle. Renders every configured template from the glyph
//! manifest and the font files just written. Templates are independent: one
//! that cannot be written is reported without stopping the others, and they
//! are rendered in parallel.
//!
//! ## Output files
//!
//! For `font_name = "icons"`:
//!
//! ```text
//! css                  → <css>/icons.css
//! scss                 → <css>/_icons.scss
//! scss-rails           → <css>/_icons-rails.scss
//! bootstrap            → <css>/icons-bootstrap.css
//! bootstrap-scss       → <css>/_icons-bootstrap.scss
//! bootstrap-ie7        → <css>/icons-bootstrap-ie7.css
//! bootstrap-ie7-scss   → <css>/_icons-bootstrap-ie7.scss
//! preview              → <preview>/icons-preview.html
//! ```
//!
//! ## Font URLs
//!
//! Plain CSS and the preview reference the fonts by their path relative to
//! the template's own directory. SCSS templates go through a
//! `$<name>-font-path` variable (the `preprocessor_path` option, or the
//! relative path), and `scss-rails` uses the asset pipeline's `font-url()`.

use crate::config::{Config, TemplateKind};
use crate::font::FontFormat;
use crate::fonts::FontOutput;
use crate::naming;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

const PREVIEW_CSS: &str = include_str!("../static/preview.css");

/// Order of the `src:` list in `@font-face`; browsers take the first they support.
const SRC_ORDER: [FontFormat; 4] = [
    FontFormat::Eot,
    FontFormat::Woff,
    FontFormat::Ttf,
    FontFormat::Svg,
];

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Cannot write {kind} template to {}: {source}", path.display())]
    Write {
        kind: TemplateKind,
        path: PathBuf,
        source: io::Error,
    },
}

impl TemplateError {
    /// File the template was meant to be written to.
    pub fn path(&self) -> &Path {
        match self {
            TemplateError::Write { path, .. } => path,
        }
    }
}

/// Outcome of rendering every configured template.
#[derive(Debug, Default)]
pub struct TemplateReport {
    pub written: Vec<(TemplateKind, PathBuf)>,
    pub failures: Vec<TemplateError>,
}

impl TemplateReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// File name a template kind is written to.
pub fn template_file_name(font_name: &str, kind: TemplateKind) -> String {
    match kind {
        TemplateKind::Preview => format!("{font_name}-preview.html"),
        TemplateKind::Css => format!("{font_name}.css"),
        TemplateKind::Scss => format!("_{font_name}.scss"),
        TemplateKind::ScssRails => format!("_{font_name}-rails.scss"),
        TemplateKind::Bootstrap => format!("{font_name}-bootstrap.css"),
        TemplateKind::BootstrapScss => format!("_{font_name}-bootstrap.scss"),
        TemplateKind::BootstrapIe7 => format!("{font_name}-bootstrap-ie7.css"),
        TemplateKind::BootstrapIe7Scss => format!("_{font_name}-bootstrap-ie7.scss"),
    }
}

pub fn template_path(config: &Config, kind: TemplateKind) -> PathBuf {
    config
        .output
        .for_template(kind)
        .join(template_file_name(&config.font_name, kind))
}

/// Render and write every configured template.
pub fn render_templates(config: &Config, fonts: &FontOutput) -> TemplateReport {
    let results: Vec<Result<(TemplateKind, PathBuf), TemplateError>> = config
        .templates
        .par_iter()
        .map(|&kind| {
            let path = template_path(config, kind);
            match write_template(&path, &render(kind, config, fonts)) {
                Ok(()) => Ok((kind, path)),
                Err(source) => Err(TemplateError::Write { kind, path, source }),
            }
        })
        .collect();

    let mut report = TemplateReport::default();
    for result in results {
        match result {
            Ok(written) => report.written.push(written),
            Err(e) => {
                log::debug!("{}", e);
                report.failures.push(e);
            }
        }
    }
    report
}

fn write_template(path: &Path, content: &str) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, content)
}

/// Render one template to a string.
pub fn render(kind: TemplateKind, config: &Config, fonts: &FontOutput) -> String {
    let relative = relative_dir(config.output.for_template(kind), &config.output.fonts);
    let scss_var = format!("${}-font-path", naming::glyph_name(&config.font_name));
    let plain = FontUrls::Relative(&relative);
    let scss = FontUrls::Variable(&scss_var);

    match kind {
        TemplateKind::Preview => render_preview(config, fonts, &relative).into_string(),
        TemplateKind::Css => [
            header(fonts),
            font_face(config, fonts, &plain),
            pseudo_base(config),
            glyph_rules(config, fonts),
        ]
        .concat(),
        TemplateKind::Scss => [
            header(fonts),
            scss_path_variable(config, &scss_var, &relative),
            font_face(config, fonts, &scss),
            pseudo_base(config),
            glyph_rules(config, fonts),
        ]
        .concat(),
        TemplateKind::ScssRails => [
            header(fonts),
            font_face(config, fonts, &FontUrls::Rails),
            pseudo_base(config),
            glyph_rules(config, fonts),
        ]
        .concat(),
        TemplateKind::Bootstrap => [
            header(fonts),
            font_face(config, fonts, &plain),
            bootstrap_base(config),
            glyph_rules(config, fonts),
        ]
        .concat(),
        TemplateKind::BootstrapScss => [
            header(fonts),
            scss_path_variable(config, &scss_var, &relative),
            font_face(config, fonts, &scss),
            bootstrap_base(config),
            glyph_rules(config, fonts),
        ]
        .concat(),
        TemplateKind::BootstrapIe7 | TemplateKind::BootstrapIe7Scss => {
            [header(fonts), ie7_rules(config, fonts)].concat()
        }
    }
}

/// Relative URL path from directory `from` to directory `to`, `/`-separated.
///
/// Empty when they are the same directory.
pub fn relative_dir(from: &Path, to: &Path) -> String {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

// ============================================================================
// Stylesheet pieces
// ============================================================================

enum FontUrls<'a> {
    Relative(&'a str),
    Variable(&'a str),
    Rails,
}

impl FontUrls<'_> {
    fn url(&self, file: &str) -> String {
        match self {
            FontUrls::Relative("") => format!("url(\"{file}\")"),
            FontUrls::Relative(dir) => format!("url(\"{dir}/{file}\")"),
            FontUrls::Variable(var) => format!("url(\"#{{{var}}}/{file}\")"),
            FontUrls::Rails => format!("font-url(\"{file}\")"),
        }
    }
}

fn header(fonts: &FontOutput) -> String {
    format!(
        "/*\n  {} ({} glyphs), generated by glyphpack.\n  Changes to this file are overwritten on the next run.\n*/\n\n",
        fonts.base_name,
        fonts.glyphs.len()
    )
}

fn scss_path_variable(config: &Config, var: &str, relative: &str) -> String {
    let path = match config.preprocessor_path.as_deref() {
        Some(path) => path.trim_end_matches('/'),
        None if relative.is_empty() => ".",
        None => relative,
    };
    format!("{var}: \"{path}\" !default;\n\n")
}

fn font_face(config: &Config, fonts: &FontOutput, urls: &FontUrls) -> String {
    let name = &config.font_name;
    let mut css = String::from("@font-face {\n");
    css.push_str(&format!("  font-family: \"{name}\";\n"));

    let has_eot = fonts.files.contains_key(&FontFormat::Eot);
    if has_eot {
        let eot = fonts.file_name(FontFormat::Eot);
        css.push_str(&format!("  src: {};\n", urls.url(&eot)));
    }

    let sources: Vec<String> = SRC_ORDER
        .iter()
        .filter(|f| fonts.files.contains_key(*f))
        .map(|&format| {
            let file = match format {
                FontFormat::Eot => format!("{}?#iefix", fonts.file_name(format)),
                FontFormat::Svg => format!("{}#{}", fonts.file_name(format), name),
                _ => fonts.file_name(format),
            };
            format!("{} format(\"{}\")", urls.url(&file), format.css_format())
        })
        .collect();
    css.push_str(&format!("  src: {};\n", sources.join(",\n       ")));

    css.push_str("  font-weight: normal;\n  font-style: normal;\n}\n\n");
    css
}

fn class_selectors(config: &Config, suffix: &str) -> String {
    let prefix = &config.css_prefix;
    format!("[class^=\"{prefix}\"]{suffix}, [class*=\" {prefix}\"]{suffix}")
}

fn pseudo_base(config: &Config) -> String {
    format!(
        "{} {{\n  font-family: \"{}\";\n  font-style: normal;\n  font-weight: normal;\n  font-variant: normal;\n  text-transform: none;\n  line-height: 1;\n  -webkit-font-smoothing: antialiased;\n  -moz-osx-font-smoothing: grayscale;\n  display: inline-block;\n  text-decoration: inherit;\n}}\n\n",
        class_selectors(config, ":before"),
        config.font_name
    )
}

fn bootstrap_base(config: &Config) -> String {
    let prefix = &config.css_prefix;
    format!(
        "{} {{\n  font-family: \"{name}\";\n  font-weight: normal;\n  font-style: normal;\n  text-decoration: inherit;\n  -webkit-font-smoothing: antialiased;\n}}\n\n\
         {} {{\n  text-decoration: inherit;\n  display: inline-block;\n  speak: none;\n}}\n\n\
         a [class^=\"{prefix}\"], a [class*=\" {prefix}\"] {{\n  display: inline-block;\n  text-decoration: inherit;\n}}\n\n\
         .btn [class^=\"{prefix}\"], .btn [class*=\" {prefix}\"],\n\
         .nav [class^=\"{prefix}\"], .nav [class*=\" {prefix}\"] {{\n  display: inline;\n}}\n\n",
        class_selectors(config, ""),
        class_selectors(config, ":before"),
        name = config.font_name,
    )
}

fn glyph_rules(config: &Config, fonts: &FontOutput) -> String {
    fonts
        .glyphs
        .iter()
        .map(|glyph| {
            format!(
                ".{}{}:before {{ content: \"{}\"; }}\n",
                config.css_prefix,
                glyph.name,
                naming::css_codepoint(glyph.codepoint)
            )
        })
        .collect()
}

fn ie7_rules(config: &Config, fonts: &FontOutput) -> String {
    let mut css = format!(
        "{} {{\n  font-family: \"{}\";\n  font-style: normal;\n  font-weight: normal;\n}}\n\n",
        class_selectors(config, ""),
        config.font_name
    );
    for glyph in &fonts.glyphs {
        css.push_str(&format!(
            ".{}{} {{ *zoom: expression( this.runtimeStyle['zoom'] = '1', this.innerHTML = '&#x{:x};'); }}\n",
            config.css_prefix, glyph.name, glyph.codepoint
        ));
    }
    css
}

// ============================================================================
// Preview page
// ============================================================================

fn render_preview(config: &Config, fonts: &FontOutput, relative: &str) -> Markup {
    let css = [
        font_face(config, fonts, &FontUrls::Relative(relative)),
        pseudo_base(config),
        glyph_rules(config, fonts),
        PREVIEW_CSS.to_string(),
    ]
    .concat();

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (config.font_name) " glyphs" }
                style { (PreEscaped(css)) }
            }
            body {
                header {
                    h1 { (config.font_name) }
                    p { (fonts.glyphs.len()) " glyphs · " (fonts.base_name) }
                }
                main.glyphs {
                    @for glyph in &fonts.glyphs {
                        @let class = format!("{}{}", config.css_prefix, glyph.name);
                        div.glyph {
                            div.sizes {
                                span class={ (class) " size-16" } {}
                                span class={ (class) " size-24" } {}
                                span class={ (class) " size-48" } {}
                            }
                            span.name { "." (class) }
                            span.codepoint { (naming::css_codepoint(glyph.codepoint)) }
                        }
                    }
                }
            }
        }
    }
}
