use clap::{Parser, Subcommand};
use glyphpack::config::{self, ConfigError, Overrides, ResolveRequest};
use glyphpack::font::FontForgeConverter;
use glyphpack::watch::{self, StopHandle, WatchEvent};
use glyphpack::{Error, output, pipeline};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Flags shared by every command. Anything set here wins over `glyphpack.toml`.
#[derive(clap::Args, Clone, Debug)]
struct Options {
    /// Project root; relative paths in the config resolve against it
    #[arg(short = 'r', long, default_value = ".", global = true)]
    project_root: PathBuf,

    /// Output directory for fonts, stylesheets and the preview
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Config file to use instead of discovering glyphpack.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data cache file recording generated outputs
    #[arg(short, long, global = true)]
    data_cache: Option<String>,

    /// Templates to render, comma separated (css, scss, scss-rails, bootstrap, ...)
    #[arg(short, long, global = true, value_delimiter = ',')]
    templates: Option<Vec<String>>,

    /// Font formats to produce, comma separated (ttf, woff, eot, svg)
    #[arg(long, global = true, value_delimiter = ',')]
    formats: Option<Vec<String>>,

    /// Font family name and base of the output file names
    #[arg(short, long, global = true)]
    font_name: Option<String>,

    /// Prefix of the generated CSS class names
    #[arg(short = 'p', long, global = true)]
    css_prefix: Option<String>,

    /// Font path used in the SCSS templates
    #[arg(short = 's', long, global = true)]
    preprocessor_path: Option<String>,

    /// Leave the fingerprint out of font file names
    #[arg(short, long, global = true)]
    no_hash: bool,

    /// Verbose logging
    #[arg(short = 'g', long, global = true)]
    debug: bool,

    /// Print errors only
    #[arg(short, long, global = true)]
    quiet: bool,
}

impl Options {
    fn request(&self, input: Option<PathBuf>, skip_first: Option<bool>) -> ResolveRequest {
        ResolveRequest {
            project_root: self.project_root.clone(),
            config_file: self.config.clone(),
            input,
            overrides: Overrides {
                output: self.output.clone(),
                data_cache: self.data_cache.clone(),
                font_name: self.font_name.clone(),
                css_prefix: self.css_prefix.clone(),
                preprocessor_path: self.preprocessor_path.clone(),
                templates: self.templates.clone(),
                formats: self.formats.clone(),
                no_hash: self.no_hash.then_some(true),
                debug: self.debug.then_some(true),
                quiet: self.quiet.then_some(true),
                skip_first,
            },
        }
    }
}

#[derive(Parser)]
#[command(name = "glyphpack")]
#[command(about = "Webfont generator for SVG and EPS icons")]
#[command(long_about = "\
Webfont generator for SVG and EPS icons

Every icon in the input directory becomes one glyph. The file name is the
glyph name and the CSS class suffix; codepoints are assigned in file name
order starting at U+F100.

  icons/
  ├── glyphpack.toml          # Optional config (also looked up in config/)
  ├── arrow-left.svg          # .icon-arrow-left
  └── home.svg                # .icon-home

Output (defaults):

  fonts/icons_<fingerprint>.{ttf,woff,eot,svg}
  fonts/icons.css
  fonts/icons-preview.html

The fingerprint changes whenever an icon changes. Files left over from
earlier runs are deleted using the record in .glyphpack-data.

Font conversion needs FontForge (with its Python module) on PATH.
Run 'glyphpack config' to write a documented glyphpack.toml.")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate fonts, stylesheets and the preview once
    Compile {
        /// Icon directory (default: `input` from the config, else the project root)
        input: Option<PathBuf>,
    },
    /// Regenerate whenever an icon or the config file changes
    Watch {
        /// Icon directory (default: `input` from the config, else the project root)
        input: Option<PathBuf>,

        /// Wait for the first change instead of compiling on start
        #[arg(long)]
        skip_first: bool,
    },
    /// Write a documented glyphpack.toml
    Config {
        /// Target directory (default: the project root)
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logging = Logging::init();
    logging.apply(config::log_level(cli.options.debug, cli.options.quiet));

    match run(cli, &logging) {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// The logger is installed before options are resolved, so it lets every
/// level through and the effective level is set with `log::set_max_level`
/// once `debug`/`quiet` are known. `RUST_LOG` wins over both.
struct Logging {
    from_env: bool,
}

impl Logging {
    fn init() -> Self {
        let from_env = std::env::var_os("RUST_LOG").is_some();
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .format_timestamp(None)
            .init();
        Self { from_env }
    }

    fn apply(&self, level: log::LevelFilter) {
        if !self.from_env {
            log::set_max_level(level);
        }
    }
}

fn run(cli: Cli, logging: &Logging) -> Result<ExitCode, Error> {
    let Cli { options, command } = cli;

    match command {
        Command::Compile { input } => {
            let config = config::resolve(&options.request(input, None))?;
            logging.apply(config.log_level());
            let report = pipeline::run_cycle(&FontForgeConverter::new(), &config)?;
            if config.quiet {
                output::print_problems(&report);
            } else {
                output::print_cycle_report(&report, &config.project_root);
            }
            Ok(if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Watch { input, skip_first } => {
            let request = options.request(input, skip_first.then_some(true));
            let config = config::resolve(&request)?;
            logging.apply(config.log_level());
            let quiet = config.quiet;
            let root = config.project_root;

            watch::watch(
                &request,
                &FontForgeConverter::new(),
                &StopHandle::new(),
                |event| match event {
                    WatchEvent::Cycle(Ok(report)) if quiet => output::print_problems(report),
                    WatchEvent::Cycle(Ok(report)) => output::print_cycle_report(report, &root),
                    WatchEvent::Reconciled(Ok(result)) => output::print_reconciled(result, &root),
                    WatchEvent::Cycle(Err(e)) | WatchEvent::Reconciled(Err(e)) => {
                        output::print_error(e)
                    }
                },
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { dir } => {
            let dir = match dir {
                Some(d) if d.is_absolute() => d,
                Some(d) => options.project_root.join(d),
                None => options.project_root.clone(),
            };
            write_stock_config(&dir)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Never overwrites an existing config.
fn write_stock_config(dir: &Path) -> Result<(), ConfigError> {
    let path = dir.join(config::CONFIG_FILENAME);
    if path.exists() {
        output::print_status("exists", path.display());
        return Ok(());
    }
    std::fs::create_dir_all(dir)?;
    std::fs::write(&path, config::stock_config_toml())?;
    output::print_status("create", path.display());
    Ok(())
}
