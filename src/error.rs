//! Crate-level error type.
//!
//! Each stage has its own error enum; [`Error`] wraps them so callers can
//! match on one type, and [`Error::category`] groups them the way the CLI
//! reports them.

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::fonts::FontError;
use crate::scan::ScanError;
use crate::templates::TemplateError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("Cannot watch for changes: {0}")]
    Watch(#[from] notify::Error),
}

/// Coarse grouping of failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid options, config file, or project layout. Reported before any work.
    Configuration,
    /// The icon sources or the converter's handling of them.
    Input,
    /// A template could not be written.
    Template,
    /// The data cache could not be written.
    Cache,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Input => "input",
            ErrorCategory::Template => "template",
            ErrorCategory::Cache => "cache",
        })
    }
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Configuration,
            Error::Scan(_) | Error::Font(_) | Error::Watch(_) => ErrorCategory::Input,
            Error::Template(_) => ErrorCategory::Template,
            Error::Cache(_) => ErrorCategory::Cache,
        }
    }
}
