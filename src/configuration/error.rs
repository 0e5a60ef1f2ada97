//! Error types for loading, validating and re-serializing configuration sources.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use super::format::SourceFormat;


/// Coarse classification of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configuration file does not exist.
    NotFound,
    /// The file exists but could not be read.
    Io,
    /// The source is not valid syntax for its format.
    Parse,
    /// The source is well-formed but structurally invalid.
    Schema,
    /// The descriptor cannot be expressed in the requested output format.
    Serialize,
}


/// A single structural problem found while resolving or validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{location}: {message}")]
pub struct SchemaViolation {
    /// Dotted path of the offending value, e.g. `theme.extend.colors` or `plugins[1]`.
    pub location: String,

    pub message: String,
}

impl SchemaViolation {
    pub fn new<L, M>(location: L, message: M) -> Self
    where
        L: Into<String>,
        M: Into<String>,
    {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}


fn format_schema_error(path: &Option<PathBuf>, violations: &[SchemaViolation]) -> String {
    let mut message = match path {
        Some(path) => format!("invalid configuration in {}", path.display()),
        None => "invalid configuration".to_string(),
    };

    let _ = write!(
        message,
        " ({} problem{} found)",
        violations.len(),
        if violations.len() == 1 { "" } else { "s" }
    );

    for violation in violations {
        let _ = write!(message, "\n  - {violation}");
    }

    message
}


#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .path.display())]
    #[diagnostic(
        code(twconf::not_found),
        help("Pass an explicit path or create tailwind.config.js in the working directory.")
    )]
    NotFound { path: PathBuf },

    #[error("failed to read configuration file {}", .path.display())]
    #[diagnostic(code(twconf::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported configuration file extension: {}", .path.display())]
    #[diagnostic(
        code(twconf::parse),
        help("Supported extensions are .js, .cjs, .mjs, .json and .toml.")
    )]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to parse {format} configuration {}: {message}", .path.display())]
    #[diagnostic(code(twconf::parse))]
    Parse {
        path: PathBuf,
        format: SourceFormat,
        message: String,
        #[source_code]
        source_code: NamedSource<String>,
        #[label("{message}")]
        span: Option<SourceSpan>,
    },

    #[error("{}", format_schema_error(.path, .violations))]
    #[diagnostic(code(twconf::schema))]
    Schema {
        path: Option<PathBuf>,
        #[related]
        violations: Vec<SchemaViolation>,
    },

    #[error("cannot write configuration as {format}: {message}")]
    #[diagnostic(code(twconf::serialize))]
    Serialize {
        format: SourceFormat,
        message: String,
    },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Read { .. } => ErrorKind::Io,
            Self::UnsupportedFormat { .. } | Self::Parse { .. } => ErrorKind::Parse,
            Self::Schema { .. } => ErrorKind::Schema,
            Self::Serialize { .. } => ErrorKind::Serialize,
        }
    }

    /// Returns the schema violations carried by this error (empty for other kinds).
    pub fn violations(&self) -> &[SchemaViolation] {
        match self {
            Self::Schema { violations, .. } => violations,
            _ => &[],
        }
    }

    pub(crate) fn parse(
        path: &Path,
        format: SourceFormat,
        source: &str,
        message: impl Into<String>,
        span: Option<SourceSpan>,
    ) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            format,
            message: message.into(),
            source_code: NamedSource::new(path.display().to_string(), source.to_string()),
            span,
        }
    }

    pub(crate) fn schema(path: Option<&Path>, violations: Vec<SchemaViolation>) -> Self {
        Self::Schema {
            path: path.map(Path::to_path_buf),
            violations,
        }
    }

    pub(crate) fn serialize(format: SourceFormat, message: impl Into<String>) -> Self {
        Self::Serialize {
            format,
            message: message.into(),
        }
    }
}
