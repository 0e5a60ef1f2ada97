//! Command-line interface definitions for the `twconf` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{miette, Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;
use twconf::SourceFormat;



/// Command-line arguments.
#[derive(Parser)]
#[command(
    name = "twconf",
    author,
    about = "Load and validate utility-CSS build configuration (tailwind.config.*).",
    version
)]
pub struct CLIArgs {
    /// This is the path to the configuration file to use.
    /// If unspecified, the first `tailwind.config.*` in the current directory is used.
    #[arg(
        short = 'c',
        long = "configuration-file-path",
        global = true,
        help = "Path to the configuration file to use. \
                Defaults to the first tailwind.config.{js,cjs,mjs,json,toml} in the current directory."
    )]
    pub configuration_file_path: Option<PathBuf>,

    #[arg(
        long = "log-level",
        global = true,
        help = "Console log filter (tracing EnvFilter syntax, e.g. \"debug\" or \"twconf=trace\"). \
                Falls back to RUST_LOG, then to \"warn\"."
    )]
    pub log_level: Option<String>,

    #[arg(
        long = "log-file-directory",
        global = true,
        help = "If set, logs are additionally written to daily-rotated files in this directory."
    )]
    pub log_file_directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CLICommand,
}

#[derive(Subcommand)]
pub enum CLICommand {
    /// Load and validate the configuration, then print a one-line summary.
    Check,

    /// Load the configuration and print it in the chosen source format.
    Show {
        #[arg(
            short = 'f',
            long = "format",
            value_enum,
            default_value_t = OutputFormat::Json,
            help = "Output format."
        )]
        format: OutputFormat,
    },

    /// Load and validate the configuration, then print every file matched by `content`.
    Files,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum OutputFormat {
    Json,
    Toml,
    Js,
}

impl From<OutputFormat> for SourceFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => SourceFormat::Json,
            OutputFormat::Toml => SourceFormat::Toml,
            OutputFormat::Js => SourceFormat::JavaScript,
        }
    }
}


impl CLIArgs {
    /// The console log filter: `--log-level`, then `RUST_LOG`, then `warn`.
    pub fn console_level_filter(&self) -> Result<EnvFilter> {
        match self.log_level.as_deref() {
            Some(filter) => EnvFilter::try_new(filter)
                .into_diagnostic()
                .wrap_err_with(|| miette!("Failed to parse --log-level value \"{}\".", filter)),
            None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))),
        }
    }
}
