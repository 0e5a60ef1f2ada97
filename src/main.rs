use std::env::current_dir;

use clap::Parser;
use miette::{Context, IntoDiagnostic, Result};
use tracing::info;
use twconf::{configuration::default_configuration_file_path, ConfigDescriptor};

use crate::{
    cli::{CLIArgs, CLICommand},
    logging::{initialize_tracing, LogFileOutput},
};

mod cli;
mod logging;


fn main() -> Result<()> {
    let cli_args = CLIArgs::parse();

    let console_level_filter = cli_args.console_level_filter()?;
    let log_file_output = cli_args
        .log_file_directory
        .as_deref()
        .map(|directory| LogFileOutput {
            level_filter: tracing_subscriber::EnvFilter::new("debug"),
            directory,
            file_name_prefix: "twconf.log",
        });

    let logging_raii_guard = initialize_tracing(console_level_filter, log_file_output)
        .wrap_err("Failed to initialize tracing.")?;

    info!("Tracing initialized.");


    // Load configuration.
    let configuration_file_path = match cli_args.configuration_file_path.as_ref() {
        Some(path) => path.clone(),
        None => default_configuration_file_path()
            .wrap_err("Could not find a configuration file in the current directory.")?,
    };

    let configuration = ConfigDescriptor::load_from_path(&configuration_file_path)
        .wrap_err("Failed to load configuration file.")?;

    info!(
        "Configuration loaded: {}.",
        configuration_file_path.display()
    );


    match cli_args.command {
        CLICommand::Check => {
            configuration
                .validate()
                .wrap_err("Configuration is invalid.")?;

            println!(
                "{}: ok ({} content pattern{}, {} theme extension key{}, {} plugin{})",
                configuration_file_path.display(),
                configuration.content.len(),
                plural(configuration.content.len()),
                configuration.theme.extend().len(),
                plural(configuration.theme.extend().len()),
                configuration.plugins.len(),
                plural(configuration.plugins.len()),
            );
        }
        CLICommand::Show { format } => {
            let source = configuration
                .to_source(format.into())
                .wrap_err("Failed to serialize configuration.")?;

            print!("{source}");
        }
        CLICommand::Files => {
            configuration
                .validate()
                .wrap_err("Configuration is invalid.")?;

            let working_directory = current_dir()
                .into_diagnostic()
                .wrap_err("Could not get the current directory.")?;

            let files = configuration
                .content_files(&working_directory)
                .wrap_err("Failed to expand content patterns.")?;

            for file in files {
                println!("{}", file.display());
            }
        }
    }


    drop(logging_raii_guard);
    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
