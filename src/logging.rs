use std::path::Path;

use miette::{miette, Context, IntoDiagnostic, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};


/// Where (and how verbosely) to write log files in addition to the console.
pub struct LogFileOutput<'a> {
    pub level_filter: EnvFilter,
    pub directory: &'a Path,
    pub file_name_prefix: &'a str,
}


/// Installs the global tracing subscriber: a console layer on stderr and,
/// optionally, a daily-rotated file layer.
///
/// The returned guard flushes the file writer when dropped, so keep it alive
/// until the program exits.
pub fn initialize_tracing(
    console_level_filter: EnvFilter,
    log_file_output: Option<LogFileOutput<'_>>,
) -> Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_level_filter);

    let (file_layer, guard) = match log_file_output {
        Some(output) => {
            std::fs::create_dir_all(output.directory)
                .into_diagnostic()
                .wrap_err_with(|| {
                    miette!(
                        "Failed to create missing log file directory at {}.",
                        output.directory.display()
                    )
                })?;

            let file_appender =
                tracing_appender::rolling::daily(output.directory, output.file_name_prefix);
            let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking_appender)
                .with_filter(output.level_filter);

            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("Failed to install tracing subscriber.")?;

    Ok(guard)
}
