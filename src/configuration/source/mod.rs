//! Turning configuration source text into a [`Table`] and back.

use std::path::Path;

use tracing::trace;

use super::{error::ConfigError, format::SourceFormat, value::Table};

mod data;
#[cfg(feature = "javascript")]
mod javascript;
mod write;

pub(crate) use self::write::write_source;


/// Parses `source` (the contents of `path`) as `format` into its top-level table.
pub(crate) fn read_source(
    path: &Path,
    format: SourceFormat,
    source: &str,
) -> Result<Table, ConfigError> {
    trace!(
        "Parsing {} bytes of {format} from {}.",
        source.len(),
        path.display()
    );

    match format {
        SourceFormat::Toml => data::read_toml(path, source),
        SourceFormat::Json => data::read_json(path, source),
        #[cfg(feature = "javascript")]
        SourceFormat::JavaScript => javascript::read_javascript(path, source),
        #[cfg(not(feature = "javascript"))]
        SourceFormat::JavaScript => Err(ConfigError::parse(
            path,
            format,
            source,
            "JavaScript configuration support is disabled (build with the `javascript` feature)",
            None,
        )),
    }
}
