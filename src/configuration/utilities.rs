use std::{
    env::current_dir,
    path::{Path, PathBuf},
};

use tracing::trace;

use super::error::ConfigError;

/// Configuration file names looked for by discovery, in order of precedence.
pub const CONFIGURATION_FILE_NAMES: [&str; 5] = [
    "tailwind.config.js",
    "tailwind.config.cjs",
    "tailwind.config.mjs",
    "tailwind.config.json",
    "tailwind.config.toml",
];


/// Returns the first existing configuration file inside `directory`,
/// trying [`CONFIGURATION_FILE_NAMES`] in order.
pub fn discover_configuration_file<P: AsRef<Path>>(directory: P) -> Result<PathBuf, ConfigError> {
    let directory = directory.as_ref();

    for file_name in CONFIGURATION_FILE_NAMES {
        let candidate = directory.join(file_name);
        trace!("Looking for configuration at {}.", candidate.display());

        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(ConfigError::NotFound {
        path: directory.to_path_buf(),
    })
}

/// Returns the default configuration filepath, which is the first
/// `tailwind.config.*` file in the current directory.
pub fn default_configuration_file_path() -> Result<PathBuf, ConfigError> {
    let directory = current_dir().map_err(|error| ConfigError::Read {
        path: PathBuf::from("."),
        source: error,
    })?;

    discover_configuration_file(directory)
}
