//! This module contains all configuration-relevant code, including
//! the full configuration structure as well as methods needed to load,
//! validate and re-serialize it.
//!
//! Your starting point should probably be [`ConfigDescriptor::load_from_path`]
//! (or the [`load`] shorthand) followed by [`validate`].
//!
//! # Internals
//! The entire configuration structure is based on the concept of
//! unvalidated ("unresolved") and validated configuration structures.
//!
//! Loading first parses the source (JavaScript, JSON or TOML) into a plain
//! [`Table`], which is wrapped in an `UnresolvedConfiguration`.
//! Its `resolve` method then recursively turns each section into its resolved
//! counterpart, collecting every shape problem on the way, and produces the
//! [`ConfigDescriptor`].
//!
//! [`validate`] runs afterwards and checks the values themselves
//! (non-empty patterns, unique theme keys, ...).

#![allow(rustdoc::private_intra_doc_links)]

use std::path::Path;

mod error;
mod format;
mod source;
mod structure;
mod traits;
mod utilities;
mod validation;
mod value;

pub use error::*;
pub use format::SourceFormat;
pub use structure::*;
pub use utilities::{
    default_configuration_file_path,
    discover_configuration_file,
    CONFIGURATION_FILE_NAMES,
};
pub use validation::validate;
pub use value::{ConfigValue, ModuleReference, Table};


/// Reads and evaluates the configuration source at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ConfigDescriptor, ConfigError> {
    ConfigDescriptor::load_from_path(path)
}
