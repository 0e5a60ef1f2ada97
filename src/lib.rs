//! Loader and validator for utility-CSS build configuration
//! (`tailwind.config.js` and its JSON / TOML equivalents).
//!
//! ```no_run
//! let descriptor = twconf::load("tailwind.config.js")?;
//! twconf::validate(&descriptor)?;
//!
//! for pattern in descriptor.content.iter() {
//!     println!("{pattern}");
//! }
//! # Ok::<(), twconf::ConfigError>(())
//! ```

pub mod configuration;

pub use configuration::{
    load,
    validate,
    ConfigDescriptor,
    ConfigError,
    ConfigValue,
    ContentPatterns,
    ErrorKind,
    ModuleReference,
    PluginReference,
    Plugins,
    SchemaViolation,
    SourceFormat,
    Table,
    ThemeExtension,
};
