//! Structural checks on a resolved [`ConfigDescriptor`].
//!
//! Unlike resolution, which only cares about shapes, validation looks at the
//! values themselves. Every violation is collected before returning so a single
//! pass reports all of them.

use tracing::debug;

use super::error::{ConfigError, SchemaViolation};
use super::structure::{ConfigDescriptor, PluginReference};


/// Checks the invariants of a loaded configuration:
/// - `content` has at least one pattern, and no pattern is blank;
/// - keys are unique within each nesting level of `theme`;
/// - plugin module specifiers are non-empty, and plugin tables have unique keys.
pub fn validate(descriptor: &ConfigDescriptor) -> Result<(), ConfigError> {
    let mut violations = Vec::new();

    if descriptor.content.is_empty() {
        violations.push(SchemaViolation::new("content", "empty content patterns"));
    }

    for (index, pattern) in descriptor.content.iter().enumerate() {
        let pattern = pattern.strip_prefix('!').unwrap_or(pattern);

        if pattern.trim().is_empty() {
            violations.push(SchemaViolation::new(
                format!("content[{index}]"),
                "empty pattern",
            ));
        }
    }

    for (location, key) in descriptor.theme.duplicate_keys() {
        violations.push(SchemaViolation::new(
            location,
            format!("duplicate key \"{key}\""),
        ));
    }

    for (index, plugin) in descriptor.plugins.iter().enumerate() {
        let location = format!("plugins[{index}]");

        let duplicates = match plugin {
            PluginReference::Module(reference) => {
                if reference.specifier.trim().is_empty() {
                    violations.push(SchemaViolation::new(
                        location.as_str(),
                        "empty module specifier",
                    ));
                }

                match &reference.options {
                    Some(options) => options.nested_duplicate_keys(&format!("{location}.options")),
                    None => Vec::new(),
                }
            }
            PluginReference::Inline(table) => table.nested_duplicate_keys(&location),
        };

        for (location, key) in duplicates {
            violations.push(SchemaViolation::new(
                location,
                format!("duplicate key \"{key}\""),
            ));
        }
    }

    if violations.is_empty() {
        return Ok(());
    }

    for violation in &violations {
        debug!("Configuration violation: {violation}");
    }

    Err(ConfigError::schema(
        descriptor.file_path.as_deref(),
        violations,
    ))
}

impl ConfigDescriptor {
    /// See [`validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate(self)
    }
}
