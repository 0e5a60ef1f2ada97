use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

pub use self::content::ContentPatterns;
use self::content::UnresolvedContentPatterns;
pub use self::plugins::{PluginReference, Plugins};
use self::plugins::UnresolvedPlugins;
pub use self::theme::ThemeExtension;
use self::theme::UnresolvedThemeExtension;
use super::error::{ConfigError, SchemaViolation};
use super::format::SourceFormat;
use super::source::{read_source, write_source};
use super::traits::{ResolvableConfiguration, ResolvableConfigurationWithContext};
use super::utilities::default_configuration_file_path;
use super::value::{ConfigValue, Table};

mod content;
mod plugins;
mod theme;

const SECTION_KEYS: [&str; 3] = ["content", "theme", "plugins"];



pub(crate) struct UnresolvedConfiguration {
    /// Source-scan patterns.
    content: UnresolvedContentPatterns,

    /// Theme overrides and extensions.
    theme: UnresolvedThemeExtension,

    /// Plugin references.
    plugins: UnresolvedPlugins,

    /// Every other top-level key, kept verbatim.
    extra: Table,

    /// Sections that were given more than once.
    repeated_sections: Vec<String>,
}

impl UnresolvedConfiguration {
    pub(crate) fn from_table(mut table: Table) -> Self {
        let repeated_sections = table
            .duplicate_keys()
            .into_iter()
            .filter(|key| SECTION_KEYS.contains(key))
            .map(str::to_string)
            .collect();

        let content = table.remove("content");
        let theme = table.remove("theme");
        let plugins = table.remove("plugins");

        Self {
            content: UnresolvedContentPatterns::new(content),
            theme: UnresolvedThemeExtension::new(theme),
            plugins: UnresolvedPlugins::new(plugins),
            extra: table,
            repeated_sections,
        }
    }
}


/// The entire configuration.
///
/// Equality compares the configuration data only, not where it was loaded from.
#[derive(Debug, Clone, Default)]
pub struct ConfigDescriptor {
    /// This is the file path this descriptor was loaded from
    /// (`None` if it was built in memory).
    pub file_path: Option<PathBuf>,

    /// Files to scan for class names.
    pub content: ContentPatterns,

    /// Theme overrides and extensions.
    pub theme: ThemeExtension,

    /// Plugins to enable, in order.
    pub plugins: Plugins,

    /// Top-level keys without dedicated handling (`darkMode`, `prefix`, ...).
    pub extra: Table,
}

impl PartialEq for ConfigDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
            && self.theme == other.theme
            && self.plugins == other.plugins
            && self.extra == other.extra
    }
}


impl ResolvableConfigurationWithContext for UnresolvedConfiguration {
    type Resolved = ConfigDescriptor;
    type Context = Option<PathBuf>;

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved, ConfigError> {
        let mut violations: Vec<SchemaViolation> = self
            .repeated_sections
            .iter()
            .map(|key| SchemaViolation::new("(root)", format!("duplicate key \"{key}\"")))
            .collect();

        let content = self.content.resolve().map_err(|errors| violations.extend(errors));
        let theme = self.theme.resolve().map_err(|errors| violations.extend(errors));
        let plugins = self.plugins.resolve().map_err(|errors| violations.extend(errors));

        match (content, theme, plugins) {
            (Ok(content), Ok(theme), Ok(plugins)) if violations.is_empty() => Ok(ConfigDescriptor {
                file_path: context,
                content,
                theme,
                plugins,
                extra: self.extra,
            }),
            _ => Err(ConfigError::schema(context.as_deref(), violations)),
        }
    }
}


impl ConfigDescriptor {
    pub fn new(content: ContentPatterns, theme: ThemeExtension, plugins: Plugins) -> Self {
        Self {
            file_path: None,
            content,
            theme,
            plugins,
            extra: Table::new(),
        }
    }

    /// Load the configuration from a specific file path.
    /// The format is chosen by the file extension.
    pub fn load_from_path<S: AsRef<Path>>(configuration_file_path: S) -> Result<Self, ConfigError> {
        let configuration_file_path = configuration_file_path.as_ref();

        // Read the configuration file into memory.
        let configuration_string =
            fs::read_to_string(configuration_file_path).map_err(|error| {
                if error.kind() == io::ErrorKind::NotFound {
                    ConfigError::NotFound {
                        path: configuration_file_path.to_path_buf(),
                    }
                } else {
                    ConfigError::Read {
                        path: configuration_file_path.to_path_buf(),
                        source: error,
                    }
                }
            })?;

        let format = SourceFormat::from_path(configuration_file_path).ok_or_else(|| {
            ConfigError::UnsupportedFormat {
                path: configuration_file_path.to_path_buf(),
            }
        })?;

        let canonical_file_path =
            dunce::canonicalize(configuration_file_path).map_err(|error| ConfigError::Read {
                path: configuration_file_path.to_path_buf(),
                source: error,
            })?;

        debug!(
            "Loading {format} configuration from {}.",
            canonical_file_path.display()
        );


        // Parse the string into the `UnresolvedConfiguration` structure and then resolve it.
        let table = read_source(&canonical_file_path, format, &configuration_string)?;
        let resolved_configuration =
            UnresolvedConfiguration::from_table(table).resolve(Some(canonical_file_path))?;

        debug!(
            "Configuration resolved: {} content pattern(s), {} theme key(s), {} plugin(s).",
            resolved_configuration.content.len(),
            resolved_configuration.theme.table.len(),
            resolved_configuration.plugins.len()
        );

        Ok(resolved_configuration)
    }

    /// Load the configuration from the default path
    /// (the first `tailwind.config.*` in the current directory).
    pub fn load_from_default_path() -> Result<Self, ConfigError> {
        ConfigDescriptor::load_from_path(default_configuration_file_path()?)
    }

    /// Parse configuration source text that does not live on disk.
    pub fn from_source_str(source: &str, format: SourceFormat) -> Result<Self, ConfigError> {
        let pseudo_path = PathBuf::from(format!("<inline>.{}", format.extension()));

        let table = read_source(&pseudo_path, format, source)?;
        UnresolvedConfiguration::from_table(table).resolve(None)
    }

    /// Every file matched by `content`. Relative patterns are anchored at the
    /// configuration file's directory, the others at `working_directory`.
    pub fn content_files(&self, working_directory: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        let configuration_directory = self
            .file_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(working_directory);

        let base_directory = self
            .content
            .base_directory(configuration_directory, working_directory);

        self.content.matching_files(&base_directory)
    }

    /// The descriptor as a single table, in the shape every reader produces.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();

        let patterns = ConfigValue::Array(
            self.content
                .patterns
                .iter()
                .map(|pattern| ConfigValue::String(pattern.clone()))
                .collect(),
        );

        if self.content.relative {
            table.insert(
                "content",
                Table::new().with("relative", true).with("files", patterns),
            );
        } else {
            table.insert("content", patterns);
        }

        table.insert("theme", self.theme.table.clone());
        table.insert(
            "plugins",
            ConfigValue::Array(self.plugins.iter().map(PluginReference::to_value).collect()),
        );
        table.extend_from(self.extra.clone());

        table
    }

    /// Writes the descriptor as source text that loads back into an equal descriptor.
    pub fn to_source(&self, format: SourceFormat) -> Result<String, ConfigError> {
        write_source(&self.to_table(), format)
    }
}
