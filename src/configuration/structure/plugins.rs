use crate::configuration::{
    error::SchemaViolation,
    traits::ResolvableConfiguration,
    value::{ConfigValue, ModuleReference, Table},
};


#[derive(Debug, Clone)]
pub(super) struct UnresolvedPlugins {
    plugins: Option<ConfigValue>,
}

impl UnresolvedPlugins {
    pub(super) fn new(plugins: Option<ConfigValue>) -> Self {
        Self { plugins }
    }
}


/// Opaque handle to a plugin. Plugin references are never resolved here;
/// finding and running the module is left to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginReference {
    /// A plugin module, optionally invoked with options.
    Module(ModuleReference),

    /// A plugin given inline as an object.
    Inline(Table),
}

impl PluginReference {
    pub fn module<S: Into<String>>(specifier: S) -> Self {
        Self::Module(ModuleReference::new(specifier))
    }

    pub fn specifier(&self) -> Option<&str> {
        match self {
            Self::Module(reference) => Some(&reference.specifier),
            Self::Inline(_) => None,
        }
    }

    fn from_value(value: ConfigValue) -> Result<Self, String> {
        match value {
            ConfigValue::String(specifier) => Ok(Self::module(specifier)),
            ConfigValue::Module(reference) => Ok(Self::Module(reference)),
            ConfigValue::Table(mut table) => {
                // `{ inline = { ... } }` is the explicit spelling, needed when the
                // plugin object itself would look like a module reference.
                if table.len() == 1 && table.contains_key("inline") {
                    match table.remove("inline") {
                        Some(ConfigValue::Table(inner)) => return Ok(Self::Inline(inner)),
                        Some(ConfigValue::Module(reference)) => {
                            return Ok(Self::Inline(reference.to_table()));
                        }
                        Some(other) => table.insert("inline", other),
                        None => {}
                    }
                }

                Ok(Self::Inline(table))
            }
            other => Err(format!(
                "expected a module specifier, module reference or table, found {}",
                other.type_name()
            )),
        }
    }

    /// The value that reads back as this reference in any source format.
    pub(crate) fn to_value(&self) -> ConfigValue {
        match self {
            Self::Module(reference) => match reference.options {
                None => ConfigValue::String(reference.specifier.clone()),
                Some(_) => ConfigValue::Module(reference.clone()),
            },
            Self::Inline(table) => {
                let ambiguous = table.as_module_reference().is_some()
                    || (table.len() == 1 && table.contains_key("inline"));

                if ambiguous {
                    Table::new().with("inline", table.clone()).into()
                } else {
                    table.clone().into()
                }
            }
        }
    }
}


#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plugins {
    pub references: Vec<PluginReference>,
}

impl ResolvableConfiguration for UnresolvedPlugins {
    type Resolved = Plugins;

    fn resolve(self) -> Result<Self::Resolved, Vec<SchemaViolation>> {
        let items = match self.plugins {
            None => return Ok(Plugins::default()),
            Some(ConfigValue::Array(items)) => items,
            Some(other) => {
                return Err(vec![SchemaViolation::new(
                    "plugins",
                    format!("expected an array, found {}", other.type_name()),
                )]);
            }
        };

        let mut references = Vec::with_capacity(items.len());
        let mut violations = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            match PluginReference::from_value(item) {
                Ok(reference) => references.push(reference),
                Err(message) => {
                    violations.push(SchemaViolation::new(format!("plugins[{index}]"), message))
                }
            }
        }

        if !violations.is_empty() {
            return Err(violations);
        }

        Ok(Plugins { references })
    }
}

impl Plugins {
    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PluginReference> {
        self.references.iter()
    }
}

impl FromIterator<PluginReference> for Plugins {
    fn from_iter<T: IntoIterator<Item = PluginReference>>(iter: T) -> Self {
        Self {
            references: iter.into_iter().collect(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_reference_form() {
        let plugins = ConfigValue::Array(vec![
            "daisyui".into(),
            ModuleReference::new("@tailwindcss/typography")
                .with_options(Table::new().with("className", "prose"))
                .into(),
            Table::new().with("name", "local").into(),
            Table::new()
                .with("inline", Table::new().with("module", "literal"))
                .into(),
        ]);

        let resolved = UnresolvedPlugins::new(Some(plugins)).resolve().unwrap();

        assert_eq!(resolved.len(), 4);
        assert_eq!(resolved.references[0], PluginReference::module("daisyui"));
        assert_eq!(
            resolved.references[1].specifier(),
            Some("@tailwindcss/typography")
        );
        assert_eq!(
            resolved.references[2],
            PluginReference::Inline(Table::new().with("name", "local"))
        );
        assert_eq!(
            resolved.references[3],
            PluginReference::Inline(Table::new().with("module", "literal"))
        );
    }

    #[test]
    fn explicit_inline_wrapper_undoes_module_shorthand() {
        // Data readers turn `{ module = "x" }` into a module reference even inside
        // `inline`, so the wrapper has to turn it back into a table.
        let plugins = ConfigValue::Array(vec![Table::new()
            .with("inline", ModuleReference::new("literal"))
            .into()]);

        let resolved = UnresolvedPlugins::new(Some(plugins)).resolve().unwrap();
        assert_eq!(
            resolved.references[0],
            PluginReference::Inline(Table::new().with("module", "literal"))
        );
    }

    #[test]
    fn missing_plugins_resolve_to_empty() {
        let resolved = UnresolvedPlugins::new(None).resolve().unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn reports_every_bad_entry() {
        let plugins = ConfigValue::Array(vec![
            ConfigValue::Integer(1),
            "daisyui".into(),
            ConfigValue::Null,
        ]);

        let violations = UnresolvedPlugins::new(Some(plugins)).resolve().unwrap_err();
        let locations: Vec<&str> = violations.iter().map(|v| v.location.as_str()).collect();
        assert_eq!(locations, vec!["plugins[0]", "plugins[2]"]);
    }

    #[test]
    fn ambiguous_inline_plugins_are_wrapped() {
        let looks_like_module = PluginReference::Inline(Table::new().with("module", "x"));
        let plain = PluginReference::Inline(Table::new().with("handler", "x"));

        assert_eq!(
            looks_like_module.to_value(),
            ConfigValue::Table(Table::new().with("inline", Table::new().with("module", "x")))
        );
        assert_eq!(
            plain.to_value(),
            ConfigValue::Table(Table::new().with("handler", "x"))
        );
        assert_eq!(
            PluginReference::module("daisyui").to_value(),
            ConfigValue::from("daisyui")
        );
    }
}
