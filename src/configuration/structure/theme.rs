use crate::configuration::{
    error::SchemaViolation,
    traits::ResolvableConfiguration,
    value::{ConfigValue, Table},
};

static EMPTY_TABLE: Table = Table::new();


#[derive(Debug, Clone)]
pub(super) struct UnresolvedThemeExtension {
    theme: Option<ConfigValue>,
}

impl UnresolvedThemeExtension {
    pub(super) fn new(theme: Option<ConfigValue>) -> Self {
        Self { theme }
    }
}


/// The `theme` table. Top-level keys other than `extend` replace the
/// defaults of the external tool; entries under `extend` are merged into them.
///
/// The table is kept exactly as written (repeated keys included).
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeExtension {
    pub table: Table,
}

impl Default for ThemeExtension {
    /// `{ extend: {} }`
    fn default() -> Self {
        Self {
            table: Table::new().with("extend", Table::new()),
        }
    }
}

impl ResolvableConfiguration for UnresolvedThemeExtension {
    type Resolved = ThemeExtension;

    fn resolve(self) -> Result<Self::Resolved, Vec<SchemaViolation>> {
        let table = match self.theme {
            None => return Ok(ThemeExtension::default()),
            Some(ConfigValue::Table(table)) => table,
            Some(other) => {
                return Err(vec![SchemaViolation::new(
                    "theme",
                    format!("expected a table, found {}", other.type_name()),
                )]);
            }
        };

        let violations: Vec<SchemaViolation> = table
            .iter()
            .filter(|(key, _)| *key == "extend")
            .filter_map(|(_, value)| match value {
                ConfigValue::Table(_) => None,
                other => Some(SchemaViolation::new(
                    "theme.extend",
                    format!("expected a table, found {}", other.type_name()),
                )),
            })
            .collect();

        if !violations.is_empty() {
            return Err(violations);
        }

        Ok(ThemeExtension { table })
    }
}


impl ThemeExtension {
    /// The `extend` table, or an empty table if the theme has none.
    pub fn extend(&self) -> &Table {
        self.table
            .get("extend")
            .and_then(ConfigValue::as_table)
            .unwrap_or(&EMPTY_TABLE)
    }

    /// Theme keys that replace the defaults outright.
    pub fn overrides(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.table.iter().filter(|(key, _)| *key != "extend")
    }

    /// Every `(location, key)` pair that is repeated within one nesting level,
    /// anywhere inside the theme.
    pub fn duplicate_keys(&self) -> Vec<(String, String)> {
        self.table.nested_duplicate_keys("theme")
    }
}

impl From<Table> for ThemeExtension {
    fn from(table: Table) -> Self {
        Self { table }
    }
}
