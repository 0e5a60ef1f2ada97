//! Dynamically typed values used for theme data, plugin options and inline plugins.
//!
//! Tables keep their entries in the order they were written, *including* repeated
//! keys, so that validation can report duplicates that a plain map would silently
//! collapse.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Key under which the `toml` deserializer hands out datetimes.
const TOML_DATETIME_FIELD: &str = "$__toml_private_datetime";


/// Reference to a plugin (or any other) module, e.g. `require("daisyui")`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleReference {
    pub specifier: String,

    /// Options the module is invoked with: `require("x")({ ... })`.
    pub options: Option<Table>,
}

impl ModuleReference {
    pub fn new<S: Into<String>>(specifier: S) -> Self {
        Self {
            specifier: specifier.into(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: Table) -> Self {
        self.options = Some(options);
        self
    }

    /// The `{ module, options? }` table spelling of this reference.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new().with("module", self.specifier.as_str());
        if let Some(options) = &self.options {
            table.insert("options", options.clone());
        }
        table
    }
}


#[derive(Debug, Clone)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<ConfigValue>),
    Table(Table),
    Module(ModuleReference),
}

impl ConfigValue {
    /// Human-readable name of the value's type, used in schema messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Table(_) => "table",
            Self::Module(_) => "module reference",
        }
    }

    /// Builds a number the way a JavaScript engine would see it: integral values
    /// become [`ConfigValue::Integer`], everything else stays a float.
    pub fn number(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Self::Integer(value as i64)
        } else {
            Self::Float(value)
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Rewrites tables shaped like `{ module = "..." }` or
    /// `{ module = "...", options = { ... } }` into [`ConfigValue::Module`],
    /// recursively. Data formats have no call syntax, so this is how they spell
    /// `require(...)`.
    pub fn into_module_references(self) -> Self {
        match self {
            Self::Array(items) => Self::Array(
                items
                    .into_iter()
                    .map(ConfigValue::into_module_references)
                    .collect(),
            ),
            Self::Table(table) => {
                let table = table.into_module_references();

                match table.as_module_reference() {
                    Some(reference) => Self::Module(reference),
                    None => Self::Table(table),
                }
            }
            other => other,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Table> for ConfigValue {
    fn from(value: Table) -> Self {
        Self::Table(value)
    }
}

impl From<ModuleReference> for ConfigValue {
    fn from(value: ModuleReference) -> Self {
        Self::Module(value)
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(left), Self::Bool(right)) => left == right,
            (Self::Integer(left), Self::Integer(right)) => left == right,
            // Structural equality: a `nan` read back from TOML equals the one written.
            (Self::Float(left), Self::Float(right)) => {
                left == right || (left.is_nan() && right.is_nan())
            }
            // JavaScript has a single number type, so `1` and `1.0` are the same value.
            (Self::Integer(integer), Self::Float(float))
            | (Self::Float(float), Self::Integer(integer)) => *integer as f64 == *float,
            (Self::String(left), Self::String(right)) => left == right,
            (Self::Array(left), Self::Array(right)) => left == right,
            (Self::Table(left), Self::Table(right)) => left == right,
            (Self::Module(left), Self::Module(right)) => left == right,
            _ => false,
        }
    }
}


/// Ordered key/value entries. Unlike a map, a key may appear more than once;
/// lookups return the *last* occurrence, matching object-literal semantics.
///
/// Equality ignores entry order.
#[derive(Debug, Clone, Default)]
pub struct Table {
    entries: Vec<(String, ConfigValue)>,
}

impl Table {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        self.entries.push((key.into(), value.into()));
    }

    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries
            .iter()
            .rev()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(entry_key, _)| entry_key == key)
    }

    /// Removes every entry with the given key, returning the last value.
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        let mut removed = None;

        self.entries.retain_mut(|(entry_key, value)| {
            if entry_key == key {
                removed = Some(std::mem::replace(value, ConfigValue::Null));
                false
            } else {
                true
            }
        });

        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Keys that occur more than once at this level, each reported once,
    /// in the order their first repetition appears.
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut duplicates: Vec<&str> = Vec::new();

        for (index, (key, _)) in self.entries.iter().enumerate() {
            let seen_before = self.entries[..index]
                .iter()
                .any(|(earlier, _)| earlier == key);

            if seen_before && !duplicates.contains(&key.as_str()) {
                duplicates.push(key);
            }
        }

        duplicates
    }

    /// Every `(location, key)` pair repeated within one nesting level, searching
    /// nested tables, arrays and module options. `location` names this table.
    pub fn nested_duplicate_keys(&self, location: &str) -> Vec<(String, String)> {
        let mut duplicates = Vec::new();
        collect_duplicate_keys(location, self, &mut duplicates);
        duplicates
    }

    /// Appends all entries of `other`, keeping repetitions.
    pub fn extend_from(&mut self, other: Table) {
        self.entries.extend(other.entries);
    }

    fn into_module_references(self) -> Self {
        Self {
            entries: self
                .entries
                .into_iter()
                .map(|(key, value)| (key, value.into_module_references()))
                .collect(),
        }
    }

    /// `Some` if this table is exactly `{ module, options? }` with the right types.
    pub(crate) fn as_module_reference(&self) -> Option<ModuleReference> {
        if !self.duplicate_keys().is_empty() {
            return None;
        }

        let specifier = self.get("module")?.as_str()?;

        match (self.len(), self.get("options")) {
            (1, None) => Some(ModuleReference::new(specifier)),
            (2, Some(ConfigValue::Table(options))) => {
                Some(ModuleReference::new(specifier).with_options(options.clone()))
            }
            _ => None,
        }
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }

        let mut matched = vec![false; other.entries.len()];

        self.entries.iter().all(|entry| {
            let position = other
                .entries
                .iter()
                .enumerate()
                .position(|(index, candidate)| !matched[index] && candidate == entry);

            match position {
                Some(index) => {
                    matched[index] = true;
                    true
                }
                None => false,
            }
        })
    }
}

impl FromIterator<(String, ConfigValue)> for Table {
    fn from_iter<T: IntoIterator<Item = (String, ConfigValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Table {
    type Item = (String, ConfigValue);
    type IntoIter = std::vec::IntoIter<(String, ConfigValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}


fn collect_duplicate_keys(location: &str, table: &Table, duplicates: &mut Vec<(String, String)>) {
    for key in table.duplicate_keys() {
        duplicates.push((location.to_string(), key.to_string()));
    }

    for (key, value) in table.iter() {
        collect_duplicate_keys_in_value(&format!("{location}.{key}"), value, duplicates);
    }
}

fn collect_duplicate_keys_in_value(
    location: &str,
    value: &ConfigValue,
    duplicates: &mut Vec<(String, String)>,
) {
    match value {
        ConfigValue::Table(table) => collect_duplicate_keys(location, table, duplicates),
        ConfigValue::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_duplicate_keys_in_value(&format!("{location}[{index}]"), item, duplicates);
            }
        }
        ConfigValue::Module(reference) => {
            if let Some(options) = &reference.options {
                collect_duplicate_keys(&format!("{location}.options"), options, duplicates);
            }
        }
        _ => {}
    }
}


impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Float(value) => serializer.serialize_f64(*value),
            Self::String(value) => serializer.serialize_str(value),
            Self::Array(items) => {
                let mut sequence = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    sequence.serialize_element(item)?;
                }
                sequence.end()
            }
            Self::Table(table) => table.serialize(serializer),
            Self::Module(reference) => {
                let length = if reference.options.is_some() { 2 } else { 1 };
                let mut map = serializer.serialize_map(Some(length))?;
                map.serialize_entry("module", &reference.specifier)?;
                if let Some(options) = &reference.options {
                    map.serialize_entry("options", options)?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}


struct ConfigValueVisitor;

impl<'de> Visitor<'de> for ConfigValueVisitor {
    type Value = ConfigValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any configuration value")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(ConfigValue::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(ConfigValue::Integer(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(match i64::try_from(value) {
            Ok(value) => ConfigValue::Integer(value),
            Err(_) => ConfigValue::Float(value as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(ConfigValue::Float(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(ConfigValue::String(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(ConfigValue::String(value))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ConfigValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ConfigValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        ConfigValue::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut sequence: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(sequence.size_hint().unwrap_or(0));
        while let Some(item) = sequence.next_element::<ConfigValue>()? {
            items.push(item);
        }

        Ok(ConfigValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, ConfigValue>()? {
            entries.push((key, value));
        }

        // TOML datetimes arrive as a single-entry map; keep them as their string form.
        let is_datetime = matches!(
            entries.as_slice(),
            [(key, ConfigValue::String(_))] if key == TOML_DATETIME_FIELD
        );

        if is_datetime {
            if let Some((_, datetime)) = entries.pop() {
                return Ok(datetime);
            }
        }

        Ok(ConfigValue::Table(Table { entries }))
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ConfigValueVisitor)
    }
}
