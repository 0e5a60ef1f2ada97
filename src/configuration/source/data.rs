//! Readers for the data formats (TOML and JSON).

use std::path::Path;

use miette::SourceSpan;

use crate::configuration::{
    error::{ConfigError, SchemaViolation},
    format::SourceFormat,
    value::{ConfigValue, Table},
};


pub(crate) fn read_toml(path: &Path, source: &str) -> Result<Table, ConfigError> {
    let value = toml::from_str::<ConfigValue>(source).map_err(|error| {
        let span = error
            .span()
            .map(|range| SourceSpan::from((range.start, range.len())));

        ConfigError::parse(path, SourceFormat::Toml, source, error.message(), span)
    })?;

    expect_top_level_table(path, value)
}

pub(crate) fn read_json(path: &Path, source: &str) -> Result<Table, ConfigError> {
    let value = serde_json::from_str::<ConfigValue>(source).map_err(|error| {
        let span = offset_of_line_column(source, error.line(), error.column())
            .map(|offset| SourceSpan::from((offset, 0)));

        ConfigError::parse(path, SourceFormat::Json, source, error.to_string(), span)
    })?;

    expect_top_level_table(path, value)
}


fn expect_top_level_table(path: &Path, value: ConfigValue) -> Result<Table, ConfigError> {
    match value.into_module_references() {
        ConfigValue::Table(table) => Ok(table),
        other => Err(ConfigError::schema(
            Some(path),
            vec![SchemaViolation::new(
                "(root)",
                format!("expected a table, found {}", other.type_name()),
            )],
        )),
    }
}

/// Converts serde_json's 1-based line and column into a byte offset.
fn offset_of_line_column(source: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }

    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let column = column.saturating_sub(1).min(text.len());
            return Some(offset + column);
        }
        offset += text.len();
    }

    Some(source.len())
}
