//! Serialization of a configuration table back into source text.

use std::fmt::Write as _;

use crate::configuration::{
    error::ConfigError,
    format::SourceFormat,
    value::{ConfigValue, ModuleReference, Table},
};

const INDENT: &str = "  ";


pub(crate) fn write_source(table: &Table, format: SourceFormat) -> Result<String, ConfigError> {
    match format {
        SourceFormat::Toml => toml::to_string(table)
            .map_err(|error| ConfigError::serialize(format, error.to_string())),
        SourceFormat::Json => {
            // serde_json would silently write these as `null`.
            for (_, value) in table.iter() {
                reject_non_finite(value, format)?;
            }

            serde_json::to_string_pretty(table)
                .map(|mut json| {
                    json.push('\n');
                    json
                })
                .map_err(|error| ConfigError::serialize(format, error.to_string()))
        }
        SourceFormat::JavaScript => write_javascript(table),
    }
}


fn reject_non_finite(value: &ConfigValue, format: SourceFormat) -> Result<(), ConfigError> {
    match value {
        ConfigValue::Float(number) if !number.is_finite() => Err(ConfigError::serialize(
            format,
            format!("{number} is not a finite number"),
        )),
        ConfigValue::Array(items) => items
            .iter()
            .try_for_each(|item| reject_non_finite(item, format)),
        ConfigValue::Table(table) => table
            .iter()
            .try_for_each(|(_, item)| reject_non_finite(item, format)),
        ConfigValue::Module(reference) => match &reference.options {
            Some(options) => options
                .iter()
                .try_for_each(|(_, item)| reject_non_finite(item, format)),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}


/// Writes an ES module with one named export per top-level key
/// (keys that are not identifiers go into a default export instead).
fn write_javascript(table: &Table) -> Result<String, ConfigError> {
    let mut output = String::from("/** @type {import('tailwindcss').Config} */\n");

    if table.keys().all(is_identifier) && table.duplicate_keys().is_empty() {
        for (key, value) in table.iter() {
            let _ = write!(output, "export const {key} = ");
            write_javascript_value(&mut output, value, 0)?;
            output.push_str(";\n");
        }
    } else {
        output.push_str("export default ");
        write_javascript_table(&mut output, table, 0)?;
        output.push_str(";\n");
    }

    Ok(output)
}

fn write_javascript_value(
    output: &mut String,
    value: &ConfigValue,
    depth: usize,
) -> Result<(), ConfigError> {
    match value {
        ConfigValue::Null => output.push_str("null"),
        ConfigValue::Bool(value) => {
            let _ = write!(output, "{value}");
        }
        ConfigValue::Integer(value) => {
            let _ = write!(output, "{value}");
        }
        ConfigValue::Float(value) => {
            if !value.is_finite() {
                return Err(ConfigError::serialize(
                    SourceFormat::JavaScript,
                    format!("{value} is not a finite number"),
                ));
            }
            let _ = write!(output, "{value:?}");
        }
        ConfigValue::String(value) => write_string_literal(output, value),
        ConfigValue::Array(items) => {
            if items.is_empty() {
                output.push_str("[]");
                return Ok(());
            }

            output.push_str("[\n");
            for item in items {
                push_indent(output, depth + 1);
                write_javascript_value(output, item, depth + 1)?;
                output.push_str(",\n");
            }
            push_indent(output, depth);
            output.push(']');
        }
        ConfigValue::Table(table) => write_javascript_table(output, table, depth)?,
        ConfigValue::Module(reference) => write_require(output, reference, depth)?,
    }

    Ok(())
}

fn write_javascript_table(
    output: &mut String,
    table: &Table,
    depth: usize,
) -> Result<(), ConfigError> {
    if table.is_empty() {
        output.push_str("{}");
        return Ok(());
    }

    output.push_str("{\n");
    for (key, value) in table.iter() {
        push_indent(output, depth + 1);
        if is_identifier(key) {
            output.push_str(key);
        } else {
            write_string_literal(output, key);
        }
        output.push_str(": ");
        write_javascript_value(output, value, depth + 1)?;
        output.push_str(",\n");
    }
    push_indent(output, depth);
    output.push('}');

    Ok(())
}

fn write_require(
    output: &mut String,
    reference: &ModuleReference,
    depth: usize,
) -> Result<(), ConfigError> {
    output.push_str("require(");
    write_string_literal(output, &reference.specifier);
    output.push(')');

    if let Some(options) = &reference.options {
        output.push('(');
        write_javascript_table(output, options, depth)?;
        output.push(')');
    }

    Ok(())
}

/// JSON string literals are valid JavaScript string literals.
fn write_string_literal(output: &mut String, value: &str) {
    match serde_json::to_string(value) {
        Ok(literal) => output.push_str(&literal),
        Err(_) => {
            let _ = write!(output, "{value:?}");
        }
    }
}

fn push_indent(output: &mut String, depth: usize) {
    for _ in 0..depth {
        output.push_str(INDENT);
    }
}

fn is_identifier(key: &str) -> bool {
    // Reserved words, strict-mode and module-code restrictions, and the literal names.
    const RESERVED: [&str; 51] = [
        "await", "break", "case", "catch", "class", "const", "continue", "debugger",
        "default", "delete", "do", "else", "enum", "export", "extends", "false", "finally",
        "for", "function", "if", "import", "in", "instanceof", "new", "null", "return",
        "super", "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while",
        "with", "yield", "let", "static", "implements", "interface", "package", "private",
        "protected", "public", "arguments", "eval", "undefined", "NaN", "Infinity",
    ];

    let mut characters = key.chars();
    let Some(first) = characters.next() else {
        return false;
    };

    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && characters.all(|character| character.is_ascii_alphanumeric() || character == '_' || character == '$')
        && !RESERVED.contains(&key)
}
