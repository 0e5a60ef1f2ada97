use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::MatchOptions;
use tracing::{debug, warn};

use crate::configuration::{
    error::{ConfigError, SchemaViolation},
    traits::ResolvableConfiguration,
    value::ConfigValue,
};


#[derive(Debug, Clone)]
pub(super) struct UnresolvedContentPatterns {
    content: Option<ConfigValue>,
}

impl UnresolvedContentPatterns {
    pub(super) fn new(content: Option<ConfigValue>) -> Self {
        Self { content }
    }
}


/// Glob patterns naming the source files to scan for class names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentPatterns {
    pub patterns: Vec<String>,

    /// When `true`, patterns are relative to the configuration file
    /// rather than to the working directory of the build.
    pub relative: bool,
}

impl ResolvableConfiguration for UnresolvedContentPatterns {
    type Resolved = ContentPatterns;

    fn resolve(self) -> Result<Self::Resolved, Vec<SchemaViolation>> {
        let Some(content) = self.content else {
            return Err(vec![SchemaViolation::new(
                "content",
                "missing required field",
            )]);
        };

        // Either a bare array, or the object form `{ files: [...], relative: bool }`.
        let (files, relative, location) = match content {
            ConfigValue::Array(files) => (files, false, "content"),
            ConfigValue::Table(mut table) => {
                let relative = match table.remove("relative") {
                    None => false,
                    Some(ConfigValue::Bool(relative)) => relative,
                    Some(other) => {
                        return Err(vec![SchemaViolation::new(
                            "content.relative",
                            format!("expected a boolean, found {}", other.type_name()),
                        )]);
                    }
                };

                match table.remove("files") {
                    Some(ConfigValue::Array(files)) => (files, relative, "content.files"),
                    Some(other) => {
                        return Err(vec![SchemaViolation::new(
                            "content.files",
                            format!("expected an array of strings, found {}", other.type_name()),
                        )]);
                    }
                    None => {
                        return Err(vec![SchemaViolation::new(
                            "content.files",
                            "missing required field",
                        )]);
                    }
                }
            }
            other => {
                return Err(vec![SchemaViolation::new(
                    "content",
                    format!("expected an array of strings, found {}", other.type_name()),
                )]);
            }
        };


        let mut patterns = Vec::with_capacity(files.len());
        let mut violations = Vec::new();

        for (index, file) in files.into_iter().enumerate() {
            match file {
                ConfigValue::String(pattern) => patterns.push(pattern),
                other => violations.push(SchemaViolation::new(
                    format!("{location}[{index}]"),
                    format!("expected a string, found {}", other.type_name()),
                )),
            }
        }

        if !violations.is_empty() {
            return Err(violations);
        }

        Ok(ContentPatterns { patterns, relative })
    }
}


impl ContentPatterns {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            relative: false,
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    /// Directory the patterns are anchored at: the configuration file's directory
    /// for `relative` patterns, the working directory otherwise.
    pub fn base_directory(&self, configuration_directory: &Path, working_directory: &Path) -> PathBuf {
        if self.relative {
            configuration_directory.to_path_buf()
        } else {
            working_directory.to_path_buf()
        }
    }

    /// Expands the patterns against `base_directory` and returns every matching file,
    /// sorted and without duplicates. Patterns starting with `!` remove matches.
    pub fn matching_files(&self, base_directory: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };

        let mut included = BTreeSet::new();
        let mut excluded = BTreeSet::new();
        let mut violations = Vec::new();

        for (index, pattern) in self.patterns.iter().enumerate() {
            let (negated, pattern) = match pattern.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, pattern.as_str()),
            };

            for expanded in expand_braces(pattern) {
                let anchored = anchor_pattern(base_directory, &expanded);

                let entries = match glob::glob_with(&anchored, options) {
                    Ok(entries) => entries,
                    Err(error) => {
                        violations.push(SchemaViolation::new(
                            format!("content[{index}]"),
                            format!("invalid glob pattern \"{expanded}\": {error}"),
                        ));
                        continue;
                    }
                };

                for entry in entries {
                    let path = match entry {
                        Ok(path) => path,
                        Err(error) => {
                            warn!("Skipping unreadable path while scanning content: {error}");
                            continue;
                        }
                    };

                    if !path.is_file() {
                        continue;
                    }

                    let path = dunce::canonicalize(&path).unwrap_or(path);

                    if negated {
                        excluded.insert(path);
                    } else {
                        included.insert(path);
                    }
                }
            }
        }

        if !violations.is_empty() {
            return Err(ConfigError::schema(None, violations));
        }

        let files: Vec<PathBuf> = included.difference(&excluded).cloned().collect();
        debug!(
            "Content patterns matched {} file(s) under {}.",
            files.len(),
            base_directory.display()
        );

        Ok(files)
    }
}


fn anchor_pattern(base_directory: &Path, pattern: &str) -> String {
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }

    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);

    // Glob metacharacters in the base directory itself must not be interpreted.
    let base = glob::Pattern::escape(&base_directory.to_string_lossy());

    format!("{}/{}", base.trim_end_matches(['/', '\\']), pattern)
}


/// Expands shell-style brace groups: `src/**/*.{js,ts}` becomes
/// `src/**/*.js` and `src/**/*.ts`. Groups may nest. An unbalanced `{`
/// is left as a literal.
pub(crate) fn expand_braces(pattern: &str) -> Vec<String> {
    let Some((open, close)) = find_brace_group(pattern) else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let body = &pattern[open + 1..close];
    let suffix = &pattern[close + 1..];

    let mut expanded = Vec::new();
    for alternative in split_top_level(body) {
        let combined = format!("{prefix}{alternative}{suffix}");
        expanded.extend(expand_braces(&combined));
    }

    expanded
}

fn find_brace_group(pattern: &str) -> Option<(usize, usize)> {
    let bytes = pattern.as_bytes();

    for (open, byte) in bytes.iter().enumerate() {
        if *byte != b'{' {
            continue;
        }

        let mut depth = 0usize;
        for (offset, inner) in bytes[open..].iter().enumerate() {
            match inner {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((open, open + offset));
                    }
                }
                _ => {}
            }
        }
    }

    None
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, character) in body.char_indices() {
        match character {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }

    parts.push(&body[start..]);
    parts
}


#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::configuration::value::Table;

    #[test]
    fn resolves_array_form() {
        let content = ConfigValue::Array(vec!["./../../../src/**/*.rs".into()]);

        let resolved = UnresolvedContentPatterns::new(Some(content)).resolve().unwrap();
        assert_eq!(resolved.patterns, vec!["./../../../src/**/*.rs"]);
        assert!(!resolved.relative);
    }

    #[test]
    fn resolves_object_form() {
        let content = Table::new()
            .with("relative", true)
            .with("files", ConfigValue::Array(vec!["./src/**/*.html".into()]));

        let resolved = UnresolvedContentPatterns::new(Some(content.into()))
            .resolve()
            .unwrap();
        assert_eq!(resolved.patterns, vec!["./src/**/*.html"]);
        assert!(resolved.relative);
    }

    #[test]
    fn reports_every_non_string_entry() {
        let content = ConfigValue::Array(vec![
            "./src/**/*.rs".into(),
            ConfigValue::Integer(3),
            ConfigValue::Table(Table::new()),
        ]);

        let violations = UnresolvedContentPatterns::new(Some(content))
            .resolve()
            .unwrap_err();

        assert_eq!(
            violations,
            vec![
                SchemaViolation::new("content[1]", "expected a string, found number"),
                SchemaViolation::new("content[2]", "expected a string, found table"),
            ]
        );
    }

    #[test]
    fn missing_content_is_a_violation() {
        let violations = UnresolvedContentPatterns::new(None).resolve().unwrap_err();
        assert_eq!(violations[0].location, "content");
        assert_eq!(violations[0].message, "missing required field");
    }

    #[test]
    fn wrong_content_type_is_a_violation() {
        let violations = UnresolvedContentPatterns::new(Some("./src/**/*.rs".into()))
            .resolve()
            .unwrap_err();
        assert_eq!(
            violations[0].message,
            "expected an array of strings, found string"
        );
    }

    #[test]
    fn expands_brace_groups() {
        assert_eq!(
            expand_braces("./src/**/*.{js,jsx,ts}"),
            vec!["./src/**/*.js", "./src/**/*.jsx", "./src/**/*.ts"]
        );
        assert_eq!(
            expand_braces("{a,b{1,2}}/x"),
            vec!["a/x", "b1/x", "b2/x"]
        );
        assert_eq!(expand_braces("plain/*.rs"), vec!["plain/*.rs"]);
        assert_eq!(expand_braces("broken/{a,b"), vec!["broken/{a,b"]);
    }

    #[test]
    fn matches_files_with_negation() {
        let directory = tempfile::tempdir().unwrap();
        let source = directory.path().join("src");
        fs::create_dir_all(source.join("nested")).unwrap();
        fs::write(source.join("main.rs"), "").unwrap();
        fs::write(source.join("nested/view.rs"), "").unwrap();
        fs::write(source.join("nested/generated.rs"), "").unwrap();
        fs::write(source.join("index.html"), "").unwrap();
        fs::write(source.join("notes.txt"), "").unwrap();

        let patterns = ContentPatterns::new([
            "./src/**/*.{rs,html}",
            "!./src/nested/generated.rs",
        ]);

        let files = patterns.matching_files(directory.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(files.len(), 3);
        assert!(names.contains(&"main.rs".to_string()));
        assert!(names.contains(&"view.rs".to_string()));
        assert!(names.contains(&"index.html".to_string()));
        assert!(!names.contains(&"generated.rs".to_string()));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let directory = tempfile::tempdir().unwrap();
        let patterns = ContentPatterns::new(["./src/[*.rs"]);

        let error = patterns.matching_files(directory.path()).unwrap_err();
        assert_eq!(error.violations()[0].location, "content[0]");
    }

    #[test]
    fn relative_patterns_anchor_at_configuration_directory() {
        let mut patterns = ContentPatterns::new(["./src/**/*.rs"]);
        let configuration_directory = Path::new("/project/web");
        let working_directory = Path::new("/project");

        assert_eq!(
            patterns.base_directory(configuration_directory, working_directory),
            working_directory
        );

        patterns.relative = true;
        assert_eq!(
            patterns.base_directory(configuration_directory, working_directory),
            configuration_directory
        );
    }
}
