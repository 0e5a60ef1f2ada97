//! Loading and validating configuration files from disk.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use twconf::{
    configuration::discover_configuration_file,
    load,
    validate,
    ConfigDescriptor,
    ConfigError,
    ErrorKind,
    PluginReference,
    SourceFormat,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
#[cfg(feature = "javascript")]
fn loads_the_project_configuration() {
    let descriptor = load(fixture("tailwind.config.js")).expect("load fixture");

    assert_eq!(descriptor.content.len(), 1);
    assert_eq!(descriptor.content.patterns[0], "./../../../src/**/*.rs");
    assert!(descriptor.theme.extend().is_empty());
    assert_eq!(descriptor.plugins.len(), 2);
    assert_eq!(
        descriptor.plugins.references,
        vec![
            PluginReference::module("@tailwindcss/typography"),
            PluginReference::module("daisyui"),
        ]
    );
    assert!(descriptor.file_path.as_deref().is_some_and(Path::is_absolute));

    validate(&descriptor).expect("fixture is valid");
}

#[test]
#[cfg(feature = "javascript")]
fn same_configuration_in_every_format() {
    let dir = TempDir::new().expect("tempdir");

    let javascript = write(
        &dir,
        "tailwind.config.js",
        r#"module.exports = {
  content: ["./../../../src/**/*.rs"],
  theme: { extend: {} },
  plugins: [require("pluginA"), require("pluginB")],
};"#,
    );
    let json = write(
        &dir,
        "tailwind.config.json",
        r#"{
  "content": ["./../../../src/**/*.rs"],
  "theme": { "extend": {} },
  "plugins": ["pluginA", { "module": "pluginB" }]
}"#,
    );
    let toml = write(
        &dir,
        "tailwind.config.toml",
        r#"content = ["./../../../src/**/*.rs"]
plugins = ["pluginA", "pluginB"]

[theme.extend]
"#,
    );

    let from_javascript = load(&javascript).expect("load js");
    let from_json = load(&json).expect("load json");
    let from_toml = load(&toml).expect("load toml");

    assert_eq!(from_javascript.content.len(), 1);
    assert!(from_javascript.theme.extend().is_empty());
    assert_eq!(from_javascript.plugins.len(), 2);

    assert_eq!(from_javascript, from_json);
    assert_eq!(from_json, from_toml);
}

#[test]
fn missing_file_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("tailwind.config.js");

    let error = load(&missing).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
    match error {
        ConfigError::NotFound { path } => assert_eq!(path, missing),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn missing_file_with_unknown_extension_is_still_not_found() {
    let dir = TempDir::new().expect("tempdir");

    let error = load(dir.path().join("tailwind.config.yaml")).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn unknown_extension_is_a_parse_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(&dir, "tailwind.config.yaml", "content: []");

    let error = load(&path).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Parse);
}

#[test]
#[cfg(feature = "javascript")]
fn missing_content_is_a_schema_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(
        &dir,
        "tailwind.config.js",
        "export const theme = { extend: {} };\nexport const plugins = [];\n",
    );

    let error = load(&path).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Schema);
    assert_eq!(error.violations()[0].location, "content");
}

#[test]
fn every_shape_problem_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(
        &dir,
        "tailwind.config.json",
        r#"{ "content": ["./src/**/*.rs", 7], "theme": { "extend": [] }, "plugins": "daisyui" }"#,
    );

    let error = load(&path).unwrap_err();
    let locations: Vec<&str> = error
        .violations()
        .iter()
        .map(|violation| violation.location.as_str())
        .collect();

    assert_eq!(locations, vec!["content[1]", "theme.extend", "plugins"]);
}

#[test]
fn malformed_sources_are_parse_errors() {
    let dir = TempDir::new().expect("tempdir");

    let mut sources = vec![
        ("tailwind.config.json", "{ \"content\": [ }"),
        ("tailwind.config.toml", "content = ["),
    ];
    if cfg!(feature = "javascript") {
        sources.push(("tailwind.config.js", "export const content = [\"./src/**/*.rs\""));
    }

    for (name, contents) in sources {
        let path = write(&dir, name, contents);
        let error = load(&path).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Parse, "{name} should fail to parse");
    }
}

#[test]
#[cfg(feature = "javascript")]
fn empty_content_fails_validation() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(
        &dir,
        "tailwind.config.js",
        "export const content = [];\nexport const theme = { extend: {} };\n",
    );

    let descriptor = load(&path).expect("empty content still loads");
    let error = validate(&descriptor).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Schema);
    assert!(error.to_string().contains("empty content patterns"));
}

#[test]
fn duplicate_theme_keys_fail_validation() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(
        &dir,
        "tailwind.config.json",
        r##"{
  "content": ["./src/**/*.rs"],
  "theme": { "extend": { "colors": { "brand": "#000", "brand": "#fff" } } }
}"##,
    );

    let error = load(&path).unwrap().validate().unwrap_err();
    assert_eq!(
        error.violations()[0].to_string(),
        "theme.extend.colors: duplicate key \"brand\""
    );
}

#[test]
#[cfg(feature = "javascript")]
fn round_trips_through_every_format() {
    let source = r##"
const brand = { primary: "#0af", ratio: 1.5, steps: [1, 2, 3] };

export default {
  content: { relative: true, files: ["./templates/**/*.html", "!./templates/legacy/**"] },
  darkMode: "class",
  theme: {
    screens: { sm: "480px" },
    extend: { colors: brand, opacity: { ghost: 0.05 } },
  },
  plugins: [
    require("@tailwindcss/typography")({ className: "wysiwyg" }),
    require("daisyui"),
    { name: "inline-plugin", enabled: true },
  ],
};
"##;

    let original = ConfigDescriptor::from_source_str(source, SourceFormat::JavaScript)
        .expect("parse original");
    assert_eq!(original.extra.len(), 1);

    let dir = TempDir::new().expect("tempdir");

    for format in SourceFormat::ALL {
        let written = original.to_source(format).expect("serialize");
        let path = write(&dir, &format!("round-trip.{}", format.extension()), &written);

        let reloaded = load(&path).unwrap_or_else(|error| {
            panic!("reloading {format} failed: {error}\n{written}")
        });
        assert_eq!(reloaded, original, "{format} round trip changed the configuration");
    }
}

#[test]
fn discovery_finds_the_configuration() {
    let dir = TempDir::new().expect("tempdir");
    write(&dir, "tailwind.config.toml", "content = [\"./src/**/*.rs\"]\n");

    let path = discover_configuration_file(dir.path()).expect("discover");
    let descriptor = load(path).expect("load discovered");
    assert_eq!(descriptor.content.len(), 1);
    assert!(descriptor.plugins.is_empty());
}

#[test]
fn relative_content_is_anchored_at_the_configuration_directory() {
    let project = TempDir::new().expect("tempdir");
    let web = project.path().join("web");
    fs::create_dir_all(web.join("src/pages")).expect("create web/src");
    fs::create_dir_all(project.path().join("src")).expect("create src");

    fs::write(web.join("src/index.html"), "").expect("write page");
    fs::write(web.join("src/pages/about.html"), "").expect("write page");
    fs::write(web.join("src/draft.html"), "").expect("write page");
    fs::write(project.path().join("src/outside.html"), "").expect("write page");

    let path = web.join("tailwind.config.json");
    fs::write(
        &path,
        r#"{ "content": { "relative": true, "files": ["./src/**/*.html", "!./src/draft.html"] } }"#,
    )
    .expect("write config");

    let descriptor = load(&path).expect("load relative config");
    assert!(descriptor.content.relative);

    let files = descriptor
        .content_files(project.path())
        .expect("expand content");
    let web = dunce::canonicalize(&web).expect("canonical web");

    assert_eq!(
        files,
        vec![web.join("src/index.html"), web.join("src/pages/about.html")]
    );
}

#[test]
fn plain_content_is_anchored_at_the_working_directory() {
    let project = TempDir::new().expect("tempdir");
    let web = project.path().join("web");
    fs::create_dir_all(web.join("src")).expect("create web/src");
    fs::create_dir_all(project.path().join("src")).expect("create src");

    fs::write(web.join("src/index.html"), "").expect("write page");
    fs::write(project.path().join("src/outside.html"), "").expect("write page");

    let path = web.join("tailwind.config.toml");
    fs::write(&path, "content = [\"./src/**/*.html\"]\n").expect("write config");

    let files = load(&path)
        .expect("load config")
        .content_files(project.path())
        .expect("expand content");
    let root = dunce::canonicalize(project.path()).expect("canonical root");

    assert_eq!(files, vec![root.join("src/outside.html")]);
}

#[test]
#[cfg(feature = "javascript")]
fn reserved_word_keys_round_trip_through_javascript() {
    let original = ConfigDescriptor::from_source_str(
        r#"{ "content": ["./a/*.rs"], "if": 1, "null": true, "await": "later" }"#,
        SourceFormat::Json,
    )
    .expect("parse json");

    let written = original
        .to_source(SourceFormat::JavaScript)
        .expect("serialize");
    assert!(!written.contains("export const if"));

    let reloaded = ConfigDescriptor::from_source_str(&written, SourceFormat::JavaScript)
        .unwrap_or_else(|error| panic!("reloading failed: {error}\n{written}"));
    assert_eq!(reloaded, original);
}

#[test]
#[cfg(feature = "javascript")]
fn default_export_specifier_is_the_configuration() {
    let descriptor = ConfigDescriptor::from_source_str(
        "const config = { content: [\"./src/**/*.rs\"] };\nexport { config as default };\n",
        SourceFormat::JavaScript,
    )
    .expect("load default export specifier");

    assert_eq!(descriptor.content.len(), 1);
    assert!(descriptor.extra.is_empty());
}

#[test]
#[cfg(feature = "javascript")]
fn module_shaped_javascript_objects_stay_inline() {
    let descriptor = ConfigDescriptor::from_source_str(
        r#"
export const content = ["./src/**/*.rs"];
export const theme = { extend: { fontFamily: { module: "Inter" } } };
export const plugins = [{ module: "local-handler" }];
"#,
        SourceFormat::JavaScript,
    )
    .expect("load");

    assert_eq!(
        descriptor.plugins.references,
        vec![PluginReference::Inline(
            twconf::Table::new().with("module", "local-handler")
        )]
    );

    let written = descriptor
        .to_source(SourceFormat::JavaScript)
        .expect("serialize");
    assert!(!written.contains("require(\"Inter\")"));
    assert_eq!(
        ConfigDescriptor::from_source_str(&written, SourceFormat::JavaScript).expect("reload"),
        descriptor
    );
}

#[test]
fn repeated_sections_are_schema_errors() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(
        &dir,
        "tailwind.config.json",
        r#"{ "content": ["./src/**/*.rs"], "theme": {}, "theme": { "extend": {} } }"#,
    );

    let error = load(&path).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Schema);
    assert_eq!(
        error.violations()[0].to_string(),
        "(root): duplicate key \"theme\""
    );
}

#[test]
fn non_finite_numbers_survive_toml_but_not_json() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(
        &dir,
        "tailwind.config.toml",
        "content = [\"./src/**/*.rs\"]\n\n[theme.extend]\nratio = nan\nlimit = inf\n",
    );

    let original = load(&path).expect("load toml");

    let toml = original.to_source(SourceFormat::Toml).expect("serialize toml");
    let reloaded = ConfigDescriptor::from_source_str(&toml, SourceFormat::Toml).expect("reload");
    assert_eq!(reloaded, original);

    let error = original.to_source(SourceFormat::Json).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Serialize);
}
