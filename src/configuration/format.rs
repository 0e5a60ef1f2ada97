use std::fmt::{self, Display, Formatter};
use std::path::Path;


/// Syntax a configuration source is written in, detected from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// `.js`, `.cjs` or `.mjs`; evaluated statically.
    JavaScript,
    Json,
    Toml,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 3] = [Self::JavaScript, Self::Json, Self::Toml];

    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();

        match extension.as_str() {
            "js" | "cjs" | "mjs" => Some(Self::JavaScript),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// The canonical file extension (without the leading dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::JavaScript => "js",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

impl Display for SourceFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::JavaScript => "JavaScript",
            Self::Json => "JSON",
            Self::Toml => "TOML",
        })
    }
}
