//! Source language of a compile unit.

use serde::{Deserialize, Serialize};

/// Source language for a compile unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C language (default)
    #[default]
    C,
    /// C++ language
    #[serde(alias = "cpp", alias = "cxx", alias = "c++")]
    Cxx,
}

impl Language {
    /// Get the language name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
        }
    }

    /// Guess the language from a source file extension.
    ///
    /// Anything that is not a recognized C++ extension is treated as C.
    pub fn from_extension(ext: &str) -> Self {
        // Upper-case `.C` is C++ by GCC convention; only then fold case
        if ext == "C" {
            return Language::Cxx;
        }
        match ext.to_ascii_lowercase().as_str() {
            "cc" | "cpp" | "cxx" | "c++" | "cp" => Language::Cxx,
            _ => Language::C,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
