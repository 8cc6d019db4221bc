//! Per-language tree-sitter configuration and the extension → language map
//! from spec §6 (authoritative, closed set).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use thiserror::Error;

use super::{
    c::c_language_config, cpp::cpp_language_config, csharp::csharp_language_config,
    go::go_language_config, java::java_language_config, javascript::javascript_language_config,
    kotlin::kotlin_language_config, php::php_language_config, python::python_language_config,
    ruby::ruby_language_config, rust::rust_language_config, swift::swift_language_config,
    typescript::typescript_language_config,
};

/// Everything the slicer needs to know about a language: its grammar, and
/// the tree-sitter query strings that identify function-like and
/// class/interface-like nodes.
#[derive(Clone)]
pub struct TSLanguageConfig {
    /// Canonical name, e.g. "rust", "python". Matches spec §6's table.
    pub language_ids: &'static [&'static str],

    /// File extensions mapped to this language (case-insensitive match).
    pub file_extensions: &'static [&'static str],

    /// tree-sitter grammar constructor for this language.
    pub grammar: fn() -> tree_sitter::Language,

    /// Queries identifying function/method definitions. Must capture the
    /// whole definition as `@function` and, optionally, its name as `@name`.
    pub function_query: &'static [&'static str],

    /// Queries identifying class/interface/struct-impl declarations. Must
    /// capture the whole declaration as `@class` and, optionally, its name
    /// as `@name`.
    pub class_query: &'static [&'static str],

    /// Node types considered "import/use" statements, collected verbatim
    /// from the top level of the file as ancestor context (spec §4.2).
    pub import_node_types: &'static [&'static str],
}

impl TSLanguageConfig {
    pub fn language(&self) -> &'static str {
        self.language_ids[0]
    }

    pub fn parser(&self) -> tree_sitter::Parser {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language((self.grammar)())
            .expect("grammar to load for its own config");
        parser
    }
}

/// Registry of every language the extension table names, plus lookup by
/// extension (spec §6) and by canonical name.
pub struct TSLanguageParsing {
    configs: Vec<TSLanguageConfig>,
}

impl TSLanguageParsing {
    pub fn init() -> Self {
        Self {
            configs: vec![
                rust_language_config(),
                python_language_config(),
                javascript_language_config(),
                typescript_language_config(),
                go_language_config(),
                cpp_language_config(),
                c_language_config(),
                csharp_language_config(),
                ruby_language_config(),
                java_language_config(),
                php_language_config(),
                swift_language_config(),
                kotlin_language_config(),
            ],
        }
    }

    pub fn for_language(&self, language: &str) -> Option<&TSLanguageConfig> {
        self.configs
            .iter()
            .find(|config| config.language_ids.contains(&language))
    }

    pub fn for_extension(&self, extension: &str) -> Option<&TSLanguageConfig> {
        let extension = extension.to_lowercase();
        self.configs
            .iter()
            .find(|config| config.file_extensions.contains(&extension.as_str()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectLanguageError {
    #[error("file path cannot be empty")]
    InvalidArgument,
}

/// Authoritative extension → language map, spec §6. Built once; matching is
/// case-insensitive on the extension.
static EXTENSION_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("py", "python"),
        ("rs", "rust"),
        ("js", "javascript"),
        ("jsx", "javascript"),
        ("go", "go"),
        ("ts", "typescript"),
        ("tsx", "typescript"),
        ("cpp", "cpp"),
        ("hpp", "cpp"),
        ("c", "c"),
        ("h", "c"),
        ("cs", "csharp"),
        ("rb", "ruby"),
        ("java", "java"),
        ("php", "php"),
        ("swift", "swift"),
        ("kt", "kotlin"),
    ])
});

/// Detect a file's language from its path. `detect("Main.KT") == Some("kotlin")`,
/// `detect("notes.txt") == None`, `detect("")` is an error (spec §8 S1).
pub fn detect_language(file_path: &str) -> Result<Option<&'static str>, DetectLanguageError> {
    if file_path.trim().is_empty() {
        return Err(DetectLanguageError::InvalidArgument);
    }
    let extension = std::path::Path::new(file_path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());
    Ok(extension.and_then(|ext| EXTENSION_MAP.get(ext.as_str()).copied()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_case_insensitively() {
        assert_eq!(detect_language("Main.KT").unwrap(), Some("kotlin"));
    }

    #[test]
    fn unmapped_extension_is_none() {
        assert_eq!(detect_language("notes.txt").unwrap(), None);
    }

    #[test]
    fn empty_path_is_invalid_argument() {
        assert_eq!(
            detect_language(""),
            Err(DetectLanguageError::InvalidArgument)
        );
    }

    #[test]
    fn registry_resolves_every_mapped_extension() {
        let parsing = TSLanguageParsing::init();
        for ext in EXTENSION_MAP.keys() {
            assert!(
                parsing.for_extension(ext).is_some(),
                "no TSLanguageConfig registered for extension {ext}"
            );
        }
    }
}
