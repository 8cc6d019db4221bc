//! Language detection and AST-based snippet slicing (spec §4.2, §6).

mod c;
mod cpp;
mod csharp;
mod go;
mod java;
mod javascript;
mod kotlin;
pub mod languages;
mod php;
mod python;
mod ruby;
mod rust;
pub mod slicer;
mod swift;
pub mod text_document;
pub mod types;
mod typescript;

pub use languages::{detect_language, DetectLanguageError, TSLanguageConfig, TSLanguageParsing};
pub use slicer::{extract, ExtractOutcome, ExtractedSnippet};
