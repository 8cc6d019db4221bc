//! Owned, post-query representations of function/class tree-sitter captures.
//!
//! We deliberately copy ranges out of the `tree_sitter::Tree` rather than
//! holding borrowed `Node`s: the slicer processes one file at a time and
//! wants to keep the parsed tree's lifetime local to `slicer::extract`.

use super::text_document::Range;

#[derive(Debug, Clone)]
pub struct FunctionInformation {
    range: Range,
    name: Option<String>,
}

impl FunctionInformation {
    pub fn new(range: Range, name: Option<String>) -> Self {
        Self { range, name }
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct ClassInformation {
    range: Range,
    /// The header line range only (signature, not the body) - what gets
    /// included as ancestor context for a method snippet.
    header_range: Range,
    name: Option<String>,
}

impl ClassInformation {
    pub fn new(range: Range, header_range: Range, name: Option<String>) -> Self {
        Self {
            range,
            header_range,
            name,
        }
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn header_range(&self) -> &Range {
        &self.header_range
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// An import/use statement at the head of a file, carried along as context
/// for every snippet extracted from that file (spec §4.2).
#[derive(Debug, Clone)]
pub struct ImportStatement {
    range: Range,
}

impl ImportStatement {
    pub fn new(range: Range) -> Self {
        Self { range }
    }

    pub fn range(&self) -> &Range {
        &self.range
    }
}
