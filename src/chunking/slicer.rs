//! Snippet extraction (spec §4.2): parse a file, find every function/method
//! definition, and slice out that definition plus the minimal ancestor
//! context (file-head imports, nearest enclosing class header, nested
//! function ancestors) needed to read it standalone.

use std::collections::BTreeSet;

use tree_sitter::{Node, Query, QueryCursor};

use super::{
    languages::TSLanguageConfig,
    text_document::{Position, Range},
    types::{ClassInformation, FunctionInformation, ImportStatement},
};

/// Node kinds that represent a function/method body across the languages we
/// support. Used to split a definition into "header" (signature) and "body"
/// so enclosing context only carries the header line(s), per spec §4.2.
const BODY_NODE_KINDS: &[&str] = &[
    "block",
    "statement_block",
    "compound_statement",
    "constructor_body",
    "function_body",
    "class_body",
    "field_declaration_list",
    "declaration_list",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSnippet {
    pub text: String,
    pub language: String,
    pub name: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
}

/// Extraction outcome: either an ordered snippet sequence, or a marker that
/// the file could not be parsed (spec §4.2 edge-case policy — not an error).
#[derive(Debug)]
pub enum ExtractOutcome {
    Snippets(Vec<ExtractedSnippet>),
    Unparseable,
}

pub fn extract(file_bytes: &[u8], config: &TSLanguageConfig) -> ExtractOutcome {
    let mut parser = config.parser();
    let Some(tree) = parser.parse(file_bytes, None) else {
        return ExtractOutcome::Unparseable;
    };
    let root = tree.root_node();

    let functions = capture_functions(config, root, file_bytes);
    let classes = capture_classes(config, root, file_bytes);
    let imports = capture_imports(config, root);

    let source = String::from_utf8_lossy(file_bytes);
    let source_lines: Vec<&str> = source.split('\n').collect();

    let mut snippets = Vec::with_capacity(functions.len());
    for function in &functions {
        let mut lines: BTreeSet<usize> = BTreeSet::new();

        for import in &imports {
            lines.extend(import.range().line_numbers());
        }

        if let Some(class) = nearest_enclosing(function.range(), &classes, |c| c.range()) {
            lines.extend(class.header_range().line_numbers());
        }

        for ancestor in enclosing_functions(function, &functions) {
            lines.extend(header_range(ancestor.range(), root).line_numbers());
        }

        lines.extend(function.range().line_numbers());

        let text = lines
            .iter()
            .filter_map(|&line| source_lines.get(line))
            .copied()
            .collect::<Vec<_>>()
            .join("\n");

        let start_line = *lines.iter().next().unwrap_or(&function.range().start_line());
        let end_line = *lines.iter().last().unwrap_or(&function.range().end_line());

        snippets.push(ExtractedSnippet {
            text,
            language: config.language().to_owned(),
            name: function.name().map(str::to_owned),
            start_line,
            end_line,
        });
    }

    ExtractOutcome::Snippets(snippets)
}

fn nearest_enclosing<'a, T>(
    target: &Range,
    candidates: &'a [T],
    range_of: impl Fn(&'a T) -> &'a Range,
) -> Option<&'a T> {
    candidates
        .iter()
        .filter(|candidate| range_of(candidate).contains(target))
        .min_by_key(|candidate| {
            range_of(candidate).end_byte() - range_of(candidate).start_byte()
        })
}

fn enclosing_functions<'a>(
    target: &'a FunctionInformation,
    all: &'a [FunctionInformation],
) -> Vec<&'a FunctionInformation> {
    let mut ancestors: Vec<&FunctionInformation> = all
        .iter()
        .filter(|candidate| {
            candidate.range() != target.range() && candidate.range().contains(target.range())
        })
        .collect();
    // Innermost ancestor first, matching the order the original line-number
    // union would naturally produce when walking `node.parent()`.
    ancestors.sort_by_key(|candidate| candidate.range().end_byte() - candidate.range().start_byte());
    ancestors
}

/// The signature-only range of a definition: everything before its body
/// node, or the whole range if no body-shaped child is found.
fn header_range(range: &Range, root: Node<'_>) -> Range {
    let Some(node) = find_node_for_range(root, range) else {
        return *range;
    };
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if BODY_NODE_KINDS.contains(&child.kind()) {
            let header_end = Position::new(child.start_position().row, child.start_byte());
            return Range::new(range.start(), header_end);
        }
    }
    *range
}

fn find_node_for_range<'a>(root: Node<'a>, range: &Range) -> Option<Node<'a>> {
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.start_byte() == range.start_byte() && node.end_byte() == range.end_byte() {
            return Some(node);
        }
        if node.start_byte() <= range.start_byte() && node.end_byte() >= range.end_byte() {
            stack.extend(node.children(&mut cursor));
        }
    }
    None
}

fn capture_functions(
    config: &TSLanguageConfig,
    root: Node<'_>,
    source: &[u8],
) -> Vec<FunctionInformation> {
    let mut out = Vec::new();
    let mut seen = BTreeSet::new();
    for query_src in config.function_query {
        let query = Query::new((config.grammar)(), query_src).expect("function query is valid");
        let function_idx = query.capture_index_for_name("function");
        let name_idx = query.capture_index_for_name("name");
        let mut cursor = QueryCursor::new();
        for (m, _) in cursor.captures(&query, root, source) {
            let Some(function_capture) = function_idx.and_then(|idx| {
                m.captures.iter().find(|c| c.index == idx)
            }) else {
                continue;
            };
            let range = Range::for_tree_node(&function_capture.node);
            if !seen.insert((range.start_byte(), range.end_byte())) {
                continue;
            }
            let name = name_idx.and_then(|idx| {
                m.captures
                    .iter()
                    .find(|c| c.index == idx)
                    .and_then(|c| c.node.utf8_text(source).ok())
                    .map(str::to_owned)
            });
            out.push(FunctionInformation::new(range, name));
        }
    }
    out
}

fn capture_classes(
    config: &TSLanguageConfig,
    root: Node<'_>,
    source: &[u8],
) -> Vec<ClassInformation> {
    let mut out = Vec::new();
    let mut seen = BTreeSet::new();
    for query_src in config.class_query {
        let query = Query::new((config.grammar)(), query_src).expect("class query is valid");
        let class_idx = query.capture_index_for_name("class");
        let name_idx = query.capture_index_for_name("name");
        let mut cursor = QueryCursor::new();
        for (m, _) in cursor.captures(&query, root, source) {
            let Some(class_capture) = class_idx.and_then(|idx| {
                m.captures.iter().find(|c| c.index == idx)
            }) else {
                continue;
            };
            let range = Range::for_tree_node(&class_capture.node);
            if !seen.insert((range.start_byte(), range.end_byte())) {
                continue;
            }
            let name = name_idx.and_then(|idx| {
                m.captures
                    .iter()
                    .find(|c| c.index == idx)
                    .and_then(|c| c.node.utf8_text(source).ok())
                    .map(str::to_owned)
            });
            let header = header_range(&range, root);
            out.push(ClassInformation::new(range, header, name));
        }
    }
    out
}

fn capture_imports(config: &TSLanguageConfig, root: Node<'_>) -> Vec<ImportStatement> {
    if config.import_node_types.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if config.import_node_types.contains(&child.kind()) {
            out.push(ImportStatement::new(Range::for_tree_node(&child)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::rust::rust_language_config;

    #[test]
    fn extracts_standalone_function_with_imports() {
        let source = b"use std::fmt;\n\nfn greet(name: &str) -> String {\n    format!(\"hi {name}\")\n}\n";
        let config = rust_language_config();
        let ExtractOutcome::Snippets(snippets) = extract(source, &config) else {
            panic!("expected snippets");
        };
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].text.contains("use std::fmt;"));
        assert!(snippets[0].text.contains("fn greet"));
    }

    #[test]
    fn extraction_is_deterministic() {
        let source = b"fn a() {}\nfn b() {}\n";
        let config = rust_language_config();
        let ExtractOutcome::Snippets(first) = extract(source, &config) else {
            panic!("expected snippets");
        };
        let ExtractOutcome::Snippets(second) = extract(source, &config) else {
            panic!("expected snippets");
        };
        assert_eq!(first, second);
    }

    #[test]
    fn method_carries_nearest_class_header() {
        let source = b"struct Greeter;\n\nimpl Greeter {\n    fn hello(&self) {\n        println!(\"hi\");\n    }\n}\n";
        let config = rust_language_config();
        let ExtractOutcome::Snippets(snippets) = extract(source, &config) else {
            panic!("expected snippets");
        };
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].text.contains("impl Greeter"));
    }

    #[test]
    fn top_level_statements_are_not_snippets() {
        let source = b"let x = 1;\n";
        let config = rust_language_config();
        let ExtractOutcome::Snippets(snippets) = extract(source, &config) else {
            panic!("expected snippets");
        };
        assert!(snippets.is_empty());
    }
}
