//! Byte/line positions shared by the slicer and the snippet line-set math.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Position {
    line: usize,
    byte_offset: usize,
}

impl Position {
    pub fn new(line: usize, byte_offset: usize) -> Self {
        Self { line, byte_offset }
    }

    pub fn from_tree_sitter(point: tree_sitter::Point, byte_offset: usize) -> Self {
        Self {
            line: point.row,
            byte_offset,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn to_byte_offset(&self) -> usize {
        self.byte_offset
    }
}

/// A half-open `[start, end)` byte/line range, always expressed in the
/// original file's coordinates (0-indexed lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Range {
    start: Position,
    end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn for_tree_node(node: &tree_sitter::Node<'_>) -> Self {
        Self {
            start: Position::from_tree_sitter(node.start_position(), node.start_byte()),
            end: Position::from_tree_sitter(node.end_position(), node.end_byte()),
        }
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn start_byte(&self) -> usize {
        self.start.to_byte_offset()
    }

    pub fn end_byte(&self) -> usize {
        self.end.to_byte_offset()
    }

    pub fn start_line(&self) -> usize {
        self.start.line()
    }

    pub fn end_line(&self) -> usize {
        self.end.line()
    }

    pub fn contains(&self, other: &Range) -> bool {
        self.start_byte() <= other.start_byte() && self.end_byte() >= other.end_byte()
    }

    /// All (0-indexed) line numbers this range spans, inclusive.
    pub fn line_numbers(&self) -> Vec<usize> {
        (self.start_line()..=self.end_line()).collect()
    }
}
