//! Token types produced by the scanner.

use std::fmt;

/// A source position: 1-based line and column, 0-based byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input.
    Eof,
    /// `\n`.
    Newline,
    /// `---` at column 1.
    DocumentStart,
    /// `...` at column 1.
    DocumentEnd,
    /// `:` followed by space, newline, or end of input.
    Key,
    /// A plain or quoted string scalar.
    String,
    /// A plain scalar with a numeric shape.
    Number,
    /// A plain scalar recognized as a boolean word.
    Boolean,
    /// A plain scalar recognized as null (`null`, `~`, or empty).
    Null,
    /// `- ` block sequence item marker.
    SequenceItem,
    /// `&name`.
    Anchor,
    /// `*name`.
    Alias,
    /// `!name` or `!!name`.
    Tag,
    /// `# …` to end of line; value is the trimmed text.
    Comment,
    /// `|` block scalar; value is the decoded content.
    LiteralBlock,
    /// `>` block scalar; value is the folded, decoded content.
    FoldedBlock,
    /// `[`.
    FlowSequenceStart,
    /// `]`.
    FlowSequenceEnd,
    /// `{`.
    FlowMappingStart,
    /// `}`.
    FlowMappingEnd,
    /// `,` inside a flow collection.
    FlowEntry,
    /// A lexical error; value is the message.
    Error,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Eof => "EOF",
            TokenKind::Newline => "NewLine",
            TokenKind::DocumentStart => "DocumentStart",
            TokenKind::DocumentEnd => "DocumentEnd",
            TokenKind::Key => "Key",
            TokenKind::String => "String",
            TokenKind::Number => "Number",
            TokenKind::Boolean => "Boolean",
            TokenKind::Null => "Null",
            TokenKind::SequenceItem => "SequenceItem",
            TokenKind::Anchor => "Anchor",
            TokenKind::Alias => "Alias",
            TokenKind::Tag => "Tag",
            TokenKind::Comment => "Comment",
            TokenKind::LiteralBlock => "LiteralBlock",
            TokenKind::FoldedBlock => "FoldedBlock",
            TokenKind::FlowSequenceStart => "FlowSequenceStart",
            TokenKind::FlowSequenceEnd => "FlowSequenceEnd",
            TokenKind::FlowMappingStart => "FlowMappingStart",
            TokenKind::FlowMappingEnd => "FlowMappingEnd",
            TokenKind::FlowEntry => "FlowEntry",
            TokenKind::Error => "Error",
        };
        f.write_str(name)
    }
}

/// A single token with its decoded value and source position.
///
/// `value` is empty where the kind carries no payload (markers, brackets).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            value: value.into(),
            pos,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "{} at {}", self.kind, self.pos)
        } else {
            write!(f, "{}({:?}) at {}", self.kind, self.value, self.pos)
        }
    }
}
