//! Error types for parsing, emission, merging, and value binding.

use thiserror::Error;

use crate::node::NodeKind;

/// Result type for yamlet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type covering every failure surfaced by this crate.
///
/// Lexical and syntactic errors carry the 1-based line and column where the
/// offending input was found. Merge errors carry the structural path of the
/// merge step that failed.
#[derive(Error, Debug)]
pub enum Error {
    /// Lexical failure reported by the scanner (e.g. unterminated string).
    #[error("{message} at line {line}, column {column}")]
    Lexical {
        message: String,
        line: usize,
        column: usize,
    },

    /// The parser met a token it has no rule for.
    #[error("unexpected token {found} at line {line}, column {column}")]
    UnexpectedToken {
        found: String,
        line: usize,
        column: usize,
    },

    /// A flow mapping entry did not start with a scalar key.
    #[error("expected key, got {found} at line {line}, column {column}")]
    ExpectedKey {
        found: String,
        line: usize,
        column: usize,
    },

    /// A flow mapping key was not followed by `:`.
    #[error("expected ':' after key, got {found} at line {line}, column {column}")]
    ExpectedColon {
        found: String,
        line: usize,
        column: usize,
    },

    /// A flow sequence ran out of input before its `]`.
    #[error("expected ']' before end of input at line {line}, column {column}")]
    UnclosedFlowSequence { line: usize, column: usize },

    /// A flow mapping ran out of input before its `}`.
    #[error("expected '}}' before end of input at line {line}, column {column}")]
    UnclosedFlowMapping { line: usize, column: usize },

    /// An alias referenced an anchor that was never defined.
    #[error("undefined alias: {name} at line {line}, column {column}")]
    UndefinedAlias {
        name: String,
        line: usize,
        column: usize,
    },

    /// Two nodes of different kinds met during a merge with
    /// `allow_type_mismatch` off.
    #[error("type mismatch at {path}: {left} vs {right}")]
    TypeMismatch {
        path: String,
        left: NodeKind,
        right: NodeKind,
    },

    /// The emitter met an alias node that was never resolved to a value.
    #[error("cannot emit unresolved alias '{name}'")]
    UnresolvedAlias { name: String },

    /// A value could not be bound to the requested host type.
    #[error("cannot decode {found} into {target}")]
    Decode {
        found: String,
        target: &'static str,
    },

    /// I/O failure from the reader/writer adapters.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
