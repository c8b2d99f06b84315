//! yamlet — a YAML codec that keeps scalar styles and comments through a
//! parse/emit round trip, with a structural merge over the parsed tree.
//!
//! # Pipeline
//!
//! 1. **Scanner**: walks the input bytes and produces tokens with
//!    line/column positions, with one token of pushback for lookahead.
//! 2. **Parser**: turns tokens into a tree of Document/Mapping/Sequence/
//!    Scalar nodes that records styles, tags, anchors, and comments, and
//!    resolves aliases to deep clones.
//! 3. **Emitter**: serializes a tree back to YAML honoring the recorded
//!    styles and comment slots.
//! 4. **Merger**: combines two trees into a third under a [`MergeOptions`]
//!    record.
//!
//! The [`Value`] type and the [`ToYaml`] / [`FromYaml`] traits bridge node
//! trees to plain host data for `marshal` / `unmarshal`.
//!
//! # Example
//!
//! ```
//! let doc = yamlet::parse("key: value").unwrap();
//! let yaml = yamlet::emit(&doc).unwrap();
//! assert_eq!(yaml, "key: value\n");
//! ```
//!
//! # Coverage
//!
//! The codec implements a practical subset of YAML 1.2: plain and quoted
//! scalars, block and flow collections, literal/folded blocks with chomping,
//! anchors and aliases, explicit tags, document markers, and comments. It
//! does not handle complex (`? `) keys, `%` directives, `<<` merge keys, or
//! multiline plain scalars.

mod encode;
mod error;
mod merge;
mod node;
mod parser;
mod scanner;
mod token;
mod value;

pub use encode::Encoder;
pub use error::{Error, Result};
pub use merge::{
    merge, merge_nodes, patch, ArrayMergeStrategy, CustomMergeFn, MergeMode, MergeOptions,
};
pub use node::{
    CollectionStyle, Comment, Entry, Node, NodeBody, NodeKind, Position, ScalarStyle, SortMode,
    SortTarget,
};
pub use parser::Parser;
pub use scanner::Scanner;
pub use token::{Token, TokenKind};
pub use value::{FromYaml, ToYaml, Value};

use std::io::{Read, Write};

/// Parses YAML text into a [`Node`] tree rooted at a `Document`.
pub fn parse(input: &str) -> Result<Node> {
    Parser::new(input.as_bytes()).parse()
}

/// Parses YAML from a reader. The reader is drained eagerly before scanning.
pub fn parse_reader<R: Read>(mut reader: R) -> Result<Node> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    Parser::new(&buffer).parse()
}

/// Serializes a node tree to YAML text with the default two-space indent.
pub fn emit(node: &Node) -> Result<String> {
    Encoder::new().encode(node)
}

/// Serializes a node tree and writes it out in one piece.
pub fn emit_writer<W: Write>(mut writer: W, node: &Node) -> Result<()> {
    let text = emit(node)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}

/// Renders a host value to YAML text via its [`ToYaml`] capability.
pub fn marshal<T: ToYaml + ?Sized>(value: &T) -> Result<String> {
    emit(&value.to_yaml().to_node())
}

/// Parses YAML text and binds it to a host type via [`FromYaml`].
pub fn unmarshal<T: FromYaml>(input: &str) -> Result<T> {
    let node = parse(input)?;
    T::from_yaml(&Value::from_node(&node))
}
