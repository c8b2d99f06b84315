//! Emitter: node tree → YAML text.
//!
//! Serialization honors the styles recorded on each node (plain/quoted
//! scalars, literal and folded blocks, flow vs block collections) and writes
//! comment slots back where the parser attached them. Plain scalars whose
//! text would be re-read as a different type (booleans, numbers, null words,
//! or text containing structural characters) are promoted to double quotes.

use crate::error::{Error, Result};
use crate::node::{Entry, Node, NodeBody, ScalarStyle};
use crate::scanner::classify_scalar;
use crate::token::TokenKind;

pub struct Encoder {
    indent: usize,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// An encoder with the default indent width of two spaces.
    pub fn new() -> Self {
        Self { indent: 2 }
    }

    /// An encoder with the given indent width (at least one space).
    pub fn with_indent(indent: usize) -> Self {
        Self {
            indent: indent.max(1),
        }
    }

    pub fn set_indent(&mut self, spaces: usize) {
        self.indent = spaces.max(1);
    }

    /// Serializes a node tree to YAML text.
    ///
    /// Fails only on malformed trees: an unresolved `Alias` node cannot be
    /// emitted.
    pub fn encode(&self, node: &Node) -> Result<String> {
        let mut out = String::new();
        self.encode_node(&mut out, node, 0, false)?;
        Ok(out)
    }

    fn encode_node(
        &self,
        out: &mut String,
        node: &Node,
        indent: usize,
        inline: bool,
    ) -> Result<()> {
        if !inline && !node.comment.head.is_empty() {
            push_comment_lines(out, &node.comment.head, indent);
        }

        match &node.body {
            NodeBody::Document { content } => {
                for (i, child) in content.iter().enumerate() {
                    if i > 0 {
                        out.push_str("\n---\n");
                    }
                    self.encode_node(out, child, indent, false)?;
                }
            }

            NodeBody::Scalar { value, style } => {
                if let Some(name) = &node.anchor {
                    out.push('&');
                    out.push_str(name);
                    out.push(' ');
                }
                self.encode_scalar(out, value, *style, &node.tag, indent);
            }

            NodeBody::Sequence { items, style } => {
                let flow = *style == crate::node::CollectionStyle::Flow || inline;
                self.push_collection_anchor(out, node, flow || items.is_empty(), indent);
                if items.is_empty() {
                    out.push_str("[]");
                } else if flow {
                    self.encode_flow_sequence(out, items)?;
                } else {
                    self.encode_block_sequence(out, items, indent)?;
                }
            }

            NodeBody::Mapping { entries, style } => {
                let flow = *style == crate::node::CollectionStyle::Flow || inline;
                self.push_collection_anchor(out, node, flow || entries.is_empty(), indent);
                if entries.is_empty() {
                    out.push_str("{}");
                } else if flow {
                    self.encode_flow_mapping(out, entries)?;
                } else {
                    self.encode_block_mapping(out, entries, indent)?;
                }
            }

            NodeBody::Alias { identifier } => {
                return Err(Error::UnresolvedAlias {
                    name: identifier.clone(),
                });
            }
        }

        if !node.comment.line.is_empty() && !out.ends_with('\n') {
            out.push_str(" # ");
            out.push_str(&node.comment.line);
        }

        if !inline && !node.comment.foot.is_empty() {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            push_comment_lines(out, &node.comment.foot, indent);
        }

        Ok(())
    }

    /// Writes a collection's anchor. Inline collections take `&name ` on the
    /// same line; block collections put `&name` on its own line above the
    /// first entry.
    fn push_collection_anchor(&self, out: &mut String, node: &Node, inline: bool, indent: usize) {
        let Some(name) = &node.anchor else { return };
        if inline {
            out.push('&');
            out.push_str(name);
            out.push(' ');
        } else {
            push_indent(out, indent);
            out.push('&');
            out.push_str(name);
            out.push('\n');
        }
    }

    fn encode_scalar(
        &self,
        out: &mut String,
        value: &str,
        style: ScalarStyle,
        tag: &str,
        indent: usize,
    ) {
        match style {
            ScalarStyle::SingleQuoted => {
                out.push('\'');
                out.push_str(&value.replace('\'', "''"));
                out.push('\'');
            }
            ScalarStyle::DoubleQuoted => push_double_quoted(out, value),
            ScalarStyle::Literal => self.encode_literal_block(out, value, indent),
            ScalarStyle::Folded => self.encode_folded_block(out, value, indent),
            ScalarStyle::Plain => {
                // Only string-typed scalars are at risk of being re-read as
                // another type; tagged booleans, numbers, and nulls keep
                // their plain text.
                if (tag.is_empty() || tag == "!!str") && needs_quoting(value) {
                    push_double_quoted(out, value);
                } else {
                    out.push_str(value);
                }
            }
        }
    }

    fn encode_literal_block(&self, out: &mut String, value: &str, indent: usize) {
        out.push('|');
        push_chomp_indicator(out, value);
        out.push('\n');

        for line in block_lines(value) {
            if line.is_empty() {
                out.push('\n');
            } else {
                push_indent(out, indent + self.indent);
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    fn encode_folded_block(&self, out: &mut String, value: &str, indent: usize) {
        out.push('>');
        push_chomp_indicator(out, value);
        out.push('\n');

        // Each newline in the value becomes a blank line, so folding on
        // re-parse reconstructs the original text.
        for (i, line) in block_lines(value).iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if !line.is_empty() {
                push_indent(out, indent + self.indent);
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    fn encode_flow_sequence(&self, out: &mut String, items: &[Node]) -> Result<()> {
        out.push('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.encode_node(out, item, 0, true)?;
        }
        out.push(']');
        Ok(())
    }

    fn encode_flow_mapping(&self, out: &mut String, entries: &[Entry]) -> Result<()> {
        out.push('{');
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.encode_node(out, &entry.key, 0, true)?;
            out.push_str(": ");
            self.encode_node(out, &entry.value, 0, true)?;
        }
        out.push('}');
        Ok(())
    }

    fn encode_block_sequence(&self, out: &mut String, items: &[Node], indent: usize) -> Result<()> {
        for item in items {
            // Block children print their own head comments when recursed;
            // inline items would drop theirs, so print them here.
            if !is_block_child(item) && !item.comment.head.is_empty() {
                push_comment_lines(out, &item.comment.head, indent);
            }
            push_indent(out, indent);
            out.push_str("- ");

            if is_block_child(item) {
                out.push('\n');
                self.encode_node(out, item, indent + self.indent, false)?;
            } else {
                self.encode_inline_entry_value(out, item, indent)?;
            }
        }
        Ok(())
    }

    fn encode_block_mapping(&self, out: &mut String, entries: &[Entry], indent: usize) -> Result<()> {
        for entry in entries {
            if !entry.comment.key.is_empty() {
                push_comment_lines(out, &entry.comment.key, indent);
            }
            if !entry.key.comment.head.is_empty() {
                push_comment_lines(out, &entry.key.comment.head, indent);
            }

            push_indent(out, indent);
            self.encode_node(out, &entry.key, 0, true)?;
            out.push(':');

            if is_block_child(&entry.value) {
                out.push('\n');
                self.encode_node(out, &entry.value, indent + self.indent, false)?;
            } else {
                out.push(' ');
                self.encode_inline_entry_value(out, &entry.value, indent)?;
            }
        }
        Ok(())
    }

    /// Emits a value that fits after `: ` or `- ` and terminates its line.
    /// Literal and folded scalars spread over following lines on their own.
    fn encode_inline_entry_value(&self, out: &mut String, node: &Node, indent: usize) -> Result<()> {
        self.encode_node(out, node, indent, true)?;
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(())
    }
}

/// A nested non-empty block collection goes on the lines below its marker.
fn is_block_child(node: &Node) -> bool {
    match &node.body {
        NodeBody::Mapping { entries, style } => {
            *style == crate::node::CollectionStyle::Block && !entries.is_empty()
        }
        NodeBody::Sequence { items, style } => {
            *style == crate::node::CollectionStyle::Block && !items.is_empty()
        }
        _ => false,
    }
}

/// The lines of a block scalar body, without the final empty split segment
/// a trailing newline produces.
fn block_lines(value: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = value.split('\n').collect();
    if value.ends_with('\n') {
        lines.pop();
    }
    lines
}

fn push_chomp_indicator(out: &mut String, value: &str) {
    if !value.ends_with('\n') {
        out.push('-');
    } else if value.ends_with("\n\n") {
        out.push('+');
    }
}

fn push_indent(out: &mut String, spaces: usize) {
    for _ in 0..spaces {
        out.push(' ');
    }
}

fn push_comment_lines(out: &mut String, text: &str, indent: usize) {
    for line in text.trim().split('\n') {
        push_indent(out, indent);
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
}

fn push_double_quoted(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0b' => out.push_str("\\v"),
            '\x0c' => out.push_str("\\f"),
            '\x1b' => out.push_str("\\e"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

/// Whether plain text would be re-read as something other than the same
/// string: a recognized null/bool/number word, text with structural
/// characters, or padding the scanner would trim.
fn needs_quoting(value: &str) -> bool {
    if classify_scalar(value) != TokenKind::String {
        return true;
    }
    if value.contains(|c: char| ":#@*&[]{}|>'\"\n\r\t,".contains(c)) {
        return true;
    }
    if value.starts_with(['!', '%', '?', ' ']) || value.ends_with(' ') {
        return true;
    }
    if value == "-" || value.starts_with("- ") {
        return true;
    }
    value.parse::<f64>().is_ok()
}
