//! Parser: token stream → node tree.
//!
//! The parser drives the scanner one token at a time, using the scanner's
//! single-slot pushback for the "is this a mapping?" lookahead. It resolves
//! aliases to deep clones at parse time through a parse-local anchor table,
//! and gathers comment tokens into a pending buffer that is attached to the
//! next node or mapping entry.

use std::collections::HashMap;

use log::trace;

use crate::error::{Error, Result};
use crate::node::{CollectionStyle, Entry, Node, NodeBody, ScalarStyle};
use crate::scanner::Scanner;
use crate::token::{Position, Token, TokenKind};

pub struct Parser<'a> {
    input: &'a [u8],
    scanner: Scanner<'a>,
    current: Token,
    anchors: HashMap<String, Node>,
    pending_comments: Vec<String>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            scanner: Scanner::new(input),
            current: Token::new(TokenKind::Eof, "", Position::default()),
            anchors: HashMap::new(),
            pending_comments: Vec::new(),
        }
    }

    /// Consumes the whole input and returns a `Document` node. Multi-document
    /// streams land as multiple entries in the document's content.
    pub fn parse(&mut self) -> Result<Node> {
        self.advance();

        let mut doc = Node::document();
        doc.pos = self.current.pos;
        let mut content = Vec::new();

        // A key at column 1 starts a root mapping.
        if self.current.pos.column == 1 && self.is_mapping_start() {
            content.push(self.parse_mapping()?);
        }

        loop {
            self.skip_newlines();
            match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::DocumentStart | TokenKind::DocumentEnd => self.advance(),
                _ => {
                    if let Some(mut node) = self.parse_value()? {
                        self.attach_line_comment(&mut node);
                        content.push(node);
                    }
                    self.skip_newlines();
                }
            }
        }

        if let NodeBody::Document { content: slot } = &mut doc.body {
            *slot = content;
        }
        Ok(doc)
    }

    fn parse_value(&mut self) -> Result<Option<Node>> {
        self.skip_newlines();
        self.collect_comments();
        trace!("parse_value: {}", self.current);

        match self.current.kind {
            TokenKind::Eof | TokenKind::DocumentEnd => Ok(None),
            TokenKind::Error => Err(self.lexical_error()),

            TokenKind::Null => Ok(Some(self.take_scalar("!!null"))),

            TokenKind::Boolean => {
                if self.is_mapping_start() {
                    return self.parse_mapping().map(Some);
                }
                Ok(Some(self.take_scalar("!!bool")))
            }

            TokenKind::Number => {
                if self.is_mapping_start() {
                    return self.parse_mapping().map(Some);
                }
                let tag = number_tag(&self.current.value);
                Ok(Some(self.take_scalar(tag)))
            }

            TokenKind::String => {
                if self.is_mapping_start() {
                    return self.parse_mapping().map(Some);
                }
                Ok(Some(self.take_scalar("!!str")))
            }

            TokenKind::LiteralBlock => Ok(Some(self.take_block_scalar(ScalarStyle::Literal))),
            TokenKind::FoldedBlock => Ok(Some(self.take_block_scalar(ScalarStyle::Folded))),

            TokenKind::SequenceItem => self.parse_sequence().map(Some),
            TokenKind::FlowSequenceStart => self.parse_flow_sequence().map(Some),
            TokenKind::FlowMappingStart => self.parse_flow_mapping().map(Some),

            TokenKind::Anchor => {
                let name = self.current.value.clone();
                self.advance();
                let mut node = self.parse_value()?.unwrap_or_else(Node::null);
                node.anchor = Some(name.clone());
                // Later anchors with the same name overwrite earlier ones.
                self.anchors.insert(name, node.clone());
                Ok(Some(node))
            }

            TokenKind::Alias => {
                let name = self.current.value.clone();
                let pos = self.current.pos;
                self.advance();
                match self.anchors.get(&name) {
                    Some(node) => {
                        let mut clone = node.clone();
                        clone.anchor = None;
                        clone.pos = pos;
                        Ok(Some(clone))
                    }
                    None => Err(Error::UndefinedAlias {
                        name,
                        line: pos.line,
                        column: pos.column,
                    }),
                }
            }

            TokenKind::Tag => {
                let tag = self.current.value.clone();
                self.advance();
                let mut node = self.parse_value()?.unwrap_or_else(Node::null);
                node.tag = tag;
                Ok(Some(node))
            }

            _ => Err(Error::UnexpectedToken {
                found: self.current.to_string(),
                line: self.current.pos.line,
                column: self.current.pos.column,
            }),
        }
    }

    /// Builds a scalar from the current token and advances past it. The
    /// quote style is recovered from the source byte at the token's offset.
    fn take_scalar(&mut self, tag: &str) -> Node {
        let style = match self.input.get(self.current.pos.offset) {
            Some(b'\'') => ScalarStyle::SingleQuoted,
            Some(b'"') => ScalarStyle::DoubleQuoted,
            _ => ScalarStyle::Plain,
        };
        let mut node = Node::styled_scalar(self.current.value.clone(), style);
        node.tag = tag.to_string();
        node.pos = self.current.pos;
        self.attach_comments(&mut node);
        self.advance();
        node
    }

    fn take_block_scalar(&mut self, style: ScalarStyle) -> Node {
        let mut node = Node::styled_scalar(self.current.value.clone(), style);
        node.tag = "!!str".to_string();
        node.pos = self.current.pos;
        self.attach_comments(&mut node);
        self.advance();
        node
    }

    fn parse_sequence(&mut self) -> Result<Node> {
        let mut node = Node::sequence();
        node.pos = self.current.pos;
        self.attach_comments(&mut node);

        let item_column = self.current.pos.column;
        let mut items = Vec::new();

        while self.current.kind == TokenKind::SequenceItem
            && self.current.pos.column == item_column
        {
            let marker = self.current.pos;
            self.advance();
            self.skip_newlines();
            self.collect_comments();

            // A dedent (or end of input) right after the marker means the
            // item has no value.
            let missing = matches!(self.current.kind, TokenKind::Eof | TokenKind::DocumentEnd)
                || (self.current.pos.line > marker.line
                    && self.current.pos.column <= marker.column);
            let mut value = if missing {
                Node::null()
            } else {
                self.parse_value()?.unwrap_or_else(Node::null)
            };
            self.attach_line_comment(&mut value);
            items.push(value);
            self.skip_newlines();
            // A comment between items must not end the sequence; it belongs
            // to the item that follows.
            self.collect_comments();
        }

        if let NodeBody::Sequence { items: slot, .. } = &mut node.body {
            *slot = items;
        }
        Ok(node)
    }

    fn parse_mapping(&mut self) -> Result<Node> {
        trace!("parse_mapping: starting at {}", self.current.pos);
        let mut node = Node::mapping();
        node.pos = self.current.pos;

        let mut entries: Vec<Entry> = Vec::new();
        let mut start_column = 0;
        let mut first = true;

        while !matches!(self.current.kind, TokenKind::Eof | TokenKind::DocumentEnd) {
            self.skip_newlines();
            self.collect_comments();

            if matches!(
                self.current.kind,
                TokenKind::Eof | TokenKind::DocumentEnd | TokenKind::SequenceItem
            ) {
                break;
            }
            if self.current.kind == TokenKind::Error {
                return Err(self.lexical_error());
            }

            if first {
                start_column = self.current.pos.column;
                first = false;
            } else if self.current.pos.column != start_column {
                // Dedent or deeper indent: this key belongs to another level.
                break;
            }

            if !matches!(
                self.current.kind,
                TokenKind::String | TokenKind::Number | TokenKind::Boolean | TokenKind::Null
            ) {
                break;
            }

            let head = self.take_pending();
            let key = self.take_scalar("");

            self.skip_newlines();
            if self.current.kind != TokenKind::Key {
                // Not an entry after all; leave the token for the caller.
                break;
            }
            self.advance();
            self.skip_newlines();
            self.collect_comments();

            // A token at or left of the key column on a later line is a
            // sibling or dedent, so the entry's value is null. A sequence
            // marker at the key column is the exception: it is the value.
            let missing = matches!(self.current.kind, TokenKind::Eof | TokenKind::DocumentEnd)
                || (self.current.pos.line > key.pos.line
                    && (self.current.pos.column < start_column
                        || (self.current.pos.column == start_column
                            && self.current.kind != TokenKind::SequenceItem)));
            let mut value = if missing {
                Node::null()
            } else {
                self.parse_value()?.unwrap_or_else(Node::null)
            };
            self.attach_line_comment(&mut value);

            let mut entry = Entry::new(key, value);
            if !head.is_empty() {
                if entries.is_empty() {
                    // Comments above the first key lead the mapping itself.
                    entry.key.comment.head = head;
                } else {
                    // Comments between entries describe the entry that follows.
                    entry.comment.key = head;
                }
            }
            entries.push(entry);
            self.skip_newlines();
        }

        if let NodeBody::Mapping { entries: slot, .. } = &mut node.body {
            *slot = entries;
        }
        Ok(node)
    }

    fn parse_flow_sequence(&mut self) -> Result<Node> {
        let mut node = Node::sequence();
        node.pos = self.current.pos;
        self.attach_comments(&mut node);
        if let NodeBody::Sequence { style, .. } = &mut node.body {
            *style = CollectionStyle::Flow;
        }

        let open = self.current.pos;
        self.advance();
        let mut items = Vec::new();

        while self.current.kind != TokenKind::FlowSequenceEnd {
            self.skip_newlines();
            self.collect_comments();

            if self.current.kind == TokenKind::FlowSequenceEnd {
                break;
            }
            if self.current.kind == TokenKind::Eof {
                return Err(Error::UnclosedFlowSequence {
                    line: open.line,
                    column: open.column,
                });
            }

            if let Some(value) = self.parse_value()? {
                items.push(value);
            }
            self.skip_newlines();

            if self.current.kind == TokenKind::FlowEntry {
                self.advance();
                self.skip_newlines();
            }
        }
        self.advance();

        if let NodeBody::Sequence { items: slot, .. } = &mut node.body {
            *slot = items;
        }
        Ok(node)
    }

    fn parse_flow_mapping(&mut self) -> Result<Node> {
        let mut node = Node::mapping();
        node.pos = self.current.pos;
        self.attach_comments(&mut node);
        if let NodeBody::Mapping { style, .. } = &mut node.body {
            *style = CollectionStyle::Flow;
        }

        let open = self.current.pos;
        self.advance();
        let mut entries = Vec::new();

        while self.current.kind != TokenKind::FlowMappingEnd {
            self.skip_newlines();
            self.collect_comments();

            if self.current.kind == TokenKind::FlowMappingEnd {
                break;
            }
            if self.current.kind == TokenKind::Eof {
                return Err(Error::UnclosedFlowMapping {
                    line: open.line,
                    column: open.column,
                });
            }

            if !matches!(
                self.current.kind,
                TokenKind::String | TokenKind::Number | TokenKind::Boolean | TokenKind::Null
            ) {
                return Err(Error::ExpectedKey {
                    found: self.current.to_string(),
                    line: self.current.pos.line,
                    column: self.current.pos.column,
                });
            }
            let key = self.take_scalar("");

            self.skip_newlines();
            if self.current.kind != TokenKind::Key {
                return Err(Error::ExpectedColon {
                    found: self.current.to_string(),
                    line: self.current.pos.line,
                    column: self.current.pos.column,
                });
            }
            self.advance();
            self.skip_newlines();
            self.collect_comments();

            let value = self.parse_value()?.unwrap_or_else(Node::null);
            entries.push(Entry::new(key, value));
            self.skip_newlines();

            if self.current.kind == TokenKind::FlowEntry {
                self.advance();
                self.skip_newlines();
            }
        }
        self.advance();

        if let NodeBody::Mapping { entries: slot, .. } = &mut node.body {
            *slot = entries;
        }
        Ok(node)
    }

    /// One-token lookahead: is the current scalar the key of a mapping?
    fn is_mapping_start(&mut self) -> bool {
        if !matches!(
            self.current.kind,
            TokenKind::String | TokenKind::Number | TokenKind::Boolean
        ) {
            return false;
        }
        let next = self.scanner.scan();
        let is_key = next.kind == TokenKind::Key;
        self.scanner.push_back(next);
        is_key
    }

    fn advance(&mut self) {
        self.current = self.scanner.scan();
    }

    fn skip_newlines(&mut self) {
        while self.current.kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn collect_comments(&mut self) {
        while self.current.kind == TokenKind::Comment {
            self.pending_comments.push(self.current.value.clone());
            self.advance();
            self.skip_newlines();
        }
    }

    fn take_pending(&mut self) -> String {
        if self.pending_comments.is_empty() {
            return String::new();
        }
        self.pending_comments.drain(..).collect::<Vec<_>>().join("\n")
    }

    fn attach_comments(&mut self, node: &mut Node) {
        let head = self.take_pending();
        if !head.is_empty() {
            node.comment.head = head;
        }
    }

    /// Attaches a comment token on the same line as the node as its trailing
    /// `line` comment.
    fn attach_line_comment(&mut self, node: &mut Node) {
        if self.current.kind == TokenKind::Comment && self.current.pos.line == node.pos.line {
            node.comment.line = self.current.value.clone();
            self.advance();
        }
    }

    fn lexical_error(&self) -> Error {
        Error::Lexical {
            message: self.current.value.clone(),
            line: self.current.pos.line,
            column: self.current.pos.column,
        }
    }
}

fn number_tag(value: &str) -> &'static str {
    if value.contains(['.', 'e', 'E']) {
        "!!float"
    } else {
        "!!int"
    }
}
