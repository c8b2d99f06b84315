//! Byte-level scanner.
//!
//! The scanner walks the input a byte at a time, tracking line, column, and
//! offset, and produces the token stream the parser consumes. It keeps a
//! single-slot pushback buffer so the parser can look one token ahead. Flow
//! context (`[` / `{` nesting) changes how `,` and scalar termination are
//! handled.
//!
//! Lexical failures do not abort the scan; they surface as
//! [`TokenKind::Error`] tokens carrying a message and the position of the
//! offending input.

use crate::token::{Position, Token, TokenKind};

/// Block scalar chomping behavior, from the `+` / `-` header indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomping {
    /// `-` strip all trailing newlines.
    Strip,
    /// No indicator: collapse trailing newlines to exactly one.
    Clip,
    /// `+` keep all trailing newlines.
    Keep,
}

pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    flow_depth: usize,
    pushback: Option<Token>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            flow_depth: 0,
            pushback: None,
        }
    }

    /// Returns the next token. After the input is exhausted this returns
    /// `Eof` tokens forever.
    pub fn scan(&mut self) -> Token {
        if let Some(token) = self.pushback.take() {
            return token;
        }
        self.scan_next()
    }

    /// Returns a token to the scanner so the next `scan` yields it again.
    /// Only one token can be held at a time.
    pub fn push_back(&mut self, token: Token) {
        debug_assert!(self.pushback.is_none(), "pushback slot already occupied");
        self.pushback = Some(token);
    }

    fn scan_next(&mut self) -> Token {
        self.skip_whitespace();

        if self.is_eof() {
            return self.make_token(TokenKind::Eof, "");
        }

        let ch = self.peek();

        if ch == b'#' {
            return self.scan_comment();
        }

        if ch == b'\n' {
            return self.scan_newline();
        }

        if self.column == 1 && ch == b'-' && self.peek_at(1) == b'-' && self.peek_at(2) == b'-' {
            return self.scan_marker(TokenKind::DocumentStart, "---");
        }

        if self.column == 1 && ch == b'.' && self.peek_at(1) == b'.' && self.peek_at(2) == b'.' {
            return self.scan_marker(TokenKind::DocumentEnd, "...");
        }

        if ch == b'-' && self.peek_at(1) == b' ' {
            let token = self.make_token(TokenKind::SequenceItem, "-");
            self.advance();
            self.advance();
            return token;
        }

        if ch == b'[' {
            let token = self.make_token(TokenKind::FlowSequenceStart, "[");
            self.advance();
            self.flow_depth += 1;
            return token;
        }

        if ch == b']' {
            let token = self.make_token(TokenKind::FlowSequenceEnd, "]");
            self.advance();
            self.flow_depth = self.flow_depth.saturating_sub(1);
            return token;
        }

        if ch == b'{' {
            let token = self.make_token(TokenKind::FlowMappingStart, "{");
            self.advance();
            self.flow_depth += 1;
            return token;
        }

        if ch == b'}' {
            let token = self.make_token(TokenKind::FlowMappingEnd, "}");
            self.advance();
            self.flow_depth = self.flow_depth.saturating_sub(1);
            return token;
        }

        if ch == b',' && self.flow_depth > 0 {
            let token = self.make_token(TokenKind::FlowEntry, ",");
            self.advance();
            return token;
        }

        if ch == b':' && (self.peek_at(1) == b' ' || self.peek_at(1) == b'\n' || self.is_eof_at(1))
        {
            let token = self.make_token(TokenKind::Key, ":");
            self.advance();
            return token;
        }

        if ch == b'|' {
            return self.scan_literal_block();
        }

        if ch == b'>' {
            return self.scan_folded_block();
        }

        if ch == b'\'' {
            return self.scan_single_quoted();
        }

        if ch == b'"' {
            return self.scan_double_quoted();
        }

        if ch == b'&' {
            return self.scan_name(TokenKind::Anchor);
        }

        if ch == b'*' {
            return self.scan_name(TokenKind::Alias);
        }

        if ch == b'!' {
            return self.scan_tag();
        }

        self.scan_scalar()
    }

    fn scan_comment(&mut self) -> Token {
        let start = self.position();
        self.advance();

        let mut text = Vec::new();
        while !self.is_eof() && self.peek() != b'\n' {
            text.push(self.peek());
            self.advance();
        }

        let value = String::from_utf8_lossy(&text).trim().to_string();
        Token::new(TokenKind::Comment, value, start)
    }

    fn scan_newline(&mut self) -> Token {
        let token = self.make_token(TokenKind::Newline, "\n");
        self.advance_newline();
        token
    }

    fn scan_marker(&mut self, kind: TokenKind, text: &str) -> Token {
        let token = self.make_token(kind, text);
        self.advance();
        self.advance();
        self.advance();
        token
    }

    fn scan_literal_block(&mut self) -> Token {
        let start = self.position();
        self.advance();

        let chomping = self.scan_chomping();
        self.skip_to_end_of_line();
        if !self.is_eof() && self.peek() == b'\n' {
            self.advance_newline();
        }

        let base = self.count_indent();
        let mut content: Vec<u8> = Vec::new();

        // Base indentation of zero means there is no content more indented
        // than the surrounding structure.
        if base > 0 {
            while !self.is_eof() {
                let indent = self.count_indent();
                if indent < base && self.peek() != b'\n' {
                    break;
                }

                // Strip the base indentation; deeper indentation is content.
                self.skip_indent(base.min(indent));

                while !self.is_eof() && self.peek() != b'\n' {
                    content.push(self.peek());
                    self.advance();
                }

                if !self.is_eof() {
                    content.push(b'\n');
                    self.advance_newline();
                }
            }
        }

        let value = apply_chomping(String::from_utf8_lossy(&content).into_owned(), chomping);
        Token::new(TokenKind::LiteralBlock, value, start)
    }

    fn scan_folded_block(&mut self) -> Token {
        let start = self.position();
        self.advance();

        let chomping = self.scan_chomping();
        self.skip_to_end_of_line();
        if !self.is_eof() && self.peek() == b'\n' {
            self.advance_newline();
        }

        let base = self.count_indent();
        let mut content: Vec<u8> = Vec::new();
        let mut last_was_empty = false;

        if base > 0 {
            while !self.is_eof() {
                let indent = self.count_indent();
                if indent < base && self.peek() != b'\n' {
                    break;
                }

                self.skip_indent(base.min(indent));

                let line_empty = self.is_eof() || self.peek() == b'\n';
                if !line_empty {
                    // Consecutive content lines fold into one with a single
                    // space; after a blank line no joining space is added.
                    if !content.is_empty() && !last_was_empty {
                        content.push(b' ');
                    }
                    while !self.is_eof() && self.peek() != b'\n' {
                        content.push(self.peek());
                        self.advance();
                    }
                    last_was_empty = false;
                } else {
                    if !content.is_empty() {
                        content.push(b'\n');
                    }
                    last_was_empty = true;
                }

                if !self.is_eof() && self.peek() == b'\n' {
                    self.advance_newline();
                }
            }
        }

        let value = apply_chomping(String::from_utf8_lossy(&content).into_owned(), chomping);
        Token::new(TokenKind::FoldedBlock, value, start)
    }

    fn scan_chomping(&mut self) -> Chomping {
        match self.peek() {
            b'-' => {
                self.advance();
                Chomping::Strip
            }
            b'+' => {
                self.advance();
                Chomping::Keep
            }
            _ => Chomping::Clip,
        }
    }

    fn scan_single_quoted(&mut self) -> Token {
        let start = self.position();
        self.advance();

        let mut text = Vec::new();
        let mut terminated = false;
        while !self.is_eof() {
            let ch = self.peek();
            if ch == b'\'' {
                if self.peek_at(1) == b'\'' {
                    // '' is an escaped single quote
                    text.push(b'\'');
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    terminated = true;
                    break;
                }
            } else {
                text.push(ch);
                if ch == b'\n' {
                    self.advance_newline();
                } else {
                    self.advance();
                }
            }
        }

        if !terminated {
            return Token::new(TokenKind::Error, "unterminated string", start);
        }
        Token::new(
            TokenKind::String,
            String::from_utf8_lossy(&text).into_owned(),
            start,
        )
    }

    fn scan_double_quoted(&mut self) -> Token {
        let start = self.position();
        self.advance();

        let mut text = Vec::new();
        let mut terminated = false;
        while !self.is_eof() {
            let ch = self.peek();
            if ch == b'"' {
                self.advance();
                terminated = true;
                break;
            } else if ch == b'\\' {
                self.advance();
                if !self.is_eof() {
                    let escape = self.peek();
                    self.advance();
                    text.push(match escape {
                        b'n' => b'\n',
                        b't' => b'\t',
                        b'r' => b'\r',
                        b'0' => 0x00,
                        b'a' => 0x07,
                        b'b' => 0x08,
                        b'v' => 0x0b,
                        b'f' => 0x0c,
                        b'e' => 0x1b,
                        // \, ", and anything unrecognized pass through
                        other => other,
                    });
                }
            } else {
                text.push(ch);
                if ch == b'\n' {
                    self.advance_newline();
                } else {
                    self.advance();
                }
            }
        }

        if !terminated {
            return Token::new(TokenKind::Error, "unterminated string", start);
        }
        Token::new(
            TokenKind::String,
            String::from_utf8_lossy(&text).into_owned(),
            start,
        )
    }

    fn scan_name(&mut self, kind: TokenKind) -> Token {
        let start = self.position();
        self.advance();

        let mut name = Vec::new();
        while !self.is_eof() && is_anchor_char(self.peek()) {
            name.push(self.peek());
            self.advance();
        }

        Token::new(kind, String::from_utf8_lossy(&name).into_owned(), start)
    }

    fn scan_tag(&mut self) -> Token {
        let start = self.position();
        let mut tag = vec![b'!'];
        self.advance();

        if !self.is_eof() && self.peek() == b'!' {
            tag.push(b'!');
            self.advance();
        }

        while !self.is_eof() && !self.peek().is_ascii_whitespace() {
            tag.push(self.peek());
            self.advance();
        }

        Token::new(
            TokenKind::Tag,
            String::from_utf8_lossy(&tag).into_owned(),
            start,
        )
    }

    fn scan_scalar(&mut self) -> Token {
        let start = self.position();

        let mut text = Vec::new();
        while !self.is_eof() {
            let ch = self.peek();
            if ch == b':'
                && (self.peek_at(1) == b' ' || self.peek_at(1) == b'\n' || self.is_eof_at(1))
            {
                break;
            }
            if ch == b'\n' || ch == b'#' {
                break;
            }
            if self.flow_depth > 0 && (ch == b',' || ch == b'}' || ch == b']') {
                break;
            }
            text.push(ch);
            self.advance();
        }

        let value = String::from_utf8_lossy(&text).trim().to_string();
        let kind = classify_scalar(&value);
        Token::new(kind, value, start)
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && (self.peek() == b' ' || self.peek() == b'\t') {
            self.advance();
        }
    }

    fn skip_to_end_of_line(&mut self) {
        while !self.is_eof() && self.peek() != b'\n' {
            self.advance();
        }
    }

    fn count_indent(&self) -> usize {
        self.input[self.pos..]
            .iter()
            .take_while(|&&b| b == b' ')
            .count()
    }

    fn skip_indent(&mut self, count: usize) {
        for _ in 0..count {
            if self.is_eof() || self.peek() != b' ' {
                break;
            }
            self.advance();
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column, self.pos)
    }

    fn make_token(&self, kind: TokenKind, value: &str) -> Token {
        Token::new(kind, value, self.position())
    }

    fn peek(&self) -> u8 {
        self.input.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.input.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
            self.column += 1;
        }
    }

    fn advance_newline(&mut self) {
        self.advance();
        self.line += 1;
        self.column = 1;
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn is_eof_at(&self, offset: usize) -> bool {
        self.pos + offset >= self.input.len()
    }
}

fn apply_chomping(value: String, chomping: Chomping) -> String {
    if value.is_empty() {
        return value;
    }
    match chomping {
        Chomping::Strip => value.trim_end_matches('\n').to_string(),
        Chomping::Keep => value,
        Chomping::Clip => {
            let mut clipped = value.trim_end_matches('\n').to_string();
            clipped.push('\n');
            clipped
        }
    }
}

fn is_anchor_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'-'
}

/// Classifies plain scalar text into `Null`, `Boolean`, `Number`, or
/// `String`. The emitter consults this too, to decide which plain strings
/// must be quoted to survive a round trip.
pub(crate) fn classify_scalar(value: &str) -> TokenKind {
    if value.is_empty() || value == "null" || value == "~" {
        return TokenKind::Null;
    }

    let lower = value.to_ascii_lowercase();
    if matches!(
        lower.as_str(),
        "true" | "false" | "yes" | "no" | "on" | "off"
    ) {
        return TokenKind::Boolean;
    }

    if is_number(value) {
        return TokenKind::Number;
    }

    TokenKind::String
}

fn is_number(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }

    if matches!(value, ".inf" | "-.inf" | "+.inf" | ".nan") {
        return true;
    }

    if value.starts_with("0x") || value.starts_with("0o") || value.starts_with("0b") {
        return true;
    }

    if !value.bytes().any(|b| b.is_ascii_digit()) {
        return false;
    }

    let bytes = value.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if !b.is_ascii_digit() && !matches!(b, b'.' | b'-' | b'+' | b'e' | b'E' | b'_') {
            return false;
        }
        if (b == b'-' || b == b'+') && i != 0 && !matches!(bytes[i - 1], b'e' | b'E') {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(input: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(input.as_bytes());
        let mut tokens = Vec::new();
        loop {
            let token = scanner.scan();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        scan_all(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_mapping_tokens() {
        assert_eq!(
            kinds("key: value"),
            [
                TokenKind::String,
                TokenKind::Key,
                TokenKind::String,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_sequence_item() {
        assert_eq!(
            kinds("- item"),
            [TokenKind::SequenceItem, TokenKind::String, TokenKind::Eof]
        );
    }

    #[test]
    fn test_document_markers_at_column_one() {
        assert_eq!(
            kinds("---\n..."),
            [
                TokenKind::DocumentStart,
                TokenKind::Newline,
                TokenKind::DocumentEnd,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_flow_tokens() {
        assert_eq!(
            kinds("[1, 2]"),
            [
                TokenKind::FlowSequenceStart,
                TokenKind::Number,
                TokenKind::FlowEntry,
                TokenKind::Number,
                TokenKind::FlowSequenceEnd,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comma_outside_flow_is_scalar_text() {
        let tokens = scan_all("a, b");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, "a, b");
    }

    #[test]
    fn test_comment_is_trimmed() {
        let tokens = scan_all("# a comment ");
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].value, "a comment");
    }

    #[test]
    fn test_scalar_classification() {
        assert_eq!(scan_all("null")[0].kind, TokenKind::Null);
        assert_eq!(scan_all("~")[0].kind, TokenKind::Null);
        assert_eq!(scan_all("True")[0].kind, TokenKind::Boolean);
        assert_eq!(scan_all("off")[0].kind, TokenKind::Boolean);
        assert_eq!(scan_all("42")[0].kind, TokenKind::Number);
        assert_eq!(scan_all("-3.5e2")[0].kind, TokenKind::Number);
        assert_eq!(scan_all("0x1F")[0].kind, TokenKind::Number);
        assert_eq!(scan_all(".inf")[0].kind, TokenKind::Number);
        assert_eq!(scan_all("hello")[0].kind, TokenKind::String);
        assert_eq!(scan_all("e")[0].kind, TokenKind::String);
    }

    #[test]
    fn test_single_quoted_escape() {
        let tokens = scan_all("'it''s'");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, "it's");
    }

    #[test]
    fn test_double_quoted_escapes() {
        let tokens = scan_all(r#""a\nb\tc\\d\"e""#);
        assert_eq!(tokens[0].value, "a\nb\tc\\d\"e");
    }

    #[test]
    fn test_unknown_escape_passes_through() {
        let tokens = scan_all(r#""a\qb""#);
        assert_eq!(tokens[0].value, "aqb");
    }

    #[test]
    fn test_unterminated_string_is_error_token() {
        let tokens = scan_all("'never closed");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].pos.line, 1);
        assert_eq!(tokens[0].pos.column, 1);
    }

    #[test]
    fn test_anchor_alias_tag() {
        let tokens = scan_all("&base *base !!str !custom");
        assert_eq!(tokens[0].kind, TokenKind::Anchor);
        assert_eq!(tokens[0].value, "base");
        assert_eq!(tokens[1].kind, TokenKind::Alias);
        assert_eq!(tokens[1].value, "base");
        assert_eq!(tokens[2].kind, TokenKind::Tag);
        assert_eq!(tokens[2].value, "!!str");
        assert_eq!(tokens[3].kind, TokenKind::Tag);
        assert_eq!(tokens[3].value, "!custom");
    }

    #[test]
    fn test_positions() {
        let tokens = scan_all("key: value\nnext: 1");
        assert_eq!(tokens[0].pos, Position::new(1, 1, 0));
        let next = tokens.iter().find(|t| t.value == "next").unwrap();
        assert_eq!(next.pos.line, 2);
        assert_eq!(next.pos.column, 1);
    }

    #[test]
    fn test_push_back() {
        let mut scanner = Scanner::new(b"a: b");
        let first = scanner.scan();
        assert_eq!(first.value, "a");
        let second = scanner.scan();
        assert_eq!(second.kind, TokenKind::Key);
        scanner.push_back(second.clone());
        assert_eq!(scanner.scan(), second);
        assert_eq!(scanner.scan().value, "b");
    }

    #[test]
    fn test_literal_block_clip() {
        let tokens = scan_all("key: |\n  line1\n  line2\n");
        let block = tokens
            .iter()
            .find(|t| t.kind == TokenKind::LiteralBlock)
            .unwrap();
        assert_eq!(block.value, "line1\nline2\n");
    }

    #[test]
    fn test_literal_block_preserves_relative_indent() {
        let tokens = scan_all("key: |\n  line1\n    deeper\n");
        let block = tokens
            .iter()
            .find(|t| t.kind == TokenKind::LiteralBlock)
            .unwrap();
        assert_eq!(block.value, "line1\n  deeper\n");
    }

    #[test]
    fn test_literal_block_strip_and_keep() {
        let strip = scan_all("key: |-\n  text\n\n");
        let block = strip
            .iter()
            .find(|t| t.kind == TokenKind::LiteralBlock)
            .unwrap();
        assert_eq!(block.value, "text");

        let keep = scan_all("key: |+\n  text\n\n");
        let block = keep
            .iter()
            .find(|t| t.kind == TokenKind::LiteralBlock)
            .unwrap();
        assert_eq!(block.value, "text\n\n");
    }

    #[test]
    fn test_folded_block_joins_lines() {
        let tokens = scan_all("key: >\n  line1\n  line2\n\n  line3\n");
        let block = tokens
            .iter()
            .find(|t| t.kind == TokenKind::FoldedBlock)
            .unwrap();
        assert_eq!(block.value, "line1 line2\nline3\n");
    }

    #[test]
    fn test_block_scalar_stops_at_dedent() {
        let tokens = scan_all("key: |\n  inside\nnext: 1");
        let block = tokens
            .iter()
            .find(|t| t.kind == TokenKind::LiteralBlock)
            .unwrap();
        assert_eq!(block.value, "inside\n");
        assert!(tokens.iter().any(|t| t.value == "next"));
    }

    #[test]
    fn test_key_requires_following_space() {
        let tokens = scan_all("a:b");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, "a:b");
    }
}
