//! Settings format parser.
//!
//! A small line-oriented block format:
//!
//! ```text
//! # comment
//! rootProject: demo
//! pluginManagement {
//!     repositories {
//!         gradlePluginPortal
//!     }
//! }
//! plugins {
//!     id: com.example.tool version 1.2.0
//! }
//! ```
//!
//! The input is read in chunks through a [`FormatPreservingReader`]. A byte
//! lexer produces token events counted in characters, and the tree builder
//! asks the reader for every prefix and token text by offset, the same way
//! an external parser driven by an event stream would.

use std::io::{ErrorKind, Read};

use remold_tree::{Document, Node, Token};

use crate::reader::{FormatPreservingReader, OffsetUnit, TokenEvent};
use crate::{ParseError, Parser};

const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Deepest block nesting accepted.
const MAX_DEPTH: usize = 128;

/// Parser for the settings format.
#[derive(Debug, Clone)]
pub struct SettingsParser {
    chunk_size: usize,
}

impl SettingsParser {
    /// Creates a parser with the default chunk size.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Reads the input in chunks of `chunk_size` bytes (at least one).
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Parses everything `input` yields.
    pub fn parse_reader<R: Read>(&self, input: R) -> Result<Document, ParseError> {
        let mut reader = FormatPreservingReader::with_unit(input, OffsetUnit::Char);
        let mut lexer = Lexer::default();
        let mut chunk = vec![0u8; self.chunk_size];
        let mut total_bytes = 0;

        loop {
            let read = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            total_bytes += read;
            lexer.feed(&chunk[..read]);
        }

        let tokens = lexer.finish()?;
        let mut builder = TreeBuilder {
            reader: &mut reader,
            tokens,
            position: 0,
            last_end: 0,
        };
        let document = builder.build()?;
        Ok(document.with_source_len(total_bytes))
    }
}

impl Default for SettingsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for SettingsParser {
    fn name(&self) -> &str {
        "settings"
    }

    fn extensions(&self) -> &[&str] {
        &["settings", "conf"]
    }

    fn parse(&self, source: &str) -> Result<Document, ParseError> {
        self.parse_reader(source.as_bytes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Atom,
    Colon,
    LBrace,
    RBrace,
}

impl TokenKind {
    fn describe(self) -> &'static str {
        match self {
            TokenKind::Atom => "word",
            TokenKind::Colon => "':'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LexToken {
    kind: TokenKind,
    start: usize,
    end: usize,
    /// A line break separates this token from the previous one.
    newline_before: bool,
}

impl TokenEvent for LexToken {
    fn start(&self) -> usize {
        self.start
    }

    fn end(&self) -> usize {
        self.end
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum LexState {
    #[default]
    Idle,
    Atom {
        start: usize,
    },
    Quoted {
        start: usize,
        quote: u8,
        escaped: bool,
    },
    Comment,
}

/// Incremental byte lexer; state survives chunk boundaries.
#[derive(Debug, Default)]
struct Lexer {
    state: LexState,
    /// Characters seen so far.
    count: usize,
    /// Character index of the byte being processed.
    position: usize,
    newline: bool,
    tokens: Vec<LexToken>,
}

impl Lexer {
    fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            // UTF-8 continuation bytes belong to the current character.
            if byte & 0xC0 != 0x80 {
                self.position = self.count;
                self.count += 1;
            }
            self.step(byte);
        }
    }

    fn step(&mut self, byte: u8) {
        match self.state {
            LexState::Idle => self.idle(byte),
            LexState::Atom { start } => {
                if is_delimiter(byte) {
                    self.push(TokenKind::Atom, start, self.position);
                    self.state = LexState::Idle;
                    self.idle(byte);
                }
            }
            LexState::Quoted {
                start,
                quote,
                escaped,
            } => {
                if escaped {
                    self.state = LexState::Quoted {
                        start,
                        quote,
                        escaped: false,
                    };
                } else if byte == b'\\' {
                    self.state = LexState::Quoted {
                        start,
                        quote,
                        escaped: true,
                    };
                } else if byte == quote {
                    self.push(TokenKind::Atom, start, self.position + 1);
                    self.state = LexState::Idle;
                }
            }
            LexState::Comment => {
                if byte == b'\n' {
                    self.newline = true;
                    self.state = LexState::Idle;
                }
            }
        }
    }

    fn idle(&mut self, byte: u8) {
        let position = self.position;
        match byte {
            b'\n' => self.newline = true,
            b'#' => self.state = LexState::Comment,
            b':' => self.push(TokenKind::Colon, position, position + 1),
            b'{' => self.push(TokenKind::LBrace, position, position + 1),
            b'}' => self.push(TokenKind::RBrace, position, position + 1),
            b'"' | b'\'' => {
                self.state = LexState::Quoted {
                    start: position,
                    quote: byte,
                    escaped: false,
                }
            }
            _ if byte.is_ascii_whitespace() => {}
            _ => self.state = LexState::Atom { start: position },
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(LexToken {
            kind,
            start,
            end,
            newline_before: std::mem::take(&mut self.newline),
        });
    }

    fn finish(mut self) -> Result<Vec<LexToken>, ParseError> {
        match self.state {
            LexState::Atom { start } => self.push(TokenKind::Atom, start, self.count),
            LexState::Quoted { start, .. } => {
                return Err(ParseError::invalid_source_at("unterminated quoted string", start));
            }
            LexState::Idle | LexState::Comment => {}
        }
        Ok(self.tokens)
    }
}

fn is_delimiter(byte: u8) -> bool {
    byte.is_ascii_whitespace() || matches!(byte, b':' | b'{' | b'}' | b'#')
}

/// Builds nodes from token events, pulling text out of the reader.
struct TreeBuilder<'r, R> {
    reader: &'r mut FormatPreservingReader<R>,
    tokens: Vec<LexToken>,
    position: usize,
    last_end: usize,
}

impl<R> TreeBuilder<'_, R> {
    fn build(&mut self) -> Result<Document, ParseError> {
        let items = self.parse_items(0)?;
        if let Some(token) = self.peek() {
            return Err(ParseError::invalid_source_at(
                format!("unexpected {}", token.kind.describe()),
                token.start,
            ));
        }
        let eof = self.reader.prefix_between(self.last_end, self.reader.consumed())?;
        Ok(Document::new(Node::block(None, items, None), eof))
    }

    fn peek(&self) -> Option<LexToken> {
        self.tokens.get(self.position).copied()
    }

    /// Consumes the next token, returning its prefix and text.
    fn take(&mut self, token: LexToken) -> Result<(String, String), ParseError> {
        self.position += 1;
        let prefix = self.reader.prefix_before(self.last_end, &token)?;
        let text = self.reader.event_text(&token)?;
        self.last_end = token.end;
        Ok((prefix, text))
    }

    /// Items up to (not including) a closing brace or the end of input.
    fn parse_items(&mut self, depth: usize) -> Result<Vec<Node>, ParseError> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::RBrace => break,
                TokenKind::Atom => items.push(self.parse_item(token, depth)?),
                TokenKind::Colon | TokenKind::LBrace => {
                    return Err(ParseError::invalid_source_at(
                        format!("unexpected {}", token.kind.describe()),
                        token.start,
                    ));
                }
            }
        }
        Ok(items)
    }

    fn parse_item(&mut self, first: LexToken, depth: usize) -> Result<Node, ParseError> {
        let (prefix, name) = self.take(first)?;

        match self.peek() {
            Some(colon) if colon.kind == TokenKind::Colon && !colon.newline_before => {
                let (colon_prefix, colon_text) = self.take(colon)?;
                let value = self.parse_value(colon, depth)?;
                Ok(Node::declaration(
                    Node::literal(name),
                    Some(Token::new(colon_prefix, colon_text)),
                    value,
                )
                .with_prefix(prefix))
            }
            Some(open) if open.kind == TokenKind::LBrace => {
                let block = self.parse_block(open, depth)?;
                Ok(Node::declaration(Node::literal(name), None, block).with_prefix(prefix))
            }
            _ => {
                let mut operands = vec![Node::literal(name)];
                self.collect_line(&mut operands)?;
                Ok(line_node(operands, prefix))
            }
        }
    }

    fn parse_value(&mut self, colon: LexToken, depth: usize) -> Result<Node, ParseError> {
        match self.peek() {
            Some(open) if open.kind == TokenKind::LBrace && !open.newline_before => {
                self.parse_block(open, depth)
            }
            Some(atom) if atom.kind == TokenKind::Atom && !atom.newline_before => {
                let (prefix, text) = self.take(atom)?;
                let mut operands = vec![Node::literal(text)];
                self.collect_line(&mut operands)?;
                Ok(line_node(operands, prefix))
            }
            _ => Err(ParseError::invalid_source_at(
                "expected a value after ':'",
                colon.end,
            )),
        }
    }

    fn parse_block(&mut self, open: LexToken, depth: usize) -> Result<Node, ParseError> {
        if depth >= MAX_DEPTH {
            return Err(ParseError::unsupported(format!(
                "blocks nested deeper than {MAX_DEPTH}"
            )));
        }

        let (prefix, open_text) = self.take(open)?;
        let children = self.parse_items(depth + 1)?;
        match self.peek() {
            Some(close) if close.kind == TokenKind::RBrace => {
                let (close_prefix, close_text) = self.take(close)?;
                Ok(Node::block(
                    Some(Token::bare(open_text)),
                    children,
                    Some(Token::new(close_prefix, close_text)),
                )
                .with_prefix(prefix))
            }
            _ => Err(ParseError::invalid_source_at("unclosed block", open.start)),
        }
    }

    /// Appends the remaining words and colons on the current line.
    fn collect_line(&mut self, operands: &mut Vec<Node>) -> Result<(), ParseError> {
        while let Some(token) = self.peek() {
            let same_line = !token.newline_before;
            if !same_line || !matches!(token.kind, TokenKind::Atom | TokenKind::Colon) {
                break;
            }
            let (prefix, text) = self.take(token)?;
            operands.push(Node::literal(text).with_prefix(prefix));
        }
        Ok(())
    }
}

/// One operand becomes a literal, more become an expression. The line's
/// prefix moves to the outermost node.
fn line_node(mut operands: Vec<Node>, prefix: String) -> Node {
    if operands.len() == 1 {
        let single = operands.remove(0);
        single.with_prefix(prefix)
    } else {
        Node::expression(operands).with_prefix(prefix)
    }
}
