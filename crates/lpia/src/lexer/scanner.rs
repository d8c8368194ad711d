//! Lexer implementation using logos, plus the indentation layout pass

use super::token::{Token, TokenKind};
use crate::common::{AnalysisError, AnalysisResult, LineIndex, Span};
use logos::Logos;
use std::collections::VecDeque;

/// Lexer for LPI source code
///
/// Lazily yields tokens, turning leading whitespace into `Indent` and
/// `Dedent` tokens. The sequence always ends with exactly one `Eof`.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    lines: LineIndex,
    pending: VecDeque<Token>,
    /// Open indentation widths; the bottom entry is always 0
    indents: Vec<usize>,
    /// Whitespace character the file indents with, once known
    indent_char: Option<char>,
    /// Depth of open `(` / `[` groups
    groups: usize,
    /// Byte offset of the current line's start, when it still needs a layout check
    line_start: Option<usize>,
    /// Whether the current logical line produced a token
    line_has_content: bool,
    finished: bool,
    done: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            lines: LineIndex::new(source),
            pending: VecDeque::new(),
            indents: vec![0],
            indent_char: None,
            groups: 0,
            line_start: Some(0),
            line_has_content: false,
            finished: false,
            done: false,
        }
    }

    /// Rewind to the start of the source
    pub fn restart(&mut self) {
        *self = Lexer::new(self.inner.source());
    }

    /// Get the next token
    pub fn next_token(&mut self) -> AnalysisResult<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(token);
            }

            if self.finished {
                return Ok(self.eof_token());
            }

            if let Some(offset) = self.line_start.take() {
                self.layout_line(offset)?;
                continue;
            }

            match self.inner.next() {
                Some(Ok(TokenKind::Newline)) => {
                    if self.groups > 0 {
                        continue;
                    }
                    let span = self.current_span();
                    if self.line_has_content {
                        self.pending.push_back(Token::new(TokenKind::Newline, span));
                        self.line_has_content = false;
                    }
                    self.line_start = Some(span.end);
                }
                Some(Ok(kind)) => {
                    if kind.opens_group() {
                        self.groups += 1;
                    } else if kind.closes_group() {
                        self.groups = self.groups.saturating_sub(1);
                    }
                    self.line_has_content = true;
                    let span = self.current_span();
                    return Ok(Token::new(kind, span));
                }
                Some(Err(())) => {
                    let span = self.current_span();
                    let character = self.inner.slice().chars().next().unwrap_or('\0');
                    return Err(AnalysisError::unexpected_character(character, span));
                }
                None => self.finish(),
            }
        }
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> AnalysisResult<&Token> {
        if self.pending.is_empty() {
            let token = self.next_token()?;
            self.pending.push_front(token);
        }
        Ok(&self.pending[0])
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize_all(self) -> AnalysisResult<Vec<Token>> {
        self.collect()
    }

    /// Get the source being lexed
    pub fn source(&self) -> &'a str {
        self.inner.source()
    }

    fn current_span(&self) -> Span {
        let range = self.inner.span();
        self.lines.span(self.inner.source(), range.start, range.end)
    }

    fn eof_token(&self) -> Token {
        let len = self.inner.source().len();
        Token::new(TokenKind::Eof, self.lines.span(self.inner.source(), len, len))
    }

    /// Close the last line and every open indentation level
    fn finish(&mut self) {
        let end = self.eof_token().span;
        if self.line_has_content {
            self.pending.push_back(Token::new(TokenKind::Newline, end));
            self.line_has_content = false;
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.pending.push_back(Token::new(TokenKind::Dedent, end));
        }
        self.finished = true;
    }

    /// Compare the indentation of the line starting at `offset` with the open levels
    fn layout_line(&mut self, offset: usize) -> AnalysisResult<()> {
        let source = self.inner.source();
        let rest = &source[offset..];
        let width = rest.find(|c: char| c != ' ' && c != '\t').unwrap_or(rest.len());
        let indent = &rest[..width];

        // blank and comment-only lines do not take part in layout
        if matches!(rest[width..].chars().next(), None | Some('\n' | '\r' | '#')) {
            return Ok(());
        }

        let span = self.lines.span(source, offset, offset + width);
        if indent.contains(' ') && indent.contains('\t') {
            return Err(AnalysisError::indentation("inconsistent use of tabs and spaces", span));
        }
        if let Some(c) = indent.chars().next() {
            match self.indent_char {
                None => self.indent_char = Some(c),
                Some(expected) if expected != c => {
                    return Err(AnalysisError::indentation(
                        format!("indented with {}, but earlier lines use {}", describe(c), describe(expected)),
                        span,
                    ));
                }
                Some(_) => {}
            }
        }

        let current = self.indents.last().copied().unwrap_or(0);
        if width > current {
            self.indents.push(width);
            self.pending.push_back(Token::new(TokenKind::Indent, span));
        } else if width < current {
            while self.indents.last().is_some_and(|&open| open > width) {
                self.indents.pop();
                self.pending.push_back(Token::new(TokenKind::Dedent, span));
            }
            if self.indents.last() != Some(&width) {
                return Err(AnalysisError::indentation(
                    "unindent does not match any outer indentation level",
                    span,
                ));
            }
        }
        Ok(())
    }
}

fn describe(c: char) -> &'static str {
    if c == '\t' { "tabs" } else { "spaces" }
}

impl Iterator for Lexer<'_> {
    type Item = AnalysisResult<Token>;

    /// Yields every token through `Eof`, or a single error, then stops
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_token();
        if !matches!(&result, Ok(token) if token.kind != TokenKind::Eof) {
            self.done = true;
        }
        Some(result)
    }
}
