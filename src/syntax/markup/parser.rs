//! Recursive descent parser for the markup syntax
//!
//! Builds a rowan GreenNode tree from tokens.
//! Supports error recovery and produces a lossless CST.

use super::lexer::{Lexer, Token};
use super::syntax_kind::SyntaxKind;
use crate::syntax::SyntaxError;
use rowan::{GreenNode, GreenNodeBuilder, TextRange, TextSize};

/// Parse result containing the green tree and any errors
#[derive(Debug, Clone)]
pub struct Parse {
    pub green: GreenNode,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    /// Get the root syntax node
    pub fn syntax(&self) -> super::SyntaxNode {
        super::SyntaxNode::new_root(self.green.clone())
    }

    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse markup source into a CST
pub fn parse(input: &str) -> Parse {
    let tokens: Vec<_> = Lexer::new(input).collect();
    let mut parser = Parser::new(&tokens);
    parser.parse_document();
    parser.finish()
}

/// The parser state
struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
    /// Names of the elements currently open, innermost last
    open: Vec<&'a str>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            open: Vec::new(),
        }
    }

    fn finish(self) -> Parse {
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> SyntaxKind {
        self.current().map(|t| t.kind).unwrap_or(SyntaxKind::ERROR)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        !self.at_eof() && self.current_kind() == kind
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Look ahead `n` tokens, skipping whitespace
    fn nth_token(&self, n: usize) -> Option<&Token<'a>> {
        self.tokens[self.pos..]
            .iter()
            .filter(|t| t.kind != SyntaxKind::WHITESPACE)
            .nth(n)
    }

    /// Range of the current token, or an empty range at the end of input
    fn current_range(&self) -> TextRange {
        match self.current() {
            Some(token) => TextRange::at(token.offset, TextSize::of(token.text)),
            None => {
                let end = self
                    .tokens
                    .last()
                    .map(|t| t.offset + TextSize::of(t.text))
                    .unwrap_or_default();
                TextRange::empty(end)
            }
        }
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) {
        if let Some(token) = self.current() {
            self.builder.token(token.kind.into(), token.text);
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.at(SyntaxKind::WHITESPACE) {
            self.bump();
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let range = self.current_range();
        self.errors.push(SyntaxError::new(message, range));
    }

    fn error_at(&mut self, message: impl Into<String>, range: TextRange) {
        self.errors.push(SyntaxError::new(message, range));
    }

    /// Wrap the current token in an ERROR node and report it
    fn error_bump(&mut self, message: impl Into<String>) {
        self.error(message);
        self.builder.start_node(SyntaxKind::ERROR.into());
        self.bump();
        self.builder.finish_node();
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn parse_document(&mut self) {
        self.builder.start_node(SyntaxKind::DOCUMENT.into());
        while !self.at_eof() {
            match self.current_kind() {
                SyntaxKind::L_ANGLE => self.parse_element(),
                SyntaxKind::L_ANGLE_SLASH => {
                    self.builder.start_node(SyntaxKind::ERROR.into());
                    self.error("closing tag without matching start tag");
                    self.parse_end_tag_tokens();
                    self.builder.finish_node();
                }
                kind if kind.is_trivia() || kind == SyntaxKind::TEXT => self.bump(),
                _ => self.error_bump("unexpected token outside of an element"),
            }
        }
        self.builder.finish_node();
    }

    fn parse_element(&mut self) {
        self.builder.start_node(SyntaxKind::ELEMENT.into());
        let start = self.current_range().start();

        self.builder.start_node(SyntaxKind::START_TAG.into());
        self.bump(); // <
        let name = if self.at(SyntaxKind::NAME) {
            let name = self.current().map(|t| t.text).unwrap_or_default();
            self.bump();
            Some(name)
        } else {
            self.error("expected element name");
            None
        };

        let self_closing = loop {
            self.skip_whitespace();
            match self.current_kind() {
                _ if self.at_eof() => {
                    self.error("unterminated start tag");
                    break None;
                }
                SyntaxKind::NAME => self.parse_attribute(),
                SyntaxKind::R_ANGLE => {
                    self.bump();
                    break Some(false);
                }
                SyntaxKind::SLASH_R_ANGLE => {
                    self.bump();
                    break Some(true);
                }
                SyntaxKind::L_ANGLE | SyntaxKind::L_ANGLE_SLASH => {
                    self.error("unterminated start tag");
                    break None;
                }
                _ => self.error_bump("unexpected token in start tag"),
            }
        };
        self.builder.finish_node(); // START_TAG

        if self_closing == Some(false) {
            if let Some(name) = name {
                self.open.push(name);
                self.parse_content(name, start);
                self.open.pop();
            } else {
                self.parse_content("", start);
            }
        }

        self.builder.finish_node(); // ELEMENT
    }

    fn parse_attribute(&mut self) {
        self.builder.start_node(SyntaxKind::ATTRIBUTE.into());
        let name_range = self.current_range();
        self.bump(); // NAME

        let has_eq = self
            .nth_token(0)
            .map(|t| t.kind == SyntaxKind::EQ)
            .unwrap_or(false);
        if has_eq {
            self.skip_whitespace();
            self.bump(); // =
            let has_value = self
                .nth_token(0)
                .map(|t| t.kind == SyntaxKind::STRING)
                .unwrap_or(false);
            if has_value {
                self.skip_whitespace();
                self.bump();
            } else {
                self.error("expected attribute value");
            }
        } else {
            self.error_at("attribute without value", name_range);
        }
        self.builder.finish_node();
    }

    fn parse_content(&mut self, name: &str, element_start: TextSize) {
        self.builder.start_node(SyntaxKind::CONTENT.into());
        let closed = loop {
            if self.at_eof() {
                break false;
            }
            match self.current_kind() {
                SyntaxKind::L_ANGLE => self.parse_element(),
                SyntaxKind::L_ANGLE_SLASH => break true,
                SyntaxKind::TEXT
                | SyntaxKind::CDATA
                | SyntaxKind::COMMENT
                | SyntaxKind::PROCESSING_INSTRUCTION
                | SyntaxKind::DOCTYPE => self.bump(),
                _ => self.error_bump("unexpected token in element content"),
            }
        };
        self.builder.finish_node(); // CONTENT

        if !closed {
            let range = TextRange::new(element_start, self.current_range().end());
            self.error_at(format!("element `{}` is not closed", name), range);
            return;
        }

        let end_name = self
            .nth_token(1)
            .filter(|t| t.kind == SyntaxKind::NAME)
            .map(|t| t.text);
        match end_name {
            Some(end_name) if end_name != name && self.closes_ancestor(end_name) => {
                // Leave the end tag for the enclosing element
                let range = TextRange::new(element_start, self.current_range().start());
                self.error_at(format!("element `{}` is not closed", name), range);
            }
            Some(end_name) if end_name != name => {
                self.error(format!(
                    "closing tag `{}` does not match element `{}`",
                    end_name, name
                ));
                self.parse_end_tag();
            }
            _ => self.parse_end_tag(),
        }
    }

    fn closes_ancestor(&self, name: &str) -> bool {
        // The innermost entry is the element being closed
        self.open
            .iter()
            .rev()
            .skip(1)
            .any(|open| *open == name)
    }

    fn parse_end_tag(&mut self) {
        self.builder.start_node(SyntaxKind::END_TAG.into());
        self.parse_end_tag_tokens();
        self.builder.finish_node();
    }

    fn parse_end_tag_tokens(&mut self) {
        self.bump(); // </
        self.skip_whitespace();
        if !self.eat(SyntaxKind::NAME) {
            self.error("expected element name in closing tag");
        }
        self.skip_whitespace();
        if !self.eat(SyntaxKind::R_ANGLE) {
            self.error("expected `>`");
        }
    }
}
