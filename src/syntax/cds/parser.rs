//! Recursive descent parser for CDS annotation statements
//!
//! Builds a rowan GreenNode tree from tokens.
//! Supports error recovery and produces a lossless CST.
//!
//! Trivia never starts a node: [`Parser::start_node`] flushes pending
//! whitespace and comments into the enclosing node first, so node ranges
//! begin at their first significant token.

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

/// Parse CDS annotation source into a CST
pub fn parse(input: &str) -> Parse {
    let tokens: Vec<_> = Lexer::new(input).collect();
    let mut parser = Parser::new(&tokens);
    parser.parse_source_file();
    parser.finish()
}

/// Tokens that end the current value or property
const VALUE_RECOVERY: &[SyntaxKind] = &[
    SyntaxKind::COMMA,
    SyntaxKind::SEMICOLON,
    SyntaxKind::R_BRACE,
    SyntaxKind::R_BRACKET,
    SyntaxKind::R_PAREN,
    SyntaxKind::ANNOTATE_KW,
];

/// The parser state
struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
        }
    }

    fn finish(self) -> Parse {
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token inspection (trivia is transparent)
    // =========================================================================

    fn nth_significant(&self, n: usize) -> Option<&Token<'a>> {
        self.tokens[self.pos..]
            .iter()
            .filter(|t| !t.kind.is_trivia())
            .nth(n)
    }

    fn current_kind(&self) -> SyntaxKind {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> SyntaxKind {
        self.nth_significant(n).map(|t| t.kind).unwrap_or(SyntaxKind::ERROR)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.nth_significant(0).is_some_and(|t| t.kind == kind)
    }

    fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.current_kind()) && !self.at_eof()
    }

    fn at_eof(&self) -> bool {
        self.nth_significant(0).is_none()
    }

    /// Range of the next significant token, or an empty range at the end
    fn current_range(&self) -> TextRange {
        match self.nth_significant(0) {
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

    fn skip_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if !token.kind.is_trivia() {
                break;
            }
            self.builder.token(token.kind.into(), token.text);
            self.pos += 1;
        }
    }

    fn bump(&mut self) {
        self.skip_trivia();
        if let Some(token) = self.tokens.get(self.pos) {
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

    fn expect(&mut self, kind: SyntaxKind, what: &str) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(format!("expected {}", what));
            false
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let range = self.current_range();
        self.errors.push(SyntaxError::new(message, range));
    }

    /// Report an error and wrap tokens up to a recovery point in an ERROR node
    fn error_recover(&mut self, message: impl Into<String>, recovery: &[SyntaxKind]) {
        self.error(message);
        if self.at_eof() || self.at_any(recovery) {
            return;
        }
        self.start_node(SyntaxKind::ERROR);
        while !self.at_eof() && !self.at_any(recovery) {
            self.bump();
        }
        self.finish_node();
    }

    // =========================================================================
    // Node building
    // =========================================================================

    fn start_node(&mut self, kind: SyntaxKind) {
        self.skip_trivia();
        self.builder.start_node(kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_source_file(&mut self) {
        self.builder.start_node(SyntaxKind::SOURCE_FILE.into());
        while !self.at_eof() {
            if self.at(SyntaxKind::ANNOTATE_KW) {
                self.parse_annotate();
            } else if self.at(SyntaxKind::SEMICOLON) {
                self.bump();
            } else {
                self.error_recover("expected `annotate` statement", &[SyntaxKind::ANNOTATE_KW]);
            }
        }
        self.skip_trivia();
        self.finish_node();
    }

    /// `annotate <Target> [with] <annotations> [{ elements }] ;`
    fn parse_annotate(&mut self) {
        self.start_node(SyntaxKind::ANNOTATE);
        self.bump(); // annotate

        if self.at(SyntaxKind::IDENT) {
            self.parse_target_name();
        } else {
            self.error("expected annotation target");
        }
        self.eat(SyntaxKind::WITH_KW);

        loop {
            match self.current_kind() {
                _ if self.at_eof() => {
                    self.error("expected `;`");
                    break;
                }
                SyntaxKind::AT => self.parse_annotation_prefix(),
                SyntaxKind::L_BRACE => self.parse_element_block(),
                SyntaxKind::SEMICOLON => {
                    self.bump();
                    break;
                }
                SyntaxKind::ANNOTATE_KW => {
                    self.error("expected `;`");
                    break;
                }
                _ => self.error_recover(
                    "expected annotation or `;`",
                    &[SyntaxKind::AT, SyntaxKind::SEMICOLON, SyntaxKind::ANNOTATE_KW],
                ),
            }
        }
        self.finish_node();
    }

    fn parse_target_name(&mut self) {
        self.start_node(SyntaxKind::TARGET_NAME);
        self.bump();
        while self.at(SyntaxKind::DOT) && self.nth(1) == SyntaxKind::IDENT {
            self.bump();
            self.bump();
        }
        self.finish_node();
    }

    /// `{ element @A @B; ... }`
    fn parse_element_block(&mut self) {
        self.start_node(SyntaxKind::ELEMENT_BLOCK);
        self.bump(); // {
        while !self.at_eof() && !self.at(SyntaxKind::R_BRACE) {
            if self.at(SyntaxKind::IDENT) {
                self.start_node(SyntaxKind::ELEMENT_ENTRY);
                self.bump();
                while self.at(SyntaxKind::AT) {
                    self.parse_annotation_prefix();
                }
                if !self.eat(SyntaxKind::SEMICOLON) && !self.at(SyntaxKind::R_BRACE) {
                    self.error_recover(
                        "expected `;` after element annotations",
                        &[SyntaxKind::SEMICOLON, SyntaxKind::R_BRACE],
                    );
                    self.eat(SyntaxKind::SEMICOLON);
                }
                self.finish_node();
            } else {
                self.error_recover(
                    "expected element name",
                    &[SyntaxKind::SEMICOLON, SyntaxKind::R_BRACE],
                );
                self.eat(SyntaxKind::SEMICOLON);
            }
        }
        self.expect(SyntaxKind::R_BRACE, "`}`");
        self.finish_node();
    }

    // =========================================================================
    // Annotations
    // =========================================================================

    /// `@Name: value` or `@( Name: value, ... )`
    fn parse_annotation_prefix(&mut self) {
        if self.nth(1) == SyntaxKind::L_PAREN {
            self.start_node(SyntaxKind::ANNOTATION_GROUP);
            self.bump(); // @
            self.bump(); // (
            while !self.at_eof() && !self.at(SyntaxKind::R_PAREN) {
                if self.at(SyntaxKind::IDENT) || self.at(SyntaxKind::AT) {
                    self.parse_assignment();
                } else {
                    self.error_recover(
                        "expected annotation name",
                        &[SyntaxKind::COMMA, SyntaxKind::R_PAREN, SyntaxKind::SEMICOLON],
                    );
                    if self.at(SyntaxKind::SEMICOLON) {
                        break;
                    }
                }
                if !self.eat(SyntaxKind::COMMA) {
                    break;
                }
            }
            self.expect(SyntaxKind::R_PAREN, "`)`");
            self.finish_node();
        } else {
            self.parse_assignment();
        }
    }

    fn parse_assignment(&mut self) {
        self.start_node(SyntaxKind::ANNOTATION_ASSIGNMENT);
        self.eat(SyntaxKind::AT);
        self.parse_annotation_name();
        if self.eat(SyntaxKind::COLON) {
            self.parse_value();
        }
        self.finish_node();
    }

    /// `UI.LineItem`, `UI.LineItem#q`, `UI.LineItem #q`
    fn parse_annotation_name(&mut self) {
        self.start_node(SyntaxKind::ANNOTATION_NAME);
        if self.at(SyntaxKind::IDENT) {
            self.bump();
            while self.at(SyntaxKind::DOT) && self.nth(1) == SyntaxKind::IDENT {
                self.bump();
                self.bump();
            }
        } else {
            self.error("expected annotation name");
        }
        if self.at(SyntaxKind::HASH) {
            self.start_node(SyntaxKind::QUALIFIER);
            self.bump();
            self.expect(SyntaxKind::IDENT, "qualifier");
            self.finish_node();
        }
        self.finish_node();
    }

    // =========================================================================
    // Values
    // =========================================================================

    fn parse_value(&mut self) {
        match self.current_kind() {
            _ if self.at_eof() => self.error("expected value"),
            SyntaxKind::L_BRACE => self.parse_record(),
            SyntaxKind::L_BRACKET => self.parse_collection(),
            SyntaxKind::HASH => {
                self.start_node(SyntaxKind::ENUM_VALUE);
                self.bump();
                self.expect(SyntaxKind::IDENT, "enum member name");
                self.finish_node();
            }
            SyntaxKind::IDENT => {
                self.start_node(SyntaxKind::PATH_VALUE);
                self.bump();
                while matches!(self.current_kind(), SyntaxKind::DOT | SyntaxKind::SLASH)
                    && self.nth(1) == SyntaxKind::IDENT
                {
                    self.bump();
                    self.bump();
                }
                self.finish_node();
            }
            SyntaxKind::MINUS if self.nth(1) == SyntaxKind::NUMBER => {
                self.start_node(SyntaxKind::LITERAL);
                self.bump();
                self.bump();
                self.finish_node();
            }
            SyntaxKind::UNTERMINATED_STRING => {
                self.error("unterminated string literal");
                self.start_node(SyntaxKind::LITERAL);
                self.bump();
                self.finish_node();
            }
            kind if kind.is_literal() => {
                self.start_node(SyntaxKind::LITERAL);
                self.bump();
                self.finish_node();
            }
            _ => self.error_recover("expected value", VALUE_RECOVERY),
        }
    }

    /// `{ Key: value, @Nested: value, ... }`
    fn parse_record(&mut self) {
        self.start_node(SyntaxKind::RECORD);
        self.bump(); // {
        while !self.at_eof() && !self.at(SyntaxKind::R_BRACE) {
            match self.current_kind() {
                SyntaxKind::AT => self.parse_assignment(),
                SyntaxKind::IDENT => {
                    self.start_node(SyntaxKind::RECORD_PROPERTY);
                    self.bump();
                    while self.at(SyntaxKind::DOT) && self.nth(1) == SyntaxKind::IDENT {
                        self.bump();
                        self.bump();
                    }
                    if self.expect(SyntaxKind::COLON, "`:`") {
                        self.parse_value();
                    }
                    self.finish_node();
                }
                _ => self.error_recover(
                    "expected property name",
                    &[SyntaxKind::COMMA, SyntaxKind::R_BRACE, SyntaxKind::SEMICOLON],
                ),
            }
            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        self.expect(SyntaxKind::R_BRACE, "`}`");
        self.finish_node();
    }

    /// `[ value, value, ... ]`
    fn parse_collection(&mut self) {
        self.start_node(SyntaxKind::COLLECTION);
        self.bump(); // [
        while !self.at_eof() && !self.at(SyntaxKind::R_BRACKET) {
            self.parse_value();
            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        self.expect(SyntaxKind::R_BRACKET, "`]`");
        self.finish_node();
    }
}
