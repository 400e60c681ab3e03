//! Logos-based lexer for the markup syntax.
//!
//! Markup needs two lexing modes: character data between tags and the
//! interior of a tag. The lexer switches between two logos token sets with
//! `morph` whenever a tag opens or closes.

use super::syntax_kind::SyntaxKind;
use logos::Logos;
use rowan::TextSize;

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

enum Mode<'a> {
    Content(logos::Lexer<'a, ContentToken>),
    Tag(logos::Lexer<'a, TagToken>),
}

/// Lexer wrapping the two logos-generated tokenizers
pub struct Lexer<'a> {
    mode: Option<Mode<'a>>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            mode: Some(Mode::Content(ContentToken::lexer(input))),
            offset: 0,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (kind, text, mode) = match self.mode.take()? {
            Mode::Content(mut lex) => {
                let token = lex.next()?;
                let text = lex.slice();
                match token {
                    Ok(ContentToken::LAngle) => (SyntaxKind::L_ANGLE, text, Mode::Tag(lex.morph())),
                    Ok(ContentToken::LAngleSlash) => {
                        (SyntaxKind::L_ANGLE_SLASH, text, Mode::Tag(lex.morph()))
                    }
                    Ok(t) => (t.into(), text, Mode::Content(lex)),
                    Err(()) => (SyntaxKind::ERROR, text, Mode::Content(lex)),
                }
            }
            Mode::Tag(mut lex) => {
                let token = lex.next()?;
                let text = lex.slice();
                match token {
                    Ok(TagToken::RAngle) => (SyntaxKind::R_ANGLE, text, Mode::Content(lex.morph())),
                    Ok(TagToken::SlashRAngle) => {
                        (SyntaxKind::SLASH_R_ANGLE, text, Mode::Content(lex.morph()))
                    }
                    // A new tag opening means the previous one was never closed
                    Ok(TagToken::LAngle) => (SyntaxKind::L_ANGLE, text, Mode::Tag(lex)),
                    Ok(TagToken::LAngleSlash) => (SyntaxKind::L_ANGLE_SLASH, text, Mode::Tag(lex)),
                    Ok(t) => (t.into(), text, Mode::Tag(lex)),
                    Err(()) => (SyntaxKind::ERROR, text, Mode::Tag(lex)),
                }
            }
        };
        self.mode = Some(mode);

        let offset = TextSize::new(self.offset);
        self.offset += text.len() as u32;

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Tokens between tags
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum ContentToken {
    #[token("<")]
    LAngle,

    #[token("</")]
    LAngleSlash,

    #[regex(r"<!--([^-]|-[^-])*-->")]
    Comment,

    #[regex(r"<!\[CDATA\[([^\]]|\][^\]]|\]\][^>])*\]\]>")]
    CData,

    #[regex(r"<\?([^?]|\?[^>])*\?>")]
    ProcessingInstruction,

    #[regex(r"<![A-Z][^>]*>")]
    Doctype,

    #[regex(r"[^<]+")]
    Text,
}

impl From<ContentToken> for SyntaxKind {
    fn from(token: ContentToken) -> Self {
        match token {
            ContentToken::LAngle => SyntaxKind::L_ANGLE,
            ContentToken::LAngleSlash => SyntaxKind::L_ANGLE_SLASH,
            ContentToken::Comment => SyntaxKind::COMMENT,
            ContentToken::CData => SyntaxKind::CDATA,
            ContentToken::ProcessingInstruction => SyntaxKind::PROCESSING_INSTRUCTION,
            ContentToken::Doctype => SyntaxKind::DOCTYPE,
            ContentToken::Text => SyntaxKind::TEXT,
        }
    }
}

/// Tokens inside a start or end tag
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum TagToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"[A-Za-z_][A-Za-z0-9_.\-]*(:[A-Za-z_][A-Za-z0-9_.\-]*)?")]
    Name,

    #[token("=")]
    Eq,

    #[regex(r#""[^"<]*""#)]
    #[regex(r"'[^'<]*'")]
    String,

    #[token(">")]
    RAngle,

    #[token("/>")]
    SlashRAngle,

    #[token("<")]
    LAngle,

    #[token("</")]
    LAngleSlash,
}

impl From<TagToken> for SyntaxKind {
    fn from(token: TagToken) -> Self {
        match token {
            TagToken::Whitespace => SyntaxKind::WHITESPACE,
            TagToken::Name => SyntaxKind::NAME,
            TagToken::Eq => SyntaxKind::EQ,
            TagToken::String => SyntaxKind::STRING,
            TagToken::RAngle => SyntaxKind::R_ANGLE,
            TagToken::SlashRAngle => SyntaxKind::SLASH_R_ANGLE,
            TagToken::LAngle => SyntaxKind::L_ANGLE,
            TagToken::LAngleSlash => SyntaxKind::L_ANGLE_SLASH,
        }
    }
}
