//! Logos-based lexer for CDS annotation sources

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

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            offset: 0,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.offset);
        self.offset += text.len() as u32;

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::ERROR,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Logos token enum - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[$A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[regex(r"'([^'\n]|'')*'")]
    String,

    #[regex(r"'([^'\n]|'')*")]
    UnterminatedString,

    #[regex(r"`([^`\\]|\\.)*`")]
    MultilineString,

    #[regex(r"```([^`]|`[^`]|``[^`])*```")]
    TextBlock,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("@")]
    At,

    #[token("#")]
    Hash,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("/")]
    Slash,

    #[token("-")]
    Minus,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("annotate", ignore(ascii_case))]
    Annotate,

    #[token("with", ignore(ascii_case))]
    With,

    #[token("true", ignore(ascii_case))]
    True,

    #[token("false", ignore(ascii_case))]
    False,

    #[token("null", ignore(ascii_case))]
    Null,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Whitespace => SyntaxKind::WHITESPACE,
            LogosToken::LineComment => SyntaxKind::LINE_COMMENT,
            LogosToken::BlockComment => SyntaxKind::BLOCK_COMMENT,
            LogosToken::Ident => SyntaxKind::IDENT,
            LogosToken::Number => SyntaxKind::NUMBER,
            LogosToken::String => SyntaxKind::STRING,
            LogosToken::UnterminatedString => SyntaxKind::UNTERMINATED_STRING,
            LogosToken::MultilineString => SyntaxKind::MULTILINE_STRING,
            LogosToken::TextBlock => SyntaxKind::TEXT_BLOCK,
            LogosToken::At => SyntaxKind::AT,
            LogosToken::Hash => SyntaxKind::HASH,
            LogosToken::Colon => SyntaxKind::COLON,
            LogosToken::Semicolon => SyntaxKind::SEMICOLON,
            LogosToken::Comma => SyntaxKind::COMMA,
            LogosToken::Dot => SyntaxKind::DOT,
            LogosToken::Slash => SyntaxKind::SLASH,
            LogosToken::Minus => SyntaxKind::MINUS,
            LogosToken::LParen => SyntaxKind::L_PAREN,
            LogosToken::RParen => SyntaxKind::R_PAREN,
            LogosToken::LBrace => SyntaxKind::L_BRACE,
            LogosToken::RBrace => SyntaxKind::R_BRACE,
            LogosToken::LBracket => SyntaxKind::L_BRACKET,
            LogosToken::RBracket => SyntaxKind::R_BRACKET,
            LogosToken::Annotate => SyntaxKind::ANNOTATE_KW,
            LogosToken::With => SyntaxKind::WITH_KW,
            LogosToken::True => SyntaxKind::TRUE_KW,
            LogosToken::False => SyntaxKind::FALSE_KW,
            LogosToken::Null => SyntaxKind::NULL_KW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        tokenize(input)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    #[test]
    fn test_annotate_statement() {
        use SyntaxKind::*;
        assert_eq!(
            kinds("annotate Srv.Books with @UI.Hidden;"),
            vec![ANNOTATE_KW, IDENT, DOT, IDENT, WITH_KW, AT, IDENT, DOT, IDENT, SEMICOLON]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        use SyntaxKind::*;
        assert_eq!(kinds("ANNOTATE With TRUE"), vec![ANNOTATE_KW, WITH_KW, TRUE_KW]);
    }

    #[test]
    fn test_string_literals() {
        use SyntaxKind::*;
        assert_eq!(
            kinds("'it''s' `multi\nline` ```block```"),
            vec![STRING, MULTILINE_STRING, TEXT_BLOCK]
        );
        assert_eq!(kinds("'open\n"), vec![UNTERMINATED_STRING]);
    }

    #[test]
    fn test_dollar_identifiers_and_numbers() {
        use SyntaxKind::*;
        assert_eq!(
            kinds("{ $Type: 'x', Max: -1.5e3 }"),
            vec![L_BRACE, IDENT, COLON, STRING, COMMA, IDENT, COLON, MINUS, NUMBER, R_BRACE]
        );
    }

    #[test]
    fn test_comments_are_trivia() {
        let tokens = tokenize("// line\n/* block */ @");
        assert_eq!(tokens[0].kind, SyntaxKind::LINE_COMMENT);
        assert_eq!(tokens[2].kind, SyntaxKind::BLOCK_COMMENT);
        assert_eq!(tokens.last().map(|t| t.kind), Some(SyntaxKind::AT));
    }
}
