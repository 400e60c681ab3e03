//! Syntax kinds for the CDS annotation CST
//!
//! This enum defines all node and token kinds of the declarative
//! annotation syntax: `annotate` statements, annotation assignments and
//! annotation values.

/// All syntax kinds (tokens and nodes) of the CDS annotation syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    WHITESPACE = 0,
    LINE_COMMENT,
    BLOCK_COMMENT,

    // =========================================================================
    // LITERALS
    // =========================================================================
    IDENT,              // Books, $Type
    NUMBER,             // 42, 3.14, 1e10
    STRING,             // 'text', 'it''s'
    UNTERMINATED_STRING, // 'text<newline>
    MULTILINE_STRING,   // `text`
    TEXT_BLOCK,         // ```text```

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    AT,                 // @
    HASH,               // #
    COLON,              // :
    SEMICOLON,          // ;
    COMMA,              // ,
    DOT,                // .
    SLASH,              // /
    MINUS,              // -
    L_PAREN,            // (
    R_PAREN,            // )
    L_BRACE,            // {
    R_BRACE,            // }
    L_BRACKET,          // [
    R_BRACKET,          // ]

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    ANNOTATE_KW,
    WITH_KW,
    TRUE_KW,
    FALSE_KW,
    NULL_KW,

    // =========================================================================
    // NODES
    // =========================================================================
    SOURCE_FILE,
    ANNOTATE,
    TARGET_NAME,
    ANNOTATION_GROUP,
    ANNOTATION_ASSIGNMENT,
    ANNOTATION_NAME,
    QUALIFIER,
    ELEMENT_BLOCK,
    ELEMENT_ENTRY,
    RECORD,
    RECORD_PROPERTY,
    COLLECTION,
    PATH_VALUE,
    ENUM_VALUE,
    LITERAL,

    ERROR,

    #[doc(hidden)]
    __LAST,
}

impl SyntaxKind {
    /// Check if this is a trivia token (whitespace or comment)
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::LINE_COMMENT | Self::BLOCK_COMMENT)
    }

    /// Check if this token can stand alone as a literal value
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Self::NUMBER
                | Self::STRING
                | Self::UNTERMINATED_STRING
                | Self::MULTILINE_STRING
                | Self::TEXT_BLOCK
                | Self::TRUE_KW
                | Self::FALSE_KW
                | Self::NULL_KW
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

impl From<rowan::SyntaxKind> for SyntaxKind {
    fn from(raw: rowan::SyntaxKind) -> Self {
        assert!(raw.0 < SyntaxKind::__LAST as u16);
        // Safety: we control all syntax kinds and check bounds above
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }
}

/// Language definition for Rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CdsLanguage {}

impl rowan::Language for CdsLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<CdsLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<CdsLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<CdsLanguage>;
