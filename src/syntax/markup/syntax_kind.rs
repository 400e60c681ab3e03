//! Syntax kinds for the markup CST.

/// All syntax kinds (tokens and nodes) of the markup syntax.
///
/// Tokens are leaves (names, strings, text runs, punctuation).
/// Nodes are composite (elements, tags, attributes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    WHITESPACE = 0,     // whitespace inside a tag
    COMMENT,            // <!-- ... -->
    PROCESSING_INSTRUCTION, // <? ... ?>
    DOCTYPE,            // <!DOCTYPE ...>

    // =========================================================================
    // CONTENT TOKENS
    // =========================================================================
    TEXT,               // character data between tags
    CDATA,              // <![CDATA[ ... ]]>

    // =========================================================================
    // TAG TOKENS
    // =========================================================================
    L_ANGLE,            // <
    L_ANGLE_SLASH,      // </
    R_ANGLE,            // >
    SLASH_R_ANGLE,      // />
    NAME,               // edmx:Edmx
    EQ,                 // =
    STRING,             // "value" or 'value'

    // =========================================================================
    // NODES
    // =========================================================================
    DOCUMENT,
    ELEMENT,
    START_TAG,
    ATTRIBUTE,
    CONTENT,
    END_TAG,

    ERROR,

    #[doc(hidden)]
    __LAST,
}

impl SyntaxKind {
    /// Check if this is a trivia token
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WHITESPACE | Self::COMMENT | Self::PROCESSING_INSTRUCTION | Self::DOCTYPE
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
pub enum MarkupLanguage {}

impl rowan::Language for MarkupLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<MarkupLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<MarkupLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<MarkupLanguage>;
