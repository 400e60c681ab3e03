//! Source text positions and ranges.
//!
//! Positions use editor conventions: zero-based lines, and columns counted
//! in UTF-16 code units. Byte offsets coming out of the concrete syntax
//! trees are converted through a [`LineIndex`].

use std::fmt;

use rustc_hash::FxHashMap;

// Re-export from text-size for compatibility
pub use text_size::TextRange;
pub use text_size::TextSize;

/// A line and character position in source text.
///
/// Both line and character are 0-indexed internally, but displayed as 1-indexed.
/// Ordering is lexicographic: line first, then character.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column in UTF-16 code units
    pub character: u32,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Create from 1-indexed line and column (as displayed to users).
    #[inline]
    pub const fn from_one_indexed(line: u32, character: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            character: character.saturating_sub(1),
        }
    }

    /// Get 1-indexed line number (for display).
    #[inline]
    pub const fn line_one_indexed(self) -> u32 {
        self.line + 1
    }

    /// Get 1-indexed column number (for display).
    #[inline]
    pub const fn character_one_indexed(self) -> u32 {
        self.character + 1
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_one_indexed(), self.character_one_indexed())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_one_indexed(), self.character_one_indexed())
    }
}

/// An interval between two positions. `start` is never after `end`.
///
/// Zero-width ranges are insertion points.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a range, swapping the bounds if they are given out of order.
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    /// Create a range from raw coordinates.
    pub fn from_coords(start_line: u32, start_character: u32, end_line: u32, end_character: u32) -> Self {
        Self::new(
            Position::new(start_line, start_character),
            Position::new(end_line, end_character),
        )
    }

    /// A zero-width range at `position`.
    #[inline]
    pub const fn point(position: Position) -> Self {
        Self { start: position, end: position }
    }

    /// Check if this range has zero width.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The smallest range covering both `self` and `other`.
    pub fn cover(self, other: Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}-{:?}", self.start, self.end)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A character on a line that needs more than one UTF-16 code unit or more
/// than one UTF-8 byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct WideChar {
    /// Byte offset from the start of the line
    start: u32,
    /// Length in UTF-8 bytes
    len_utf8: u32,
    /// Length in UTF-16 code units
    len_utf16: u32,
}

/// Index for converting between byte offsets and line/character positions.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<TextSize>,
    /// Non-ASCII characters per line, only for lines that have them
    wide_chars: FxHashMap<u32, Vec<WideChar>>,
    /// Total length of the indexed text
    len: TextSize,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        let mut wide_chars: FxHashMap<u32, Vec<WideChar>> = FxHashMap::default();
        let mut line = 0u32;
        let mut line_start = 0usize;

        for (offset, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
                line += 1;
                line_start = offset + 1;
                continue;
            }
            if !c.is_ascii() {
                wide_chars.entry(line).or_default().push(WideChar {
                    start: (offset - line_start) as u32,
                    len_utf8: c.len_utf8() as u32,
                    len_utf16: c.len_utf16() as u32,
                });
            }
        }

        Self {
            line_starts,
            wide_chars,
            len: TextSize::of(text),
        }
    }

    /// Convert a byte offset to a position.
    pub fn position(&self, offset: TextSize) -> Position {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);

        let line_start = self.line_starts[line];
        let col: u32 = (offset - line_start).into();

        Position {
            line: line as u32,
            character: self.utf8_to_utf16_col(line as u32, col),
        }
    }

    /// Convert a position to a byte offset.
    ///
    /// Returns `None` when the position is past the end of its line, the
    /// line does not exist, or the column falls inside a surrogate pair.
    pub fn offset(&self, position: Position) -> Option<TextSize> {
        let line_start = *self.line_starts.get(position.line as usize)?;
        let line_end = self
            .line_starts
            .get(position.line as usize + 1)
            .copied()
            .unwrap_or(self.len);
        let col = self.utf16_to_utf8_col(position.line, position.character)?;
        let offset = line_start + TextSize::from(col);
        (offset <= line_end).then_some(offset)
    }

    /// Convert a byte range to a position range.
    pub fn range(&self, range: TextRange) -> Range {
        Range {
            start: self.position(range.start()),
            end: self.position(range.end()),
        }
    }

    /// Convert a position range to a byte range.
    pub fn text_range(&self, range: Range) -> Option<TextRange> {
        let start = self.offset(range.start)?;
        let end = self.offset(range.end)?;
        (start <= end).then(|| TextRange::new(start, end))
    }

    /// Get the number of lines.
    pub fn len(&self) -> usize {
        self.line_starts.len()
    }

    /// Check if there are no lines (empty file).
    pub fn is_empty(&self) -> bool {
        self.line_starts.is_empty()
    }

    fn utf8_to_utf16_col(&self, line: u32, col: u32) -> u32 {
        let Some(chars) = self.wide_chars.get(&line) else {
            return col;
        };
        let mut res = col;
        for c in chars {
            if c.start >= col {
                break;
            }
            res = res - c.len_utf8 + c.len_utf16;
        }
        res
    }

    fn utf16_to_utf8_col(&self, line: u32, col: u32) -> Option<u32> {
        let Some(chars) = self.wide_chars.get(&line) else {
            return Some(col);
        };
        let mut res = col;
        let mut utf16_seen = 0u32;
        let mut utf8_seen = 0u32;
        for c in chars {
            // utf16 column where this wide char starts
            let c_col16 = c.start - utf8_seen + utf16_seen;
            if c_col16 >= col {
                break;
            }
            if col < c_col16 + c.len_utf16 {
                return None;
            }
            res = res + c.len_utf8 - c.len_utf16;
            utf8_seen = c.start + c.len_utf8;
            utf16_seen = c_col16 + c.len_utf16;
        }
        Some(res)
    }
}
