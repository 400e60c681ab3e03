//! Position and range predicates, indentation helpers.
//!
//! All functions here are pure and allocation-free except [`indent`].

use super::span::{Position, Range};

/// Check whether `a` sorts before `b` by (line, character).
///
/// With `include_equal`, equal positions also satisfy the predicate.
pub fn is_before(a: Position, b: Position, include_equal: bool) -> bool {
    if include_equal { a <= b } else { a < b }
}

/// Check whether `position` lies inside `range`, boundaries included.
pub fn position_contained(range: Range, position: Position) -> bool {
    is_before(range.start, position, true) && is_before(position, range.end, true)
}

/// Like [`position_contained`], but a position exactly on `range.end` is outside.
pub fn position_contained_strict(range: Range, position: Position) -> bool {
    is_before(range.start, position, true) && is_before(position, range.end, false)
}

/// Check whether both ends of `inner` lie within `outer` (boundaries included).
pub fn range_contained(outer: Range, inner: Range) -> bool {
    position_contained(outer, inner.start) && position_contained(outer, inner.end)
}

/// Indentation level of a column offset for a given tab width.
///
/// Returns `-1` for negative offsets and for a zero tab width; callers treat
/// negative results as "no known indentation".
pub fn get_indent_level(column_offset: i64, tab_width: u32) -> i64 {
    if column_offset < 0 || tab_width == 0 {
        return -1;
    }
    column_offset.div_euclid(i64::from(tab_width))
}

/// Literal indentation: `levels` repetitions of a tab or of `width` spaces.
pub fn indent(width: u32, use_tabs: bool, levels: usize) -> String {
    if use_tabs {
        "\t".repeat(levels)
    } else {
        " ".repeat(width as usize * levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
        Range::from_coords(sl, sc, el, ec)
    }

    #[test]
    fn test_is_before() {
        let a = Position::new(1, 5);
        let b = Position::new(1, 6);
        let c = Position::new(2, 0);

        assert!(is_before(a, b, false));
        assert!(is_before(a, c, false));
        assert!(!is_before(b, a, false));
        assert!(!is_before(a, a, false));
        assert!(is_before(a, a, true));
    }

    #[test]
    fn test_position_contained_boundaries() {
        let r = range(5, 10, 5, 20);

        assert!(position_contained(r, Position::new(5, 10)));
        assert!(position_contained(r, Position::new(5, 20)));
        assert!(position_contained_strict(r, Position::new(5, 10)));
        assert!(!position_contained_strict(r, Position::new(5, 20)));
    }

    #[test]
    fn test_position_contained_multiline() {
        let r = range(5, 10, 7, 5);

        assert!(position_contained(r, Position::new(5, 15)));
        assert!(position_contained(r, Position::new(6, 0)));
        assert!(position_contained(r, Position::new(7, 3)));

        assert!(!position_contained(r, Position::new(5, 9)));
        assert!(!position_contained(r, Position::new(7, 6)));
        assert!(!position_contained(r, Position::new(4, 15)));
    }

    #[test]
    fn test_range_contained() {
        let outer = range(1, 0, 10, 0);

        assert!(range_contained(outer, range(2, 0, 3, 4)));
        assert!(range_contained(outer, outer));
        assert!(!range_contained(outer, range(0, 5, 3, 4)));
        assert!(!range_contained(outer, range(9, 0, 10, 1)));
    }

    #[rstest]
    #[case(0, 4, 0)]
    #[case(3, 4, 0)]
    #[case(4, 4, 1)]
    #[case(9, 4, 2)]
    #[case(6, 2, 3)]
    #[case(-1, 4, -1)]
    #[case(-8, 4, -1)]
    #[case(8, 0, -1)]
    fn test_get_indent_level(#[case] offset: i64, #[case] tab_width: u32, #[case] expected: i64) {
        assert_eq!(get_indent_level(offset, tab_width), expected);
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent(4, false, 2), "        ");
        assert_eq!(indent(2, false, 1), "  ");
        assert_eq!(indent(4, true, 3), "\t\t\t");
        assert_eq!(indent(4, false, 0), "");
    }
}
