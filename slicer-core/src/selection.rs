//! Token range selection used to drive slicing and splitting

use crate::section::Span;

/// A selection over the global token stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenSelection {
    pub anchor: usize,
    pub cursor: usize,
}

impl TokenSelection {
    /// Create a new selection at a single token
    pub fn new(index: usize) -> Self {
        Self {
            anchor: index,
            cursor: index,
        }
    }

    /// Selection from `anchor` to `cursor`
    pub fn range_of(anchor: usize, cursor: usize) -> Self {
        Self { anchor, cursor }
    }

    /// Selection covering a whole span
    pub fn of_span(span: Span) -> Self {
        Self::range_of(span.start, span.end)
    }

    /// Get the selection range as (min, max) inclusive
    pub fn range(&self) -> (usize, usize) {
        let a = self.anchor.min(self.cursor);
        let b = self.anchor.max(self.cursor);
        (a, b)
    }
}

/// Range a selection control should offer around a section: the span widened
/// by `margin` tokens on each side, clamped to the token stream.
pub fn window(span: Span, margin: usize, stream_len: usize) -> (usize, usize) {
    let last = stream_len.saturating_sub(1);
    let lower = span.start.saturating_sub(margin).min(last);
    let upper = span.end.saturating_add(margin).min(last);
    (lower, upper.max(lower))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_forward_selection() {
        let sel = TokenSelection {
            anchor: 5,
            cursor: 10,
        };
        assert_eq!(sel.range(), (5, 10));
    }

    #[test]
    fn test_range_backward_selection() {
        let sel = TokenSelection {
            anchor: 10,
            cursor: 5,
        };
        assert_eq!(sel.range(), (5, 10));
    }

    #[test]
    fn test_range_single_token() {
        let sel = TokenSelection::new(7);
        assert_eq!(sel.range(), (7, 7));
    }

    #[test]
    fn test_window_widens_span() {
        assert_eq!(window(Span::new(100, 120), 80, 1000), (20, 200));
    }

    #[test]
    fn test_window_clamps_to_stream() {
        assert_eq!(window(Span::new(5, 12), 80, 40), (0, 39));
        assert_eq!(window(Span::new(0, 0), 0, 0), (0, 0));
    }
}
