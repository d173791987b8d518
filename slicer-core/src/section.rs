//! Sections: titled runs of the document-wide token stream

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::selection::TokenSelection;
use crate::token::{self, Token};

/// Inclusive `(start, end)` range of global token indices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of token indices covered
    pub fn len(&self) -> usize {
        self.end.saturating_add(1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    /// Whether the inclusive range `[start, end]` shares any index with this span
    pub fn intersects(&self, start: usize, end: usize) -> bool {
        start <= self.end && end >= self.start
    }

    /// Number of unowned indices between this span and a later one
    pub fn gap_to(&self, next: &Span) -> usize {
        next.start.saturating_sub(self.end.saturating_add(1))
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Self { start, end }
    }
}

impl From<Span> for (usize, usize) {
    fn from(span: Span) -> Self {
        (span.start, span.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// A titled slice of the document.
///
/// `id` is the section's current position in its document and is rewritten
/// after every structural edit; it is a label, not an identity. `tokens` is
/// always the tokenization of `text`, which is why both are private.
#[derive(Clone, Debug)]
pub struct Section {
    pub id: usize,
    pub title: Option<String>,
    pub spans: Span,
    pub discarded: bool,
    text: String,
    tokens: Vec<Token>,
}

impl Section {
    pub fn new(id: usize, title: Option<String>, text: impl Into<String>, spans: Span) -> Self {
        let text = text.into();
        let tokens = token::tokenize(&text);
        Self {
            id,
            title,
            spans,
            discarded: false,
            text,
            tokens,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Replace the text and recompute tokens
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.tokens = token::tokenize(&self.text);
    }

    pub fn is_active(&self) -> bool {
        !self.discarded
    }

    /// Text of the global range `[start, end]` (inclusive), clamped to this
    /// section's own span. Ranges outside the span give an empty string.
    pub fn slice_text(&self, start: usize, end: usize) -> String {
        let start = start.max(self.spans.start);
        let end = end.min(self.spans.end);
        if start > end {
            return String::new();
        }

        let local_start = start - self.spans.start;
        let local_end = end - self.spans.start + 1;
        token::join(&self.tokens, local_start, local_end)
    }

    /// Token at a global index, if this section owns it
    pub fn token_at(&self, index: usize) -> Option<&Token> {
        if !self.spans.contains(index) {
            return None;
        }
        self.tokens.get(index - self.spans.start)
    }

    /// Default break point for splitting this section.
    ///
    /// Prefers a selection edge strictly inside the span, then the first
    /// paragraph break.
    pub fn suggested_break(&self, selection: &TokenSelection) -> Option<usize> {
        let (start, end) = selection.range();
        let inside = |index: usize| self.spans.start < index && index < self.spans.end;

        if inside(start) {
            return Some(start);
        }
        if inside(end) {
            return Some(end);
        }

        self.tokens
            .iter()
            .position(Token::is_break)
            .map(|local| self.spans.start + local)
            .filter(|&index| inside(index))
    }

    /// Build a section from the global range `[start, end]` of `sources`,
    /// which must be in document order.
    ///
    /// Pieces from contiguous sources are concatenated; a gap between two
    /// sources becomes a paragraph break. Breaks at either edge of the result
    /// are dropped and the span tightened to match, so the new section's span
    /// length always equals its token count. Returns `None` if no word token
    /// falls inside the range.
    pub fn carve(sources: &[&Section], start: usize, end: usize, title: Option<String>) -> Option<Section> {
        if start > end {
            return None;
        }

        let mut picked: Vec<(usize, Token)> = Vec::new();
        let mut previous: Option<Span> = None;

        for source in sources {
            let from = start.max(source.spans.start);
            let to = end.min(source.spans.end);
            if from > to {
                continue;
            }

            if let Some(prev) = previous {
                if prev.gap_to(&source.spans) > 0 && !picked.is_empty() {
                    picked.push((prev.end + 1, Token::Break));
                }
            }

            for index in from..=to {
                if let Some(token) = source.token_at(index) {
                    picked.push((index, token.clone()));
                }
            }
            previous = Some(source.spans);
        }

        while picked.first().is_some_and(|(_, token)| token.is_break()) {
            picked.remove(0);
        }
        while picked.last().is_some_and(|(_, token)| token.is_break()) {
            picked.pop();
        }

        let first = picked.first()?.0;
        let last = picked.last()?.0;
        let tokens: Vec<Token> = picked.into_iter().map(|(_, token)| token).collect();

        Some(Section::new(0, title, token::join_all(&tokens), Span::new(first, last)))
    }

    /// Concatenate two neighbouring sections into one covering both spans.
    ///
    /// Texts meet with a space when the spans are contiguous and with a blank
    /// line when a gap lies between them.
    pub fn merge(lo: &Section, hi: &Section, title: Option<String>) -> Section {
        let separator = if lo.spans.gap_to(&hi.spans) > 0 { "\n\n" } else { " " };
        let text = format!("{}{}{}", lo.text.trim_end(), separator, hi.text.trim_start());
        Section::new(lo.id, title, text, Span::new(lo.spans.start, hi.spans.end))
    }
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Section {}

impl PartialOrd for Section {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Section {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} [{}]",
            self.id,
            self.title.as_deref().unwrap_or("(untitled)"),
            self.spans
        )?;
        if self.discarded {
            f.write_str(" (discarded)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(text: &str, start: usize) -> Section {
        let len = token::tokenize(text).len();
        Section::new(0, Some("t".into()), text, Span::new(start, start + len - 1))
    }

    #[test]
    fn test_span_serializes_as_pair() {
        let json = serde_json::to_string(&Span::new(3, 9)).unwrap();
        assert_eq!(json, "[3,9]");
        let span: Span = serde_json::from_str("[4,5]").unwrap();
        assert_eq!(span, Span::new(4, 5));
    }

    #[test]
    fn test_span_gap() {
        assert_eq!(Span::new(0, 3).gap_to(&Span::new(4, 8)), 0);
        assert_eq!(Span::new(0, 3).gap_to(&Span::new(5, 8)), 1);
        assert_eq!(Span::new(0, 3).len(), 4);
    }

    #[test]
    fn test_span_at_index_limit() {
        let wide = Span::new(0, usize::MAX);
        assert_eq!(wide.len(), usize::MAX);
        assert_eq!(wide.gap_to(&Span::new(5, 8)), 0);
    }

    #[test]
    fn test_slice_text_maps_global_to_local() {
        let s = section("a b c d e", 10);
        assert_eq!(s.slice_text(11, 13), "b c d");
        assert_eq!(s.slice_text(10, 10), "a");
    }

    #[test]
    fn test_slice_text_clamps_silently() {
        let s = section("a b c", 10);
        assert_eq!(s.slice_text(0, 100), "a b c");
        assert_eq!(s.slice_text(12, 50), "c");
        assert_eq!(s.slice_text(0, 5), "");
        assert_eq!(s.slice_text(13, 20), "");
    }

    #[test]
    fn test_set_text_recomputes_tokens() {
        let mut s = section("a b", 0);
        s.set_text("x\n\ny z");
        assert_eq!(s.tokens().len(), 4);
        assert_eq!(s.text(), "x\n\ny z");
    }

    #[test]
    fn test_equality_is_positional() {
        let mut a = section("one", 0);
        let mut b = section("completely different", 5);
        a.id = 2;
        b.id = 2;
        assert_eq!(a, b);
        b.id = 3;
        assert!(a < b);
    }

    #[test]
    fn test_carve_across_contiguous_sources() {
        let a = section("a b c", 0);
        let b = section("d e", 3);
        let carved = Section::carve(&[&a, &b], 1, 3, None).unwrap();
        assert_eq!(carved.text(), "b c d");
        assert_eq!(carved.spans, Span::new(1, 3));
        assert_eq!(carved.tokens().len(), carved.spans.len());
    }

    #[test]
    fn test_carve_tightens_edge_breaks() {
        let s = section("a b\n\nc d", 0);
        // index 2 is the paragraph break
        let head = Section::carve(&[&s], 0, 2, None).unwrap();
        assert_eq!(head.spans, Span::new(0, 1));
        let tail = Section::carve(&[&s], 2, 4, None).unwrap();
        assert_eq!(tail.spans, Span::new(3, 4));
        assert_eq!(tail.text(), "c d");
        assert!(Section::carve(&[&s], 2, 2, None).is_none());
    }

    #[test]
    fn test_carve_bridges_gap_with_break() {
        let a = section("a b", 0);
        let b = section("c d", 3);
        let carved = Section::carve(&[&a, &b], 0, 4, None).unwrap();
        assert_eq!(carved.text(), "a b\n\nc d");
        assert_eq!(carved.spans, Span::new(0, 4));
        assert_eq!(carved.tokens().len(), 5);
    }

    #[test]
    fn test_merge_contiguous_and_gapped() {
        let a = section("a b\n\n", 0);
        let b = section("c", 2);
        let merged = Section::merge(&a, &b, Some("m".into()));
        assert_eq!(merged.text(), "a b c");
        assert_eq!(merged.spans, Span::new(0, 2));

        let c = section("c", 3);
        let merged = Section::merge(&a, &c, None);
        assert_eq!(merged.text(), "a b\n\nc");
        assert_eq!(merged.tokens().len(), merged.spans.len());
    }

    #[test]
    fn test_suggested_break() {
        let s = section("a b\n\nc d", 10);
        assert_eq!(s.suggested_break(&TokenSelection::range_of(11, 30)), Some(11));
        assert_eq!(s.suggested_break(&TokenSelection::range_of(0, 13)), Some(13));
        assert_eq!(s.suggested_break(&TokenSelection::range_of(10, 14)), Some(12));

        let flat = section("a b c", 0);
        assert_eq!(flat.suggested_break(&TokenSelection::range_of(0, 2)), None);
    }
}
