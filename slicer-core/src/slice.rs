//! Slice planning: classify a requested range against the current sections
//!
//! A [`SlicePlan`] is computed from a target section and a global token range.
//! It records whether the range leaves leftover fragments inside the target
//! (inbounds) and whether it reaches into a neighbour (overflow), and it can
//! render every piece the commit would produce. Planning never touches the
//! document, so it can be recomputed on every selection change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Side, SliceError};
use crate::section::{Section, Span};

/// What to do with a leftover fragment of the target section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    /// Concatenate onto the neighbour on the fragment's side
    AppendToAdjacent,
    /// Keep as a section of its own
    NewSection,
    /// Keep as a section of its own, marked discarded
    Discard,
}

impl Disposition {
    pub const ALL: [Disposition; 3] = [
        Disposition::AppendToAdjacent,
        Disposition::NewSection,
        Disposition::Discard,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Disposition::AppendToAdjacent => "append",
            Disposition::NewSection => "new",
            Disposition::Discard => "discard",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown disposition '{0}' (expected append, new or discard)")]
pub struct ParseDispositionError(String);

impl FromStr for Disposition {
    type Err = ParseDispositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" | "append-to-adjacent" => Ok(Disposition::AppendToAdjacent),
            "new" | "new-section" => Ok(Disposition::NewSection),
            "discard" => Ok(Disposition::Discard),
            other => Err(ParseDispositionError(other.to_string())),
        }
    }
}

/// Operator choices accompanying a slice commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceChoices {
    /// Title for the selected range; defaults to the target's title
    pub title: Option<String>,
    pub leading: Option<Disposition>,
    pub leading_title: Option<String>,
    pub trailing: Option<Disposition>,
    pub trailing_title: Option<String>,
}

/// Classification of a range against a target section and its neighbours
#[derive(Debug, Clone)]
pub struct SlicePlan {
    rev: u64,
    position: usize,
    sequence_len: usize,
    start: usize,
    end: usize,
    current: Section,
    predecessor: Option<Section>,
    successor: Option<Section>,
    /// Part of the target before the range stays behind
    pub leading_inbounds: bool,
    /// Part of the target after the range stays behind
    pub trailing_inbounds: bool,
    /// The range starts inside the predecessor
    pub leading_overflow: bool,
    /// The range ends inside the successor
    pub trailing_overflow: bool,
}

impl SlicePlan {
    /// Plan a slice of `sections[id]` to the inclusive range `[start, end]`.
    ///
    /// At the first and last position the range is clamped to the section,
    /// since there is no neighbour to overflow into. Otherwise the range must
    /// intersect the section and may not reach past a neighbour's far edge.
    pub(crate) fn new(
        sections: &[Section],
        id: usize,
        start: usize,
        end: usize,
        rev: u64,
    ) -> Result<Self, SliceError> {
        let len = sections.len();
        let current = sections
            .get(id)
            .ok_or(SliceError::UnknownSection { id, len })?;
        let invalid = SliceError::InvalidRange { id, start, end };

        if start > end {
            return Err(invalid);
        }

        let span = current.spans;
        let mut lo = start;
        let mut hi = end;
        if id == 0 {
            lo = lo.max(span.start);
        }
        if id + 1 == len {
            hi = hi.min(span.end);
        }
        if lo > hi || !span.intersects(lo, hi) {
            return Err(invalid);
        }

        let leading_overflow = lo < span.start;
        let trailing_overflow = hi > span.end;

        let predecessor = if leading_overflow {
            let pred = &sections[id - 1];
            if lo < pred.spans.start {
                return Err(invalid);
            }
            Some(pred.clone())
        } else {
            None
        };

        let successor = if trailing_overflow {
            let succ = &sections[id + 1];
            if hi > succ.spans.end {
                return Err(invalid);
            }
            Some(succ.clone())
        } else {
            None
        };

        Ok(Self {
            rev,
            position: id,
            sequence_len: len,
            start: lo,
            end: hi,
            current: current.clone(),
            predecessor,
            successor,
            leading_inbounds: lo > span.start,
            trailing_inbounds: hi < span.end,
            leading_overflow,
            trailing_overflow,
        })
    }

    /// Document revision the plan was computed against
    pub fn revision(&self) -> u64 {
        self.rev
    }

    /// Position of the target section
    pub fn position(&self) -> usize {
        self.position
    }

    /// Effective range after clamping, inclusive
    pub fn range(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn current(&self) -> &Section {
        &self.current
    }

    pub fn is_first(&self) -> bool {
        self.position == 0
    }

    pub fn is_last(&self) -> bool {
        self.position + 1 == self.sequence_len
    }

    /// Whether the commit needs a disposition for `side`
    pub fn needs_disposition(&self, side: Side) -> bool {
        match side {
            Side::Leading => self.leading_inbounds,
            Side::Trailing => self.trailing_inbounds,
        }
    }

    /// Dispositions the operator may choose for `side`. Appending is not
    /// offered where there is no neighbour on that side.
    pub fn options(&self, side: Side) -> Vec<Disposition> {
        let at_edge = match side {
            Side::Leading => self.is_first(),
            Side::Trailing => self.is_last(),
        };
        Disposition::ALL
            .into_iter()
            .filter(|d| !(at_edge && *d == Disposition::AppendToAdjacent))
            .collect()
    }

    /// Check the operator's dispositions and return the ones that apply
    pub fn resolve(
        &self,
        choices: &SliceChoices,
    ) -> Result<(Option<Disposition>, Option<Disposition>), SliceError> {
        let leading = self.resolve_side(Side::Leading, choices.leading)?;
        let trailing = self.resolve_side(Side::Trailing, choices.trailing)?;
        Ok((leading, trailing))
    }

    fn resolve_side(
        &self,
        side: Side,
        choice: Option<Disposition>,
    ) -> Result<Option<Disposition>, SliceError> {
        if !self.needs_disposition(side) {
            return Ok(None);
        }
        match choice {
            Some(d) if self.options(side).contains(&d) => Ok(Some(d)),
            rejected => Err(SliceError::DispositionRequired { side, rejected }),
        }
    }

    /// Whether `sections` still hold the target and neighbours this plan was
    /// computed from, at the same positions
    pub(crate) fn matches(&self, sections: &[Section]) -> bool {
        if sections.len() != self.sequence_len {
            return false;
        }
        let same = |position: Option<usize>, planned: &Section| {
            position
                .and_then(|p| sections.get(p))
                .is_some_and(|s| same_content(s, planned))
        };

        same(Some(self.position), &self.current)
            && self
                .predecessor
                .as_ref()
                .map_or(true, |pred| same(self.position.checked_sub(1), pred))
            && self
                .successor
                .as_ref()
                .map_or(true, |succ| same(Some(self.position + 1), succ))
    }

    /// Text of the leftover before the range, if any
    pub fn leading_fragment_text(&self) -> Option<String> {
        self.leading_fragment(None).map(|s| s.text().to_string())
    }

    /// Text of the leftover after the range, if any
    pub fn trailing_fragment_text(&self) -> Option<String> {
        self.trailing_fragment(None).map(|s| s.text().to_string())
    }

    /// Text of the selected range, including any overflowed neighbour parts
    pub fn selected_text(&self) -> String {
        self.selected_section(None)
            .map(|s| s.text().to_string())
            .unwrap_or_default()
    }

    pub(crate) fn selected_section(&self, title: Option<String>) -> Option<Section> {
        let mut sources: Vec<&Section> = Vec::with_capacity(3);
        sources.extend(self.predecessor.as_ref());
        sources.push(&self.current);
        sources.extend(self.successor.as_ref());

        let title = title.or_else(|| self.current.title.clone());
        Section::carve(&sources, self.start, self.end, title)
    }

    pub(crate) fn leading_fragment(&self, title: Option<String>) -> Option<Section> {
        if !self.leading_inbounds {
            return None;
        }
        Section::carve(&[&self.current], self.current.spans.start, self.start - 1, title)
    }

    pub(crate) fn trailing_fragment(&self, title: Option<String>) -> Option<Section> {
        if !self.trailing_inbounds {
            return None;
        }
        Section::carve(&[&self.current], self.end + 1, self.current.spans.end, title)
    }

    /// What remains of the predecessor after the overflow is taken from it.
    /// `None` when the whole predecessor is consumed.
    pub(crate) fn trimmed_predecessor(&self) -> Option<Section> {
        let pred = self.predecessor.as_ref()?;
        if self.start == 0 {
            return None;
        }
        let mut rest = Section::carve(&[pred], pred.spans.start, self.start - 1, pred.title.clone())?;
        rest.discarded = pred.discarded;
        Some(rest)
    }

    /// What remains of the successor after the overflow is taken from it
    pub(crate) fn trimmed_successor(&self) -> Option<Section> {
        let succ = self.successor.as_ref()?;
        let mut rest = Section::carve(&[succ], self.end + 1, succ.spans.end, succ.title.clone())?;
        rest.discarded = succ.discarded;
        Some(rest)
    }
}

/// Section equality compares ids only; plans need the full content
fn same_content(a: &Section, b: &Section) -> bool {
    a.id == b.id
        && a.spans == b.spans
        && a.title == b.title
        && a.discarded == b.discarded
        && a.text() == b.text()
}
