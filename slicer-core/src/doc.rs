//! Document model: the ordered section sequence and its structural edits
//!
//! Every mutating operation validates against the current state, builds the
//! complete replacement list, checks it, and only then swaps it in. A rejected
//! edit leaves the document exactly as it was.

use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::Path;

use crate::error::{Side, SliceError};
use crate::section::{Section, Span};
use crate::segment::{self, Segment};
use crate::slice::{Disposition, SliceChoices, SlicePlan};
use crate::state::{SectionRecord, StateFile};
use crate::token;

/// The main document structure
#[derive(Clone, Debug, Default)]
pub struct Document {
    sections: Vec<Section>,
    /// Bumped by every change to the section list
    pub rev: u64,
}

impl Document {
    /// Build a document from an initial segmentation.
    ///
    /// Spans are assigned by running a cursor through the segments in order.
    /// Segments without any tokens are skipped since they cannot own a span.
    pub fn build<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        let mut sections = Vec::new();
        let mut cursor = 0;

        for segment in segments {
            let segment: Segment = segment.into();
            let len = token::tokenize(&segment.text).len();
            if len == 0 {
                debug!("skipping empty segment {:?}", segment.title);
                continue;
            }

            let span = Span::new(cursor, cursor + len - 1);
            sections.push(Section::new(sections.len(), segment.title, segment.text, span));
            cursor += len;
        }

        debug!("built document with {} sections, {} tokens", sections.len(), cursor);
        Self { sections, rev: 1 }
    }

    /// Build from converted markdown, one section per heading
    pub fn from_markdown(markdown: &str, heading_level: usize) -> Self {
        Self::build(segment::split_markdown(markdown, heading_level))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, id: usize) -> Result<&Section, SliceError> {
        self.sections.get(id).ok_or(SliceError::UnknownSection {
            id,
            len: self.sections.len(),
        })
    }

    /// Length of the global token stream covered by the sections
    pub fn token_count(&self) -> usize {
        self.sections
            .iter()
            .map(|s| s.spans.end.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    pub fn discarded_ids(&self) -> Vec<usize> {
        self.sections
            .iter()
            .filter(|s| s.discarded)
            .map(|s| s.id)
            .collect()
    }

    /// Active sections in order
    pub fn export_active(&self) -> Vec<Section> {
        self.sections.iter().filter(|s| s.is_active()).cloned().collect()
    }

    /// Records of every section, discarded ones included
    pub fn snapshot(&self) -> Vec<SectionRecord> {
        self.sections.iter().map(SectionRecord::from).collect()
    }

    /// Ids match positions and active spans are ordered without overlap
    pub fn check_invariants(&self) -> bool {
        invariants_hold(&self.sections)
    }

    /// Mark a section discarded. Discarding twice is a no-op.
    pub fn discard(&mut self, id: usize) -> Result<(), SliceError> {
        let len = self.sections.len();
        let section = self
            .sections
            .get_mut(id)
            .ok_or(SliceError::UnknownSection { id, len })?;

        if !section.discarded {
            section.discarded = true;
            self.rev += 1;
            debug!("discarded section {id}");
        }
        Ok(())
    }

    /// Merge two adjacent sections into one active section
    pub fn join(&mut self, first: usize, second: usize, title: impl Into<String>) -> Result<(), SliceError> {
        self.section(first)?;
        self.section(second)?;
        if first.abs_diff(second) != 1 {
            return Err(SliceError::Adjacency { first, second });
        }

        let lo = first.min(second);
        let merged = Section::merge(&self.sections[lo], &self.sections[lo + 1], Some(title.into()));
        let span = merged.spans;

        let mut next = Vec::with_capacity(self.sections.len() - 1);
        next.extend_from_slice(&self.sections[..lo]);
        next.push(merged);
        next.extend_from_slice(&self.sections[lo + 2..]);

        self.install(next, lo, span)?;
        debug!("joined sections {lo} and {}", lo + 1);
        Ok(())
    }

    /// Split a section in two at a global token index.
    ///
    /// The halves are `[start, at - 1]` and `[at, end]`; the break token
    /// belongs to the second half only, so joining the halves again gives
    /// back the original token sequence.
    pub fn split(
        &mut self,
        id: usize,
        at: usize,
        first_title: Option<String>,
        second_title: Option<String>,
    ) -> Result<(), SliceError> {
        let section = self.section(id)?;
        let span = section.spans;
        let invalid = SliceError::InvalidRange { id, start: at, end: at };

        if !(span.start < at && at < span.end) {
            return Err(invalid);
        }

        let head = Section::carve(&[section], span.start, at - 1, first_title);
        let tail = Section::carve(&[section], at, span.end, second_title);
        let (Some(head), Some(tail)) = (head, tail) else {
            return Err(invalid);
        };

        let mut next = Vec::with_capacity(self.sections.len() + 1);
        next.extend_from_slice(&self.sections[..id]);
        next.push(head);
        next.push(tail);
        next.extend_from_slice(&self.sections[id + 1..]);

        self.install(next, id, Span::new(at, at))?;
        debug!("split section {id} at token {at}");
        Ok(())
    }

    /// Plan a slice of section `id` to the inclusive range `[start, end]`
    pub fn plan_slice(&self, id: usize, start: usize, end: usize) -> Result<SlicePlan, SliceError> {
        SlicePlan::new(&self.sections, id, start, end, self.rev)
    }

    /// Apply a slice plan.
    ///
    /// The result replaces the target (and any neighbour the range reached
    /// into) with, in order: the trimmed predecessor, the leading fragment,
    /// the selected range, the trailing fragment, the trimmed successor.
    /// Fragments go wherever their disposition says. A plan from another
    /// revision, or whose sections no longer match, is rejected as stale.
    pub fn commit_slice(&mut self, plan: &SlicePlan, choices: SliceChoices) -> Result<(), SliceError> {
        if plan.revision() != self.rev || !plan.matches(&self.sections) {
            return Err(SliceError::StalePlan {
                planned: plan.revision(),
                current: self.rev,
            });
        }
        let (leading, trailing) = plan.resolve(&choices)?;

        let position = plan.position();
        let range = plan.range();
        let invalid = SliceError::InvalidRange {
            id: position,
            start: range.start,
            end: range.end,
        };

        let selected = plan
            .selected_section(choices.title.clone())
            .ok_or_else(|| invalid.clone())?;

        let mut before = self.sections[..position].to_vec();
        let mut after = self.sections[position + 1..].to_vec();

        if plan.leading_overflow {
            before.pop();
            before.extend(plan.trimmed_predecessor());
        }
        if plan.trailing_overflow {
            after.remove(0);
            if let Some(rest) = plan.trimmed_successor() {
                after.insert(0, rest);
            }
        }

        let mut middle = Vec::with_capacity(3);

        if let (Some(disposition), Some(mut fragment)) = (leading, plan.leading_fragment(choices.leading_title)) {
            match disposition {
                Disposition::AppendToAdjacent => {
                    let neighbour = before.last_mut().ok_or_else(|| invalid.clone())?;
                    let merged = append_fragment(neighbour, &fragment, Side::Leading);
                    *neighbour = merged;
                }
                Disposition::NewSection => middle.push(fragment),
                Disposition::Discard => {
                    fragment.discarded = true;
                    middle.push(fragment);
                }
            }
        }

        middle.push(selected);

        if let (Some(disposition), Some(mut fragment)) = (trailing, plan.trailing_fragment(choices.trailing_title)) {
            match disposition {
                Disposition::AppendToAdjacent => {
                    let neighbour = after.first_mut().ok_or_else(|| invalid.clone())?;
                    let merged = append_fragment(neighbour, &fragment, Side::Trailing);
                    *neighbour = merged;
                }
                Disposition::NewSection => middle.push(fragment),
                Disposition::Discard => {
                    fragment.discarded = true;
                    middle.push(fragment);
                }
            }
        }

        let mut next = before;
        next.append(&mut middle);
        next.append(&mut after);

        self.install(next, position, range)?;
        debug!(
            "committed slice {range} on section {position}; {} sections now",
            self.sections.len()
        );
        Ok(())
    }

    /// Plan and commit in one step
    pub fn slice(&mut self, id: usize, start: usize, end: usize, choices: SliceChoices) -> Result<(), SliceError> {
        let plan = self.plan_slice(id, start, end)?;
        self.commit_slice(&plan, choices)
    }

    /// Renumber a candidate list and make it current if it is consistent
    fn install(&mut self, mut candidate: Vec<Section>, id: usize, span: Span) -> Result<(), SliceError> {
        renumber(&mut candidate);
        if !invariants_hold(&candidate) {
            return Err(SliceError::InvalidRange {
                id,
                start: span.start,
                end: span.end,
            });
        }

        self.sections = candidate;
        self.rev += 1;
        Ok(())
    }

    // --- Persistence ---

    pub fn to_state(&self) -> StateFile {
        StateFile {
            sections: self.snapshot(),
        }
    }

    /// Rebuild from persisted records. Ids are reassigned by position and
    /// tokens recomputed from text.
    pub fn from_state(state: StateFile) -> Result<Self> {
        let mut sections: Vec<Section> = state
            .sections
            .into_iter()
            .map(SectionRecord::into_section)
            .collect();
        renumber(&mut sections);

        if !invariants_hold(&sections) {
            anyhow::bail!("Section state has overlapping or inverted spans");
        }
        if let Some(section) = sections.iter().find(|s| s.spans.end == usize::MAX) {
            anyhow::bail!("Section {} ends at the token index limit", section.id);
        }

        Ok(Self { sections, rev: 1 })
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        self.to_state().to_json(pretty)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_state(StateFile::from_json(json)?)
    }

    /// Active sections in the state file shape, for download
    pub fn export_json(&self, pretty: bool) -> Result<String> {
        let state = StateFile {
            sections: self
                .sections
                .iter()
                .filter(|s| s.is_active())
                .map(SectionRecord::from)
                .collect(),
        };
        state.to_json(pretty)
    }

    /// Write every section, discarded ones included, to a state file
    pub fn save_state(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = self.to_json(pretty)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        info!("saved {} sections to {}", self.sections.len(), path.display());
        Ok(())
    }

    /// Replace the current sections with those of a state file
    pub fn load_state(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let loaded = Self::from_json(&content)
            .with_context(|| format!("Invalid state file: {}", path.display()))?;

        self.sections = loaded.sections;
        self.rev += 1;

        info!("loaded {} sections from {}", self.sections.len(), path.display());
        Ok(())
    }

    /// Load a document from a state file
    pub fn open(path: &Path) -> Result<Self> {
        let mut doc = Self::default();
        doc.load_state(path)?;
        Ok(doc)
    }
}

/// Extend `neighbour` with a fragment from its `side` of the selected range.
/// The neighbour keeps its title and discard flag.
fn append_fragment(neighbour: &Section, fragment: &Section, side: Side) -> Section {
    let mut merged = match side {
        Side::Leading => Section::merge(neighbour, fragment, neighbour.title.clone()),
        Side::Trailing => Section::merge(fragment, neighbour, neighbour.title.clone()),
    };
    merged.discarded = neighbour.discarded;
    merged
}

fn renumber(sections: &mut [Section]) {
    for (position, section) in sections.iter_mut().enumerate() {
        section.id = position;
    }
}

fn invariants_hold(sections: &[Section]) -> bool {
    let positional = sections.iter().enumerate().all(|(i, s)| s.id == i);
    let ordered = sections.iter().all(|s| s.spans.start <= s.spans.end);

    let active: Vec<&Span> = sections
        .iter()
        .filter(|s| s.is_active())
        .map(|s| &s.spans)
        .collect();
    let disjoint = active.windows(2).all(|pair| pair[0].end < pair[1].start);

    positional && ordered && disjoint
}
