//! Initial segmentation of converted markdown into titled sections

use ropey::Rope;

/// One `(title, text)` pair of an initial segmentation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub title: Option<String>,
    pub text: String,
}

impl Segment {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            text: text.into(),
        }
    }

    pub fn untitled(text: impl Into<String>) -> Self {
        Self {
            title: None,
            text: text.into(),
        }
    }
}

impl<T: Into<String>, U: Into<String>> From<(T, U)> for Segment {
    fn from((title, text): (T, U)) -> Self {
        Segment::new(title, text)
    }
}

/// Split markdown into segments at ATX headings.
///
/// Every heading of level `max_level` or shallower opens a new segment whose
/// title is the heading text and whose text starts with that heading text
/// (markers stripped). Content before the first such heading becomes an
/// untitled segment. Blank segments are dropped.
pub fn split_markdown(markdown: &str, max_level: usize) -> Vec<Segment> {
    let rope = Rope::from_str(markdown);
    let mut segments = Vec::new();
    let mut title: Option<String> = None;
    let mut body = String::new();

    for line in rope.lines() {
        let line_str: String = line.chunks().collect();
        let trimmed = line_str.trim_end();

        match parse_atx_heading(trimmed) {
            Some((level, text)) if level <= max_level => {
                push_segment(&mut segments, title.take(), &body);
                body.clear();
                body.push_str(&text);
                body.push('\n');
                title = Some(text);
            }
            _ => {
                body.push_str(trimmed);
                body.push('\n');
            }
        }
    }
    push_segment(&mut segments, title, &body);

    segments
}

fn push_segment(segments: &mut Vec<Segment>, title: Option<String>, body: &str) {
    let text = body.trim();
    if text.is_empty() {
        return;
    }
    segments.push(Segment {
        title,
        text: text.to_string(),
    });
}

/// Parse ATX heading (returns level and text if valid)
fn parse_atx_heading(line: &str) -> Option<(usize, String)> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('#') {
        return None;
    }

    let hash_count = trimmed.chars().take_while(|&c| c == '#').count();
    if hash_count > 6 {
        return None;
    }

    // Must be followed by whitespace or be at end
    let rest = &trimmed[hash_count..];
    if rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace()) {
        let text = rest.trim().trim_end_matches('#').trim_end().to_string();
        Some((hash_count, text))
    } else {
        None
    }
}
