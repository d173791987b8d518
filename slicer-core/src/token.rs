//! Word/paragraph tokenization of section text

use std::fmt;

/// A single unit of the document-wide token stream
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    /// A run of non-space characters
    Word(String),
    /// Boundary between two non-empty paragraphs
    Break,
}

impl Token {
    pub fn is_break(&self) -> bool {
        matches!(self, Token::Break)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(word) => f.write_str(word),
            Token::Break => f.write_str("\n\n"),
        }
    }
}

/// Split text into word tokens with a `Break` between paragraphs.
///
/// A paragraph ends at a line holding nothing but whitespace. Empty paragraphs
/// are dropped, so the result never starts or ends with a `Break` and never
/// holds two in a row. Within a paragraph, words are separated by spaces; a
/// single newline stays inside its word.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for paragraph in paragraphs(text) {
        if !tokens.is_empty() {
            tokens.push(Token::Break);
        }
        tokens.extend(
            paragraph
                .split(' ')
                .filter(|word| !word.trim().is_empty())
                .map(|word| Token::Word(word.to_string())),
        );
    }

    tokens
}

/// Render `tokens[start..end]` back to text.
///
/// Words are separated by one space and a `Break` renders as a blank line.
/// The range is clamped to the token slice, so this never panics.
pub fn join(tokens: &[Token], start: usize, end: usize) -> String {
    let end = end.min(tokens.len());
    let start = start.min(end);

    let mut result = String::new();
    for token in &tokens[start..end] {
        match token {
            Token::Word(word) => {
                result.push_str(word);
                result.push(' ');
            }
            Token::Break => {
                let trimmed = result.trim_end_matches(' ').len();
                result.truncate(trimmed);
                result.push_str("\n\n");
            }
        }
    }

    result.trim_end().to_string()
}

/// Join every token in the slice
pub fn join_all(tokens: &[Token]) -> String {
    join(tokens, 0, tokens.len())
}

fn paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut current, &mut paragraphs);
        } else {
            current.push(line);
        }
    }
    flush_paragraph(&mut current, &mut paragraphs);

    paragraphs
}

fn flush_paragraph(lines: &mut Vec<&str>, paragraphs: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let paragraph = lines.join("\n").trim().to_string();
    if !paragraph.is_empty() {
        paragraphs.push(paragraph);
    }
    lines.clear();
}
