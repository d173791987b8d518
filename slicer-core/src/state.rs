//! Persisted section state
//!
//! The state file is a flat ordered list of section records. Tokens are never
//! written; they are recomputed from `text` when a record becomes a section.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::section::{Section, Span};

/// One persisted section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    #[serde(alias = "id_")]
    pub id: usize,
    pub title: Option<String>,
    pub text: String,
    pub spans: Span,
    #[serde(default)]
    pub discarded: bool,
}

impl From<&Section> for SectionRecord {
    fn from(section: &Section) -> Self {
        Self {
            id: section.id,
            title: section.title.clone(),
            text: section.text().to_string(),
            spans: section.spans,
            discarded: section.discarded,
        }
    }
}

impl SectionRecord {
    /// Rebuild the section, recomputing its tokens
    pub fn into_section(self) -> Section {
        let mut section = Section::new(self.id, self.title, self.text, self.spans);
        section.discarded = self.discarded;
        section
    }
}

/// Top-level shape of a state file: `{"sections": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    pub sections: Vec<SectionRecord>,
}

impl StateFile {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse section state")
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.context("Failed to serialize section state")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_shape() -> Result<()> {
        let section = Section::new(3, Some("Intro".into()), "a b c", Span::new(10, 12));
        let state = StateFile {
            sections: vec![SectionRecord::from(&section)],
        };

        let value: serde_json::Value = serde_json::from_str(&state.to_json(false)?)?;
        let record = &value["sections"][0];
        assert_eq!(record["id"], 3);
        assert_eq!(record["title"], "Intro");
        assert_eq!(record["text"], "a b c");
        assert_eq!(record["spans"], serde_json::json!([10, 12]));
        assert_eq!(record["discarded"], false);
        assert!(record.get("tokens").is_none());

        Ok(())
    }

    #[test]
    fn test_null_title_and_persisted_tokens_ignored() -> Result<()> {
        let json = r#"{"sections": [
            {"id_": 0, "title": null, "text": "x y", "spans": [0, 1],
             "discarded": true, "tokens": ["stale", "list", "ignored"]}
        ]}"#;

        let state = StateFile::from_json(json)?;
        let section = state.sections[0].clone().into_section();
        assert_eq!(section.title, None);
        assert!(section.discarded);
        assert_eq!(section.tokens().len(), 2);

        Ok(())
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(StateFile::from_json("{\"sections\": [{]").is_err());
        assert!(StateFile::from_json("{}").is_err());
    }
}
