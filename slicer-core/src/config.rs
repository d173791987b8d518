//! Configuration management for slicer

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Side;
use crate::slice::{Disposition, SliceChoices, SlicePlan};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub segment: SegmentConfig,
    pub slicing: SlicingConfig,
    pub state: StateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Headings of this level or shallower open a new section
    pub heading_level: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicingConfig {
    /// Tokens offered on either side of a section when selecting a range
    pub window: usize,
    /// Applied to a leading fragment when the operator picks nothing
    pub leading: Disposition,
    /// Applied to a trailing fragment when the operator picks nothing
    pub trailing: Disposition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub file_name: String,
    pub pretty: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self { heading_level: 2 }
    }
}

impl Default for SlicingConfig {
    fn default() -> Self {
        Self {
            window: 80,
            leading: Disposition::Discard,
            trailing: Disposition::Discard,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            file_name: "sections.json".to_string(),
            pretty: true,
        }
    }
}

impl SlicingConfig {
    /// Fill dispositions the operator left open with the configured defaults,
    /// where the plan needs one and allows the default
    pub fn fill_defaults(&self, plan: &SlicePlan, mut choices: SliceChoices) -> SliceChoices {
        let pick = |side: Side, default: Disposition| {
            (plan.needs_disposition(side) && plan.options(side).contains(&default)).then_some(default)
        };
        choices.leading = choices.leading.or_else(|| pick(Side::Leading, self.leading));
        choices.trailing = choices.trailing.or_else(|| pick(Side::Trailing, self.trailing));
        choices
    }
}

impl Config {
    /// Get the platform-specific config file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "slicer")
            .map(|proj_dirs| proj_dirs.config_dir().join("slicer.toml"))
    }

    /// Load configuration from file, falling back to defaults if missing
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        // Check config file permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat config file: {}", path.display()))?;
            if metadata.permissions().mode() & 0o002 != 0 {
                anyhow::bail!(
                    "Config file {} is world-writable (insecure permissions)",
                    path.display()
                );
            }
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if config.segment.heading_level == 0 || config.segment.heading_level > 6 {
            anyhow::bail!(
                "heading_level must be between 1 and 6, got {}",
                config.segment.heading_level
            );
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::Document;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.segment.heading_level, 2);
        assert_eq!(config.slicing.window, 80);
        assert_eq!(config.slicing.leading, Disposition::Discard);
        assert_eq!(config.state.file_name, "sections.json");
        assert!(config.state.pretty);
    }

    #[test]
    fn test_load_valid_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(
            b"[segment]\n\
heading_level = 1\n\
\n\
[slicing]\n\
window = 40\n\
leading = \"new-section\"\n\
trailing = \"append-to-adjacent\"\n\
\n\
[state]\n\
file_name = \"doc.json\"\n\
pretty = false\n",
        )?;

        let config = Config::load_from(file.path())?;
        assert_eq!(config.segment.heading_level, 1);
        assert_eq!(config.slicing.window, 40);
        assert_eq!(config.slicing.leading, Disposition::NewSection);
        assert_eq!(config.slicing.trailing, Disposition::AppendToAdjacent);
        assert_eq!(config.state.file_name, "doc.json");
        assert!(!config.state.pretty);

        Ok(())
    }

    #[test]
    fn test_load_partial_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"[slicing]\nwindow = 10\n")?;

        let config = Config::load_from(file.path())?;
        assert_eq!(config.slicing.window, 10);
        assert_eq!(config.slicing.trailing, Disposition::Discard);
        assert_eq!(config.segment.heading_level, 2);
        assert_eq!(config.state.file_name, "sections.json");

        Ok(())
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"invalid toml [[[syntax").unwrap();

        let result = Config::load_from(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_heading_level_out_of_range() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[segment]\nheading_level = 9\n").unwrap();

        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_config_path_returns_some() {
        let path = Config::config_path();
        if let Some(p) = path {
            assert!(p.to_string_lossy().contains("slicer"));
            assert!(p.to_string_lossy().ends_with("slicer.toml"));
        }
    }

    #[test]
    fn test_fill_defaults_keeps_operator_choice() {
        let doc = Document::build([("A", "a b c d"), ("B", "e f")]);
        let plan = doc.plan_slice(0, 1, 2).unwrap();

        let slicing = SlicingConfig::default();
        let choices = slicing.fill_defaults(
            &plan,
            SliceChoices {
                leading: Some(Disposition::NewSection),
                ..Default::default()
            },
        );
        assert_eq!(choices.leading, Some(Disposition::NewSection));
        assert_eq!(choices.trailing, Some(Disposition::Discard));
    }

    #[test]
    fn test_fill_defaults_skips_disallowed_default() {
        let doc = Document::build([("A", "a b c d"), ("B", "e f")]);
        let plan = doc.plan_slice(0, 1, 3).unwrap();

        let slicing = SlicingConfig {
            leading: Disposition::AppendToAdjacent,
            ..Default::default()
        };
        let choices = slicing.fill_defaults(&plan, SliceChoices::default());
        // no predecessor to append to, and no trailing fragment at all
        assert_eq!(choices.leading, None);
        assert_eq!(choices.trailing, None);
    }

    #[test]
    fn test_round_trip_serialization() -> Result<()> {
        let mut config = Config::default();
        config.slicing.leading = Disposition::AppendToAdjacent;

        let toml_str = toml::to_string(&config)?;
        assert!(toml_str.contains("append-to-adjacent"));

        let parsed: Config = toml::from_str(&toml_str)?;
        assert_eq!(parsed.slicing.leading, Disposition::AppendToAdjacent);

        Ok(())
    }
}
