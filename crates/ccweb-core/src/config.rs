//! Processor configuration.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What to do with a `tool_result` whose `tool_use` was never seen
/// (truncated history, cross-session replay).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedResultPolicy {
    /// Display it under the generic "Tool" name.
    #[default]
    Placeholder,
    /// Leave it out of the transcript.
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    #[serde(default)]
    pub unmatched_tool_results: UnmatchedResultPolicy,
    /// Tool results shorter than this many characters are shown verbatim
    /// as their own summary.
    #[serde(default = "default_summary_char_threshold")]
    pub summary_char_threshold: usize,
    /// Maximum length of the argument display in tool messages.
    #[serde(default = "default_tool_display_max_len")]
    pub tool_display_max_len: usize,
    #[serde(default = "default_show_init_messages")]
    pub show_init_messages: bool,
}

fn default_summary_char_threshold() -> usize {
    50
}

fn default_tool_display_max_len() -> usize {
    60
}

fn default_show_init_messages() -> bool {
    true
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            unmatched_tool_results: UnmatchedResultPolicy::default(),
            summary_char_threshold: default_summary_char_threshold(),
            tool_display_max_len: default_tool_display_max_len(),
            show_init_messages: default_show_init_messages(),
        }
    }
}

impl ProcessorConfig {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProcessorConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from the default location or fall back to defaults.
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(ProcessorConfig::default())
    }

    /// `<config dir>/ccweb/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ccweb").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.unmatched_tool_results, UnmatchedResultPolicy::Placeholder);
        assert_eq!(config.summary_char_threshold, 50);
        assert_eq!(config.tool_display_max_len, 60);
        assert!(config.show_init_messages);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "unmatched_tool_results = \"drop\"").unwrap();
        writeln!(file, "summary_char_threshold = 80").unwrap();

        let config = ProcessorConfig::load_from(file.path()).unwrap();
        assert_eq!(config.unmatched_tool_results, UnmatchedResultPolicy::Drop);
        assert_eq!(config.summary_char_threshold, 80);
        assert_eq!(config.tool_display_max_len, 60);
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "unmatched_tool_results = \"sometimes\"").unwrap();
        assert!(ProcessorConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = ProcessorConfig::load_from(Path::new("/nonexistent/ccweb.toml"));
        assert!(matches!(result, Err(crate::CcwebError::IoError(_))));
    }
}
