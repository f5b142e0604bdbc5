//! Engine configuration
//!
//! YAML/JSON configuration for the alignment pipeline, the external
//! reasoner invocation, and the output sinks.

use caseflow_core::EngineError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Dynamic attribute names resolved into every snapshot
    #[serde(default)]
    pub tracked_attributes: Vec<String>,

    /// Stop after this many cases; an orchestration-level early exit,
    /// unlimited when unset
    #[serde(default)]
    pub max_cases: Option<usize>,

    /// Policy for classification codes missing from the description table
    #[serde(default)]
    pub on_unresolved_code: OnUnresolvedCode,

    /// Disposition prefix that marks a case as admitted
    #[serde(default = "default_admitted_prefix")]
    pub admitted_prefix: String,

    /// Delimiter of the classification-code column
    #[serde(default = "default_code_delimiter")]
    pub code_delimiter: String,

    /// External rule engine invocation
    #[serde(default)]
    pub reasoner: ReasonerConfig,

    /// Output sinks
    #[serde(default)]
    pub sinks: SinkConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tracked_attributes: Vec::new(),
            max_cases: None,
            on_unresolved_code: OnUnresolvedCode::default(),
            admitted_prefix: default_admitted_prefix(),
            code_delimiter: default_code_delimiter(),
            reasoner: ReasonerConfig::default(),
            sinks: SinkConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load from YAML file
    pub fn from_yaml_file(path: &PathBuf) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("failed to read config: {}", e)))?;
        serde_yaml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("failed to parse config: {}", e)))
    }

    /// Load from JSON file
    pub fn from_json_file(path: &PathBuf) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("failed to read config: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| EngineError::Config(format!("failed to parse config: {}", e)))
    }
}

fn default_admitted_prefix() -> String {
    "Admitted".to_string()
}

fn default_code_delimiter() -> String {
    ";".to_string()
}

/// What to do when a classification code is not in the description table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnUnresolvedCode {
    /// Fail the case's processing
    #[default]
    Fail,
    /// Substitute "unknown" and continue, logging the offending code
    Placeholder,
}

/// External rule engine invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonerConfig {
    /// Command to spawn
    #[serde(default = "default_reasoner_command")]
    pub command: String,

    /// Extra arguments passed before the rule files
    #[serde(default)]
    pub args: Vec<String>,

    /// Fixed rule-set files appended to the invocation
    #[serde(default)]
    pub rule_files: Vec<PathBuf>,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            command: default_reasoner_command(),
            args: Vec::new(),
            rule_files: Vec::new(),
        }
    }
}

fn default_reasoner_command() -> String {
    "eye".to_string()
}

/// Output sink settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SinkConfig {
    /// Write per-case alignments as JSONL to this path
    #[serde(default)]
    pub facts_jsonl: Option<PathBuf>,

    /// Persist verdicts to this SQLite database
    #[serde(default)]
    pub verdicts_db: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.tracked_attributes.is_empty());
        assert!(config.max_cases.is_none());
        assert_eq!(config.on_unresolved_code, OnUnresolvedCode::Fail);
        assert_eq!(config.admitted_prefix, "Admitted");
        assert_eq!(config.reasoner.command, "eye");
    }

    #[test]
    fn test_yaml_parse() {
        let yaml = r#"
tracked_attributes:
  - Heart rate
  - Leucocytes
max_cases: 100
on_unresolved_code: placeholder
admitted_prefix: "Admitted"
code_delimiter: ";"
reasoner:
  command: eye
  args: ["--nope", "--pass-only-new"]
  rule_files:
    - rules/lifecycle.n3
    - rules/workflow.n3
sinks:
  facts_jsonl: out/alignments.jsonl
  verdicts_db: out/verdicts.db
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tracked_attributes.len(), 2);
        assert_eq!(config.max_cases, Some(100));
        assert_eq!(config.on_unresolved_code, OnUnresolvedCode::Placeholder);
        assert_eq!(config.reasoner.args.len(), 2);
        assert_eq!(config.reasoner.rule_files.len(), 2);
        assert!(config.sinks.facts_jsonl.is_some());
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: EngineConfig = serde_yaml::from_str("max_cases: 5").unwrap();
        assert_eq!(config.max_cases, Some(5));
        assert_eq!(config.admitted_prefix, "Admitted");
        assert_eq!(config.code_delimiter, ";");
        assert_eq!(config.on_unresolved_code, OnUnresolvedCode::Fail);
    }
}
