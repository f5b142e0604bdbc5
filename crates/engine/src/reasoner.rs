//! Rule evaluation boundary.
//!
//! The lifecycle rules are evaluated by an external engine. The core
//! treats it as an opaque function from serialized facts to the encoded
//! result; any failure to obtain a well-formed result surfaces as the
//! distinct `ReasoningUnavailable` condition, never as "no violations".

use caseflow_core::{CaseAlignment, EngineError};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::config::ReasonerConfig;

/// Opaque rule evaluation: facts in, encoded result out.
pub trait RuleEngine: Send + Sync {
    fn evaluate(&self, alignment: &CaseAlignment) -> Result<Value, EngineError>;
}

/// Spawns the configured external reasoner, feeds it the case's
/// serialized alignment on stdin together with the fixed rule-set files,
/// and parses stdout as the encoded result.
pub struct SubprocessRuleEngine {
    command: String,
    args: Vec<String>,
    rule_files: Vec<PathBuf>,
}

impl SubprocessRuleEngine {
    pub fn new(config: &ReasonerConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            rule_files: config.rule_files.clone(),
        }
    }
}

impl RuleEngine for SubprocessRuleEngine {
    fn evaluate(&self, alignment: &CaseAlignment) -> Result<Value, EngineError> {
        let payload = serde_json::to_vec(alignment)
            .map_err(|e| EngineError::ReasoningUnavailable(format!("serialize facts: {}", e)))?;

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        for rule_file in &self.rule_files {
            cmd.arg(rule_file);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            EngineError::ReasoningUnavailable(format!("failed to spawn {}: {}", self.command, e))
        })?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(&payload).map_err(|e| {
                EngineError::ReasoningUnavailable(format!("failed to write facts: {}", e))
            })?;
        }

        let output = child.wait_with_output().map_err(|e| {
            EngineError::ReasoningUnavailable(format!("{} did not finish: {}", self.command, e))
        })?;

        if !output.status.success() {
            return Err(EngineError::ReasoningUnavailable(format!(
                "{} exited with {:?}: {}",
                self.command,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            EngineError::ReasoningUnavailable(format!("malformed encoded result: {}", e))
        })
    }
}
