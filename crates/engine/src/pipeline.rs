//! Case processing pipeline
//!
//! Connects the ingestion boundary to the external reasoner and the
//! output sinks:
//!
//! ```text
//!  Cases ──▶ CaseAligner ──▶ FactSinks (serialization hand-off)
//!                │
//!                ▼
//!           RuleEngine (external) ──▶ decode_result ──▶ VerdictSinks
//! ```
//!
//! Cases share no mutable state; a per-case failure is reported with its
//! case id and counted, and processing continues with the next case.

use caseflow_core::{Case, CaseAlignment, CaseVerdict, EngineError};
use std::sync::{Arc, Mutex};

use crate::aligner::CaseAligner;
use crate::code_lookup::CodeLookup;
use crate::config::EngineConfig;
use crate::decoder::decode_result;
use crate::interval_index::IntervalIndex;
use crate::reasoner::RuleEngine;
use crate::snapshot_builder::SnapshotBuilder;

/// Receives per-case alignments (snapshot table + alignment sequence)
/// for serialization.
pub trait FactSink: Send + Sync {
    fn send(&self, alignment: &CaseAlignment) -> Result<(), EngineError>;

    fn flush(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Receives decoded verdicts for downstream aggregation.
pub trait VerdictSink: Send + Sync {
    fn send(&self, verdict: &CaseVerdict) -> Result<(), EngineError>;

    fn flush(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// In-memory fact sink for testing
#[derive(Default)]
pub struct MemoryFactSink {
    alignments: Mutex<Vec<CaseAlignment>>,
}

impl MemoryFactSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_alignments(&self) -> Vec<CaseAlignment> {
        self.alignments.lock().unwrap().clone()
    }
}

impl FactSink for MemoryFactSink {
    fn send(&self, alignment: &CaseAlignment) -> Result<(), EngineError> {
        self.alignments.lock().unwrap().push(alignment.clone());
        Ok(())
    }
}

/// Writes one JSON object per case, the serialization hand-off.
pub struct JsonlFactSink {
    file: Mutex<std::fs::File>,
}

impl JsonlFactSink {
    pub fn create(path: &std::path::Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::File::create(path)
            .map_err(|e| EngineError::Io(format!("failed to create {}: {}", path.display(), e)))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl FactSink for JsonlFactSink {
    fn send(&self, alignment: &CaseAlignment) -> Result<(), EngineError> {
        use std::io::Write;
        let line = serde_json::to_string(alignment)
            .map_err(|e| EngineError::Io(format!("serialize alignment: {}", e)))?;
        let mut file = self.file.lock().unwrap();
        writeln!(file, "{}", line)
            .map_err(|e| EngineError::Io(format!("write alignment: {}", e)))
    }

    fn flush(&self) -> Result<(), EngineError> {
        use std::io::Write;
        self.file
            .lock()
            .unwrap()
            .flush()
            .map_err(|e| EngineError::Io(format!("flush alignments: {}", e)))
    }
}

/// In-memory verdict sink for testing
#[derive(Default)]
pub struct MemoryVerdictSink {
    verdicts: Mutex<Vec<CaseVerdict>>,
}

impl MemoryVerdictSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_verdicts(&self) -> Vec<CaseVerdict> {
        self.verdicts.lock().unwrap().clone()
    }
}

impl VerdictSink for MemoryVerdictSink {
    fn send(&self, verdict: &CaseVerdict) -> Result<(), EngineError> {
        self.verdicts.lock().unwrap().push(verdict.clone());
        Ok(())
    }
}

/// Verdict sink that prints to stderr
pub struct LogVerdictSink {
    prefix: String,
}

impl LogVerdictSink {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }
}

impl VerdictSink for LogVerdictSink {
    fn send(&self, verdict: &CaseVerdict) -> Result<(), EngineError> {
        for (item, item_verdict) in &verdict.items {
            if item_verdict.violations.is_empty() {
                eprintln!(
                    "[{}] case={} item={} final={}",
                    self.prefix, verdict.case_id, item, item_verdict.final_state
                );
            } else {
                for violation in &item_verdict.violations {
                    eprintln!(
                        "[{}] case={} item={} final={} VIOLATION {} at {}",
                        self.prefix,
                        verdict.case_id,
                        item,
                        item_verdict.final_state,
                        violation.kind.as_str(),
                        violation.state
                    );
                }
            }
        }
        Ok(())
    }
}

/// Per-run counters
#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    pub cases_processed: u64,
    pub events_aligned: u64,
    pub snapshots_built: u64,
    pub violations_found: u64,
    pub errors: u64,
}

/// The main case processing pipeline
pub struct Pipeline {
    index: IntervalIndex,
    codes: Box<dyn CodeLookup>,
    engine: Box<dyn RuleEngine>,
    config: EngineConfig,
    fact_sinks: Vec<Arc<dyn FactSink>>,
    verdict_sinks: Vec<Arc<dyn VerdictSink>>,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(
        index: IntervalIndex,
        codes: Box<dyn CodeLookup>,
        engine: Box<dyn RuleEngine>,
        config: EngineConfig,
    ) -> Self {
        Self {
            index,
            codes,
            engine,
            config,
            fact_sinks: Vec::new(),
            verdict_sinks: Vec::new(),
            stats: PipelineStats::default(),
        }
    }

    pub fn add_fact_sink(&mut self, sink: Arc<dyn FactSink>) {
        self.fact_sinks.push(sink);
    }

    pub fn add_verdict_sink(&mut self, sink: Arc<dyn VerdictSink>) {
        self.verdict_sinks.push(sink);
    }

    /// Align one case, hand its facts off, evaluate the rules and decode
    /// the verdict.
    pub fn process_case(&mut self, case: &Case) -> Result<CaseVerdict, EngineError> {
        let alignment = {
            let builder = SnapshotBuilder::new(
                &self.index,
                self.codes.as_ref(),
                &self.config.tracked_attributes,
                self.config.on_unresolved_code,
                &self.config.admitted_prefix,
            );
            CaseAligner::new(builder).align(case)?
        };
        self.stats.events_aligned += alignment.alignment.len() as u64;
        self.stats.snapshots_built += alignment.snapshots.len() as u64;

        for sink in &self.fact_sinks {
            if let Err(e) = sink.send(&alignment) {
                eprintln!("[pipeline] fact sink error: {}", e);
                self.stats.errors += 1;
            }
        }

        let encoded = self.engine.evaluate(&alignment)?;
        let items = decode_result(&encoded)?;
        let verdict = CaseVerdict {
            case_id: case.case_id.clone(),
            items,
        };
        self.stats.violations_found += verdict.violation_count() as u64;

        for sink in &self.verdict_sinks {
            if let Err(e) = sink.send(&verdict) {
                eprintln!("[pipeline] verdict sink error: {}", e);
                self.stats.errors += 1;
            }
        }

        self.stats.cases_processed += 1;
        Ok(verdict)
    }

    /// Process cases in order, honoring the configured case cap. Failed
    /// cases are logged with their id and counted; the run continues.
    pub fn process_all(&mut self, cases: &[Case]) -> Vec<CaseVerdict> {
        let mut verdicts = Vec::new();
        for (count, case) in cases.iter().enumerate() {
            if let Some(cap) = self.config.max_cases {
                if count >= cap {
                    eprintln!("[pipeline] case cap reached ({}), stopping", cap);
                    break;
                }
            }
            match self.process_case(case) {
                Ok(verdict) => verdicts.push(verdict),
                Err(e) => {
                    eprintln!("[pipeline] case {} failed: {}", case.case_id, e);
                    self.stats.errors += 1;
                }
            }
        }
        verdicts
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Flush all sinks
    pub fn flush(&self) -> Result<(), EngineError> {
        for sink in &self.fact_sinks {
            sink.flush()?;
        }
        for sink in &self.verdict_sinks {
            sink.flush()?;
        }
        Ok(())
    }
}
