//! caseflow engine entry point
//!
//! Pipeline: events.csv + observations.csv + cases.csv -> CaseAligner ->
//! fact sinks -> external rule engine -> decoded verdicts -> verdict sinks
//!
//! Inputs are resolved under the data root:
//! - events.csv        event log (case, activity, timestamp)
//! - observations.csv  dynamic attribute stream
//! - cases.csv         static attributes, one row per case
//! - codes.csv         classification code descriptions (optional)
//! - config.yaml       engine configuration (optional)

use caseflow_engine::{
    assemble_cases, read_events, read_observations, read_static_attributes, EngineConfig,
    IntervalIndex, JsonlFactSink, LogVerdictSink, Pipeline, SqliteVerdictSink,
    SubprocessRuleEngine, TableCodeLookup,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Get data root from env or default
fn get_data_root() -> PathBuf {
    std::env::var("CASEFLOW_DATA_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn main() {
    let data_root = get_data_root();

    eprintln!("caseflow-engine starting");
    eprintln!("DATA_ROOT: {}", data_root.display());

    // Load config when present, defaults otherwise
    let config_path = data_root.join("config.yaml");
    let config = if config_path.exists() {
        match EngineConfig::from_yaml_file(&config_path) {
            Ok(config) => {
                eprintln!("Config: {}", config_path.display());
                config
            }
            Err(e) => {
                eprintln!("FATAL: {}", e);
                return;
            }
        }
    } else {
        eprintln!("Config: defaults ({} not found)", config_path.display());
        EngineConfig::default()
    };

    // Ingest the three inputs
    let events = match read_events(&data_root.join("events.csv")) {
        Ok(events) => events,
        Err(e) => {
            eprintln!("FATAL: event log: {}", e);
            return;
        }
    };
    let observations = match read_observations(&data_root.join("observations.csv")) {
        Ok(observations) => observations,
        Err(e) => {
            eprintln!("FATAL: observation stream: {}", e);
            return;
        }
    };
    let statics = match read_static_attributes(&data_root.join("cases.csv"), &config.code_delimiter)
    {
        Ok(statics) => statics,
        Err(e) => {
            eprintln!("FATAL: static attributes: {}", e);
            return;
        }
    };

    let codes_path = data_root.join("codes.csv");
    let codes = if codes_path.exists() {
        match TableCodeLookup::from_csv_file(&codes_path) {
            Ok(codes) => {
                eprintln!("[ingest] {} code descriptions", codes.len());
                codes
            }
            Err(e) => {
                eprintln!("FATAL: code table: {}", e);
                return;
            }
        }
    } else {
        TableCodeLookup::new()
    };

    let cases = assemble_cases(events, statics);
    let index = IntervalIndex::build(&observations);
    eprintln!(
        "[ingest] {} cases, {} observations in {} attribute groups",
        cases.len(),
        observations.len(),
        index.group_count()
    );

    // Wire the pipeline
    let engine = SubprocessRuleEngine::new(&config.reasoner);
    let sinks = config.sinks.clone();
    let mut pipeline = Pipeline::new(index, Box::new(codes), Box::new(engine), config);

    if let Some(path) = &sinks.facts_jsonl {
        match JsonlFactSink::create(&data_root.join(path)) {
            Ok(sink) => pipeline.add_fact_sink(Arc::new(sink)),
            Err(e) => {
                eprintln!("FATAL: {}", e);
                return;
            }
        }
    }
    if let Some(path) = &sinks.verdicts_db {
        match SqliteVerdictSink::open(&data_root.join(path)) {
            Ok(sink) => {
                eprintln!("Database: {}", data_root.join(path).display());
                pipeline.add_verdict_sink(Arc::new(sink));
            }
            Err(e) => {
                eprintln!("FATAL: {}", e);
                return;
            }
        }
    }
    pipeline.add_verdict_sink(Arc::new(LogVerdictSink::new("verdict")));

    let verdicts = pipeline.process_all(&cases);

    if let Err(e) = pipeline.flush() {
        eprintln!("[pipeline] flush error: {}", e);
    }

    let stats = pipeline.stats();
    eprintln!(
        "caseflow-engine finished. Total: {} cases, {} events, {} snapshots, {} violations, {} errors ({} verdicts emitted)",
        stats.cases_processed,
        stats.events_aligned,
        stats.snapshots_built,
        stats.violations_found,
        stats.errors,
        verdicts.len()
    );
}
