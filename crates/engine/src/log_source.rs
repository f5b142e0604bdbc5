//! Log source: CSV ingestion of the event log, the dynamic-attribute
//! stream and the static per-case records, validated into typed records
//! at the boundary and assembled into cases.

use caseflow_core::{Case, DynamicObservation, EngineError, Event, StaticAttributes};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Read the event log: one `(case, activity, timestamp)` row per event.
pub fn read_events(path: &Path) -> Result<Vec<Event>, EngineError> {
    let rdr = open_csv(path)?;
    read_events_from(rdr)
}

/// Read the dynamic-attribute stream: `(case, attribute, value,
/// timestamp)` rows. Each observation keeps its source-row position as
/// its identity.
pub fn read_observations(path: &Path) -> Result<Vec<DynamicObservation>, EngineError> {
    let rdr = open_csv(path)?;
    read_observations_from(rdr)
}

/// Read the static-attribute table: one row per case with an age column,
/// a disposition column and a delimited classification-code column.
pub fn read_static_attributes(
    path: &Path,
    code_delimiter: &str,
) -> Result<Vec<StaticAttributes>, EngineError> {
    let rdr = open_csv(path)?;
    read_static_attributes_from(rdr, code_delimiter)
}

/// Group events by case id (first-appearance order) and attach each
/// case's static record. Events are ordered by timestamp, stable so log
/// order breaks ties.
pub fn assemble_cases(events: Vec<Event>, statics: Vec<StaticAttributes>) -> Vec<Case> {
    let mut static_by_case: HashMap<String, StaticAttributes> = statics
        .into_iter()
        .map(|s| (s.case_id.clone(), s))
        .collect();

    let mut order: Vec<String> = Vec::new();
    let mut events_by_case: HashMap<String, Vec<Event>> = HashMap::new();
    for event in events {
        if !events_by_case.contains_key(&event.case_id) {
            order.push(event.case_id.clone());
        }
        events_by_case
            .entry(event.case_id.clone())
            .or_default()
            .push(event);
    }

    order
        .into_iter()
        .map(|case_id| {
            let mut events = events_by_case.remove(&case_id).unwrap_or_default();
            events.sort_by_key(|e| e.ts_ms);
            Case {
                statics: static_by_case.remove(&case_id),
                case_id,
                events,
            }
        })
        .collect()
}

fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>, EngineError> {
    csv::Reader::from_path(path)
        .map_err(|e| EngineError::Io(format!("failed to open {}: {}", path.display(), e)))
}

fn read_events_from<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<Event>, EngineError> {
    let headers = headers(&mut rdr)?;
    let case_col = column(&headers, &["case_id", "case", "case:concept:name"])?;
    let activity_col = column(&headers, &["activity", "concept:name"])?;
    let ts_col = column(&headers, &["timestamp", "time:timestamp"])?;

    let mut events = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| EngineError::InvalidRow {
            row,
            reason: e.to_string(),
        })?;
        events.push(Event {
            case_id: required(&record, case_col, row, "case id")?,
            activity: required(&record, activity_col, row, "activity")?,
            ts_ms: parse_ts_ms(record.get(ts_col).unwrap_or(""), row)?,
        });
    }
    Ok(events)
}

fn read_observations_from<R: Read>(
    mut rdr: csv::Reader<R>,
) -> Result<Vec<DynamicObservation>, EngineError> {
    let headers = headers(&mut rdr)?;
    let case_col = column(&headers, &["case_id", "case", "case:concept:name"])?;
    let attr_col = column(&headers, &["attribute", "concept:name"])?;
    let value_col = column(&headers, &["value"])?;
    let ts_col = column(&headers, &["timestamp", "time:timestamp"])?;

    let mut observations = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| EngineError::InvalidRow {
            row,
            reason: e.to_string(),
        })?;
        observations.push(DynamicObservation {
            row,
            case_id: required(&record, case_col, row, "case id")?,
            attribute: required(&record, attr_col, row, "attribute")?,
            value: record.get(value_col).unwrap_or("").trim().to_string(),
            ts_ms: parse_ts_ms(record.get(ts_col).unwrap_or(""), row)?,
        });
    }
    Ok(observations)
}

fn read_static_attributes_from<R: Read>(
    mut rdr: csv::Reader<R>,
    code_delimiter: &str,
) -> Result<Vec<StaticAttributes>, EngineError> {
    let headers = headers(&mut rdr)?;
    let case_col = column(&headers, &["case_id", "case", "case:concept:name"])?;
    let age_col = column(&headers, &["age"]).ok();
    let disposition_col = column(&headers, &["disposition", "discharge_disposition"]).ok();
    let codes_col = column(&headers, &["classification_codes", "codes"]).ok();

    let mut statics = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| EngineError::InvalidRow {
            row,
            reason: e.to_string(),
        })?;

        let age = match age_col.and_then(|col| record.get(col)).map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| EngineError::InvalidRow {
                row,
                reason: format!("unparseable age: {raw}"),
            })?),
        };

        let disposition = disposition_col
            .and_then(|col| record.get(col))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let classification_codes = codes_col
            .and_then(|col| record.get(col))
            .map(|raw| {
                raw.split(code_delimiter)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        statics.push(StaticAttributes {
            case_id: required(&record, case_col, row, "case id")?,
            age,
            disposition,
            classification_codes,
        });
    }
    Ok(statics)
}

fn headers<R: Read>(rdr: &mut csv::Reader<R>) -> Result<csv::StringRecord, EngineError> {
    rdr.headers()
        .map(|h| h.clone())
        .map_err(|e| EngineError::Io(format!("failed to read CSV headers: {}", e)))
}

/// Position of the first matching header name
fn column(headers: &csv::StringRecord, names: &[&str]) -> Result<usize, EngineError> {
    headers
        .iter()
        .position(|h| names.contains(&h.trim()))
        .ok_or_else(|| EngineError::Config(format!("missing column: one of {:?}", names)))
}

fn required(
    record: &csv::StringRecord,
    col: usize,
    row: usize,
    what: &str,
) -> Result<String, EngineError> {
    let value = record.get(col).unwrap_or("").trim();
    if value.is_empty() {
        return Err(EngineError::InvalidRow {
            row,
            reason: format!("empty {what}"),
        });
    }
    Ok(value.to_string())
}

/// Parse a timestamp into epoch milliseconds. Accepts RFC 3339, naive
/// `YYYY-MM-DD HH:MM:SS[.frac]` (taken as UTC), and raw epoch millis.
fn parse_ts_ms(raw: &str, row: usize) -> Result<i64, EngineError> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc().timestamp_millis());
    }
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(ms);
    }
    Err(EngineError::InvalidRow {
        row,
        reason: format!("unparseable timestamp: {raw}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(data.as_bytes())
    }

    #[test]
    fn test_read_events_with_xes_headers() {
        let data = "case:concept:name,concept:name,time:timestamp\n\
                    7,ER Triage,2014-10-22 11:15:41\n\
                    7,Lab Test,2014-10-22 11:27:00\n";
        let events = read_events_from(reader(data)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].case_id, "7");
        assert_eq!(events[0].activity, "ER Triage");
        assert!(events[0].ts_ms < events[1].ts_ms);
    }

    #[test]
    fn test_read_events_rejects_empty_case_id() {
        let data = "case_id,activity,timestamp\n,Triage,1000\n";
        match read_events_from(reader(data)).unwrap_err() {
            EngineError::InvalidRow { row, reason } => {
                assert_eq!(row, 0);
                assert!(reason.contains("case id"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_events_rejects_bad_timestamp() {
        let data = "case_id,activity,timestamp\n7,Triage,yesterday\n";
        assert!(matches!(
            read_events_from(reader(data)),
            Err(EngineError::InvalidRow { .. })
        ));
    }

    #[test]
    fn test_observations_keep_source_row_identity() {
        let data = "case_id,attribute,value,timestamp\n\
                    7,Heart rate,80,1000\n\
                    7,Heart rate,95,2000\n\
                    8,Leucocytes,13.8,1500\n";
        let observations = read_observations_from(reader(data)).unwrap();
        assert_eq!(observations.len(), 3);
        assert_eq!(observations[0].row, 0);
        assert_eq!(observations[2].row, 2);
        assert_eq!(observations[2].case_id, "8");
    }

    #[test]
    fn test_read_statics_splits_codes() {
        let data = "case_id,age,disposition,classification_codes\n\
                    7,63,Admitted to ward,A41.9;J18.9\n\
                    8,,,\n";
        let statics = read_static_attributes_from(reader(data), ";").unwrap();
        assert_eq!(statics[0].age, Some(63.0));
        assert_eq!(statics[0].classification_codes, vec!["A41.9", "J18.9"]);
        assert_eq!(statics[1].age, None);
        assert!(statics[1].disposition.is_none());
        assert!(statics[1].classification_codes.is_empty());
    }

    #[test]
    fn test_assemble_cases_groups_and_orders() {
        let events = vec![
            Event::new("7", "Lab", 2000),
            Event::new("8", "Triage", 500),
            Event::new("7", "Triage", 1000),
        ];
        let statics = vec![StaticAttributes {
            case_id: "7".to_string(),
            ..Default::default()
        }];
        let cases = assemble_cases(events, statics);

        // First-appearance order of case ids
        assert_eq!(cases[0].case_id, "7");
        assert_eq!(cases[1].case_id, "8");

        // Events sorted by timestamp inside a case
        assert_eq!(cases[0].events[0].activity, "Triage");
        assert_eq!(cases[0].events[1].activity, "Lab");

        // Missing static row is carried as None, reported at align time
        assert!(cases[0].statics.is_some());
        assert!(cases[1].statics.is_none());
    }
}
