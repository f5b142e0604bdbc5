//! Verdict persistence to SQLite.

use caseflow_core::{CaseVerdict, EngineError};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use crate::pipeline::VerdictSink;

/// Persists decoded verdicts and their violations, idempotently per
/// (case, item): re-sending a case replaces its rows.
pub struct SqliteVerdictSink {
    conn: Mutex<Connection>,
}

impl SqliteVerdictSink {
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)
            .map_err(|e| EngineError::Io(format!("failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, EngineError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| EngineError::Io(format!("failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, EngineError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS verdicts (
                case_id TEXT NOT NULL,
                item TEXT NOT NULL,
                final_state TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (case_id, item)
            );
            CREATE TABLE IF NOT EXISTS violations (
                case_id TEXT NOT NULL,
                item TEXT NOT NULL,
                kind TEXT NOT NULL,
                state TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_violations_case ON violations(case_id);
            CREATE INDEX IF NOT EXISTS idx_violations_kind ON violations(kind);",
        )
        .map_err(|e| EngineError::Io(format!("failed to create schema: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl VerdictSink for SqliteVerdictSink {
    fn send(&self, verdict: &CaseVerdict) -> Result<(), EngineError> {
        let conn = self.conn.lock().unwrap();
        let created_at = Utc::now().to_rfc3339();

        for (item, item_verdict) in &verdict.items {
            conn.execute(
                "INSERT OR REPLACE INTO verdicts (case_id, item, final_state, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![verdict.case_id, item, item_verdict.final_state, created_at],
            )
            .map_err(|e| EngineError::Io(format!("persist verdict: {}", e)))?;

            conn.execute(
                "DELETE FROM violations WHERE case_id = ?1 AND item = ?2",
                params![verdict.case_id, item],
            )
            .map_err(|e| EngineError::Io(format!("persist verdict: {}", e)))?;

            for violation in &item_verdict.violations {
                conn.execute(
                    "INSERT INTO violations (case_id, item, kind, state, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        verdict.case_id,
                        item,
                        violation.kind.as_str(),
                        violation.state,
                        created_at
                    ],
                )
                .map_err(|e| EngineError::Io(format!("persist violation: {}", e)))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseflow_core::{ItemVerdict, Violation, ViolationKind};
    use std::collections::BTreeMap;

    fn verdict() -> CaseVerdict {
        let mut items = BTreeMap::new();
        items.insert(
            "Triage".to_string(),
            ItemVerdict {
                final_state: "Completed".to_string(),
                violations: vec![Violation {
                    kind: ViolationKind::InactiveToCompleted,
                    state: "Completed".to_string(),
                }],
            },
        );
        items.insert(
            "Lab Test".to_string(),
            ItemVerdict {
                final_state: "Active".to_string(),
                violations: Vec::new(),
            },
        );
        CaseVerdict {
            case_id: "7".to_string(),
            items,
        }
    }

    #[test]
    fn test_persist_and_requery() {
        let sink = SqliteVerdictSink::open_in_memory().unwrap();
        sink.send(&verdict()).unwrap();

        let conn = sink.conn.lock().unwrap();
        let final_state: String = conn
            .query_row(
                "SELECT final_state FROM verdicts WHERE case_id = '7' AND item = 'Triage'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(final_state, "Completed");

        let kind: String = conn
            .query_row(
                "SELECT kind FROM violations WHERE case_id = '7' AND item = 'Triage'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(kind, "inactiveToCompleted");
    }

    #[test]
    fn test_resending_a_case_is_idempotent() {
        let sink = SqliteVerdictSink::open_in_memory().unwrap();
        sink.send(&verdict()).unwrap();
        sink.send(&verdict()).unwrap();

        let conn = sink.conn.lock().unwrap();
        let verdict_rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM verdicts", [], |row| row.get(0))
            .unwrap();
        let violation_rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM violations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(verdict_rows, 2);
        assert_eq!(violation_rows, 1);
    }
}
