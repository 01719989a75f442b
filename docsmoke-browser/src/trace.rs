use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Append-only action log shared by the session backends.
#[derive(Debug, Default)]
pub struct TraceLog {
    entries: Mutex<Vec<TraceEntry>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<T, E: Display>(
        &self,
        action: &str,
        target: Option<String>,
        started: Instant,
        outcome: &std::result::Result<T, E>,
    ) {
        let entry = TraceEntry {
            timestamp: Utc::now(),
            action: action.to_string(),
            target,
            error: outcome.as_ref().err().map(|e| e.to_string()),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }

    pub fn entries(&self) -> Vec<TraceEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_errors_and_targets() {
        let log = TraceLog::new();
        let ok: Result<(), String> = Ok(());
        let failed: Result<(), String> = Err("boom".to_string());

        log.record("goto", Some("/".to_string()), Instant::now(), &ok);
        log.record("click", None, Instant::now(), &failed);

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "goto");
        assert_eq!(entries[0].target.as_deref(), Some("/"));
        assert!(entries[0].error.is_none());
        assert_eq!(entries[1].error.as_deref(), Some("boom"));
    }
}
