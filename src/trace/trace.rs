use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// One line of the jsonl trace log. Scans, pass failures, widget expansion
/// outcomes, per-field fill results, and settle resolutions all land here.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technique: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waited_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn new(event: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            event: event.to_string(),
            pass: None,
            field_id: None,
            count: None,
            fingerprint: None,
            technique: None,
            ok: None,
            waited_ms: None,
            detail: None,
        }
    }

    pub fn with_pass(mut self, pass: &str) -> Self {
        self.pass = Some(pass.to_string());
        self
    }

    pub fn with_field(mut self, field_id: &str) -> Self {
        self.field_id = Some(field_id.to_string());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: &str) -> Self {
        self.fingerprint = Some(fingerprint.to_string());
        self
    }

    pub fn with_technique(mut self, technique: &str) -> Self {
        self.technique = Some(technique.to_string());
        self
    }

    pub fn with_ok(mut self, ok: bool) -> Self {
        self.ok = Some(ok);
        self
    }

    pub fn with_waited(mut self, waited_ms: u64) -> Self {
        self.waited_ms = Some(waited_ms);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
