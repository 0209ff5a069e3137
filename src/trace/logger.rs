use std::{fs::OpenOptions, io::Write, sync::Mutex};

use crate::trace::trace::TraceEvent;

/// Append-only jsonl trace sink. Opening or writing the file failing only
/// warns; tracing must never take the engine down.
pub struct TraceLogger {
    file: Option<Mutex<std::fs::File>>,
}

impl TraceLogger {
    pub fn new(path: &str) -> Self {
        let file = OpenOptions::new().create(true).append(true).open(path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
            },
            Err(e) => {
                warn(&format!("could not open trace file '{}': {}", path, e));
                Self { file: None }
            }
        }
    }

    /// A logger that drops everything; tests and library callers that don't
    /// care about traces use this.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some(file_mutex) = &self.file else {
            return; // tracing disabled
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn(&format!("failed to serialize trace event: {}", e));
                return;
            }
        };

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                warn(&format!("trace logger lock poisoned: {}", e));
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            warn(&format!("failed to write trace event: {}", e));
        }
    }
}

/// Stderr warning, used for recovered faults the trace file can't capture.
pub fn warn(msg: &str) {
    eprintln!("Warning: {}", msg);
}
