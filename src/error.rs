use std::fmt;
use std::process::ExitStatus;

#[derive(Debug)]
pub enum EngineError {
    /// Node.js page host failed to spawn
    HostSpawn { script: String, source: std::io::Error },

    /// Page host exited with non-zero status
    HostExited { script: String, status: ExitStatus, stderr: String },

    /// JSON parsing failed (host output or serde)
    JsonParse { context: String, source: serde_json::Error },

    /// JSON serialization failed (request to the page host)
    JsonSerialize { context: String, source: serde_json::Error },

    /// I/O against the page host pipes failed
    SessionIo(String),

    /// Page host reported a command failure
    SessionProtocol { command: String, error: String },

    /// DOM snapshot had an unexpected shape
    SnapshotStructure(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::HostSpawn { script, source } => {
                write!(f, "Failed to spawn {} (is Node.js installed?): {}", script, source)
            }
            EngineError::HostExited { script, status, stderr } => {
                write!(f, "{} exited with {}: {}", script, status, stderr)
            }
            EngineError::JsonParse { context, source } => {
                write!(f, "JSON parse error ({}): {}", context, source)
            }
            EngineError::JsonSerialize { context, source } => {
                write!(f, "JSON serialize error ({}): {}", context, source)
            }
            EngineError::SessionIo(msg) => {
                write!(f, "Page host I/O error: {}", msg)
            }
            EngineError::SessionProtocol { command, error } => {
                write!(f, "Page host command '{}' failed: {}", command, error)
            }
            EngineError::SnapshotStructure(msg) => {
                write!(f, "Unexpected DOM snapshot structure: {}", msg)
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::HostSpawn { source, .. } => Some(source),
            EngineError::JsonParse { source, .. } => Some(source),
            EngineError::JsonSerialize { source, .. } => Some(source),
            _ => None,
        }
    }
}
