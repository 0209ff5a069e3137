use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dom::dom_model::{DomSnapshot, FieldValue};
use crate::error::EngineError;
use crate::page::driver::{Key, PageDriver};

/// Request sent to page_host.js over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HostRequest {
    Navigate {
        cmd: &'static str,
        url: String,
    },
    Snapshot {
        cmd: &'static str,
    },
    Version {
        cmd: &'static str,
    },
    Target {
        cmd: &'static str,
        selector: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        values: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        attr: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_len: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Wait {
        cmd: &'static str,
        duration_ms: u64,
    },
    Quit {
        cmd: &'static str,
    },
}

impl HostRequest {
    fn target(cmd: &'static str, selector: &str) -> Self {
        HostRequest::Target {
            cmd,
            selector: selector.to_string(),
            key: None,
            value: None,
            values: None,
            checked: None,
            attr: None,
            max_len: None,
            path: None,
        }
    }
}

/// Response received from page_host.js over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct HostResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub found: Option<bool>,
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
}

/// A persistent handle to one live page, backed by page_host.js.
///
/// The host is a long-lived Node.js process keeping a Chromium page open. It
/// exposes DOM snapshots (each element stamped with a `data-ff-node`
/// ordinal), dispatches trusted-looking events for fills, and runs a
/// MutationObserver whose tick count backs `dom_version()`. Commands are
/// NDJSON over stdin, responses over stdout.
pub struct PageSession {
    script: String,
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
}

impl PageSession {
    /// Launch the page host process.
    pub fn launch(host_script: &str) -> Result<Self, EngineError> {
        let mut child = Command::new("node")
            .arg(host_script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EngineError::HostSpawn {
                script: host_script.into(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::SessionIo("Failed to capture page host stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::SessionIo("Failed to capture page host stdout".into()))?;

        let mut reader = BufReader::new(stdout);

        // Wait for the ready signal
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| EngineError::SessionIo(format!("Failed to read ready signal: {}", e)))?;
        if line.trim().is_empty() {
            return Err(host_exit_error(host_script, &mut child));
        }

        let response: HostResponse =
            serde_json::from_str(line.trim()).map_err(|e| EngineError::JsonParse {
                context: "page host ready signal".into(),
                source: e,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(EngineError::SessionProtocol {
                command: "launch".into(),
                error: "Did not receive ready signal from page host".into(),
            });
        }

        Ok(PageSession {
            script: host_script.to_string(),
            child,
            stdin,
            reader,
        })
    }

    fn send(&mut self, request: &HostRequest) -> Result<HostResponse, EngineError> {
        let json = serde_json::to_string(request).map_err(|e| EngineError::JsonSerialize {
            context: "HostRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)
            .map_err(|e| EngineError::SessionIo(format!("Failed to write to page host: {}", e)))?;
        self.stdin
            .flush()
            .map_err(|e| EngineError::SessionIo(format!("Failed to flush page host stdin: {}", e)))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| EngineError::SessionIo(format!("Failed to read from page host: {}", e)))?;

        if line.trim().is_empty() {
            return Err(host_exit_error(&self.script, &mut self.child));
        }

        serde_json::from_str(line.trim()).map_err(|e| EngineError::JsonParse {
            context: "page host response".into(),
            source: e,
        })
    }

    fn send_ok(
        &mut self,
        request: &HostRequest,
        command_name: &str,
    ) -> Result<HostResponse, EngineError> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(EngineError::SessionProtocol {
                command: command_name.into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }

    fn found(&mut self, request: &HostRequest, command_name: &str) -> Result<bool, EngineError> {
        let response = self.send_ok(request, command_name)?;
        Ok(response.found.unwrap_or(false))
    }

    /// Navigate the hosted page to a URL.
    pub fn navigate(&mut self, url: &str) -> Result<(), EngineError> {
        let request = HostRequest::Navigate {
            cmd: "navigate",
            url: url.to_string(),
        };
        self.send_ok(&request, "navigate")?;
        Ok(())
    }

    /// Shut the page host down. Best-effort.
    pub fn quit(&mut self) -> Result<(), EngineError> {
        let _ = self.send(&HostRequest::Quit { cmd: "quit" });
        let _ = self.child.wait();
        Ok(())
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}

/// The host closing its stdout mid-protocol usually means the process died.
/// When its exit status is observable, surface that plus whatever it wrote
/// to stderr instead of a bare I/O error.
fn host_exit_error(script: &str, child: &mut Child) -> EngineError {
    let status = match child.try_wait() {
        Ok(Some(status)) => status,
        _ => {
            return EngineError::SessionIo(
                "Empty response from page host (process may have died)".into(),
            );
        }
    };
    let mut stderr = String::new();
    if let Some(mut pipe) = child.stderr.take() {
        let _ = pipe.read_to_string(&mut stderr);
    }
    EngineError::HostExited {
        script: script.to_string(),
        status,
        stderr: stderr.trim().to_string(),
    }
}

impl PageDriver for PageSession {
    fn snapshot(&mut self) -> Result<DomSnapshot, EngineError> {
        let response = self.send_ok(&HostRequest::Snapshot { cmd: "snapshot" }, "snapshot")?;
        let data = response.data.ok_or_else(|| {
            EngineError::SnapshotStructure("No data in snapshot response".into())
        })?;
        DomSnapshot::from_json(data)
    }

    fn dom_version(&mut self) -> Result<u64, EngineError> {
        let response = self.send_ok(&HostRequest::Version { cmd: "version" }, "version")?;
        Ok(response.version.unwrap_or(0))
    }

    fn click(&mut self, selector: &str) -> Result<bool, EngineError> {
        self.found(&HostRequest::target("click", selector), "click")
    }

    fn press_key(&mut self, selector: &str, key: Key) -> Result<bool, EngineError> {
        let mut request = HostRequest::target("press", selector);
        if let HostRequest::Target { key: k, .. } = &mut request {
            *k = Some(key.as_str().to_string());
        }
        self.found(&request, "press")
    }

    fn set_value(&mut self, selector: &str, value: &str) -> Result<bool, EngineError> {
        let mut request = HostRequest::target("set_value", selector);
        if let HostRequest::Target { value: v, .. } = &mut request {
            *v = Some(value.to_string());
        }
        self.found(&request, "set_value")
    }

    fn set_checked(&mut self, selector: &str, checked: bool) -> Result<bool, EngineError> {
        let mut request = HostRequest::target("set_checked", selector);
        if let HostRequest::Target { checked: c, .. } = &mut request {
            *c = Some(checked);
        }
        self.found(&request, "set_checked")
    }

    fn select_values(&mut self, selector: &str, values: &[String]) -> Result<bool, EngineError> {
        let mut request = HostRequest::target("select", selector);
        if let HostRequest::Target { values: v, .. } = &mut request {
            *v = Some(values.to_vec());
        }
        self.found(&request, "select")
    }

    fn set_attribute(
        &mut self,
        selector: &str,
        name: &str,
        value: &str,
    ) -> Result<bool, EngineError> {
        let mut request = HostRequest::target("set_attr", selector);
        if let HostRequest::Target { attr, value: v, .. } = &mut request {
            *attr = Some(name.to_string());
            *v = Some(value.to_string());
        }
        self.found(&request, "set_attr")
    }

    fn read_value(&mut self, selector: &str) -> Result<Option<FieldValue>, EngineError> {
        let response = self.send_ok(&HostRequest::target("read_value", selector), "read_value")?;
        if response.found != Some(true) {
            return Ok(None);
        }
        let value = response.value.unwrap_or(Value::Null);
        let parsed = serde_json::from_value(value).map_err(|e| EngineError::JsonParse {
            context: "read_value response".into(),
            source: e,
        })?;
        Ok(Some(parsed))
    }

    fn query_visible(&mut self, selector: &str) -> Result<bool, EngineError> {
        let response = self.send_ok(&HostRequest::target("visible", selector), "visible")?;
        Ok(response.visible.unwrap_or(false))
    }

    fn outer_html(
        &mut self,
        selector: &str,
        max_len: usize,
    ) -> Result<Option<String>, EngineError> {
        let mut request = HostRequest::target("outer_html", selector);
        if let HostRequest::Target { max_len: m, .. } = &mut request {
            *m = Some(max_len);
        }
        let response = self.send_ok(&request, "outer_html")?;
        Ok(response.html)
    }

    fn upload(&mut self, selector: &str, path: &str) -> Result<bool, EngineError> {
        let mut request = HostRequest::target("upload", selector);
        if let HostRequest::Target { path: p, .. } = &mut request {
            *p = Some(path.to_string());
        }
        self.found(&request, "upload")
    }

    fn wait(&mut self, ms: u64) -> Result<(), EngineError> {
        let request = HostRequest::Wait {
            cmd: "wait",
            duration_ms: ms,
        };
        self.send_ok(&request, "wait")?;
        Ok(())
    }
}
