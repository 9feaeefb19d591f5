use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::warn;
use uuid::Uuid;

/// How status bodies are written to the message log.
pub enum MessageLogMode {
    /// Every status body in full.
    Full,
    /// First status body in full, afterwards only the changed leaves.
    Diffed,
}

/// Appends one JSON object per line for every exchange with the cloud.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous_status: Option<Value>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous_status: None,
        })
    }

    pub fn log_request(&mut self, method: &str, path: &str) {
        self.write_line(&json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "path": path,
        }));
    }

    /// Logs an outbound command and returns the id correlating it with its result.
    pub fn log_command(&mut self, label: &str, body: &Value) -> Uuid {
        let id = Uuid::new_v4();
        self.write_line(&json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "id": id.to_string(),
            "command": label,
            "body": body,
        }));
        id
    }

    pub fn log_command_result(&mut self, id: Uuid, result: &str) {
        self.write_line(&json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "result",
            "id": id.to_string(),
            "result": result,
        }));
    }

    pub fn log_status(&mut self, status: u16, body: &Value) {
        let mut entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "status",
            "status": status,
        });

        match (&self.mode, &self.previous_status) {
            (MessageLogMode::Diffed, Some(prev)) => {
                entry["changes"] = Value::Array(status_changes(prev, body));
            }
            (MessageLogMode::Diffed, None) => {
                entry["full"] = json!(true);
                entry["body"] = body.clone();
            }
            (MessageLogMode::Full, _) => {
                entry["body"] = body.clone();
            }
        }

        self.write_line(&entry);
        if matches!(self.mode, MessageLogMode::Diffed) {
            self.previous_status = Some(body.clone());
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write message log entry: {e}");
        }
    }
}

/// `{path, old, new}` for every leaf that differs between two status bodies.
/// Arrays such as `EnabledZones` compare whole; fields that disappeared are
/// reported with a null `new`.
fn status_changes(previous: &Value, current: &Value) -> Vec<Value> {
    let mut changes = Vec::new();
    collect_changes(Some(previous), current, &mut String::new(), &mut changes);
    changes
}

fn collect_changes(previous: Option<&Value>, current: &Value, path: &mut String, out: &mut Vec<Value>) {
    let Value::Object(fields) = current else {
        let old = previous.cloned().unwrap_or(Value::Null);
        if old != *current {
            out.push(json!({ "path": path.as_str(), "old": old, "new": current }));
        }
        return;
    };

    let before = previous.and_then(Value::as_object);
    for (key, value) in fields {
        with_key(path, key, |path| {
            collect_changes(before.and_then(|m| m.get(key)), value, path, out)
        });
    }
    for (key, old) in before.into_iter().flat_map(Map::iter) {
        if !fields.contains_key(key) {
            with_key(path, key, |path| {
                out.push(json!({ "path": path.as_str(), "old": old, "new": Value::Null }))
            });
        }
    }
}

fn with_key(path: &mut String, key: &str, f: impl FnOnce(&mut String)) {
    let len = path.len();
    if len > 0 {
        path.push('.');
    }
    path.push_str(key);
    f(path);
    path.truncate(len);
}
