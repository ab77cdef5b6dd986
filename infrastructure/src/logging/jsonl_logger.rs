//! JSONL file writer for agent events.
//!
//! Each [`AgentEvent`] is serialized as a single JSON line with its event
//! tag and a `timestamp`, appended to the file via a buffered writer.

use cadmate_application::ports::events::AgentEvent;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL execution logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlExecutionLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlExecutionLogger {
    /// Create a new logger writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(error) = std::fs::create_dir_all(parent) {
                    warn!(
                        "Could not create execution log directory {}: {}",
                        parent.display(),
                        error
                    );
                    return None;
                }
            }
        }

        let file = match File::create(path) {
            Ok(file) => file,
            Err(error) => {
                warn!(
                    "Could not create execution log file {}: {}",
                    path.display(),
                    error
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a JSON line.
    pub fn log(&self, event: &AgentEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let record = match serde_json::to_value(event) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.insert(
                    "timestamp".to_string(),
                    serde_json::Value::String(timestamp),
                );
                serde_json::Value::Object(map)
            }
            Ok(other) => serde_json::json!({
                "timestamp": timestamp,
                "data": other,
            }),
            Err(_) => return,
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Flush per event; JSONL is append-only
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlExecutionLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadmate_domain::agent::{AgentMode, ExecutionState, RiskLevel};
    use std::io::Read;

    #[test]
    fn test_logger_writes_valid_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("execution.jsonl");
        let logger = JsonlExecutionLogger::new(&path).unwrap();

        logger.log(&AgentEvent::PlanCreated {
            plan_id: "plan-1".to_string(),
            steps: 2,
            risk_level: RiskLevel::Low,
        });
        logger.log(&AgentEvent::ModeChanged {
            from: AgentMode::Chat,
            to: AgentMode::Agent,
        });
        logger.log(&AgentEvent::StateChanged {
            from: ExecutionState::Idle,
            to: ExecutionState::Planning,
        });
        drop(logger);

        let mut content = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        let lines: Vec<&str> = content.trim().lines().collect();
        assert_eq!(lines.len(), 3);

        for line in &lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("event").is_some());
            assert!(value.get("timestamp").is_some());
        }

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "plan_created");
        assert_eq!(first["plan_id"], "plan-1");
        assert_eq!(first["steps"], 2);
    }

    #[test]
    fn test_logger_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("execution.jsonl");
        let logger = JsonlExecutionLogger::new(&path);
        assert!(logger.is_some());
        assert!(path.exists());
    }
}
