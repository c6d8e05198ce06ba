// ABOUTME: JSONL trace of every workflow step: inputs, minted tokens and rejections
// ABOUTME: Enabled with OFFERI_DEBUG=1; files land in OFFERI_DEBUG_DIR or .offeri/debug

use chrono::Utc;
use serde_json::Value as JsonValue;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

static DEBUG_LOGGER: Mutex<Option<DebugLogger>> = Mutex::new(None);

pub struct DebugLogger {
    file: File,
    log_path: PathBuf,
}

impl DebugLogger {
    pub fn current_log_path() -> Option<PathBuf> {
        DEBUG_LOGGER
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|l| l.log_path.clone()))
    }

    /// Initialize the global step trace if `OFFERI_DEBUG` is set.
    pub fn init() {
        let enabled = std::env::var("OFFERI_DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if !enabled {
            return;
        }

        let log_dir = std::env::var("OFFERI_DEBUG_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(".offeri")
                    .join("debug")
            });

        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create debug directory: {}", e);
            return;
        }

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let log_path = log_dir.join(format!("workflow_debug_{}.jsonl", timestamp));

        match OpenOptions::new().create(true).append(true).open(&log_path) {
            Ok(file) => {
                if let Ok(mut guard) = DEBUG_LOGGER.lock() {
                    *guard = Some(DebugLogger {
                        file,
                        log_path: log_path.clone(),
                    });
                    eprintln!("Workflow debug trace: {}", log_path.display());
                }
            }
            Err(e) => {
                eprintln!("Failed to open debug log file: {}", e);
            }
        }
    }

    pub fn is_enabled() -> bool {
        DEBUG_LOGGER
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    pub fn log_step_start(step: &str, arguments: &JsonValue) {
        Self::write_entry(|| {
            serde_json::json!({
                "timestamp": Utc::now().to_rfc3339(),
                "event": "step_start",
                "step": step,
                "arguments": arguments,
            })
        });
    }

    pub fn log_step_finish(step: &str, response: &JsonValue) {
        Self::write_entry(|| {
            serde_json::json!({
                "timestamp": Utc::now().to_rfc3339(),
                "event": "step_finish",
                "step": step,
                "response_summary": Self::summarize(response),
            })
        });
    }

    pub fn log_step_rejected(step: &str, error: &str) {
        Self::write_entry(|| {
            serde_json::json!({
                "timestamp": Utc::now().to_rfc3339(),
                "event": "step_rejected",
                "step": step,
                "error": error,
            })
        });
    }

    pub fn log_token_minted(step: &str, token: &str) {
        Self::write_entry(|| {
            serde_json::json!({
                "timestamp": Utc::now().to_rfc3339(),
                "event": "token_minted",
                "step": step,
                "token": token,
            })
        });
    }

    pub fn flush() {
        if let Ok(mut guard) = DEBUG_LOGGER.lock() {
            if let Some(logger) = guard.as_mut() {
                let _ = logger.file.flush();
            }
        }
    }

    fn write_entry<F>(build: F)
    where
        F: FnOnce() -> JsonValue,
    {
        let Ok(mut guard) = DEBUG_LOGGER.lock() else {
            return;
        };
        if let Some(logger) = guard.as_mut() {
            if let Ok(line) = serde_json::to_string(&build()) {
                let _ = writeln!(logger.file, "{}", line);
                let _ = logger.file.flush();
            }
        }
    }

    /// Token and top-level keys only; full responses can be large.
    fn summarize(response: &JsonValue) -> JsonValue {
        match response {
            JsonValue::Object(obj) => {
                let token = obj
                    .iter()
                    .find(|(key, _)| key.ends_with("_token"))
                    .map(|(_, value)| value.clone());
                serde_json::json!({
                    "keys": obj.keys().collect::<Vec<_>>(),
                    "token": token,
                })
            }
            other => other.clone(),
        }
    }
}

#[macro_export]
macro_rules! debug_log {
    (step_start, $step:expr, $args:expr) => {
        $crate::debug_logger::DebugLogger::log_step_start($step, $args);
    };
    (step_finish, $step:expr, $response:expr) => {
        $crate::debug_logger::DebugLogger::log_step_finish($step, $response);
    };
    (step_rejected, $step:expr, $error:expr) => {
        $crate::debug_logger::DebugLogger::log_step_rejected($step, $error);
    };
    (token, $step:expr, $token:expr) => {
        $crate::debug_logger::DebugLogger::log_token_minted($step, $token);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn setup_temp_logger() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        *DEBUG_LOGGER.lock().unwrap() = None;
        std::env::set_var("OFFERI_DEBUG", "1");
        std::env::set_var("OFFERI_DEBUG_DIR", dir.path());
        DebugLogger::init();
        let path = DebugLogger::current_log_path().expect("log path");
        fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        (dir, path)
    }

    fn read_events(path: &PathBuf) -> Vec<JsonValue> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    #[serial]
    fn step_events_logged_in_order() {
        let (_dir, path) = setup_temp_logger();
        let args = serde_json::json!({"country": "USA"});
        let response = serde_json::json!({"selection_token": "sel_abc", "next_step": "x"});

        DebugLogger::log_step_start("select_universities", &args);
        DebugLogger::log_token_minted("select_universities", "sel_abc");
        DebugLogger::log_step_finish("select_universities", &response);
        DebugLogger::flush();

        let events = read_events(&path);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["event"], "step_start");
        assert_eq!(events[1]["token"], "sel_abc");
        assert_eq!(events[2]["response_summary"]["token"], "sel_abc");
    }

    #[test]
    #[serial]
    fn rejection_logged_with_error_text() {
        let (_dir, path) = setup_temp_logger();
        DebugLogger::log_step_rejected("filter_programs", "Invalid token: batch_x");
        DebugLogger::flush();

        let events = read_events(&path);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["event"], "step_rejected");
        assert_eq!(events[0]["error"], "Invalid token: batch_x");
    }

    #[test]
    #[serial]
    fn disabled_logger_writes_nothing() {
        *DEBUG_LOGGER.lock().unwrap() = None;
        std::env::remove_var("OFFERI_DEBUG");
        DebugLogger::init();
        assert!(!DebugLogger::is_enabled());
        DebugLogger::log_step_start("noop", &serde_json::json!({}));
    }
}
