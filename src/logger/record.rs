use chrono::{DateTime, Local};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::severity::Severity;

/// Identity of the running process stamped onto every record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessInfo {
    pub id: u32,
    pub name: Arc<str>,
}

impl ProcessInfo {
    /// Pid plus the executable stem (falls back to `argv[0]`, then `"unknown"`).
    pub fn current() -> Self {
        let name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .or_else(|| std::env::args().next())
            .unwrap_or_else(|| "unknown".to_string());
        Self { id: std::process::id(), name: name.into() }
    }

    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }
}

// Used only when the std id cannot be read; never 0.
static NEXT_LOCAL_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = parse_thread_id(&format!("{:?}", std::thread::current().id()))
        .unwrap_or_else(next_local_id);
}

// `ThreadId` only exposes its number through Debug: "ThreadId(7)".
fn parse_thread_id(raw: &str) -> Option<u64> {
    raw.strip_prefix("ThreadId(")?.strip_suffix(')')?.parse().ok()
}

fn next_local_id() -> u64 {
    NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed)
}

/// Numeric id of the calling thread.
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

/// One log event. Built at the call site and dropped once every sink has seen it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub thread_id: u64,
    pub severity: Severity,
    pub process_id: u32,
    pub process_name: Arc<str>,
    pub message: String,
}

impl LogRecord {
    /// Stamp `message` with the clock, calling thread and process identity.
    pub fn capture(process: &ProcessInfo, severity: Severity, message: String) -> Self {
        Self {
            timestamp: Local::now(),
            thread_id: current_thread_id(),
            severity,
            process_id: process.id,
            process_name: process.name.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_ids_differ_between_threads() {
        let here = current_thread_id();
        let there = std::thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(here, 0);
        assert_ne!(here, there);
    }

    #[test]
    fn parse_thread_id_handles_debug_form() {
        assert_eq!(parse_thread_id("ThreadId(42)"), Some(42));
        assert_eq!(parse_thread_id("garbage"), None);
        assert_eq!(parse_thread_id("ThreadId(x)"), None);
    }

    #[test]
    fn local_ids_are_distinct_and_nonzero() {
        let a = next_local_id();
        let b = next_local_id();
        assert_ne!(a, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn capture_fills_every_field() {
        let process = ProcessInfo::current().with_name("unit");
        let rec = LogRecord::capture(&process, Severity::Warning, "disk low".into());
        assert_eq!(rec.process_id, std::process::id());
        assert_eq!(&*rec.process_name, "unit");
        assert_eq!(rec.thread_id, current_thread_id());
        assert_eq!(rec.severity, Severity::Warning);
        assert_eq!(rec.message, "disk low");
    }
}
