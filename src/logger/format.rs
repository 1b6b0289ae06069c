use std::fmt::Write;

use super::record::LogRecord;

/// Sub-second timestamp layout: `2024-05-01 13:45:12.123456`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Bracketed attribute rendered ahead of the message.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    Timestamp,
    ThreadId,
    Severity,
    ProcessId,
    ProcessName,
}

/// Line template shared by every sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Format {
    fields: Vec<Field>,
    timestamp_format: String,
}

impl Format {
    /// `[timestamp] [thread-id] [severity] [process-id] [process-name] message`
    pub fn standard() -> Self {
        Self {
            fields: vec![
                Field::Timestamp,
                Field::ThreadId,
                Field::Severity,
                Field::ProcessId,
                Field::ProcessName,
            ],
            timestamp_format: TIMESTAMP_FORMAT.to_string(),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Render one record without a trailing newline.
    pub fn render(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(96 + record.message.len());
        for field in &self.fields {
            // Writing into a String cannot fail.
            let _ = match field {
                Field::Timestamp => {
                    write!(out, "[{}] ", record.timestamp.format(&self.timestamp_format))
                }
                Field::ThreadId => write!(out, "[{}] ", record.thread_id),
                Field::Severity => write!(out, "[{}] ", record.severity),
                Field::ProcessId => write!(out, "[{}] ", record.process_id),
                Field::ProcessName => write!(out, "[{}] ", record.process_name),
            };
        }
        out.push_str(&record.message);
        out
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::standard()
    }
}
