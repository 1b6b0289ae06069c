use log4rs::append::Append;
use log4rs::encode::Encode;
use log4rs::encode::pattern::PatternEncoder;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::filter::Filter;
use super::format::Format;
use super::record::LogRecord;

/// Backend pattern: the line is pre-rendered, backends only terminate it.
pub const LINE_PATTERN: &str = "{m}{n}";

pub fn line_encoder() -> Box<dyn Encode> {
    Box::new(PatternEncoder::new(LINE_PATTERN))
}

/// A destination: shared filter and format in front of one backend.
#[derive(Debug)]
pub struct Sink {
    name: &'static str,
    filter: Arc<Filter>,
    format: Arc<Format>,
    backend: Arc<dyn Append>,
    failures: AtomicU64,
}

impl Sink {
    pub fn new(
        name: &'static str,
        filter: Arc<Filter>,
        format: Arc<Format>,
        backend: Arc<dyn Append>,
    ) -> Self {
        Self { name, filter, format, backend, failures: AtomicU64::new(0) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn filter(&self) -> &Arc<Filter> {
        &self.filter
    }

    pub fn format(&self) -> &Arc<Format> {
        &self.format
    }

    /// Filter, render and hand the record to the backend.
    ///
    /// Returns whether a line was written. Backend errors are counted, never raised.
    pub fn deliver(&self, record: &LogRecord) -> bool {
        if !self.filter.accepts(record.severity) {
            return false;
        }
        let line = self.format.render(record);
        let result = self.backend.append(
            &log::Record::builder()
                .level(record.severity.as_level())
                .target(self.name)
                .args(format_args!("{line}"))
                .build(),
        );
        match result {
            Ok(()) => true,
            Err(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Number of records the backend rejected since construction.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn flush(&self) {
        self.backend.flush();
    }
}
