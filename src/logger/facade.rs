use log4rs::append::Append;
use log4rs::append::console::{ConsoleAppender, Target};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::LogConfig;
use crate::errors::Error;

use super::filter::Filter;
use super::format::Format;
use super::record::{LogRecord, ProcessInfo};
use super::rotating::RotatingFileAppender;
use super::severity::Severity;
use super::sink::{Sink, line_encoder};

/// One handle fanning records out to a file sink and a console sink.
///
/// Both sinks hold the same `Arc<Filter>` and `Arc<Format>`; neither can be changed after
/// construction, so every sink always sees identical policy.
#[derive(Debug)]
pub struct LogFacade {
    filter: Arc<Filter>,
    format: Arc<Format>,
    file: Sink,
    console: Sink,
    process: ProcessInfo,
    // Set only when `build` owns the file backend.
    rotating: Option<Arc<RotatingFileAppender>>,
}

impl LogFacade {
    /// Rotating file under `config.dir` plus the process stderr.
    ///
    /// # Errors
    /// `Error::SinkInit` if the file backend cannot be opened.
    pub fn build(config: &LogConfig) -> Result<Self, Error> {
        let filter = Arc::new(Self::build_filter());
        let format = Arc::new(Self::build_format());
        let (file, rotating) = Self::build_file_sink(config, &filter, &format)?;
        let console = Self::build_console_sink(&filter, &format);
        Ok(Self {
            filter,
            format,
            file,
            console,
            process: Self::process_info(config),
            rotating: Some(rotating),
        })
    }

    /// Same policies over caller-supplied backends.
    pub fn with_backends(
        process: ProcessInfo,
        file: Arc<dyn Append>,
        console: Arc<dyn Append>,
    ) -> Self {
        let filter = Arc::new(Self::build_filter());
        let format = Arc::new(Self::build_format());
        Self {
            file: Sink::new("file", filter.clone(), format.clone(), file),
            console: Sink::new("console", filter.clone(), format.clone(), console),
            filter,
            format,
            process,
            rotating: None,
        }
    }

    fn build_filter() -> Filter {
        Filter::threshold(Severity::Info)
    }

    fn build_format() -> Format {
        Format::standard()
    }

    fn build_file_sink(
        config: &LogConfig,
        filter: &Arc<Filter>,
        format: &Arc<Format>,
    ) -> Result<(Sink, Arc<RotatingFileAppender>), Error> {
        let backend = Arc::new(
            RotatingFileAppender::builder()
                .pattern(config.file_pattern.clone())
                .rotation_size(config.rotation_size)
                .sync_every_write(config.sync_every_write)
                .encoder(line_encoder())
                .build(&config.dir)?,
        );
        Ok((Sink::new("file", filter.clone(), format.clone(), backend.clone()), backend))
    }

    // The appender locks stderr per record and never closes it.
    fn build_console_sink(filter: &Arc<Filter>, format: &Arc<Format>) -> Sink {
        let backend =
            ConsoleAppender::builder().target(Target::Stderr).encoder(line_encoder()).build();
        Sink::new("console", filter.clone(), format.clone(), Arc::new(backend))
    }

    fn process_info(config: &LogConfig) -> ProcessInfo {
        let process = ProcessInfo::current();
        match &config.process_name {
            Some(name) => process.with_name(name.as_str()),
            None => process,
        }
    }

    /// Capture a record and deliver it to every sink whose filter accepts it.
    pub fn write(&self, severity: Severity, message: impl fmt::Display) {
        let record = LogRecord::capture(&self.process, severity, message.to_string());
        self.dispatch(&record);
    }

    /// Deliver an already captured record. Returns how many sinks wrote it.
    ///
    /// Sinks run one after the other on the calling thread, file first. A failing sink never
    /// stops the other, but a slow file write (fsync per record) delays the console line for
    /// this record. Cross-sink delivery is best-effort, not transactional.
    pub fn dispatch(&self, record: &LogRecord) -> usize {
        // Each sink is attempted regardless of the other's outcome.
        let to_file = self.file.deliver(record);
        let to_console = self.console.deliver(record);
        usize::from(to_file) + usize::from(to_console)
    }

    pub fn filter(&self) -> &Arc<Filter> {
        &self.filter
    }

    pub fn format(&self) -> &Arc<Format> {
        &self.format
    }

    pub fn process(&self) -> &ProcessInfo {
        &self.process
    }

    /// Active log file, when the file backend was built from a `LogConfig`.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.rotating.as_ref().map(|r| r.current_path())
    }

    /// Delete the active log file if no record reached it.
    pub(crate) fn discard_unused_file(&self) {
        if let Some(rotating) = &self.rotating {
            let _ = rotating.remove_if_empty();
        }
    }

    pub fn file_sink(&self) -> &Sink {
        &self.file
    }

    pub fn console_sink(&self) -> &Sink {
        &self.console
    }

    pub fn flush(&self) {
        self.file.flush();
        self.console.flush();
    }
}

impl log::Log for LogFacade {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.filter.accepts(metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        if self.filter.accepts(record.level().into()) {
            self.write(record.level().into(), record.args());
        }
    }

    fn flush(&self) {
        self.file.flush();
        self.console.flush();
    }
}
