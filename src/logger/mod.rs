//! Logging facade: one handle, a shared severity filter and line format, two sinks.
//!
//! ```no_run
//! let handle = dualsink::logger::initialize().unwrap();
//! dualsink::emit!(handle, dualsink::logger::Severity::Info, "started pid={}", std::process::id());
//! log::warn!("plain `log` macros are routed through the same sinks");
//! ```

pub mod capture;
pub mod facade;
pub mod filter;
pub mod format;
pub mod record;
pub mod rotating;
pub mod severity;
pub mod sink;

pub use capture::MemoryAppender;
pub use facade::LogFacade;
pub use filter::Filter;
pub use format::Format;
pub use record::{LogRecord, ProcessInfo};
pub use rotating::{RotatingFileAppender, RotationPolicy};
pub use severity::Severity;
pub use sink::Sink;

use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

use crate::config::{AppConfig, LogConfig};
use crate::errors::Error;

static GLOBAL: OnceLock<Arc<LogFacade>> = OnceLock::new();
static INIT_LOCK: Mutex<()> = parking_lot::const_mutex(());

#[derive(Debug)]
struct Installed(Arc<LogFacade>);

impl log::Log for Installed {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        log::Log::enabled(&*self.0, metadata)
    }

    fn log(&self, record: &log::Record) {
        log::Log::log(&*self.0, record)
    }

    fn flush(&self) {
        log::Log::flush(&*self.0)
    }
}

/// Build the facade from environment-derived configuration and register it
/// as the process-wide `log` logger.
pub fn initialize() -> Result<Arc<LogFacade>, Error> {
    initialize_with(&AppConfig::load(None)?.log)
}

/// Build the facade from `config` and register it as the process-wide `log` logger.
///
/// # Errors
/// `Error::SinkInit` when the file sink cannot open its target, `Error::AlreadyInitialized`
/// when called a second time or when another `log` logger is already installed.
pub fn initialize_with(config: &LogConfig) -> Result<Arc<LogFacade>, Error> {
    let _guard = INIT_LOCK.lock();
    if GLOBAL.get().is_some() {
        return Err(Error::AlreadyInitialized);
    }
    let facade = Arc::new(LogFacade::build(config)?);
    if log::set_boxed_logger(Box::new(Installed(facade.clone()))).is_err() {
        // Another `log` logger owns the process; leave no empty file behind.
        facade.discard_unused_file();
        return Err(Error::AlreadyInitialized);
    }
    log::set_max_level(log::LevelFilter::Info);
    let _ = GLOBAL.set(facade.clone());
    Ok(facade)
}

/// The registered facade, `None` before initialization.
pub fn handle() -> Option<Arc<LogFacade>> {
    GLOBAL.get().cloned()
}

/// Write through a facade handle with an explicit severity.
#[macro_export]
macro_rules! emit {
    ($handle:expr, $severity:expr, $($arg:tt)+) => {
        $handle.write($severity, format_args!($($arg)+))
    };
}

/// Write a `fatal` record; the `log` crate has no such level.
#[macro_export]
macro_rules! fatal {
    ($handle:expr, $($arg:tt)+) => {
        $crate::emit!($handle, $crate::logger::Severity::Fatal, $($arg)+)
    };
}
