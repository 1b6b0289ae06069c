pub mod cli;
pub mod config;
pub mod errors;
pub mod logger;
pub mod store;

pub use config::{AppConfig, LogConfig, StoreConfig};
pub use errors::Error;
pub use logger::{LogFacade, Severity};
pub use store::{Store, StoreState};

/// Initializes the process-wide logging facade from environment-derived configuration.
///
/// This should be called once, before the first log record is written.
pub fn init() -> Result<std::sync::Arc<LogFacade>, Error> {
    logger::initialize()
}
