use crate::logger::Severity;

pub enum Command {
    /// Run each statement, in order, against the configured store.
    Exec { statements: Vec<String> },
    /// Write records through the logging facade; `threads` writers each emit `repeat` records.
    /// Beyond a single record every message gets a ` t<thread> n<index>` suffix.
    Log { severity: Severity, message: String, threads: usize, repeat: usize },
    /// Print the resolved configuration.
    Check,
}
