use crate::errors::Error;
use crate::logger::Severity;

use super::runner::OutputMode;

pub fn parse_severity(s: &str) -> Result<Severity, Error> {
    s.parse::<Severity>().map_err(Error::Configuration)
}

pub fn parse_output_mode(s: Option<&str>) -> OutputMode {
    match s.map(str::to_ascii_lowercase).as_deref() {
        Some("plain") => OutputMode::Plain,
        _ => OutputMode::Human,
    }
}
