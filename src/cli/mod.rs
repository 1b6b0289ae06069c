mod command;
mod runner;
mod util;

pub use command::Command;
pub use runner::{Context, OutputMode, run};
pub use util::{parse_output_mode, parse_severity};
