use std::io::Write;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::Error;
use crate::logger::LogFacade;
use crate::store::{Store, StoreState};

use super::command::Command;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    Human,
    Plain,
}

/// What a command may touch.
pub struct Context<'a> {
    pub store: &'a Store,
    pub log: Option<Arc<LogFacade>>,
    pub config: AppConfig,
}

pub fn run(
    ctx: &Context<'_>,
    cmd: Command,
    mode: OutputMode,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Command::Exec { statements } => {
            if ctx.store.state() == StoreState::Unconfigured {
                let path = ctx.config.store.path.as_ref().ok_or_else(|| {
                    Error::Configuration("no database path; pass --db or set DUALSINK_DB".into())
                })?;
                ctx.store.set_path(path)?;
            }
            let opened_here = !ctx.store.is_connected();
            if opened_here {
                ctx.store.connect()?;
            }
            let result = statements.iter().enumerate().try_for_each(|(i, sql)| {
                ctx.store.execute(sql)?;
                match mode {
                    OutputMode::Human => writeln!(out, "ok statement={}", i + 1)?,
                    OutputMode::Plain => writeln!(out, "ok")?,
                }
                Ok::<(), Box<dyn std::error::Error>>(())
            });
            if opened_here {
                ctx.store.disconnect()?;
            }
            result
        }
        Command::Log { severity, message, threads, repeat } => {
            let log = ctx
                .log
                .as_ref()
                .ok_or_else(|| Error::Configuration("logging is not initialized".into()))?;
            let (threads, repeat) = (threads.max(1), repeat.max(1));
            if threads == 1 && repeat == 1 {
                log.write(severity, &message);
            } else {
                std::thread::scope(|scope| {
                    for t in 0..threads {
                        let message = &message;
                        scope.spawn(move || {
                            for n in 0..repeat {
                                log.write(severity, format_args!("{message} t{t} n{n}"));
                            }
                        });
                    }
                });
            }
            log.flush();
            Ok(())
        }
        Command::Check => {
            let text = toml::to_string_pretty(&ctx.config)?;
            match mode {
                OutputMode::Human => write!(out, "# resolved configuration\n{text}")?,
                OutputMode::Plain => write!(out, "{text}")?,
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{MemoryAppender, ProcessInfo, Severity};
    use tempfile::tempdir;

    #[test]
    fn exec_opens_runs_and_closes() {
        let dir = tempdir().unwrap();
        let store = Store::new();
        let mut config = AppConfig::default();
        config.store.path = Some(dir.path().join("cli.db"));
        let ctx = Context { store: &store, log: None, config };
        let mut out = Vec::new();
        let cmd = Command::Exec {
            statements: vec!["CREATE TABLE t(x)".into(), "INSERT INTO t VALUES (1)".into()],
        };
        run(&ctx, cmd, OutputMode::Human, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ok statement=1\nok statement=2\n");
        assert_eq!(store.state(), StoreState::Disconnected);
    }

    #[test]
    fn exec_without_path_fails() {
        let store = Store::new();
        let ctx = Context { store: &store, log: None, config: AppConfig::default() };
        let cmd = Command::Exec { statements: vec!["SELECT 1".into()] };
        assert!(run(&ctx, cmd, OutputMode::Plain, &mut Vec::new()).is_err());
    }

    #[test]
    fn failed_statement_still_closes_store() {
        let dir = tempdir().unwrap();
        let store = Store::new();
        let mut config = AppConfig::default();
        config.store.path = Some(dir.path().join("cli.db"));
        let ctx = Context { store: &store, log: None, config };
        let cmd = Command::Exec { statements: vec!["NOT SQL".into()] };
        assert!(run(&ctx, cmd, OutputMode::Plain, &mut Vec::new()).is_err());
        assert_eq!(store.state(), StoreState::Disconnected);
    }

    #[test]
    fn log_command_writes_through_facade() {
        let sink = MemoryAppender::new();
        let facade = LogFacade::with_backends(
            ProcessInfo::current(),
            Arc::new(sink.clone()),
            Arc::new(MemoryAppender::new()),
        );
        let store = Store::new();
        let ctx = Context { store: &store, log: Some(Arc::new(facade)), config: AppConfig::default() };
        let cmd = Command::Log {
            severity: Severity::Warning,
            message: "from cli".into(),
            threads: 1,
            repeat: 1,
        };
        run(&ctx, cmd, OutputMode::Human, &mut Vec::new()).unwrap();
        assert!(sink.contents().contains("[warning]"));
        assert!(sink.contents().trim_end().ends_with("] from cli"));
    }

    #[test]
    fn log_command_fans_out_across_threads() {
        let sink = MemoryAppender::new();
        let facade = LogFacade::with_backends(
            ProcessInfo::current(),
            Arc::new(MemoryAppender::new()),
            Arc::new(sink.clone()),
        );
        let store = Store::new();
        let ctx = Context { store: &store, log: Some(Arc::new(facade)), config: AppConfig::default() };
        let cmd = Command::Log { severity: Severity::Info, message: "burst".into(), threads: 3, repeat: 4 };
        run(&ctx, cmd, OutputMode::Human, &mut Vec::new()).unwrap();
        let lines = sink.lines();
        assert_eq!(lines.len(), 12);
        assert!(lines.iter().any(|l| l.ends_with("burst t2 n3")));
    }

    #[test]
    fn check_prints_toml() {
        let store = Store::new();
        let ctx = Context { store: &store, log: None, config: AppConfig::default() };
        let mut out = Vec::new();
        run(&ctx, Command::Check, OutputMode::Plain, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("rotation_size = 10485760"), "{text}");
    }
}
