use clap::{Parser, Subcommand};
use dualsink::cli::{self as prog_cli, Context};
use dualsink::{AppConfig, Store, logger};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dualsink", version, about = "Dual-sink logger and SQLite store CLI", long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, help = "Path to a config file (TOML). If omitted, defaults and DUALSINK_* env vars are used.")]
    config: Option<PathBuf>,
    /// Override DB path (takes precedence over config)
    #[arg(long, help = "Override database path (e.g., app.db). Takes precedence over config/env.")]
    db: Option<PathBuf>,
    /// Override log directory
    #[arg(long, help = "Directory for rotated log files. Takes precedence over config/env.")]
    log_dir: Option<PathBuf>,
    #[arg(long, default_value = "human", help = "Output format: human|plain")]
    format: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Execute SQL statements (no result rows) against the database")]
    Exec {
        #[arg(required = true, help = "One or more SQL statements, run in order")]
        sql: Vec<String>,
    },
    #[command(about = "Write a record through the file and console sinks")]
    Log {
        #[arg(long, default_value = "info", help = "trace|debug|info|warning|error|fatal")]
        level: String,
        #[arg(long, default_value_t = 1, help = "Concurrent writer threads")]
        threads: usize,
        #[arg(long, default_value_t = 1, help = "Records written by each thread")]
        repeat: usize,
        #[arg(required = true, help = "Message text")]
        message: Vec<String>,
    },
    #[command(about = "Print the resolved configuration")]
    Check,
}

fn main() {
    let cli = Cli::parse();
    let mut cfg = match AppConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };
    if let Some(db) = cli.db {
        cfg.store.path = Some(db);
    }
    if let Some(dir) = cli.log_dir {
        cfg.log.dir = dir;
    }
    let mode = prog_cli::parse_output_mode(Some(cli.format.as_str()));

    let cmd = match cli.command {
        Commands::Exec { sql } => prog_cli::Command::Exec { statements: sql },
        Commands::Log { level, threads, repeat, message } => match prog_cli::parse_severity(&level) {
            Ok(severity) => {
                prog_cli::Command::Log { severity, message: message.join(" "), threads, repeat }
            }
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(2);
            }
        },
        Commands::Check => prog_cli::Command::Check,
    };

    // `check` only reports; everything else logs through the facade.
    let facade = match cmd {
        prog_cli::Command::Check => None,
        _ => match logger::initialize_with(&cfg.log) {
            Ok(l) => Some(l),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
    };

    let ctx = Context { store: Store::global(), log: facade, config: cfg };
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = prog_cli::run(&ctx, cmd, mode, &mut stdout) {
        if ctx.log.is_some() {
            log::error!("{e}");
        } else {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}
