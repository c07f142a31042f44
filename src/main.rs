use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use turnkv::common::config::{DEFAULT_COMMANDS_FILE, DEFAULT_LOG_FILE, DEFAULT_OUTPUT_FILE};
use turnkv::execution::{load_commands, LogFileObserver, Observers, TracingObserver};
use turnkv::{Dispatcher, DuplicatePolicy, RunOptions};

/// Run a command file against an in-memory store, one thread per command,
/// in priority order.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command file to execute.
    #[arg(long, default_value = DEFAULT_COMMANDS_FILE)]
    commands: PathBuf,

    /// Thread log written during the run.
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log: PathBuf,

    /// File receiving one line per command outcome.
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Report inserts of existing names as duplicates instead of updating.
    #[arg(long)]
    reject_duplicates: bool,

    /// Skip the final table snapshot.
    #[arg(long)]
    no_final_print: bool,
}

impl Cli {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            duplicate_policy: if self.reject_duplicates {
                DuplicatePolicy::Reject
            } else {
                DuplicatePolicy::Merge
            },
            final_print: !self.no_final_print,
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

fn run(cli: &Cli) -> Result<()> {
    let commands = load_commands(&cli.commands)
        .with_context(|| format!("failed to load {}", cli.commands.display()))?;

    let log_files = LogFileObserver::create(&cli.log, &cli.output).with_context(|| {
        format!(
            "failed to create {} / {}",
            cli.log.display(),
            cli.output.display()
        )
    })?;
    let observers = Observers::new().with(TracingObserver).with(log_files);

    let dispatcher = Dispatcher::new(cli.run_options());
    let report = dispatcher.run(&commands, &observers)?;

    for worker in &report.outcomes {
        println!("{}", worker.outcome);
    }
    if let Some(table) = &report.final_snapshot {
        println!("Final Table:");
        for record in table {
            println!("{}", record);
        }
    }

    info!(
        commands = report.outcomes.len(),
        failures = report.failures(),
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
