use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use linklock::{
    default_workers, Charset, LinkOracle, ProgressReporter, SearchConfig, SearchCoordinator,
    SearchOutcome, StatusLine, DEFAULT_CHARSET, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_GRACE,
};

/// Conventional exit status after SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

/// Recover the passphrase of a Link Lock URL by exhaustive search.
#[derive(Parser, Debug)]
#[command(name = "crack", version)]
struct Cli {
    /// Symbols to build candidates from, in enumeration order
    #[arg(short, long, default_value_t = String::from(DEFAULT_CHARSET))]
    charset: String,

    /// Worker threads, 0 for one per CPU core
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Seconds between status line updates
    #[arg(short, long, default_value_t = 1)]
    progress_interval: u64,

    /// Give up after exhausting this password length
    #[arg(short, long)]
    max_length: Option<usize>,

    /// Candidates buffered ahead of the workers
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Log search internals
    #[arg(short, long)]
    verbose: bool,

    /// The locked link
    url: String,
}

impl Cli {
    fn search_config(&self) -> anyhow::Result<SearchConfig> {
        let charset = Charset::new(&self.charset).context("Invalid --charset")?;
        let workers = match self.threads {
            0 => default_workers(),
            n => n,
        };
        Ok(SearchConfig {
            charset,
            workers,
            queue_capacity: self.queue_capacity,
            progress_interval: Duration::from_secs(self.progress_interval),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            max_length: self.max_length,
        })
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let record = linklock_link::decode_link(&cli.url).context("Invalid locked link")?;
    let config = cli.search_config()?;
    config.validate()?;
    info!(
        workers = config.workers,
        charset = %config.charset,
        "Starting search"
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping workers");
                cancel.cancel();
            }
        }
    });

    let (progress, reporter) = ProgressReporter::spawn(config.progress_interval, StatusLine::stderr());
    let grace = config.shutdown_grace;
    let coordinator = SearchCoordinator::new(config, LinkOracle::new(record), progress)?
        .with_cancellation(cancel);
    let report = coordinator.run().await?;

    // Dropping the coordinator releases its progress handle; detached workers
    // release theirs after their last trial.
    drop(coordinator);
    match tokio::time::timeout(grace, reporter).await {
        Ok(Ok(tally)) => info!(attempts = tally.attempts(), "Search finished"),
        Ok(Err(err)) => warn!(error = %err, "Progress reporter failed"),
        Err(_) => warn!("Progress reporter did not shut down"),
    }

    match &report.outcome {
        SearchOutcome::Found(found) => {
            println!("Password: {}", found.password);
            println!("Decrypted link: {}", found.plaintext_lossy());
        }
        SearchOutcome::Exhausted { max_length } => {
            eprintln!(
                "Password not found in {} candidates up to length {max_length}",
                report.total_attempts()
            );
        }
        SearchOutcome::Cancelled => {}
    }
    Ok(ExitCode::from(exit_status(&report.outcome)))
}

/// Process exit status for a finished search.
fn exit_status(outcome: &SearchOutcome) -> u8 {
    match outcome {
        SearchOutcome::Found(_) => 0,
        SearchOutcome::Exhausted { .. } => 1,
        SearchOutcome::Cancelled => EXIT_INTERRUPTED,
    }
}
