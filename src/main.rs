//! primer — count primes with the parallel sieve.
//!
//! Usage: primer 10000000 -j 8 --time
//!
//! Press Enter while it runs to cancel.

use std::io::{self, BufRead, IsTerminal, Write};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossbeam_channel::{bounded, RecvTimeoutError};
use tracing::{debug, warn};

use primer::report::{progress_line, Summary};
use primer::{logging, CancellationToken, SieveCoordinator, SieveMode, SieveProgress, SieveRequest};

const EXIT_INVALID_INPUT: u8 = 2;
const EXIT_CANCELLED: u8 = 130;
const PROGRESS_TICK: Duration = Duration::from_millis(100);
const PROGRESS_WIDTH: usize = 30;

/// Count primes up to SIZE with a parallel odd-only sieve
#[derive(Parser, Debug)]
#[command(name = "primer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Upper bound of the sieve (at least 5)
    size: String,

    /// Number of crossing workers [default: logical cores]
    #[arg(short, long, value_name = "N")]
    jobs: Option<String>,

    /// Cross every factor on the calling thread
    #[arg(short, long)]
    single_threaded: bool,

    /// Report elapsed time
    #[arg(short, long)]
    time: bool,

    /// Sieve up to and including isqrt(SIZE) and count true primes
    #[arg(long)]
    corrected: bool,

    /// Do not draw the progress line
    #[arg(long)]
    no_progress: bool,

    /// Do not watch stdin for a cancel request
    #[arg(long)]
    no_watch: bool,

    /// Log at debug level unless PRIMER_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "warn" }).map_err(|e| anyhow!(e))?;
    debug!(?cli, "parsed arguments");

    let request = match SieveRequest::parse(&cli.size, cli.jobs.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(ExitCode::from(EXIT_INVALID_INPUT));
        }
    };
    let mode = if cli.corrected { SieveMode::Corrected } else { SieveMode::Compatible };
    let request = request
        .single_threaded(cli.single_threaded)
        .measure_time(cli.time)
        .mode(mode);

    let cancel = CancellationToken::new();
    if !cli.no_watch {
        spawn_cancel_watcher(cancel.clone());
    }

    let progress = SieveProgress::new();
    let mut coordinator = SieveCoordinator::new(request, cancel)
        .context("could not set up the sieve")?
        .with_progress(progress.clone());

    let show_progress = !cli.no_progress && io::stderr().is_terminal();
    let (done_tx, done_rx) = bounded::<()>(0);
    let renderer = show_progress.then(|| {
        thread::Builder::new()
            .name("primer-progress".into())
            .spawn(move || loop {
                match done_rx.recv_timeout(PROGRESS_TICK) {
                    Err(RecvTimeoutError::Timeout) => {
                        let line = progress_line(&progress.snapshot(), PROGRESS_WIDTH);
                        let mut err = io::stderr().lock();
                        let _ = write!(err, "\r{line}");
                        let _ = err.flush();
                    }
                    _ => {
                        let _ = write!(io::stderr().lock(), "\r\x1b[2K");
                        break;
                    }
                }
            })
    });

    let result = coordinator.run();

    drop(done_tx);
    if let Some(handle) = renderer {
        let handle = handle.context("could not start the progress renderer")?;
        if handle.join().is_err() {
            warn!("progress renderer panicked");
        }
    }

    if !result.completed() {
        eprintln!("Sieve cancelled");
        return Ok(ExitCode::from(EXIT_CANCELLED));
    }
    println!("{}", Summary(&result));
    Ok(ExitCode::SUCCESS)
}

/// Cancel the run as soon as a line arrives on stdin. EOF leaves it running.
fn spawn_cancel_watcher(cancel: CancellationToken) {
    let spawned = thread::Builder::new()
        .name("primer-cancel".into())
        .spawn(move || {
            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line) {
                Ok(n) if n > 0 => {
                    debug!("cancel requested from stdin");
                    cancel.cancel();
                }
                _ => {}
            }
        });
    if let Err(e) = spawned {
        warn!("cancel watcher unavailable: {e}");
    }
}
