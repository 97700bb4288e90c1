//! Sieve benchmark harness
//! Compares: coordinator single-threaded vs coordinator parallel vs `primal` vs `primes`
//!
//! Usage: cargo run --release --bin sieve-bench [-- --iterations 10]

use std::fmt;
use std::time::{Duration, Instant};

use anyhow::{anyhow, ensure, Context, Result};
use clap::Parser;
use tracing::info;

use primer::report::{format_commas, format_duration};
use primer::{logging, sieve, SieveMode, SieveRequest};

#[derive(Parser, Debug)]
#[command(name = "sieve-bench")]
struct Args {
    /// Timed runs per implementation and size
    #[arg(short, long, default_value_t = 10)]
    iterations: usize,

    /// Worker count for the parallel runs [default: logical cores]
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Sizes to benchmark
    #[arg(long, value_delimiter = ',', default_values_t = [10_000u64, 100_000, 1_000_000, 10_000_000, 50_000_000])]
    sizes: Vec<u64>,
}

// ─── Implementations under test ────────────────────────────────────────────

fn coordinator_count(request: SieveRequest) -> Result<u64> {
    sieve(request)?
        .prime_count()
        .context("benchmark run was cancelled")
}

fn primal_count(n: u64) -> u64 {
    primal::Sieve::new(n as usize).prime_pi(n as usize) as u64
}

fn primes_crate_count(n: u64) -> u64 {
    use primes::{PrimeSet, Sieve};
    let mut sieve = Sieve::new();
    sieve.iter().take_while(|&p| p <= n).count() as u64
}

// ─── Benchmarking machinery ────────────────────────────────────────────────

struct BenchResult {
    name: &'static str,
    prime_count: u64,
    times: Vec<Duration>,
}

impl BenchResult {
    fn median(&self) -> Duration {
        let mut sorted = self.times.clone();
        sorted.sort();
        sorted[sorted.len() / 2]
    }

    fn min(&self) -> Duration {
        self.times.iter().copied().min().unwrap_or_default()
    }

    fn mean(&self) -> Duration {
        let total: Duration = self.times.iter().sum();
        total / self.times.len().max(1) as u32
    }
}

impl fmt::Display for BenchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "│  {:<26} │ {:>10} │ {:>10} │ {:>10} │ π = {}",
            self.name,
            format_duration(self.min()),
            format_duration(self.median()),
            format_duration(self.mean()),
            format_commas(self.prime_count),
        )
    }
}

fn bench<F>(name: &'static str, iterations: usize, f: F) -> Result<BenchResult>
where
    F: Fn() -> Result<u64>,
{
    // Warmup
    let _ = f()?;

    let mut times = Vec::with_capacity(iterations);
    let mut prime_count = 0;
    for _ in 0..iterations.max(1) {
        let start = Instant::now();
        prime_count = std::hint::black_box(f()?);
        times.push(start.elapsed());
    }
    Ok(BenchResult { name, prime_count, times })
}

fn main() -> Result<()> {
    logging::init("info").map_err(|e| anyhow!(e))?;
    let args = Args::parse();
    let jobs = args.jobs.unwrap_or_else(num_cpus::get);
    info!(?args, jobs, "starting benchmark");

    println!("Parallel sieve benchmark — {} workers, {} iterations", jobs, args.iterations);
    println!();

    for &n in &args.sizes {
        let base = SieveRequest::new(n)?.mode(SieveMode::Corrected);
        let single = base.single_threaded(true);
        let parallel = base.with_parallelism(jobs)?;

        println!("┌─ n = {} ─────────────────────────────────────────────────────────", format_commas(n));
        println!("│  {:<26} │ {:>10} │ {:>10} │ {:>10} │", "Implementation", "Min", "Median", "Mean");
        println!("│  {}", "─".repeat(66));

        let mut results = vec![
            bench("coordinator (1 worker)", args.iterations, || coordinator_count(single))?,
            bench("coordinator (parallel)", args.iterations, || coordinator_count(parallel))?,
            bench("primal (Sieve::new)", args.iterations, || Ok(primal_count(n)))?,
        ];
        // primes crate iterates one prime at a time; too slow past 1M
        if n <= 1_000_000 {
            results.push(bench("primes crate (iter)", args.iterations, || Ok(primes_crate_count(n)))?);
        }
        for r in &results {
            println!("{}", r);
        }

        let expected = results[2].prime_count;
        for r in &results {
            ensure!(r.prime_count == expected,
                "MISMATCH at n={}: {}={} vs primal={}", n, r.name, r.prime_count, expected);
        }

        let compatible = coordinator_count(SieveRequest::new(n)?.with_parallelism(jobs)?)?;
        let speedup = results[0].median().as_nanos() as f64 / results[1].median().as_nanos().max(1) as f64;
        println!("│");
        println!("│  all implementations agree ✓   compatible-mode count = {}", format_commas(compatible));
        println!("│  parallel speedup over 1 worker: {:.2}x", speedup);
        println!("└──────────────────────────────────────────────────────────────────────────");
        println!();
    }

    println!("✓ Benchmark complete!");
    Ok(())
}
