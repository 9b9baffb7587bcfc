//! Aranya Prime - numeric kernel CLI
//!
//! Loads the built-in kernels or a kernel library and inspects, audits or
//! benchmarks them.

use anyhow::{bail, Context, Result};
use aranya_prime::audit::{self, CheckStatus, Falsifier, Verdict};
use aranya_prime::config::{AranyaConfig, SourceKind, CONFIG_FILE};
use aranya_prime::{banner, KernelHandle, Kernels, LoadState, Op};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "aranya")]
#[command(version)]
#[command(about = "Load, inspect and audit Aranya Prime numeric kernels", long_about = None)]
struct Cli {
    /// Kernel library to load, by name or path ("builtin" for the linked-in kernels)
    #[arg(long, global = true, value_name = "LIB")]
    library: Option<String>,

    /// Config file (default: aranya.toml in the current directory or a parent)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // Commands sorted alphabetically for easier navigation
    /// Deep numerical audit of the polynomial and add kernels
    Audit {
        /// Number of samples
        #[arg(long)]
        samples: Option<usize>,

        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Time every kernel against the scalar reference
    Bench {
        /// Buffer length
        #[arg(long)]
        size: Option<usize>,

        /// Timed repetitions per kernel
        #[arg(long)]
        iterations: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration, or write a default aranya.toml
    Config {
        /// Write a default aranya.toml in the current directory
        #[arg(long)]
        init: bool,

        /// Overwrite an existing aranya.toml
        #[arg(long, requires = "init")]
        force: bool,
    },

    /// Run the falsification suite; exits with status 1 on any failure
    Falsify {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version, kernel source and load state
    Info,

    /// List every kernel and whether it is available
    Symbols {
        /// Print the capability table as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = load_config(cli.config.as_deref())?;
    let handle = open_handle(cli.library.as_deref(), &config);

    match cli.command {
        Commands::Audit {
            samples,
            seed,
            json,
        } => cmd_audit(&handle, config, samples, seed, json),
        Commands::Bench {
            size,
            iterations,
            json,
        } => cmd_bench(&handle, config, size, iterations, json),
        Commands::Config { init, force } => cmd_config(&config, init, force),
        Commands::Falsify { json } => cmd_falsify(&handle, &config, json),
        Commands::Info => cmd_info(&handle),
        Commands::Symbols { json } => cmd_symbols(&handle, json),
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AranyaConfig> {
    match path {
        Some(path) => AranyaConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => AranyaConfig::load_from_cwd().context("Failed to load aranya.toml"),
    }
}

/// Handle for the `--library` override, or for the `[library]` section
fn open_handle(library: Option<&str>, config: &AranyaConfig) -> KernelHandle {
    let mut library_config = config.library.clone();
    match library {
        Some("builtin") => library_config.source = SourceKind::Builtin,
        Some(name) => {
            library_config.source = SourceKind::Library;
            library_config.name = name.to_string();
            library_config.path = None;
        }
        None => {}
    }
    KernelHandle::from_config(&library_config)
}

fn load(handle: &KernelHandle) -> Result<Kernels> {
    handle
        .load()
        .with_context(|| format!("Failed to load kernels from {}", handle.source()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_tag(passed: bool) -> &'static str {
    if passed {
        "[PASS]"
    } else {
        "[FAIL]"
    }
}

fn cmd_audit(
    handle: &KernelHandle,
    mut config: AranyaConfig,
    samples: Option<usize>,
    seed: Option<u64>,
    json: bool,
) -> Result<ExitCode> {
    if let Some(samples) = samples {
        config.audit.samples = samples;
    }
    if let Some(seed) = seed {
        config.audit.seed = seed;
    }
    let kernels = load(handle)?;
    let report = audit::deep_audit(&kernels, &config.audit).context("Deep audit failed")?;

    if json {
        print_json(&report)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("=== ARANYA PRIME: DEEP NUMERICAL AUDIT ===");
    println!("Kernels: {}", report.origin);
    println!(
        "Samples: {} in [-{}, {}), seed {}",
        report.samples, config.audit.range, config.audit.range, report.seed
    );
    println!();
    for metric in report.metrics() {
        println!(
            "{} {:<25}: {:.5e} (Limit: {:.1e})",
            status_tag(metric.passed()),
            metric.name,
            metric.value,
            metric.limit
        );
    }
    println!(
        "INFO   {:<25}: {:.2}%",
        "Bitwise Match Rate",
        report.poly.match_rate()
    );
    println!(
        "       -> {} / {} values identical down to the last bit",
        report.poly.exact, report.poly.len
    );
    println!();
    println!("NUMERICAL CERTIFICATION: {}", report.verdict);
    if report.verdict == Verdict::WithCaveats {
        println!("Deviations detected; check whether requirements exceed double precision.");
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_bench(
    handle: &KernelHandle,
    mut config: AranyaConfig,
    size: Option<usize>,
    iterations: Option<usize>,
    json: bool,
) -> Result<ExitCode> {
    if let Some(size) = size {
        config.bench.size = size;
    }
    if let Some(iterations) = iterations {
        if iterations == 0 {
            bail!("--iterations must be at least 1");
        }
        config.bench.iterations = iterations;
    }
    let kernels = load(handle)?;
    let report = audit::stress(&kernels, &config.bench, config.audit.seed)
        .context("Stress benchmark failed")?;

    if json {
        print_json(&report)?;
    } else {
        println!("Aranya Prime Stress Benchmark");
        println!("=============================");
        println!("Kernels: {}", report.origin);
        println!("Size: {}, iterations: {}\n", report.size, report.iterations);
        println!(
            "{:<10} {:>12} {:>12} {:>9}  {:<6} {}",
            "kernel", "kernel (s)", "scalar (s)", "speedup", "", "max error"
        );
        for r in &report.results {
            println!(
                "{:<10} {:>12.6} {:>12.6} {:>8.2}x  {:<6} {:.2e}",
                r.op.name(),
                r.kernel_secs,
                r.reference_secs,
                r.speedup,
                status_tag(r.passed),
                r.max_error
            );
        }
    }

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_config(config: &AranyaConfig, init: bool, force: bool) -> Result<ExitCode> {
    if !init {
        print!("{}", toml::to_string_pretty(config)?);
        return Ok(ExitCode::SUCCESS);
    }

    let path = std::env::current_dir()?.join(CONFIG_FILE);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AranyaConfig::default()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_falsify(handle: &KernelHandle, config: &AranyaConfig, json: bool) -> Result<ExitCode> {
    let kernels = load(handle)?;
    let report = Falsifier::new(&kernels, &config.audit).run();

    if json {
        print_json(&report)?;
    } else {
        println!("=== ARANYA PRIME: FALSIFICATION SUITE ===");
        println!("Kernels: {}\n", report.origin);
        for check in &report.checks {
            println!(
                "[{}] {:<20} {} ({:.1} ms)",
                check.status, check.name, check.detail, check.elapsed_ms
            );
        }
        println!();
        if report.passed() {
            println!(
                "[{}] SUMMARY: ENGINE INTEGRITY VERIFIED (0 failures, {} warnings)",
                CheckStatus::Pass,
                report.warnings()
            );
        } else {
            println!(
                "[{}] SUMMARY: ENGINE COMPROMISED ({} failures)",
                CheckStatus::Fail,
                report.failures()
            );
        }
    }

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_info(handle: &KernelHandle) -> Result<ExitCode> {
    println!("{}", banner());
    println!();
    println!("Source: {}", handle.source());

    // A failed load is reported, not fatal
    let _ = handle.load();
    match handle.state() {
        LoadState::Failed(reason) => println!("State:  failed\n{}", reason),
        state => println!("State:  {}", state),
    }
    if let Ok(kernels) = handle.kernels() {
        let table = kernels.table();
        println!("Origin: {}", table.origin());
        println!("Kernels: {}/{} available", table.len(), Op::ALL.len());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_symbols(handle: &KernelHandle, json: bool) -> Result<ExitCode> {
    let kernels = load(handle)?;
    let capabilities = kernels.table().capabilities();

    if json {
        print_json(&capabilities)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("Kernels from {}\n", kernels.table().origin());
    for cap in &capabilities {
        let status = match &cap.symbol {
            Some(symbol) => format!("present ({})", symbol),
            None => "absent".to_string(),
        };
        println!(
            "{:<10} {:<62} {}",
            cap.op.name(),
            cap.op.signature().to_string(),
            status
        );
    }
    Ok(ExitCode::SUCCESS)
}
