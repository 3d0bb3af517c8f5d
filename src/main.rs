use anyhow::Context;
use circle_pipeline::config::{BootstrapConfig, PipelineConfig, SimulationConfig, SynthesisConfig};
use circle_pipeline::executor::plan::plan_tasks;
use circle_pipeline::executor::runner::JobRunner;
use circle_pipeline::executor::tracker::TaskTracker;
use circle_pipeline::simulation::engine::Simulator;
use circle_pipeline::simulation::types::{SimulationOutcome, SimulationParams};
use circle_pipeline::synthesis::mixer::run_synthesis;
use circle_pipeline::synthesis::plan::build_plan;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "circle-pipeline")]
#[command(about = "Simulation, dataset synthesis and bootstrap dispatch for circle diffusion data")]
#[command(version)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bootstrap tool once per input file
    Bootstrap {
        /// Maximum number of concurrent tool processes
        #[arg(short, long)]
        workers: Option<usize>,

        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Directory receiving the log files
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Path of the bootstrap jar
        #[arg(long)]
        tool: Option<PathBuf>,

        /// Kill tool processes running longer than this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Write a JSON run report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Build mixed small/big circle datasets
    Synthesize {
        #[arg(long)]
        data_dir: Option<PathBuf>,

        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Records per output file
        #[arg(long)]
        total: Option<u64>,
    },

    /// Simulate spins diffusing in a circle
    Simulate {
        #[arg(long)]
        spins: Option<u64>,

        #[arg(long)]
        steps: Option<u64>,

        #[arg(long)]
        threads: Option<usize>,

        /// Circle radius relative to the free diffusion length
        #[arg(long)]
        ratio: Option<f64>,

        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .init();

    let mut config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Bootstrap {
            workers,
            input_dir,
            output_dir,
            tool,
            timeout,
            report,
        } => {
            let bootstrap = &mut config.bootstrap;
            if let Some(workers) = workers {
                bootstrap.num_workers = workers;
            }
            if let Some(dir) = input_dir {
                bootstrap.input_dir = dir;
            }
            if let Some(dir) = output_dir {
                bootstrap.output_dir = dir;
            }
            if let Some(tool) = tool {
                bootstrap.tool_path = tool;
            }
            if timeout.is_some() {
                bootstrap.task_timeout_secs = timeout;
            }
            if report.is_some() {
                bootstrap.report_file = report;
            }
            run_bootstrap(config.bootstrap).await
        }
        Commands::Synthesize {
            data_dir,
            output_dir,
            total,
        } => {
            let synthesis = &mut config.synthesis;
            if let Some(dir) = data_dir {
                synthesis.data_dir = dir;
            }
            if let Some(dir) = output_dir {
                synthesis.output_dir = dir;
            }
            if let Some(total) = total {
                synthesis.total_records = total;
            }
            run_synthesize(config.synthesis).await
        }
        Commands::Simulate {
            spins,
            steps,
            threads,
            ratio,
            seed,
            data_dir,
        } => {
            let simulation = &mut config.simulation;
            if let Some(spins) = spins {
                simulation.num_spins = spins;
            }
            if let Some(steps) = steps {
                simulation.num_steps = steps;
            }
            if let Some(threads) = threads {
                simulation.num_threads = threads;
            }
            if let Some(ratio) = ratio {
                simulation.adim_ratio = ratio;
            }
            if seed.is_some() {
                simulation.seed = seed;
            }
            if let Some(dir) = data_dir {
                simulation.data_dir = dir;
            }
            run_simulate(config.simulation).await
        }
    }
}

async fn run_bootstrap(config: BootstrapConfig) -> anyhow::Result<()> {
    config.validate()?;

    // 1. Plan one task per input file:
    let tasks = plan_tasks(&config)?;
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output dir {}", config.output_dir.display())
    })?;

    // 2. Runner and shared tracker:
    let tracker = TaskTracker::new();
    let runner = JobRunner::new(
        tracker.clone(),
        config.num_workers,
        config.task_timeout_secs.map(Duration::from_secs),
    );

    // 3. Spawn stats reporter:
    let stats = tracker.clone();
    let reporter = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        interval.tick().await;

        loop {
            interval.tick().await;
            let (pending, running, completed, failed) = stats.counts();
            tracing::info!(
                "Task stats: {} pending, {} running, {} completed, {} failed",
                pending,
                running,
                completed,
                failed
            );
        }
    });

    // 4. Run everything to completion:
    let report = runner.run(tasks).await;
    reporter.abort();

    if let Some(path) = &config.report_file {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    for outcome in report.failed() {
        tracing::error!(
            "  - {}: {} (log: {})",
            outcome.input,
            outcome.result.describe(),
            outcome.log_path.display()
        );
    }

    if !report.all_succeeded() {
        anyhow::bail!(
            "{} of {} bootstrap tasks did not succeed",
            report.outcomes.len() - report.succeeded(),
            report.outcomes.len()
        );
    }

    tracing::info!("Done! Bye...");
    Ok(())
}

async fn run_synthesize(config: SynthesisConfig) -> anyhow::Result<()> {
    let plan = build_plan(&config)?;
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output dir {}", config.output_dir.display())
    })?;

    let outcomes = tokio::task::spawn_blocking(move || run_synthesis(&plan)).await?;

    let failed = outcomes.iter().filter(|outcome| outcome.result.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} datasets could not be built", failed, outcomes.len());
    }

    tracing::info!("Built {} datasets", outcomes.len());
    Ok(())
}

async fn run_simulate(config: SimulationConfig) -> anyhow::Result<()> {
    let params = SimulationParams::from_config(&config)?;
    tracing::info!("Simulation seed {}", params.seed);

    let simulator = Arc::new(Simulator::new(params, config.data_dir.clone()));
    let cancel = Arc::new(AtomicBool::new(false));

    // 1. Ctrl-C stops the workers; finished spins are still saved:
    let interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, saving the spins computed so far");
            interrupt.store(true, Ordering::SeqCst);
        }
    });

    // 2. Spawn progress reporter:
    let progress = simulator.progress();
    let every = Duration::from_secs(config.progress_interval_secs);
    let reporter = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;

        loop {
            interval.tick().await;
            tracing::info!("{}", progress.describe());
        }
    });

    // 3. Compute on the blocking pool:
    let worker = simulator.clone();
    let flag = cancel.clone();
    let outcome = tokio::task::spawn_blocking(move || worker.run(&flag)).await??;

    reporter.abort();
    watcher.abort();

    match outcome {
        SimulationOutcome::AlreadyExists { path } => {
            tracing::info!("Nothing to do, {} exists", path.display());
        }
        SimulationOutcome::Completed {
            path,
            spins_computed,
            resumed_from,
        } => {
            tracing::info!(
                "Computed {} spins ({} resumed) into {}",
                spins_computed,
                resumed_from,
                path.display()
            );
        }
        SimulationOutcome::Cancelled {
            temp_path,
            spins_saved,
        } => {
            tracing::warn!(
                "Stopped with {} spins saved in {}; run again to resume",
                spins_saved,
                temp_path.display()
            );
        }
    }

    Ok(())
}
