mod cli;
mod driver;
mod work;

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use tickwork_core::config::load_dotenv;
use tickwork_core::TickerConfig;
use tickwork_scheduler::{ManualTickSource, PeriodicTask};

use crate::cli::CliArgs;
use crate::driver::TickLoop;
use crate::work::DemoWork;

// Tick delivery is single-threaded, so one runtime thread is all the loop needs.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    let config = args.apply(TickerConfig::for_profile(&args.profile));
    config.validate().context("invalid ticker configuration")?;
    config.log_summary();

    let source = Rc::new(ManualTickSource::new());
    let task = PeriodicTask::builder()
        .name(args.name.clone())
        .tick_source(source.clone())
        .delay(config.task_delay)
        .interval(config.task_interval)
        .work(DemoWork::new(args.fail_every))
        .build()
        .context("failed to build demo task")?;
    task.start();

    let outcome = TickLoop::new(Duration::from_millis(config.tick_millis), config.run_ticks)
        .pause_at(args.pause_at)
        .resume_at(args.resume_at)
        .run(&source, &task, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Could not listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    task.stop();
    let snapshot = task.snapshot();
    info!(
        task = %snapshot.name,
        ticks = outcome.ticks_delivered,
        total_ticks = snapshot.total_ticks,
        executed_ticks = snapshot.executed_ticks,
        skipped_ticks = snapshot.skipped_ticks(),
        interrupted = outcome.interrupted,
        "Tick loop finished"
    );

    if args.json {
        let json = serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot")?;
        println!("{}", json);
    }

    Ok(())
}
