mod analysis;
mod config;
mod engine;
mod model;
mod predict;
mod sort;
mod stats;

use crate::analysis::{Analyzer, Report};
use crate::config::Config;
use crate::engine::Engine;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate the outbreak and compare it with the SIR equations.
    Run,

    /// Only solve the SIR equations.
    Predict,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let cfg = Config::from_file(&args.config).context("failed to construct cfg")?;
    log::info!("{cfg:#?}");

    let analyzer = Analyzer::new(cfg.clone());

    let report = match args.command {
        Command::Run => {
            let engine = Engine::generate_initial_condition(cfg)
                .context("failed to generate initial condition")?;
            let outcome = engine
                .perform_simulation()
                .context("failed to perform simulation")?;
            analyzer.analyze(outcome).context("failed to analyze outcome")?
        }
        Command::Predict => analyzer
            .report_prediction()
            .context("failed to predict outbreak")?,
    };

    write_report(&report)
}

fn write_report(report: &Report) -> Result<()> {
    let mut writer = BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut writer, report).context("failed to serialize report")?;
    writeln!(writer)?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}
