mod cli;

use anyhow::{Context, Result};
use burn::tensor::backend::Backend;
use clap::Parser;
use cli::{BackendKind, Cli};
use opgraph::{CpuBackend, Driver, DriverConfig, GpuBackend};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log)
        .with_context(|| format!("invalid log filter {:?}", cli.log))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = DriverConfig::new()
        .iterations(cli.iterations)
        .runs_per_iteration(cli.runs_per_iteration)
        .print_protos(cli.print_protos);
    if let Some(seed) = cli.seed {
        config = config.seed(seed);
    }

    match cli.backend {
        BackendKind::Ndarray => run::<CpuBackend>(config),
        BackendKind::Wgpu => run::<GpuBackend>(config),
    }
}

fn run<B: Backend>(config: DriverConfig) -> Result<()> {
    let device = B::Device::default();
    let runs = config.total_runs();
    log::info!("Running {runs} training passes on {device:?}");

    let mut driver = Driver::<B>::new(config, device).context("failed to set up the driver")?;
    let report = driver.run().context("intro run failed")?;

    log::info!(
        "Finished {} runs, final loss {:.6}",
        report.runs,
        report.final_loss
    );
    Ok(())
}
