use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "opgraph-intro",
    version,
    about = "Trains a tiny FC -> Sigmoid -> SoftmaxWithLoss net on random data"
)]
pub struct Cli {
    /// Seed for data generation and random fills (drawn from the OS if unset)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of outer iterations; data is refreshed once per iteration
    #[arg(long, default_value_t = 100)]
    pub iterations: usize,

    /// Net runs per outer iteration
    #[arg(long, default_value_t = 10)]
    pub runs_per_iteration: usize,

    /// Tensor backend for the kernels
    #[arg(long, value_enum, default_value_t = BackendKind::Ndarray)]
    pub backend: BackendKind,

    /// Print the init and training net definitions before running
    #[arg(long)]
    pub print_protos: bool,

    /// Log filter (RUST_LOG syntax)
    #[arg(long, default_value = "info")]
    pub log: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// CPU via ndarray
    Ndarray,
    /// GPU via wgpu
    Wgpu,
}
