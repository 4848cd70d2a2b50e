//! Driver configuration.

/// Configuration for the intro training run.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Number of outer iterations; data is refreshed once per iteration.
    pub iterations: usize,
    /// Net runs per outer iteration, without refreshing data in between.
    pub runs_per_iteration: usize,
    /// Rows per batch.
    pub batch_size: usize,
    /// Width of each input row.
    pub input_size: usize,
    /// Number of label classes (and FC outputs).
    pub num_classes: usize,
    /// Seed for data generation and random fills; `None` draws from the OS.
    pub seed: Option<u64>,
    /// Whether to print both net definitions before running.
    pub print_protos: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            runs_per_iteration: 10,
            batch_size: 16,
            input_size: 100,
            num_classes: 10,
            seed: None,
            print_protos: false,
        }
    }
}

impl DriverConfig {
    /// Creates a new DriverConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of outer iterations.
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the number of runs per outer iteration.
    pub fn runs_per_iteration(mut self, runs: usize) -> Self {
        self.runs_per_iteration = runs;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets the input width.
    pub fn input_size(mut self, size: usize) -> Self {
        self.input_size = size;
        self
    }

    /// Sets the number of classes.
    pub fn num_classes(mut self, classes: usize) -> Self {
        self.num_classes = classes;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets whether net definitions are printed.
    pub fn print_protos(mut self, print: bool) -> Self {
        self.print_protos = print;
        self
    }

    /// Total number of training net runs.
    pub fn total_runs(&self) -> usize {
        self.iterations * self.runs_per_iteration
    }
}
