//! The intro run: feed, build, initialize, train, print.

use std::io::Write;

use burn::tensor::backend::Backend;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::nets::{build_init_net, build_train_net};
use super::print::format_tensor;
use super::DriverConfig;
use crate::errors::{NetError, Result};
use crate::graph::{Net, NetDef};
use crate::workspace::{Tensor, Workspace};

/// Where the driver is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// The init net has not completed yet.
    Initializing,
    /// Running the training net; `iteration` counts outer iterations.
    Training { iteration: usize },
    /// Every iteration ran and the results were printed.
    Finished,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct DriverReport {
    /// Loss after the last run of each outer iteration.
    pub loss_history: Vec<f32>,
    /// Loss after the final run.
    pub final_loss: f32,
    /// Shape of the final softmax output.
    pub softmax_shape: Vec<usize>,
    /// Number of training net runs.
    pub runs: usize,
}

/// Drives the intro sequence against its own workspace.
pub struct Driver<B: Backend> {
    config: DriverConfig,
    device: B::Device,
    workspace: Workspace,
    rng: StdRng,
    state: DriverState,
}

impl<B: Backend> Driver<B> {
    /// Creates a driver with a fresh workspace.
    pub fn new(config: DriverConfig, device: B::Device) -> Result<Self> {
        if config.batch_size == 0 || config.input_size == 0 || config.num_classes == 0 {
            return Err(NetError::InvalidConfig {
                message: "batch size, input size and class count must be positive".to_string(),
            });
        }
        if config.iterations == 0 || config.runs_per_iteration == 0 {
            return Err(NetError::InvalidConfig {
                message: "iterations and runs per iteration must be positive".to_string(),
            });
        }
        if i32::try_from(config.num_classes).is_err() {
            return Err(NetError::InvalidConfig {
                message: format!("{} classes do not fit int32 labels", config.num_classes),
            });
        }

        // Fills draw from their own stream, seeded from the data stream.
        let (workspace, rng) = match config.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                (Workspace::with_seed(rng.random()), rng)
            }
            None => (Workspace::new(), StdRng::from_os_rng()),
        };
        Ok(Self {
            config,
            device,
            workspace,
            rng,
            state: DriverState::Initializing,
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Feeds a random `(4, 3, 2)` tensor as `my_x`, fetches it back and
    /// prints both.
    pub fn feed_intro_tensor<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let values: Vec<f32> = (0..4 * 3 * 2).map(|_| self.rng.random::<f32>()).collect();
        let x = Tensor::from_vec(&[4, 3, 2], values)?;
        writeln!(out, "{}", format_tensor("x", &x))?;

        self.workspace.feed_blob("my_x", x);
        writeln!(
            out,
            "{}",
            format_tensor("my_x", self.workspace.fetch_blob("my_x")?)
        )?;
        Ok(())
    }

    /// Refills `data` with uniform values in `[0, 1)` and `label` with
    /// classes in `[0, num_classes)`.
    ///
    /// The first call creates both blobs; later calls overwrite the same
    /// storage.
    pub fn feed_batch(&mut self) -> Result<()> {
        let DriverConfig {
            batch_size,
            input_size,
            num_classes,
            ..
        } = self.config;
        let classes = num_classes as i32;

        let data: Vec<f32> = (0..batch_size * input_size)
            .map(|_| self.rng.random::<f32>())
            .collect();
        let labels: Vec<i32> = (0..batch_size)
            .map(|_| self.rng.random_range(0..classes))
            .collect();

        let tensor = self.workspace.create_blob("data").get_mutable::<Tensor>();
        tensor.resize(&[batch_size, input_size]);
        tensor.copy_from_slice(&data)?;

        let tensor = self.workspace.create_blob("label").get_mutable::<Tensor>();
        tensor.resize(&[batch_size]);
        tensor.copy_from_slice(&labels)
    }

    /// Runs the init net once and checks that it produced every parameter.
    pub fn initialize(&mut self, init_net: &NetDef) -> Result<()> {
        self.state = DriverState::Initializing;
        self.workspace.run_net_once::<B>(init_net, &self.device)?;

        for op in init_net.ops() {
            for output in op.output_names() {
                self.workspace.fetch_blob(output)?;
            }
        }
        log::info!("Initialized parameters: {:?}", self.workspace.blob_names());
        Ok(())
    }

    fn loss(&self) -> Result<f32> {
        self.workspace
            .fetch_blob("loss")?
            .data::<f32>()?
            .first()
            .copied()
            .ok_or(NetError::UninitializedTensor)
    }

    /// Runs the training loop: per outer iteration, refresh the batch, then
    /// run `net` `runs_per_iteration` times.
    pub fn train(&mut self, net: &Net<B>) -> Result<Vec<f32>> {
        let iterations = self.config.iterations;
        let mut loss_history = Vec::with_capacity(iterations);

        for iteration in 0..iterations {
            self.state = DriverState::Training { iteration };
            self.feed_batch()?;
            for _ in 0..self.config.runs_per_iteration {
                net.run(&mut self.workspace)?;
            }

            let loss = self.loss()?;
            loss_history.push(loss);
            if iteration % 10 == 0 || iteration + 1 == iterations {
                log::info!("Iteration {}/{}: loss = {:.6}", iteration + 1, iterations, loss);
            }
        }
        Ok(loss_history)
    }

    /// Runs the whole sequence, writing tensors to `out`.
    pub fn run_with_output<W: Write>(&mut self, out: &mut W) -> Result<DriverReport> {
        writeln!(out)?;
        writeln!(out, "## opgraph intro ##")?;
        writeln!(out)?;

        self.feed_intro_tensor(out)?;
        self.feed_batch()?;

        let init_net = build_init_net(&self.config)?;
        let (train_net, grads) = build_train_net()?;
        log::debug!("Gradient blobs: {grads:?}");
        if self.config.print_protos {
            writeln!(out)?;
            writeln!(out, "{}", train_net.to_json()?)?;
            writeln!(out)?;
            writeln!(out, "{}", init_net.to_json()?)?;
        }

        self.initialize(&init_net)?;
        let net = self.workspace.create_net::<B>(&train_net, &self.device)?;
        let loss_history = self.train(&net)?;
        self.state = DriverState::Finished;

        let softmax = self.workspace.fetch_blob("softmax")?;
        writeln!(out)?;
        writeln!(out, "{}", format_tensor("softmax", softmax))?;
        let softmax_shape = softmax.shape().to_vec();
        writeln!(out)?;
        writeln!(
            out,
            "{}",
            format_tensor("loss", self.workspace.fetch_blob("loss")?)
        )?;

        Ok(DriverReport {
            final_loss: self.loss()?,
            loss_history,
            softmax_shape,
            runs: self.config.total_runs(),
        })
    }

    /// Runs the whole sequence, printing to standard output.
    pub fn run(&mut self) -> Result<DriverReport> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.run_with_output(&mut out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn small_config() -> DriverConfig {
        DriverConfig::new()
            .iterations(2)
            .runs_per_iteration(3)
            .batch_size(4)
            .input_size(6)
            .num_classes(3)
            .seed(11)
    }

    #[test]
    fn test_rejects_empty_dimensions() {
        let config = DriverConfig::new().num_classes(0);
        assert!(matches!(
            Driver::<TestBackend>::new(config, Default::default()),
            Err(NetError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_training_budget() {
        for config in [
            small_config().iterations(0),
            small_config().runs_per_iteration(0),
        ] {
            assert!(matches!(
                Driver::<TestBackend>::new(config, Default::default()),
                Err(NetError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn test_fills_do_not_replay_the_data_stream() {
        let mut driver = Driver::<TestBackend>::new(small_config(), Default::default()).unwrap();
        driver.run_with_output(&mut Vec::new()).unwrap();

        let weights = driver.workspace().fetch_blob("fc_w").unwrap();
        let weights = weights.data::<f32>().unwrap();
        let s = (3.0f32 / 6.0).sqrt();

        let mut data_stream = StdRng::seed_from_u64(11);
        let replayed = weights
            .iter()
            .filter(|&&w| {
                let u = data_stream.random::<f32>();
                (w - (-s + 2.0 * s * u)).abs() < 1e-6
            })
            .count();
        assert!(replayed < weights.len() / 2, "{replayed} of {} weights", weights.len());
    }

    #[test]
    fn test_feed_batch_overwrites_in_place() {
        let mut driver = Driver::<TestBackend>::new(small_config(), Default::default()).unwrap();
        driver.feed_batch().unwrap();
        let first = driver.workspace().fetch_blob("data").unwrap().clone();
        let blobs = driver.workspace().len();

        driver.feed_batch().unwrap();
        let second = driver.workspace().fetch_blob("data").unwrap();
        assert_eq!(second.shape(), &[4, 6]);
        assert_ne!(&first, second);
        assert_eq!(driver.workspace().len(), blobs);

        let labels = driver.workspace().fetch_blob("label").unwrap();
        assert_eq!(labels.shape(), &[4]);
        assert!(labels.data::<i32>().unwrap().iter().all(|&l| (0..3).contains(&l)));
    }

    #[test]
    fn test_run_walks_states_and_prints() {
        let mut driver = Driver::<TestBackend>::new(small_config(), Default::default()).unwrap();
        assert_eq!(driver.state(), DriverState::Initializing);

        let mut out = Vec::new();
        let report = driver.run_with_output(&mut out).unwrap();
        assert_eq!(driver.state(), DriverState::Finished);

        assert_eq!(report.runs, 6);
        assert_eq!(report.loss_history.len(), 2);
        assert_eq!(report.softmax_shape, vec![4, 3]);
        assert!(report.final_loss.is_finite() && report.final_loss > 0.0);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("my_x (4, 3, 2) float32:"));
        assert!(text.contains("softmax (4, 3) float32:"));
        assert!(text.contains("loss () float32:"));
    }

    #[test]
    fn test_print_protos() {
        let config = small_config().iterations(1).print_protos(true);
        let mut driver = Driver::<TestBackend>::new(config, Default::default()).unwrap();

        let mut out = Vec::new();
        driver.run_with_output(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"name\": \"my first net\""));
        assert!(text.contains("\"type\": \"SoftmaxWithLossGradient\""));
        assert!(text.contains("\"name\": \"my first net_init\""));
    }
}
