//! Back-propagation training with momentum.
//!
//! # Example
//!
//! Let's train a small network to compute the XOR function:
//!
//! ```
//! # use backprop::*;
//! # use rand::SeedableRng;
//! let examples = [
//!     ([0.0, 0.0], [0.0]),
//!     ([0.0, 1.0], [1.0]),
//!     ([1.0, 0.0], [1.0]),
//!     ([1.0, 1.0], [0.0]),
//! ];
//!
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
//! let functions = [TransferFunction::None, TransferFunction::Sigmoid, TransferFunction::Sigmoid];
//! let mut network = Network::with_rng(&[2, 2, 1], &functions, &mut rng).unwrap();
//!
//! let report = Trainer::new(&mut network)
//!     .learning_rate(0.9)
//!     .momentum(0.3)
//!     .logging(Logging::Silent)
//!     .stop_condition(StopCondition::Iterations(2000))
//!     .train(&examples[..])
//!     .unwrap();
//! assert_eq!(report.iterations, 2000);
//!
//! // And verify the network correctly computes XOR!
//! let mut classify = |input: [f64; 2]| network.evaluate(&input).unwrap()[0] > 0.5;
//! assert_eq!(classify([0.0, 0.0]), false);
//! assert_eq!(classify([0.0, 1.0]), true);
//! assert_eq!(classify([1.0, 0.0]), true);
//! assert_eq!(classify([1.0, 1.0]), false);
//! ```

use crate::error::{Error, Result};
use crate::network::Network;
use crate::utils::{split_after, split_before};

use log::{info, trace};
use std::time::{Duration, Instant};

/// Trains a borrowed `Network` in place.
///
/// The trainer reads and writes the network's own weights, biases and
/// caches, so every step is immediately visible through the network. While
/// the trainer is alive nothing else can touch the network.
#[derive(Debug)]
pub struct Trainer<'a> {
    network: &'a mut Network,
    learning_rate: f64,
    momentum: f64,
    logging: Logging,
    stop_condition: StopCondition,
}

impl<'a> Trainer<'a> {
    /// Creates a new Trainer bound to `network`.
    ///
    /// The trainer is initialized with some default values. These defaults
    /// are:
    ///
    /// * A learning rate of 0.1.
    /// * No momentum.
    /// * Stops after 1000 training iterations.
    /// * Logs on training completion.
    pub fn new(network: &'a mut Network) -> Self {
        Trainer {
            network,
            learning_rate: 0.1,
            momentum: 0.0,
            logging: Logging::Completion,
            stop_condition: StopCondition::Iterations(1000),
        }
    }

    /// Sets the learning rate to use during gradient descent.
    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    /// Sets the fraction of the previous update blended into each new one.
    pub fn momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    /// Sets the type of logging to be emitted during training.
    pub fn logging(mut self, logging: Logging) -> Self {
        self.logging = logging;
        self
    }

    /// Sets the condition to finish training.
    pub fn stop_condition<C>(mut self, condition: C) -> Self
    where
        C: Into<StopCondition>,
    {
        self.stop_condition = condition.into();
        self
    }

    /// The network being trained.
    pub fn network(&self) -> &Network {
        self.network
    }

    /// Runs one back-propagation step on a single labelled example.
    ///
    /// Returns the sum (not the mean) of squared differences between the
    /// network's output and `desired`, measured before the update. Both
    /// vectors are checked before anything is touched.
    pub fn step(
        &mut self,
        input: &[f64],
        desired: &[f64],
        learning_rate: f64,
        momentum: f64,
    ) -> Result<f64> {
        self.check_example(input, desired)?;
        self.network.feed_forward(input);
        let error = self.feed_backwards(desired);
        self.update(input, learning_rate, momentum);
        trace!("step error {}", error);
        Ok(error)
    }

    /// Runs one `step` per example, in order, with the configured learning
    /// rate and momentum. Returns the summed error over the pass.
    ///
    /// Every example is checked before the first step.
    pub fn epoch<I, O>(&mut self, examples: &[(I, O)]) -> Result<f64>
    where
        I: AsRef<[f64]>,
        O: AsRef<[f64]>,
    {
        for (input, desired) in examples {
            self.check_example(input.as_ref(), desired.as_ref())?;
        }
        let (learning_rate, momentum) = (self.learning_rate, self.momentum);
        let mut error = 0.0;
        for (input, desired) in examples {
            error += self.step(input.as_ref(), desired.as_ref(), learning_rate, momentum)?;
        }
        Ok(error)
    }

    /// Trains the network using the provided labelled data until the stop
    /// condition is met.
    ///
    /// The provided `examples` should be a list of labelled data, where each
    /// element takes the form `(network input, expected output)`.
    pub fn train<I, O>(&mut self, examples: &[(I, O)]) -> Result<TrainingReport>
    where
        I: AsRef<[f64]>,
        O: AsRef<[f64]>,
    {
        if examples.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }

        let start_time = Instant::now();
        let mut iteration = 0;
        let mut training_error;
        loop {
            training_error = self.epoch(examples)?;
            iteration += 1;

            self.logging.iteration(iteration, training_error);
            if self
                .stop_condition
                .should_stop(iteration, training_error, start_time)
            {
                break;
            }
        }
        let report = TrainingReport {
            iterations: iteration,
            error: training_error,
            elapsed: start_time.elapsed(),
        };
        self.logging.completion(&report);
        Ok(report)
    }

    fn check_example(&self, input: &[f64], desired: &[f64]) -> Result<()> {
        self.network.check_input(input)?;
        let expected = self.network.output_len();
        if desired.len() != expected {
            return Err(Error::DesiredLength {
                expected,
                actual: desired.len(),
            });
        }
        Ok(())
    }

    /// Feeds the provided `desired` value back through the network, filling
    /// in every layer's deltas. Returns the squared error of the output.
    fn feed_backwards(&mut self, desired: &[f64]) -> f64 {
        let layers = &mut self.network.layers;
        let last = layers.len() - 1;
        let error = layers[last].output_delta(desired);
        for l in (0..last).rev() {
            let (layer, after) = split_after(&mut layers[..], l);
            layer.hidden_delta(&after[0]);
        }
        error
    }

    /// Applies the deltas from the last backward pass, weights first.
    fn update(&mut self, input: &[f64], learning_rate: f64, momentum: f64) {
        let layers = &mut self.network.layers;
        for l in 0..layers.len() {
            let (before, layer) = split_before(&mut layers[..], l);
            let inputs = before
                .last()
                .map_or(input, |previous| previous.post_activation.as_slice());
            layer.update_weights(inputs, learning_rate, momentum);
        }
        for layer in layers.iter_mut() {
            layer.update_bias(learning_rate, momentum);
        }
    }
}

/// A summary of a finished training run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrainingReport {
    /// Number of epochs run.
    pub iterations: usize,
    /// Summed squared error of the final epoch.
    pub error: f64,
    pub elapsed: Duration,
}

/// Logging frequency to use during training
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Logging {
    /// No logs will be emitted
    Silent,
    /// A summary will be logged at completion
    Completion,
    /// A summary will be logged after every `n` training iterations
    Iterations(usize),
}

impl Logging {
    /// Performs logging at the current `iteration` of training.
    fn iteration(self, iteration: usize, training_error: f64) {
        if let Logging::Iterations(freq) = self {
            if freq > 0 && iteration % freq == 0 {
                info!("iteration {}: error={}", iteration, training_error);
            }
        }
    }

    /// Performs logging at the end of training.
    fn completion(self, report: &TrainingReport) {
        if let Logging::Silent = self {
            return;
        }
        info!(
            "ran {} iterations in {:.3} seconds, final error {}",
            report.iterations,
            report.elapsed.as_secs_f64(),
            report.error
        );
    }
}

/// When to stop training
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StopCondition {
    /// Stops after the provided number of training iterations
    Iterations(usize),
    /// Stops when the training error drops below the provided threshold
    ErrorThreshold(f64),
    /// Stops after the provided duration
    Duration(Duration),
}

impl From<Duration> for StopCondition {
    fn from(duration: Duration) -> StopCondition {
        StopCondition::Duration(duration)
    }
}

impl StopCondition {
    /// Returns true if training is complete.
    fn should_stop(self, iteration: usize, training_error: f64, start_time: Instant) -> bool {
        match self {
            StopCondition::Iterations(iterations) => iteration >= iterations,
            StopCondition::ErrorThreshold(threshold) => training_error < threshold,
            StopCondition::Duration(duration) => start_time.elapsed() > duration,
        }
    }
}
