//! A [Feedforward neural network]
//! (https://en.wikipedia.org/wiki/Feedforward_neural_network).
//!
//! # Example
//!
//! ```
//! # use backprop::{Network, TransferFunction};
//! # use rand::SeedableRng;
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
//! let mut network = Network::with_rng(
//!     &[3, 4, 2],
//!     &[TransferFunction::None, TransferFunction::Sigmoid, TransferFunction::Linear],
//!     &mut rng,
//! )
//! .unwrap();
//!
//! let output = network.evaluate(&[0.5, -1.0, 2.0]).unwrap();
//! assert_eq!(output.len(), 2);
//!
//! // The input width is checked on every call.
//! assert!(network.evaluate(&[0.5, -1.0]).is_err());
//! ```

use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::transfer::TransferFunction;
use crate::utils::split_before;

use log::debug;
use rand::Rng;

/// The name given to networks that have not been named explicitly.
pub const DEFAULT_NAME: &str = "Default";

/// A feedforward neural network.
///
/// The network owns every parameter and cache. A [`Trainer`] borrows it
/// mutably to run back-propagation against the same arrays.
///
/// [`Trainer`]: crate::trainer::Trainer
#[derive(Clone, Debug)]
pub struct Network {
    name: String,
    input_len: usize,
    pub(crate) layers: Vec<Layer>,
}

impl Network {
    /// Creates a new, untrained network seeded from the thread-local
    /// generator. See [`Network::with_rng`].
    pub fn new(layer_widths: &[usize], functions: &[TransferFunction]) -> Result<Self> {
        Network::with_rng(layer_widths, functions, &mut rand::thread_rng())
    }

    /// Creates a new, untrained network.
    ///
    /// Arguments:
    ///  * `layer_widths` - the network's input width followed by the number
    ///                     of neurons in each layer.
    ///  * `functions` - one transfer function per entry of `layer_widths`.
    ///                  The first entry stands for the input layer and must
    ///                  be `TransferFunction::None`.
    ///  * `rng` - source for the `N(0, 1)` initial weights and biases.
    pub fn with_rng<R: Rng + ?Sized>(
        layer_widths: &[usize],
        functions: &[TransferFunction],
        rng: &mut R,
    ) -> Result<Self> {
        validate_topology(layer_widths, functions)?;
        let layers = layer_widths
            .windows(2)
            .zip(&functions[1..])
            .map(|(widths, &function)| Layer::new(function, widths[0], widths[1], rng))
            .collect();
        let network = Network::from_layers(DEFAULT_NAME.into(), layer_widths[0], layers);
        debug!(
            "created network with widths {:?} and transfer functions {:?}",
            layer_widths, functions
        );
        Ok(network)
    }

    pub(crate) fn from_layers(name: String, input_len: usize, layers: Vec<Layer>) -> Self {
        Network {
            name,
            input_len,
            layers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Returns the size of the input layer to the network.
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Returns the size of the output layer from the network.
    pub fn output_len(&self) -> usize {
        self.output_layer().output_len()
    }

    /// Returns the number of computed layers, excluding the input layer.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Returns layer `l`, counting from the first computed layer.
    ///
    /// Panics if `l >= self.layer_count()`.
    pub fn layer(&self, l: usize) -> &Layer {
        &self.layers[l]
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The widths this network was built from, input layer first.
    pub fn layer_widths(&self) -> Vec<usize> {
        let mut widths = Vec::with_capacity(self.layers.len() + 1);
        widths.push(self.input_len);
        widths.extend(self.layers.iter().map(Layer::output_len));
        widths
    }

    /// The transfer functions this network was built from, starting with
    /// `None` for the input layer.
    pub fn transfer_functions(&self) -> Vec<TransferFunction> {
        let mut functions = Vec::with_capacity(self.layers.len() + 1);
        functions.push(TransferFunction::None);
        functions.extend(self.layers.iter().map(Layer::transfer_function));
        functions
    }

    /// The total number of weights and biases.
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| (layer.input_len() + 1) * layer.output_len())
            .sum()
    }

    /// Feeds the provided `input` through the network, returning the output
    /// layer.
    ///
    /// Every layer's weighted sums and outputs stay cached until the next
    /// call.
    pub fn evaluate(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;
        self.feed_forward(input);
        Ok(self.output_layer().post_activation.clone())
    }

    /// Perturbs the network using the thread-local generator. See
    /// [`Network::nudge_with_rng`].
    pub fn nudge(&mut self, scalar: f64) {
        self.nudge_with_rng(scalar, &mut rand::thread_rng());
    }

    /// Adds Gaussian noise to every weight and bias, scaled by `scalar`
    /// times the parameter's own magnitude, and forgets all momentum.
    ///
    /// Parameters that are exactly zero never move.
    pub fn nudge_with_rng<R: Rng + ?Sized>(&mut self, scalar: f64, rng: &mut R) {
        for layer in &mut self.layers {
            layer.nudge(scalar, rng);
        }
    }

    pub(crate) fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.input_len {
            return Err(Error::InputLength {
                expected: self.input_len,
                actual: input.len(),
            });
        }
        Ok(())
    }

    /// Runs the forward pass without validating `input`.
    pub(crate) fn feed_forward(&mut self, input: &[f64]) {
        for l in 0..self.layers.len() {
            let (before, layer) = split_before(&mut self.layers[..], l);
            match before.last() {
                Some(previous) => layer.forward(&previous.post_activation),
                None => layer.forward(input),
            }
        }
    }

    pub(crate) fn output_layer(&self) -> &Layer {
        // Construction guarantees at least one computed layer.
        &self.layers[self.layers.len() - 1]
    }
}

/// Verifies that `layer_widths` and `functions` describe a network.
fn validate_topology(layer_widths: &[usize], functions: &[TransferFunction]) -> Result<()> {
    if layer_widths.len() != functions.len() {
        return Err(Error::Topology(format!(
            "{} layer widths but {} transfer functions",
            layer_widths.len(),
            functions.len()
        )));
    }
    if layer_widths.len() < 2 {
        return Err(Error::Topology(
            "need an input layer and at least one computed layer".into(),
        ));
    }
    if functions[0] != TransferFunction::None {
        return Err(Error::Topology(format!(
            "input layer must use None, not {}",
            functions[0]
        )));
    }
    if let Some(l) = layer_widths.iter().position(|&width| width == 0) {
        return Err(Error::Topology(format!("layer {} is empty", l)));
    }
    if let Some(l) = layer_widths
        .windows(2)
        .position(|widths| widths[0].checked_mul(widths[1]).is_none())
    {
        return Err(Error::Topology(format!(
            "layer {} has too many weights to address",
            l + 1
        )));
    }
    if let Some(l) = functions[1..]
        .iter()
        .position(|&function| function == TransferFunction::None)
    {
        return Err(Error::Topology(format!(
            "layer {} has no transfer function",
            l + 1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Mat;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use TransferFunction::*;

    fn seeded(widths: &[usize], functions: &[TransferFunction], seed: u64) -> Network {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Network::with_rng(widths, functions, &mut rng).unwrap()
    }

    #[test]
    fn mismatched_lengths() {
        assert!(matches!(
            Network::new(&[2, 2, 1], &[None, Sigmoid]),
            Err(Error::Topology(_))
        ));
    }

    #[test]
    fn first_function_must_be_none() {
        assert!(matches!(
            Network::new(&[2, 1], &[Sigmoid, Sigmoid]),
            Err(Error::Topology(_))
        ));
    }

    #[test]
    fn too_few_layers() {
        assert!(Network::new(&[2], &[None]).is_err());
        assert!(Network::new(&[], &[]).is_err());
    }

    #[test]
    fn empty_layer() {
        assert!(Network::new(&[1, 0, 1], &[None, Sigmoid, Sigmoid]).is_err());
        assert!(Network::new(&[0, 1], &[None, Sigmoid]).is_err());
    }

    #[test]
    fn none_on_computed_layer() {
        assert!(Network::new(&[1, 2, 1], &[None, None, Sigmoid]).is_err());
    }

    #[test]
    fn topology_is_reported_back() {
        let network = seeded(&[4, 3, 2], &[None, Gaussian, RationalSigmoid], 1);
        assert_eq!(network.layer_widths(), vec![4, 3, 2]);
        assert_eq!(network.transfer_functions(), vec![None, Gaussian, RationalSigmoid]);
        assert_eq!(network.layer_count(), 2);
        assert_eq!(network.input_len(), 4);
        assert_eq!(network.output_len(), 2);
        assert_eq!(network.parameter_count(), 4 * 3 + 3 + 3 * 2 + 2);
        assert_eq!(network.name(), DEFAULT_NAME);
    }

    fn assert_shapes(network: &Network, widths: &[usize]) {
        assert_eq!(network.layer_widths(), widths);
        for (l, layer) in network.layers().iter().enumerate() {
            for m in &[layer.weights(), layer.previous_weight_delta()] {
                assert_eq!(m.rows(), widths[l]);
                assert_eq!(m.cols(), widths[l + 1]);
            }
            assert_eq!(layer.bias().len(), widths[l + 1]);
            assert_eq!(layer.previous_bias_delta().len(), widths[l + 1]);
            assert_eq!(layer.pre_activation().len(), widths[l + 1]);
            assert_eq!(layer.post_activation().len(), widths[l + 1]);
            assert_eq!(layer.delta().len(), widths[l + 1]);
        }
    }

    #[test]
    fn layer_shapes_chain() {
        let widths = [5, 7, 3, 1];
        let mut network = seeded(&widths, &[None, Sigmoid, Linear, Sigmoid], 2);
        assert_shapes(&network, &widths);

        crate::trainer::Trainer::new(&mut network)
            .step(&[0.1, -0.2, 0.3, 0.4, -0.5], &[1.0], 0.5, 0.9)
            .unwrap();
        assert_shapes(&network, &widths);

        network.nudge_with_rng(0.3, &mut ChaCha8Rng::seed_from_u64(9));
        assert_shapes(&network, &widths);

        let loaded = Network::from_xml(&network.to_xml().unwrap()).unwrap().unwrap();
        assert_shapes(&loaded, &widths);
    }

    #[test]
    fn oversized_layer_is_rejected() {
        assert!(matches!(
            Network::new(&[usize::MAX, 2, 1], &[None, Sigmoid, Sigmoid]),
            Err(Error::Topology(_))
        ));
    }

    #[test]
    fn same_seed_same_network() {
        let a = seeded(&[2, 3, 1], &[None, Sigmoid, Sigmoid], 42);
        let b = seeded(&[2, 3, 1], &[None, Sigmoid, Sigmoid], 42);
        for (x, y) in a.layers().iter().zip(b.layers()) {
            assert_eq!(x.weights(), y.weights());
            assert_eq!(x.bias(), y.bias());
        }
    }

    #[test]
    fn evaluate_matches_hand_computation() {
        let mut w0 = Mat::zeros(2, 2);
        w0[(0, 0)] = 0.5;
        w0[(1, 0)] = -1.0;
        w0[(0, 1)] = 2.0;
        w0[(1, 1)] = 0.25;
        let mut w1 = Mat::zeros(2, 1);
        w1[(0, 0)] = 1.5;
        w1[(1, 0)] = -0.5;
        let mut network = Network::from_layers(
            DEFAULT_NAME.into(),
            2,
            vec![
                Layer::from_parameters(Sigmoid, w0, vec![0.1, -0.2]),
                Layer::from_parameters(Linear, w1, vec![0.3]),
            ],
        );

        let output = network.evaluate(&[1.0, 2.0]).unwrap();

        let h0 = Sigmoid.evaluate(0.5 - 2.0 + 0.1);
        let h1 = Sigmoid.evaluate(2.0 + 0.5 - 0.2);
        assert_abs_diff_eq!(network.layer(0).pre_activation()[0], 0.5 - 2.0 + 0.1);
        assert_abs_diff_eq!(network.layer(0).post_activation()[1], h1);
        assert_abs_diff_eq!(output[0], 1.5 * h0 - 0.5 * h1 + 0.3, epsilon = 1e-12);
        assert_eq!(output, network.layer(1).post_activation());
    }

    #[test]
    fn evaluate_is_deterministic() {
        let mut network = seeded(&[3, 4, 4, 2], &[None, Sigmoid, Gaussian, Linear], 3);
        let input = [0.3, -0.7, 1.1];
        let first = network.evaluate(&input).unwrap();
        for _ in 0..5 {
            assert_eq!(network.evaluate(&input).unwrap(), first);
        }
    }

    #[test]
    fn wrong_input_size_leaves_caches() {
        let mut network = seeded(&[2, 2, 1], &[None, Sigmoid, Sigmoid], 4);
        network.evaluate(&[1.0, 0.0]).unwrap();
        let before = network.clone();
        match network.evaluate(&[1.0, 0.0, 0.0]) {
            Err(Error::InputLength { expected, actual }) => {
                assert_eq!((expected, actual), (2, 3));
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(network.evaluate(&[1.0]).is_err());
        for (x, y) in network.layers().iter().zip(before.layers()) {
            assert_eq!(x.pre_activation(), y.pre_activation());
            assert_eq!(x.post_activation(), y.post_activation());
        }
    }

    #[test]
    fn nudge_moves_parameters_and_forgets_momentum() {
        let mut network = seeded(&[2, 3, 1], &[None, Sigmoid, Sigmoid], 5);
        network.layers[0].previous_weight_delta[(0, 0)] = 1.0;
        network.layers[1].previous_bias_delta[0] = 1.0;
        network.layers[1].bias[0] = 0.0;
        let before = network.clone();

        let mut rng = ChaCha8Rng::seed_from_u64(6);
        network.nudge_with_rng(0.5, &mut rng);

        assert_eq!(network.layer(1).bias()[0], 0.0);
        assert_ne!(network.layer(0).weights(), before.layer(0).weights());
        for layer in network.layers() {
            assert!(layer.previous_bias_delta().iter().all(|&d| d == 0.0));
            for i in 0..layer.input_len() {
                assert!(layer.previous_weight_delta().row(i).iter().all(|&d| d == 0.0));
            }
        }
    }

    #[test]
    fn nudge_with_zero_scalar_is_identity() {
        let mut network = seeded(&[2, 2, 2], &[None, Linear, Linear], 8);
        let before = network.clone();
        network.nudge_with_rng(0.0, &mut ChaCha8Rng::seed_from_u64(0));
        network.nudge(0.0);
        for (x, y) in network.layers().iter().zip(before.layers()) {
            assert_eq!(x.weights(), y.weights());
            assert_eq!(x.bias(), y.bias());
        }
    }
}
