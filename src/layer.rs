use crate::gaussian::Gaussian;
use crate::matrix::Mat;
use crate::transfer::TransferFunction;

use itertools::izip;
use rand::distributions::Distribution;
use rand::Rng;

/// A single fully connected layer of the network.
///
/// Besides its parameters, a layer keeps the values cached by the most recent
/// forward pass and the gradient state of the most recent training step, so
/// back-propagation never has to recompute or copy them.
#[derive(Clone, Debug)]
pub struct Layer {
    /// The transfer function applied to every neuron in the layer.
    pub(crate) function: TransferFunction,
    /// Connection weights, `inputs × outputs`.
    pub(crate) weights: Mat,
    pub(crate) bias: Vec<f64>,
    /// Weighted sums from the last forward pass.
    pub(crate) pre_activation: Vec<f64>,
    /// Transfer function outputs from the last forward pass.
    pub(crate) post_activation: Vec<f64>,
    /// Error signal from the last backward pass.
    pub(crate) delta: Vec<f64>,
    pub(crate) previous_weight_delta: Mat,
    pub(crate) previous_bias_delta: Vec<f64>,
}

impl Layer {
    /// Initializes a new, untrained layer.
    ///
    /// Arguments:
    ///
    ///  * `function` - the transfer function to be used for this layer's
    ///                 output.
    ///  * `inputs` - the number of inputs to this layer.
    ///  * `outputs` - the number of outputs from this layer.
    ///  * `rng` - source for the `N(0, 1)` initial biases, drawn first, and
    ///            weights, drawn one source unit at a time.
    pub fn new<R: Rng + ?Sized>(
        function: TransferFunction,
        inputs: usize,
        outputs: usize,
        rng: &mut R,
    ) -> Self {
        let gaussian = Gaussian::standard();
        let bias = (0..outputs).map(|_| gaussian.sample(rng)).collect();
        let weights = Mat::random(&gaussian, inputs, outputs, rng);
        Layer::from_parameters(function, weights, bias)
    }

    /// Builds a layer around existing parameters, with empty caches and no
    /// momentum.
    pub(crate) fn from_parameters(
        function: TransferFunction,
        weights: Mat,
        bias: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(weights.cols(), bias.len());
        let (inputs, outputs) = (weights.rows(), weights.cols());
        Layer {
            function,
            weights,
            bias,
            pre_activation: vec![0.0; outputs],
            post_activation: vec![0.0; outputs],
            delta: vec![0.0; outputs],
            previous_weight_delta: Mat::zeros(inputs, outputs),
            previous_bias_delta: vec![0.0; outputs],
        }
    }

    /// Returns the number of inputs to this layer.
    pub fn input_len(&self) -> usize {
        self.weights.rows()
    }

    /// Returns the number of outputs from this layer.
    pub fn output_len(&self) -> usize {
        self.weights.cols()
    }

    pub fn transfer_function(&self) -> TransferFunction {
        self.function
    }

    /// The connection weights; `weights()[(i, j)]` links input `i` to
    /// neuron `j`.
    pub fn weights(&self) -> &Mat {
        &self.weights
    }

    pub fn bias(&self) -> &[f64] {
        &self.bias
    }

    pub fn pre_activation(&self) -> &[f64] {
        &self.pre_activation
    }

    pub fn post_activation(&self) -> &[f64] {
        &self.post_activation
    }

    pub fn delta(&self) -> &[f64] {
        &self.delta
    }

    pub fn previous_weight_delta(&self) -> &Mat {
        &self.previous_weight_delta
    }

    pub fn previous_bias_delta(&self) -> &[f64] {
        &self.previous_bias_delta
    }

    /// Feeds the provided `inputs` forward through the layer, refreshing the
    /// activation caches.
    pub(crate) fn forward(&mut self, inputs: &[f64]) {
        debug_assert_eq!(inputs.len(), self.input_len());
        for j in 0..self.output_len() {
            let mut sum = 0.0;
            for (i, x) in inputs.iter().enumerate() {
                sum += self.weights[(i, j)] * x;
            }
            sum += self.bias[j];
            self.pre_activation[j] = sum;
            self.post_activation[j] = self.function.evaluate(sum);
        }
    }

    /// Computes the output layer's deltas against `desired`, returning the
    /// summed squared error.
    pub(crate) fn output_delta(&mut self, desired: &[f64]) -> f64 {
        debug_assert_eq!(desired.len(), self.output_len());
        let mut error = 0.0;
        for (delta, &y, &x, &d) in izip!(
            self.delta.iter_mut(),
            self.post_activation.iter(),
            self.pre_activation.iter(),
            desired
        ) {
            let raw = y - d;
            error += raw * raw;
            *delta = raw * self.function.evaluate_derivative(x);
        }
        error
    }

    /// Computes a hidden layer's deltas from the layer that consumes its
    /// output.
    pub(crate) fn hidden_delta(&mut self, next: &Layer) {
        debug_assert_eq!(next.input_len(), self.output_len());
        for (i, (delta, &x)) in self
            .delta
            .iter_mut()
            .zip(self.pre_activation.iter())
            .enumerate()
        {
            let mut sum = 0.0;
            for (w, d) in next.weights.row(i).iter().zip(next.delta.iter()) {
                sum += w * d;
            }
            *delta = sum * self.function.evaluate_derivative(x);
        }
    }

    /// Applies one momentum step to the weights, given the same `inputs` the
    /// forward pass saw.
    pub(crate) fn update_weights(&mut self, inputs: &[f64], learning_rate: f64, momentum: f64) {
        debug_assert_eq!(inputs.len(), self.input_len());
        for (i, &x) in inputs.iter().enumerate() {
            for (w, previous, &d) in izip!(
                self.weights.row_mut(i).iter_mut(),
                self.previous_weight_delta.row_mut(i).iter_mut(),
                self.delta.iter()
            ) {
                let change = learning_rate * d * x + momentum * *previous;
                *w -= change;
                *previous = change;
            }
        }
    }

    /// Applies one momentum step to the biases.
    ///
    /// The stored history is the plain gradient step: the momentum term is
    /// subtracted from the bias but not remembered. Weights remember both.
    pub(crate) fn update_bias(&mut self, learning_rate: f64, momentum: f64) {
        for (b, previous, &d) in izip!(
            self.bias.iter_mut(),
            self.previous_bias_delta.iter_mut(),
            self.delta.iter()
        ) {
            let change = learning_rate * d;
            *b -= change + momentum * *previous;
            *previous = change;
        }
    }

    /// Adds `N(0, |p| * scalar)` noise to every parameter `p`, forgetting
    /// its momentum.
    pub(crate) fn nudge<R: Rng + ?Sized>(&mut self, scalar: f64, rng: &mut R) {
        for j in 0..self.output_len() {
            for i in 0..self.input_len() {
                let w = self.weights[(i, j)];
                self.weights[(i, j)] += Gaussian::new(0.0, w.abs() * scalar).sample(rng);
                self.previous_weight_delta[(i, j)] = 0.0;
            }
            let b = self.bias[j];
            self.bias[j] += Gaussian::new(0.0, b.abs() * scalar).sample(rng);
            self.previous_bias_delta[j] = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn linear_layer() -> Layer {
        // 2 inputs, 2 outputs
        let mut weights = Mat::zeros(2, 2);
        weights[(0, 0)] = 1.0;
        weights[(0, 1)] = -1.0;
        weights[(1, 0)] = 0.5;
        weights[(1, 1)] = 2.0;
        Layer::from_parameters(TransferFunction::Linear, weights, vec![0.25, -0.5])
    }

    #[test]
    fn new_layer_has_consistent_shapes() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let layer = Layer::new(TransferFunction::Sigmoid, 3, 4, &mut rng);
        assert_eq!(layer.input_len(), 3);
        assert_eq!(layer.output_len(), 4);
        assert_eq!(layer.bias().len(), 4);
        assert_eq!(layer.previous_weight_delta().rows(), 3);
        assert_eq!(layer.previous_weight_delta().cols(), 4);
        assert!(layer.previous_bias_delta().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn forward_caches_sums_and_outputs() {
        let mut layer = linear_layer();
        layer.forward(&[2.0, 4.0]);
        assert_abs_diff_eq!(layer.pre_activation()[0], 2.0 + 2.0 + 0.25);
        assert_abs_diff_eq!(layer.pre_activation()[1], -2.0 + 8.0 - 0.5);
        assert_eq!(layer.pre_activation(), layer.post_activation());
    }

    #[test]
    fn hidden_delta_uses_outgoing_weights() {
        let mut next = linear_layer();
        next.delta = vec![1.0, 3.0];
        let mut layer = Layer::from_parameters(
            TransferFunction::Linear,
            Mat::zeros(1, 2),
            vec![0.0, 0.0],
        );
        layer.hidden_delta(&next);
        assert_abs_diff_eq!(layer.delta()[0], 1.0 * 1.0 + -1.0 * 3.0);
        assert_abs_diff_eq!(layer.delta()[1], 0.5 * 1.0 + 2.0 * 3.0);
    }

    #[test]
    fn bias_history_excludes_momentum() {
        let mut layer = linear_layer();
        layer.delta = vec![1.0, -2.0];
        layer.previous_bias_delta = vec![0.5, 0.5];
        layer.update_bias(0.1, 0.9);
        assert_abs_diff_eq!(layer.bias()[0], 0.25 - (0.1 + 0.45));
        assert_abs_diff_eq!(layer.bias()[1], -0.5 - (-0.2 + 0.45));
        assert_abs_diff_eq!(layer.previous_bias_delta()[0], 0.1);
        assert_abs_diff_eq!(layer.previous_bias_delta()[1], -0.2);
    }

    #[test]
    fn weight_history_includes_momentum() {
        let mut layer = linear_layer();
        layer.delta = vec![1.0, 0.0];
        layer.previous_weight_delta[(1, 0)] = 0.5;
        layer.update_weights(&[0.0, 2.0], 0.1, 0.9);
        let change = 0.1 * 1.0 * 2.0 + 0.9 * 0.5;
        assert_abs_diff_eq!(layer.weights()[(1, 0)], 0.5 - change);
        assert_abs_diff_eq!(layer.previous_weight_delta()[(1, 0)], change);
        assert_eq!(layer.weights()[(0, 0)], 1.0);
    }
}
