//! Transfer (activation) functions.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// [Activation function](https://en.wikipedia.org/wiki/Activation_function)
/// applied to every neuron of a layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferFunction {
    /// Placeholder for the implicit input layer. Never computed.
    None,
    /// Logistic sigmoid
    Sigmoid,
    /// Identity
    Linear,
    /// Gaussian bump, `e^(-x²)`
    Gaussian,
    /// Rational sigmoid, `x / (1 + √(1 + x²))`
    RationalSigmoid,
}

impl TransferFunction {
    /// All transfer functions, in declaration order.
    pub const ALL: [TransferFunction; 5] = [
        TransferFunction::None,
        TransferFunction::Sigmoid,
        TransferFunction::Linear,
        TransferFunction::Gaussian,
        TransferFunction::RationalSigmoid,
    ];

    /// Evaluates `f(x)` for the selected transfer function.
    pub fn evaluate(self, x: f64) -> f64 {
        match self {
            TransferFunction::None => 0.0,
            TransferFunction::Sigmoid => sigmoid(x),
            TransferFunction::Linear => x,
            TransferFunction::Gaussian => gaussian(x),
            TransferFunction::RationalSigmoid => x / (1.0 + (1.0 + x * x).sqrt()),
        }
    }

    /// Evaluates the derivative `f'(x)`.
    ///
    /// Unlike many formulations, this takes the *input* of the transfer
    /// function (the layer's pre-activation), not its output. The sigmoid
    /// derivative is therefore recomputed from `x` rather than read off the
    /// cached activation.
    pub fn evaluate_derivative(self, x: f64) -> f64 {
        match self {
            TransferFunction::None => 0.0,
            TransferFunction::Sigmoid => sigmoid(x) * (1.0 - sigmoid(x)),
            TransferFunction::Linear => 1.0,
            TransferFunction::Gaussian => -2.0 * x * gaussian(x),
            TransferFunction::RationalSigmoid => {
                let v = (1.0 + x * x).sqrt();
                1.0 / (v * (1.0 + v))
            }
        }
    }

    /// The name used for this function in saved networks.
    pub fn name(self) -> &'static str {
        match self {
            TransferFunction::None => "None",
            TransferFunction::Sigmoid => "Sigmoid",
            TransferFunction::Linear => "Linear",
            TransferFunction::Gaussian => "Gaussian",
            TransferFunction::RationalSigmoid => "RationalSigmoid",
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn gaussian(x: f64) -> f64 {
    (-x.powi(2)).exp()
}

impl fmt::Display for TransferFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransferFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransferFunction::ALL
            .iter()
            .copied()
            .find(|function| function.name() == s)
            .ok_or_else(|| Error::InvalidValue {
                field: "transfer function".into(),
                value: s.into(),
            })
    }
}
