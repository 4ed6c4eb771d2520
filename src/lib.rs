//! A small feedforward neural network engine, trained by back-propagation
//! with momentum.
//!
//! A [`Network`] is a stack of fully connected layers, each with its own
//! [`TransferFunction`]. [`Trainer`] runs online gradient descent on it one
//! example at a time, and [`Network::nudge`] perturbs it with random noise
//! for gradient-free search. Networks can be saved to and loaded from XML.

#[macro_use]
extern crate serde_derive;

pub mod error;
pub mod gaussian;
pub mod network;
pub mod trainer;
pub mod transfer;

mod layer;
mod matrix;
mod persist;
mod utils;

pub use crate::error::{Error, Result};
pub use crate::gaussian::Gaussian;
pub use crate::layer::Layer;
pub use crate::matrix::Mat;
pub use crate::network::Network;
pub use crate::persist::DOCUMENT_TYPE;
pub use crate::trainer::{Logging, StopCondition, Trainer, TrainingReport};
pub use crate::transfer::TransferFunction;
