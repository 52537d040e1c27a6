//! Feedforward neural network of scalar neurons with backpropagation-based
//! gradient descent training

mod activation;
mod net;
mod neuron;
mod trainer;

pub use activation::*;
pub use net::*;
pub use neuron::*;
pub use trainer::*;
