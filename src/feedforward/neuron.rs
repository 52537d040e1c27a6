use rand::prelude::Distribution;

use super::activation::Activation;
use super::net::SizeMismatch;

/// A single computational unit: weighted sum plus bias, passed through an
/// activation function.
///
/// Every neuron exclusively owns its weight and bias storage; parameters are
/// mutated in place by `Net::backward`. The most recent input vector and
/// pre-activation sum are cached by [`Neuron::activate`] so the backward pass
/// can compute gradients without re-deriving them.
pub struct Neuron {
    pub(super) activation: Activation,
    pub(super) weights: Box<[f64]>,
    pub(super) bias: f64,

    /// Input vector of the most recent `activate` call.
    /// `None` until the neuron has been activated at least once.
    pub(super) last_input: Option<Box<[f64]>>,
    /// Pre-activation sum of the most recent `activate` call.
    pub(super) last_sum: f64,
    /// Activated output of the most recent `activate` call.
    pub(super) last_output: f64,
    /// Backpropagated delta of the current training step.
    /// Only meaningful between error computation and the parameter update.
    pub(super) error: f64,
}

impl Neuron {
    /// Returns a neuron with the given activation kind and parameters.
    ///
    /// The weight count fixes the neuron's input width; `Net::from_layers`
    /// checks it against the surrounding topology.
    ///
    /// # Examples
    /// ```
    /// # use flexnet::feedforward::{Activation, Neuron};
    /// let neuron = Neuron::new(Activation::Swish, vec![1.0, -1.0], 0.0);
    /// assert_eq!(neuron.weights(), &[1.0, -1.0]);
    /// ```
    pub fn new(activation: Activation, weights: Vec<f64>, bias: f64) -> Neuron {
        Neuron {
            activation,
            weights: weights.into_boxed_slice(),
            bias,
            last_input: None,
            last_sum: 0.0,
            last_output: 0.0,
            error: 0.0,
        }
    }

    /// Returns a neuron with `inputs_count` random weights from range [-1,1]
    /// and zero bias.
    pub fn random(activation: Activation, inputs_count: usize) -> Neuron {
        let mut rng = rand::thread_rng();
        let weights_between = rand::distributions::Uniform::from(-1.0..=1.0);
        let weights = weights_between
            .sample_iter(&mut rng)
            .take(inputs_count)
            .collect();
        Neuron::new(activation, weights, 0.0)
    }

    /// Computes the neuron's output for the given input vector.
    ///
    /// Implements the formula:
    /// `activation((input . weights) + bias)`.
    ///
    /// Side effects: caches `input`, the pre-activation sum and the activated
    /// output for the next backward pass.
    ///
    /// # Returns
    /// * `Ok(f64)` if `input` has one component per weight;
    /// * `Err(SizeMismatch)` otherwise.
    ///
    /// # Examples
    /// ```
    /// # use flexnet::feedforward::{Activation, Neuron};
    /// let mut neuron = Neuron::new(Activation::Identity, vec![1.0, -1.0], 0.5);
    /// assert_eq!(neuron.activate(&[3.0, 2.0]).unwrap(), 1.5);
    /// assert!(neuron.activate(&[3.0]).is_err());
    /// ```
    pub fn activate(&mut self, input: &[f64]) -> Result<f64, SizeMismatch> {
        if input.len() != self.weights.len() {
            return Err(SizeMismatch {
                expected: self.weights.len(),
                got: input.len(),
            });
        }

        let sum: f64 = input
            .iter()
            .zip(self.weights.iter())
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.bias;

        // Reuse the cache allocation once it exists; the weight count never
        // changes, so neither does the cache length.
        match &mut self.last_input {
            Some(cache) => cache.copy_from_slice(input),
            None => self.last_input = Some(input.to_owned().into_boxed_slice()),
        }
        self.last_sum = sum;
        self.last_output = self.activation.eval(sum);

        Ok(self.last_output)
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Number of input connections (= weight count).
    pub fn inputs_count(&self) -> usize {
        self.weights.len()
    }

    /// Activated output of the most recent `activate` call, or `None` if the
    /// neuron has never been activated.
    pub fn last_output(&self) -> Option<f64> {
        self.last_input.as_ref().map(|_| self.last_output)
    }
}
