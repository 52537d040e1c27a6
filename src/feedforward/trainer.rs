use log::{debug, trace};
use rand::prelude::Distribution;
use std::fmt;

use super::net::{Net, ProcessError, SizeMismatch};

/// Net trainer structure.
///
/// A thin harness over [`Net::forward`] + [`Net::backward`]: one call trains
/// one sample with an immediate plain gradient-descent update. The trainer is
/// built by `Net::build_trainer`, which consumes the `Net` (preventing a
/// second concurrent trainer over the same network); `Trainer::teardown`
/// gives the trained `Net` back. Cost estimation is possible at any time via
/// `Trainer::process` on test inputs followed by `Net::calc_cost`.
pub struct Trainer {
    pub(crate) net: Net,
}

impl Trainer {
    /// Consumes `Net` and builds a `Trainer` object containing it.
    pub(super) fn build(net: Net) -> Trainer {
        Trainer { net }
    }

    /// Returns reference to the contained `Net`.
    pub fn net_ref(&self) -> &Net {
        &self.net
    }

    /// Returns mutable reference to the contained `Net`, allowing the use of
    /// `Net::forward` without training.
    pub fn net_mut(&mut self) -> &mut Net {
        &mut self.net
    }

    /// Runs a forward pass without training.
    pub fn process(&mut self, inputs: &[f64]) -> Result<Vec<f64>, ProcessError> {
        self.net.forward(inputs)
    }

    /// Trains on a single sample: one forward pass, one backward pass, with
    /// the weight update applied immediately.
    ///
    /// # Returns
    /// * `Ok(f64)` — the cost of this sample *before* the update;
    /// * `Err(TrainError)` on an input or desired-output width mismatch.
    ///
    /// # Examples
    /// ```
    /// # use flexnet::feedforward::{Activation, Net};
    /// let mut trainer = Net::new(&[2, 4, 1], Activation::Swish, None)
    ///     .unwrap()
    ///     .build_trainer();
    /// let cost = trainer.train(&[6.0, 2.0], &[4.0], 0.006).unwrap();
    /// assert!(cost >= 0.0);
    /// ```
    pub fn train(
        &mut self,
        inputs: &[f64],
        desired_outputs: &[f64],
        learning_rate: f64,
    ) -> Result<f64, TrainError> {
        let outputs = self.net.forward(inputs)?;
        self.net.backward(desired_outputs, learning_rate)?;
        // Widths were just validated by forward and backward.
        let cost = Net::calc_cost(&outputs, desired_outputs).unwrap();
        trace!("trained sample, cost {}", cost);
        Ok(cost)
    }

    /// Trains on `samples_count` samples drawn uniformly (with replacement)
    /// from the given pool, updating after every sample.
    ///
    /// # Arguments
    /// * `samples` - slice of `(inputs, desired_outputs)` pairs;
    /// * `samples_count` - number of training iterations;
    /// * `learning_rate` - gradient descent step size.
    ///
    /// # Returns
    /// * `Ok(f64)` — the mean cost over all trained samples;
    /// * `Err(TrainError)` if the pool is empty or any sample has wrong
    ///   input/desired-output width (checked up front, before any training).
    ///
    /// # Examples
    /// ```
    /// # use flexnet::feedforward::{Activation, Net};
    /// let mut trainer = Net::new(&[2, 4, 1], Activation::Swish, None)
    ///     .unwrap()
    ///     .build_trainer();
    /// let samples = vec![
    ///     (vec![1.0, 0.0], vec![1.0]),
    ///     (vec![2.0, 1.0], vec![1.0]),
    ///     (vec![3.0, 1.0], vec![2.0]),
    /// ];
    /// let mean_cost = trainer.train_random(&samples, 100, 0.006).unwrap();
    /// assert!(mean_cost >= 0.0);
    /// ```
    pub fn train_random(
        &mut self,
        samples: &[(Vec<f64>, Vec<f64>)],
        samples_count: usize,
        learning_rate: f64,
    ) -> Result<f64, TrainError> {
        if samples.is_empty() {
            return Err(TrainError::NoSamples);
        }

        let inputs_len = self.net.input_len();
        let outputs_len = self.net.output_len();
        for (i, (inputs, desired_outputs)) in samples.iter().enumerate() {
            if inputs.len() != inputs_len {
                return Err(TrainError::WrongSampleInputsCount((
                    i,
                    inputs_len,
                    inputs.len(),
                )));
            }
            if desired_outputs.len() != outputs_len {
                return Err(TrainError::WrongSampleDesiredOutputsCount((
                    i,
                    outputs_len,
                    desired_outputs.len(),
                )));
            }
        }

        if samples_count == 0 {
            return Ok(0.0);
        }

        let mut rng = rand::thread_rng();
        let indices_between = rand::distributions::Uniform::from(0..samples.len());

        let mut costs_sum = 0.0;
        for _ in 0..samples_count {
            let (inputs, desired_outputs) = &samples[indices_between.sample(&mut rng)];
            // Shapes were validated above.
            costs_sum += self.train(inputs, desired_outputs, learning_rate).unwrap();
        }

        let mean_cost = costs_sum / samples_count as f64;
        debug!(
            "trained on {} sample(s) from a pool of {}, mean cost {}",
            samples_count,
            samples.len(),
            mean_cost
        );
        Ok(mean_cost)
    }

    /// Consumes the `Trainer` object and returns the contained `Net` back.
    pub fn teardown(self) -> Net {
        self.net
    }
}

#[derive(Debug, Clone)]
pub enum TrainError {
    BadInputs(SizeMismatch),
    BadDesiredOutputs(SizeMismatch),
    NotActivated,
    WrongSampleInputsCount((usize, usize, usize)),
    WrongSampleDesiredOutputsCount((usize, usize, usize)),
    NoSamples,
}

impl From<ProcessError> for TrainError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::BadInputs(mismatch) => TrainError::BadInputs(mismatch),
        }
    }
}

impl fmt::Display for TrainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            TrainError::BadInputs(SizeMismatch { expected, got }) => {
                write!(f, "Expected {} input(s), but got {}!", expected, got)
            }
            TrainError::BadDesiredOutputs(SizeMismatch { expected, got }) => write!(
                f,
                "Expected {} desired output(s), but got {}!",
                expected, got
            ),
            TrainError::NotActivated => write!(
                f,
                "Backward pass requires a preceding forward pass, \
                but no activations are cached!"
            ),
            TrainError::WrongSampleInputsCount((i, expected, got)) => write!(
                f,
                "Expected {} input(s), but samples[{}] got {}!",
                expected, i, got
            ),
            TrainError::WrongSampleDesiredOutputsCount((i, expected, got)) => write!(
                f,
                "Expected {} desired output(s), but samples[{}] got {}!",
                expected, i, got
            ),
            TrainError::NoSamples => write!(f, "Cannot train on an empty sample pool!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedforward::{Activation, Neuron};

    fn subtraction_net() -> Net {
        Net::from_layers(vec![
            vec![
                Neuron::new(Activation::Swish, vec![1.0, -1.0], 0.0),
                Neuron::new(Activation::Swish, vec![1.0, -1.0], 0.0),
            ],
            vec![Neuron::new(Activation::Swish, vec![1.0, -1.0], 0.0)],
        ])
        .unwrap()
    }

    #[test]
    fn train_updates_parameters() {
        let mut trainer = subtraction_net().build_trainer();
        let (_, before) = trainer.net_ref().export();
        let cost = trainer.train(&[6.0, 2.0], &[4.0], 0.006).unwrap();
        assert!(cost > 0.0);
        let (_, after) = trainer.net_ref().export();
        assert_ne!(before, after);
    }

    #[test]
    fn train_random_validates_samples_up_front() {
        let mut trainer = subtraction_net().build_trainer();

        assert!(matches!(
            trainer.train_random(&[], 10, 0.006),
            Err(TrainError::NoSamples)
        ));

        let samples = vec![
            (vec![1.0, 0.0], vec![1.0]),
            (vec![1.0], vec![1.0]), // wrong input width
        ];
        let (_, before) = trainer.net_ref().export();
        assert!(matches!(
            trainer.train_random(&samples, 10, 0.006),
            Err(TrainError::WrongSampleInputsCount((1, 2, 1)))
        ));
        // Nothing must have been trained.
        let (_, after) = trainer.net_ref().export();
        assert_eq!(before, after);

        let samples = vec![(vec![1.0, 0.0], vec![1.0, 2.0])];
        assert!(matches!(
            trainer.train_random(&samples, 10, 0.006),
            Err(TrainError::WrongSampleDesiredOutputsCount((0, 1, 2)))
        ));
    }

    #[test]
    fn train_random_zero_iterations_is_a_no_op() {
        let mut trainer = subtraction_net().build_trainer();
        let samples = vec![(vec![1.0, 0.0], vec![1.0])];
        assert_eq!(trainer.train_random(&samples, 0, 0.006).unwrap(), 0.0);
    }

    #[test]
    fn teardown_returns_the_net() {
        let trainer = subtraction_net().build_trainer();
        let net = trainer.teardown();
        assert_eq!(net.geometry(), vec![2, 2, 1]);
    }
}
