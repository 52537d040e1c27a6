use pyo3::prelude::*;

use super::net::Net;
use crate::feedforward::{TrainError, Trainer as InnerTrainer};
use crate::impl_value_error;
use crate::python_ffi::gen_macros::Consumable;

#[pyclass]
pub struct Trainer {
    pub(super) trainer: Consumable<InnerTrainer>,
}

#[pymethods]
impl Trainer {
    pub fn geometry(&self) -> PyResult<Vec<usize>> {
        Ok(self.trainer.get_ref()?.net_ref().geometry())
    }

    pub fn export_net(&self) -> PyResult<(Vec<usize>, Vec<f64>)> {
        Ok(self.trainer.get_ref()?.net_ref().export())
    }

    /// Forward pass without training.
    pub fn process(&mut self, inputs: Vec<f64>) -> PyResult<Vec<f64>> {
        Ok(self.trainer.get_ref_mut()?.process(&inputs)?)
    }

    /// One sample, one immediate gradient-descent update; returns the cost
    /// of the sample before the update.
    pub fn train(
        &mut self,
        inputs: Vec<f64>,
        desired_outputs: Vec<f64>,
        learning_rate: f64,
    ) -> PyResult<f64> {
        Ok(self
            .trainer
            .get_ref_mut()?
            .train(&inputs, &desired_outputs, learning_rate)?)
    }

    /// Trains on `samples_count` samples drawn uniformly from the pool;
    /// returns the mean cost.
    pub fn train_random(
        &mut self,
        samples: Vec<(Vec<f64>, Vec<f64>)>,
        samples_count: usize,
        learning_rate: f64,
    ) -> PyResult<f64> {
        Ok(self
            .trainer
            .get_ref_mut()?
            .train_random(&samples, samples_count, learning_rate)?)
    }

    /// Consumes the trainer and gives the contained `Net` back.
    pub fn teardown(&mut self) -> PyResult<Net> {
        Ok(Net {
            net: Consumable::acquire(self.trainer.release()?.teardown(), "Net"),
        })
    }
}

impl_value_error!(for TrainError);
