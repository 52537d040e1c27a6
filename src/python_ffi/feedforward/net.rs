use pyo3::prelude::*;

use super::trainer::Trainer;
use crate::feedforward::{
    Activation, Net as InnerNet, Neuron, NewNetError, ProcessError, SizeMismatch,
    UnknownActivation,
};
use crate::impl_value_error;
use crate::python_ffi::gen_macros::Consumable;

#[pyclass]
pub struct Net {
    pub(super) net: Consumable<InnerNet>,
}

#[pymethods]
impl Net {
    /// Builds a network from `geometry` (input width plus layer sizes), one
    /// activation kind name for every neuron, and optional flat coefficients
    /// in `[weights]bias` per-neuron order. Without coefficients the weights
    /// are random from [-1,1] and the biases zero.
    #[new]
    pub fn new(
        geometry: Vec<usize>,
        activation: &str,
        coefficients: Option<Vec<f64>>,
    ) -> PyResult<Self> {
        let activation = activation.parse::<Activation>()?;
        let net = InnerNet::new(
            &geometry,
            activation,
            coefficients.map(|v| v.into_boxed_slice()),
        )?;

        Ok(Self {
            net: Consumable::acquire(net, "Net"),
        })
    }

    /// Builds a network from explicit layers of
    /// `(activation_kind, weights, bias)` neuron descriptions, allowing
    /// mixed activation kinds.
    #[staticmethod]
    pub fn from_layers(layers: Vec<Vec<(String, Vec<f64>, f64)>>) -> PyResult<Self> {
        let mut neuron_layers = Vec::with_capacity(layers.len());
        for layer in layers {
            let mut neurons = Vec::with_capacity(layer.len());
            for (activation, weights, bias) in layer {
                neurons.push(Neuron::new(activation.parse::<Activation>()?, weights, bias));
            }
            neuron_layers.push(neurons);
        }

        Ok(Self {
            net: Consumable::acquire(InnerNet::from_layers(neuron_layers)?, "Net"),
        })
    }

    pub fn geometry(&self) -> PyResult<Vec<usize>> {
        Ok(self.net.get_ref()?.geometry())
    }

    pub fn export(&self) -> PyResult<(Vec<usize>, Vec<f64>)> {
        Ok(self.net.get_ref()?.export())
    }

    pub fn forward(&mut self, inputs: Vec<f64>) -> PyResult<Vec<f64>> {
        Ok(self.net.get_ref_mut()?.forward(&inputs)?)
    }

    pub fn backward(&mut self, desired_outputs: Vec<f64>, learning_rate: f64) -> PyResult<()> {
        Ok(self
            .net
            .get_ref_mut()?
            .backward(&desired_outputs, learning_rate)?)
    }

    pub fn build_trainer(&mut self) -> PyResult<Trainer> {
        Ok(Trainer {
            trainer: Consumable::acquire(self.net.release()?.build_trainer(), "Trainer"),
        })
    }

    #[staticmethod]
    pub fn calc_cost(outputs: Vec<f64>, desired_outputs: Vec<f64>) -> PyResult<f64> {
        Ok(InnerNet::calc_cost(&outputs, &desired_outputs)?)
    }
}

impl_value_error!(for NewNetError, ProcessError, SizeMismatch, UnknownActivation);
