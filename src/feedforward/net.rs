use std::fmt;

use super::activation::Activation;
use super::neuron::Neuron;
use super::trainer::{Trainer, TrainError};

/// Neural network structure
///
/// An ordered sequence of layers, each layer an ordered sequence of
/// [`Neuron`]s. Every neuron of a layer consumes the same input vector:
/// the external input for layer 0, the previous layer's outputs afterwards.
///
/// The topology is fixed at construction; only weights, biases and the
/// per-neuron caches mutate, and no neuron is ever shared between networks.
pub struct Net {
    pub(super) layers: Box<[Box<[Neuron]>]>,
}

impl Net {
    /// Builds a network from explicit layers of neurons.
    ///
    /// This is the topology-description constructor: each neuron carries its
    /// own weight vector, bias and activation kind, so kinds may be mixed
    /// freely across (or within) layers.
    ///
    /// # Returns
    /// * `Ok(Net)` if the layers form a consistent topology;
    /// * `Err(NewNetError)` otherwise:
    ///   * `BadGeometry` — no layers at all;
    ///   * `EmptyLayer` — a layer without neurons;
    ///   * `BadWeights` — a neuron whose weight count disagrees with the
    ///     width of the previous layer (or, in layer 0, with the first
    ///     neuron's weight count, which defines the input width).
    ///
    /// # Examples
    /// ```
    /// # use flexnet::feedforward::{Activation, Net, Neuron};
    /// let net = Net::from_layers(vec![
    ///     vec![
    ///         Neuron::new(Activation::Swish, vec![1.0, -1.0], 0.0),
    ///         Neuron::new(Activation::Swish, vec![1.0, -1.0], 0.0),
    ///     ],
    ///     vec![Neuron::new(Activation::Swish, vec![1.0, -1.0], 0.0)],
    /// ]).unwrap();
    /// assert_eq!(net.geometry(), vec![2, 2, 1]);
    /// ```
    pub fn from_layers(layers: Vec<Vec<Neuron>>) -> Result<Net, NewNetError> {
        if layers.is_empty() {
            return Err(NewNetError::BadGeometry(0));
        }

        let mut prev_width = match layers[0].first() {
            Some(neuron) => neuron.inputs_count(),
            None => return Err(NewNetError::EmptyLayer(0)),
        };

        for (li, layer) in layers.iter().enumerate() {
            if layer.is_empty() {
                return Err(NewNetError::EmptyLayer(li));
            }
            for (ni, neuron) in layer.iter().enumerate() {
                if neuron.inputs_count() != prev_width {
                    return Err(NewNetError::BadWeights(
                        li,
                        ni,
                        SizeMismatch {
                            expected: prev_width,
                            got: neuron.inputs_count(),
                        },
                    ));
                }
            }
            prev_width = layer.len();
        }

        Ok(Net {
            layers: layers
                .into_iter()
                .map(|layer| layer.into_boxed_slice())
                .collect(),
        })
    }

    /// Returns a network for the given geometry, with one activation kind
    /// shared by every neuron.
    ///
    /// `geometry[0]` is the input width; each following entry is a layer's
    /// neuron count. Without `coefficients` the weights are random from range
    /// [-1,1] and the biases are zero. With `coefficients`, the flat layout
    /// is `[weights_1]bias_1[weights_2]bias_2 ...`, neurons in layer order —
    /// the same layout `Net::export` produces.
    ///
    /// # Returns
    /// * `Ok(Net)` if the amount of coefficients is right, or no coefficients
    ///   provided;
    /// * `Err(NewNetError)` otherwise.
    ///
    /// # Examples
    /// * Using random coefficients
    /// ```
    /// # use flexnet::feedforward::{Activation, Net};
    /// let mut net = Net::new(&[2, 4, 4, 1], Activation::Sigmoid, None).unwrap();
    /// ```
    /// * Using given coefficients
    /// ```
    /// # use flexnet::feedforward::{Activation, Net};
    /// let coefficients = [0.27, 0.3, 7.5, 0.0, 1.1];
    /// let mut net = Net::new(&[2, 1, 1], Activation::Tanh, Some(Box::new(coefficients))).unwrap();
    /// ```
    pub fn new(
        geometry: &[usize],
        activation: Activation,
        coefficients: Option<Box<[f64]>>,
    ) -> Result<Net, NewNetError> {
        if geometry.len() < 2 {
            return Err(NewNetError::BadGeometry(geometry.len()));
        }

        let coeffs_total: usize = geometry
            .windows(2)
            .map(|pair| pair[1] * (pair[0] + 1)) // [prev_width] weights + 1 bias
            .sum();

        let mut layers = Vec::with_capacity(geometry.len() - 1);
        match coefficients {
            Some(coeffs) => {
                if coeffs.len() != coeffs_total {
                    return Err(NewNetError::BadCoefficients(SizeMismatch {
                        expected: coeffs_total,
                        got: coeffs.len(),
                    }));
                }

                let mut remaining = coeffs.as_ref();
                for pair in geometry.windows(2) {
                    let (prev_width, layer_size) = (pair[0], pair[1]);
                    let mut layer = Vec::with_capacity(layer_size);
                    for _ in 0..layer_size {
                        let (neuron_coeffs, tail) = remaining.split_at(prev_width + 1);
                        remaining = tail;
                        layer.push(Neuron::new(
                            activation,
                            neuron_coeffs[..prev_width].to_vec(),
                            neuron_coeffs[prev_width],
                        ));
                    }
                    layers.push(layer);
                }
            }
            None => {
                for pair in geometry.windows(2) {
                    let (prev_width, layer_size) = (pair[0], pair[1]);
                    layers.push(
                        (0..layer_size)
                            .map(|_| Neuron::random(activation, prev_width))
                            .collect(),
                    );
                }
            }
        }

        Net::from_layers(layers)
    }

    /// Returns the number of neurons in each layer, preceded by the input
    /// width.
    pub fn geometry(&self) -> Vec<usize> {
        let mut geometry = Vec::with_capacity(self.layers.len() + 1);
        geometry.push(self.input_len());
        geometry.extend(self.layers.iter().map(|layer| layer.len()));
        geometry
    }

    /// Width of the external input vector.
    pub fn input_len(&self) -> usize {
        self.layers[0][0].inputs_count()
    }

    /// Width of the output layer.
    pub fn output_len(&self) -> usize {
        self.layers.last().unwrap().len()
    }

    /// Exports geometry and coefficients from the network.
    ///
    /// The coefficients come flattened as `[weights_1]bias_1[weights_2] ...`,
    /// neurons in layer order, the layout `Net::new` accepts back.
    ///
    /// # Returns
    /// `(geometry, coefficients)`.
    pub fn export(&self) -> (Vec<usize>, Vec<f64>) {
        let mut coeffs = Vec::new();
        for layer in self.layers.iter() {
            for neuron in layer.iter() {
                coeffs.extend_from_slice(neuron.weights());
                coeffs.push(neuron.bias());
            }
        }
        (self.geometry(), coeffs)
    }

    /// Calculates the output of the network for the given input.
    ///
    /// Feeds `inputs` to layer 0; every neuron of a layer activates on the
    /// same incoming vector, and the collected outputs become the next
    /// layer's input. Each neuron caches its input and pre-activation sum on
    /// the way, which is what a following [`Net::backward`] consumes.
    ///
    /// Given fixed weights the call is pure: repeating it with the same
    /// input yields bit-identical output.
    ///
    /// # Returns
    /// * `Ok(Vec<f64>)` — the output layer's activations;
    /// * `Err(ProcessError)` if `inputs` does not match the input width.
    ///
    /// # Examples
    /// ```
    /// # use flexnet::feedforward::{Activation, Net, Neuron};
    /// let mut net = Net::from_layers(vec![
    ///     vec![Neuron::new(Activation::Identity, vec![1.0, -1.0], 0.0)],
    /// ]).unwrap();
    /// assert_eq!(net.forward(&[3.0, 2.0]).unwrap(), vec![1.0]);
    /// ```
    pub fn forward(&mut self, inputs: &[f64]) -> Result<Vec<f64>, ProcessError> {
        if inputs.len() != self.input_len() {
            return Err(ProcessError::BadInputs(SizeMismatch {
                expected: self.input_len(),
                got: inputs.len(),
            }));
        }

        let mut activations = inputs.to_vec();
        for layer in self.layers.iter_mut() {
            let mut outputs = Vec::with_capacity(layer.len());
            for neuron in layer.iter_mut() {
                // Input width was checked above and the topology was checked
                // at construction, so activation cannot fail here.
                outputs.push(neuron.activate(&activations).unwrap());
            }
            activations = outputs;
        }
        Ok(activations)
    }

    /// Performs one backpropagation step against `desired_outputs`, updating
    /// every weight and bias by plain gradient descent.
    ///
    /// Must follow a [`Net::forward`] call for the corresponding input; the
    /// per-neuron caches of that pass are what the gradients are computed
    /// from.
    ///
    /// The pass runs in two phases. First every delta is computed: the output
    /// layer's from the difference to `desired_outputs` (the derivative of
    /// squared-error loss times the local activation slope), then each hidden
    /// layer's from the *following* layer's deltas through the transpose of
    /// the forward weight access. Only once all deltas are in place does the
    /// parameter update run — a layer's deltas must see the next layer's
    /// pre-update weights, otherwise the gradient is corrupted.
    ///
    /// # Returns
    /// * `Ok(())` on success;
    /// * `Err(TrainError::BadDesiredOutputs)` if `desired_outputs` does not
    ///   match the output layer width;
    /// * `Err(TrainError::NotActivated)` if the network has no cached forward
    ///   pass to differentiate.
    ///
    /// # Examples
    /// ```
    /// # use flexnet::feedforward::{Activation, Net, Neuron};
    /// let mut net = Net::from_layers(vec![
    ///     vec![Neuron::new(Activation::Identity, vec![1.0, -1.0], 0.0)],
    /// ]).unwrap();
    /// net.forward(&[3.0, 2.0]).unwrap();
    /// net.backward(&[10.0], 0.1).unwrap();
    /// let (_, coeffs) = net.export();
    /// assert!((coeffs[0] - 3.7).abs() < 1e-12);
    /// ```
    pub fn backward(
        &mut self,
        desired_outputs: &[f64],
        learning_rate: f64,
    ) -> Result<(), TrainError> {
        if desired_outputs.len() != self.output_len() {
            return Err(TrainError::BadDesiredOutputs(SizeMismatch {
                expected: self.output_len(),
                got: desired_outputs.len(),
            }));
        }
        if self
            .layers
            .iter()
            .any(|layer| layer.iter().any(|neuron| neuron.last_input.is_none()))
        {
            return Err(TrainError::NotActivated);
        }

        // Deltas of the output layer
        let output_layer = self.layers.last_mut().unwrap();
        for (neuron, &desired) in output_layer.iter_mut().zip(desired_outputs.iter()) {
            neuron.error =
                (neuron.last_output - desired) * neuron.activation.derivative(neuron.last_sum);
        }

        // Deltas of the hidden layers, last to first. Each needs the deltas
        // and (pre-update) weights of the layer after it, so split off the
        // tail to borrow both sides at once.
        for li in (0..self.layers.len() - 1).rev() {
            let (head, tail) = self.layers.split_at_mut(li + 1);
            let current_layer = head.last_mut().unwrap();
            let next_layer = &tail[0];

            for (i, neuron) in current_layer.iter_mut().enumerate() {
                let downstream: f64 = next_layer
                    .iter()
                    .map(|next_neuron| next_neuron.error * next_neuron.weights[i])
                    .sum();
                neuron.error = downstream * neuron.activation.derivative(neuron.last_sum);
            }
        }

        // Gradient descent update, only now that every delta is computed
        for layer in self.layers.iter_mut() {
            for neuron in layer.iter_mut() {
                let input = neuron.last_input.as_ref().unwrap();
                for (weight, &x) in neuron.weights.iter_mut().zip(input.iter()) {
                    *weight -= learning_rate * neuron.error * x;
                }
                neuron.bias -= learning_rate * neuron.error;
            }
        }

        Ok(())
    }

    /// Calculates the cost of output values given the desired values, as the
    /// sum of squared differences.
    ///
    /// # Returns
    /// * `Ok(f64)` if `outputs` and `desired_outputs` have the same length;
    /// * `Err(SizeMismatch)` otherwise.
    ///
    /// # Examples
    /// ```
    /// # use flexnet::feedforward::Net;
    /// let cost = Net::calc_cost(&[1.0, 2.0], &[1.5, 2.0]).unwrap();
    /// assert_eq!(cost, 0.25);
    /// ```
    pub fn calc_cost(outputs: &[f64], desired_outputs: &[f64]) -> Result<f64, SizeMismatch> {
        if outputs.len() != desired_outputs.len() {
            return Err(SizeMismatch {
                expected: outputs.len(),
                got: desired_outputs.len(),
            });
        }

        Ok(outputs
            .iter()
            .zip(desired_outputs.iter())
            .map(|(&a, &b)| (a - b) * (a - b))
            .sum())
    }

    /// Consumes `Net` and builds a `Trainer` object containing it.
    /// See `Trainer`'s documentation for details.
    pub fn build_trainer(self) -> Trainer {
        Trainer::build(self)
    }
}

/// Error structure for `Net::from_layers` and `Net::new`
#[derive(Debug, Clone)]
pub enum NewNetError {
    BadGeometry(usize),
    EmptyLayer(usize),
    BadWeights(usize, usize, SizeMismatch),
    BadCoefficients(SizeMismatch),
}

impl fmt::Display for NewNetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            NewNetError::BadGeometry(length) => write!(
                f,
                "Net must have at least one layer of neurons \
                (geometry: input width plus at least one layer), but got {}!",
                length
            ),
            NewNetError::EmptyLayer(layer) => {
                write!(f, "Layer {} has no neurons!", layer)
            }
            NewNetError::BadWeights(layer, neuron, SizeMismatch { expected, got }) => write!(
                f,
                "Neuron {} of layer {} must have {} weight(s) \
                to match the previous layer, but got {}!",
                neuron, layer, expected, got
            ),
            NewNetError::BadCoefficients(SizeMismatch { expected, got }) => write!(
                f,
                "Expected {} coefficients because of provided geometry, but got {}!",
                expected, got
            ),
        }
    }
}

/// Error structure for `Net::forward`
#[derive(Debug, Clone)]
pub enum ProcessError {
    BadInputs(SizeMismatch),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            ProcessError::BadInputs(SizeMismatch { expected, got }) => {
                write!(f, "Expected {} input(s), but got {}!", expected, got)
            }
        }
    }
}

/// Error structure for collections size mismatch
#[derive(Debug, Clone)]
pub struct SizeMismatch {
    pub expected: usize,
    pub got: usize,
}

impl fmt::Display for SizeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Expected {} values, but got {}!",
            self.expected, self.got
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn identity(weights: Vec<f64>, bias: f64) -> Neuron {
        Neuron::new(Activation::Identity, weights, bias)
    }

    #[test]
    fn forward_is_pure_given_fixed_weights() {
        let mut net = Net::new(&[3, 5, 5, 2], Activation::Swish, None).unwrap();
        let inputs = [0.3, -1.2, 7.0];
        let first = net.forward(&inputs).unwrap();
        let second = net.forward(&inputs).unwrap();
        // Bit-identical, not merely close.
        assert_eq!(first, second);
    }

    #[test]
    fn forward_rejects_wrong_input_width() {
        let mut net = Net::new(&[2, 2, 1], Activation::Sigmoid, None).unwrap();
        match net.forward(&[1.0, 2.0, 3.0]) {
            Err(ProcessError::BadInputs(SizeMismatch { expected: 2, got: 3 })) => {}
            other => panic!("expected BadInputs, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn backward_single_neuron_hand_computed() {
        // One identity neuron: output 1, error (1-10)*1 = -9,
        // weights [1 - 0.1*-9*3, -1 - 0.1*-9*2], bias 0 + 0.9.
        let mut net = Net::from_layers(vec![vec![identity(vec![1.0, -1.0], 0.0)]]).unwrap();
        let outputs = net.forward(&[3.0, 2.0]).unwrap();
        assert_relative_eq!(outputs[0], 1.0, epsilon = 1e-12);

        net.backward(&[10.0], 0.1).unwrap();
        let (_, coeffs) = net.export();
        assert_relative_eq!(coeffs[0], 3.7, epsilon = 1e-12);
        assert_relative_eq!(coeffs[1], 0.8, epsilon = 1e-12);
        assert_relative_eq!(coeffs[2], 0.9, epsilon = 1e-12);
    }

    #[test]
    fn backward_propagates_through_pre_update_weights() {
        // Identity everywhere, so deltas are easy to follow by hand:
        // hidden layer passes the input through, output neuron computes
        // 2*1 + 3*1 = 5. With target 0: output delta = 5, hidden deltas
        // 5*2 = 10 and 5*3 = 15 — through the output neuron's weights as
        // they were before any update.
        let mut net = Net::from_layers(vec![
            vec![
                identity(vec![1.0, 0.0], 0.0),
                identity(vec![0.0, 1.0], 0.0),
            ],
            vec![identity(vec![2.0, 3.0], 0.0)],
        ])
        .unwrap();

        let outputs = net.forward(&[1.0, 1.0]).unwrap();
        assert_relative_eq!(outputs[0], 5.0, epsilon = 1e-12);

        net.backward(&[0.0], 0.1).unwrap();
        let (_, coeffs) = net.export();
        // Hidden neuron 0: delta 10, input [1,1] -> weights [0, -1], bias -1
        assert_relative_eq!(coeffs[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(coeffs[1], -1.0, epsilon = 1e-12);
        assert_relative_eq!(coeffs[2], -1.0, epsilon = 1e-12);
        // Hidden neuron 1: delta 15 -> weights [-1.5, -0.5], bias -1.5
        assert_relative_eq!(coeffs[3], -1.5, epsilon = 1e-12);
        assert_relative_eq!(coeffs[4], -0.5, epsilon = 1e-12);
        assert_relative_eq!(coeffs[5], -1.5, epsilon = 1e-12);
        // Output neuron: delta 5, input [1,1] -> weights [1.5, 2.5], bias -0.5
        assert_relative_eq!(coeffs[6], 1.5, epsilon = 1e-12);
        assert_relative_eq!(coeffs[7], 2.5, epsilon = 1e-12);
        assert_relative_eq!(coeffs[8], -0.5, epsilon = 1e-12);
    }

    #[test]
    fn backward_requires_forward_first() {
        let mut net = Net::new(&[2, 2, 1], Activation::Swish, None).unwrap();
        match net.backward(&[1.0], 0.01) {
            Err(TrainError::NotActivated) => {}
            other => panic!("expected NotActivated, got {:?}", other),
        }
    }

    #[test]
    fn backward_rejects_wrong_target_width() {
        let mut net = Net::new(&[2, 2, 1], Activation::Swish, None).unwrap();
        net.forward(&[1.0, 2.0]).unwrap();
        match net.backward(&[1.0, 2.0], 0.01) {
            Err(TrainError::BadDesiredOutputs(SizeMismatch { expected: 1, got: 2 })) => {}
            other => panic!("expected BadDesiredOutputs, got {:?}", other),
        }
    }

    #[test]
    fn from_layers_validates_topology() {
        assert!(matches!(
            Net::from_layers(vec![]),
            Err(NewNetError::BadGeometry(0))
        ));
        assert!(matches!(
            Net::from_layers(vec![vec![identity(vec![1.0], 0.0)], vec![]]),
            Err(NewNetError::EmptyLayer(1))
        ));
        // Second layer's neuron expects 2 inputs but layer 0 has one neuron.
        assert!(matches!(
            Net::from_layers(vec![
                vec![identity(vec![1.0], 0.0)],
                vec![identity(vec![1.0, 1.0], 0.0)],
            ]),
            Err(NewNetError::BadWeights(1, 0, SizeMismatch { expected: 1, got: 2 }))
        ));
    }

    #[test]
    fn new_validates_coefficients_count() {
        let coeffs: Box<[f64]> = Box::new([0.0; 4]);
        assert!(matches!(
            Net::new(&[2, 1], Activation::Identity, Some(coeffs)),
            Err(NewNetError::BadCoefficients(SizeMismatch { expected: 3, got: 4 }))
        ));
    }

    #[test]
    fn new_round_trips_through_export() {
        let coeffs = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
        let net = Net::new(
            &[2, 2, 1],
            Activation::Sigmoid,
            Some(coeffs.clone().into_boxed_slice()),
        )
        .unwrap();
        let (geometry, exported) = net.export();
        assert_eq!(geometry, vec![2, 2, 1]);
        assert_eq!(exported, coeffs);
    }
}
