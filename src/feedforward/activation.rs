use std::fmt;
use std::str::FromStr;

/// Activation function kind of a neuron.
///
/// Each kind names a fixed (function, derivative) pair. The set is closed,
/// so neurons only carry the tag and dispatch through a `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// `f(x) = x`
    Identity,
    /// `f(x) = max(0, x)`
    Relu,
    /// `f(x) = 1 / (1 + exp(-x))`
    Sigmoid,
    /// `f(x) = tanh(x)`
    Tanh,
    /// `f(x) = x * sigmoid(x)`
    Swish,
}

/// Sigmoid function.
/// Implements the formula:
/// `1 / (1 + exp(-x))`.
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Activation {
    /// Applies the activation function to the pre-activation sum `x`.
    ///
    /// # Examples
    /// ```
    /// # use flexnet::feedforward::Activation;
    /// assert_eq!(Activation::Identity.eval(-2.5), -2.5);
    /// assert_eq!(Activation::Relu.eval(-2.5), 0.0);
    /// assert_eq!(Activation::Swish.eval(0.0), 0.0);
    /// ```
    pub fn eval(self, x: f64) -> f64 {
        match self {
            Activation::Identity => x,
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => sigmoid(x),
            Activation::Tanh => x.tanh(),
            Activation::Swish => x * sigmoid(x),
        }
    }

    /// Applies the derivative of the activation function to `x`.
    ///
    /// ReLU is not differentiable at zero; the derivative there is fixed
    /// to `0`, matching the inactive forward branch.
    pub fn derivative(self, x: f64) -> f64 {
        match self {
            Activation::Identity => 1.0,
            Activation::Relu => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
            Activation::Tanh => 1.0 - x.tanh() * x.tanh(),
            Activation::Swish => {
                let s = sigmoid(x);
                s + x * s * (1.0 - s)
            }
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Activation::Identity => "identity",
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Swish => "swish",
        })
    }
}

impl FromStr for Activation {
    type Err = UnknownActivation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" => Ok(Activation::Identity),
            "relu" => Ok(Activation::Relu),
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            "swish" => Ok(Activation::Swish),
            _ => Err(UnknownActivation(s.to_owned())),
        }
    }
}

/// Error structure for parsing an activation kind name
#[derive(Debug, Clone)]
pub struct UnknownActivation(pub String);

impl fmt::Display for UnknownActivation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Unknown activation function '{}', expected one of: \
            identity, relu, sigmoid, tanh, swish!",
            self.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sigmoid_derivative_matches_identity() {
        let mut x = -20.0;
        while x <= 20.0 {
            let s = Activation::Sigmoid.eval(x);
            assert_relative_eq!(
                Activation::Sigmoid.derivative(x),
                s * (1.0 - s),
                epsilon = 1e-9
            );
            x += 0.25;
        }
    }

    #[test]
    fn relu_boundary_convention() {
        assert_eq!(Activation::Relu.eval(0.0), 0.0);
        assert_eq!(Activation::Relu.derivative(0.0), 0.0);
        assert_eq!(Activation::Relu.derivative(-1.0), 0.0);
        assert_eq!(Activation::Relu.derivative(1e-12), 1.0);
    }

    #[test]
    fn derivatives_match_finite_differences() {
        let kinds = [
            Activation::Identity,
            Activation::Sigmoid,
            Activation::Tanh,
            Activation::Swish,
        ];
        let h = 1e-6;
        for &kind in kinds.iter() {
            for &x in [-3.0, -0.7, 0.1, 1.3, 4.0].iter() {
                let numeric = (kind.eval(x + h) - kind.eval(x - h)) / (2.0 * h);
                assert_relative_eq!(kind.derivative(x), numeric, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn kind_names_round_trip() {
        let kinds = [
            Activation::Identity,
            Activation::Relu,
            Activation::Sigmoid,
            Activation::Tanh,
            Activation::Swish,
        ];
        for &kind in kinds.iter() {
            assert_eq!(kind.to_string().parse::<Activation>().unwrap(), kind);
        }
        assert!("softmax".parse::<Activation>().is_err());
    }

    #[test]
    fn swish_formula() {
        let x = 1.5_f64;
        let s = 1.0 / (1.0 + (-x).exp());
        assert_relative_eq!(Activation::Swish.eval(x), x * s, epsilon = 1e-12);
        assert_relative_eq!(
            Activation::Swish.derivative(x),
            s + x * s * (1.0 - s),
            epsilon = 1e-12
        );
    }
}
