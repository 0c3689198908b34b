//! Activation functions for fully-connected layers.

use std::str::FromStr;

use burn::tensor::{Tensor, backend::Backend};
use serde::{Deserialize, Serialize};

use crate::errors::StackError;

/// Supported elementwise nonlinearities.
///
/// A closed enumeration: activation names coming from configuration are
/// resolved against this set and unrecognized names are rejected up front,
/// instead of being looked up dynamically at forward time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// No activation (identity function).
    #[default]
    None,
    /// Rectified Linear Unit: f(x) = max(0, x)
    Relu,
    /// Sigmoid: f(x) = 1 / (1 + exp(-x))
    Sigmoid,
    /// Hyperbolic tangent: f(x) = tanh(x)
    Tanh,
    /// Softmax normalization (across the last dimension)
    Softmax,
    /// Softplus: f(x) = ln(1 + exp(x))
    Softplus,
    /// Leaky ReLU with slope 0.01 for negative inputs.
    LeakyRelu,
    /// Gaussian Error Linear Unit.
    Gelu,
}

impl Activation {
    /// Applies the activation function to a tensor.
    pub fn apply<B: Backend, const D: usize>(&self, tensor: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::None => tensor,
            Activation::Relu => burn::tensor::activation::relu(tensor),
            Activation::Sigmoid => burn::tensor::activation::sigmoid(tensor),
            Activation::Tanh => burn::tensor::activation::tanh(tensor),
            Activation::Softmax => burn::tensor::activation::softmax(tensor, D - 1),
            Activation::Softplus => burn::tensor::activation::softplus(tensor, 1.0),
            Activation::LeakyRelu => burn::tensor::activation::leaky_relu(tensor, 0.01),
            Activation::Gelu => burn::tensor::activation::gelu(tensor),
        }
    }

    /// Resolves an activation from its configuration name, case-insensitively.
    ///
    /// Returns `None` for unrecognized names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "none" => Some(Activation::None),
            "relu" => Some(Activation::Relu),
            "sigmoid" => Some(Activation::Sigmoid),
            "tanh" => Some(Activation::Tanh),
            "softmax" => Some(Activation::Softmax),
            "softplus" => Some(Activation::Softplus),
            "leaky_relu" => Some(Activation::LeakyRelu),
            "gelu" => Some(Activation::Gelu),
            _ => None,
        }
    }

    /// Returns the configuration name of the activation.
    pub fn name(&self) -> &'static str {
        match self {
            Activation::None => "none",
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Softmax => "softmax",
            Activation::Softplus => "softplus",
            Activation::LeakyRelu => "leaky_relu",
            Activation::Gelu => "gelu",
        }
    }

    /// Converts the activation to a numeric ID for storage in a Module.
    pub fn to_id(&self) -> u8 {
        match self {
            Activation::None => 0,
            Activation::Relu => 1,
            Activation::Sigmoid => 2,
            Activation::Tanh => 3,
            Activation::Softmax => 4,
            Activation::Softplus => 5,
            Activation::LeakyRelu => 6,
            Activation::Gelu => 7,
        }
    }

    /// Creates an Activation from a numeric ID.
    pub fn from_id(id: u8) -> Self {
        match id {
            0 => Activation::None,
            1 => Activation::Relu,
            2 => Activation::Sigmoid,
            3 => Activation::Tanh,
            4 => Activation::Softmax,
            5 => Activation::Softplus,
            6 => Activation::LeakyRelu,
            7 => Activation::Gelu,
            _ => Activation::None,
        }
    }
}

impl FromStr for Activation {
    type Err = StackError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Activation::from_name(name).ok_or_else(|| StackError::NoSuchActivation {
            name: name.to_string(),
        })
    }
}
