//! Weight initializer and regularizer handles.
//!
//! These are thin configuration-level names mapped onto Burn's own
//! initializers. The regularizer surfaces as a penalty query, since Burn
//! attaches weight decay at the optimizer rather than at the layer.

use std::str::FromStr;

use burn::nn::Initializer;
use burn::tensor::{Tensor, backend::Backend};
use serde::{Deserialize, Serialize};

use crate::errors::StackError;
use crate::layers::Activation;

/// Named weight initialization strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// He/Kaiming uniform, suited to ReLU-family activations.
    HeUniform,
    /// He/Kaiming normal.
    HeNormal,
    /// Glorot/Xavier uniform, suited to sigmoid and tanh.
    #[default]
    GlorotUniform,
    /// Glorot/Xavier normal.
    GlorotNormal,
    /// All zeros.
    Zeros,
    /// All ones.
    Ones,
}

impl WeightInit {
    /// Resolves an initializer from its configuration name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "he_uniform" => Some(WeightInit::HeUniform),
            "he_normal" => Some(WeightInit::HeNormal),
            "glorot_uniform" => Some(WeightInit::GlorotUniform),
            "glorot_normal" => Some(WeightInit::GlorotNormal),
            "zeros" => Some(WeightInit::Zeros),
            "ones" => Some(WeightInit::Ones),
            _ => None,
        }
    }

    /// Maps the handle onto Burn's initializer.
    pub fn initializer(&self) -> Initializer {
        match self {
            WeightInit::HeUniform => Initializer::KaimingUniform {
                gain: std::f64::consts::SQRT_2,
                fan_out_only: false,
            },
            WeightInit::HeNormal => Initializer::KaimingNormal {
                gain: std::f64::consts::SQRT_2,
                fan_out_only: false,
            },
            WeightInit::GlorotUniform => Initializer::XavierUniform { gain: 1.0 },
            WeightInit::GlorotNormal => Initializer::XavierNormal { gain: 1.0 },
            WeightInit::Zeros => Initializer::Zeros,
            WeightInit::Ones => Initializer::Ones,
        }
    }

    /// Picks the default initializer for a layer with no explicit one.
    ///
    /// `he_uniform` for ReLU, `glorot_uniform` for sigmoid and tanh, and the
    /// framework's own dense-layer default for everything else.
    pub fn for_activation(activation: Activation) -> Initializer {
        match activation {
            Activation::Relu => WeightInit::HeUniform.initializer(),
            Activation::Sigmoid | Activation::Tanh => WeightInit::GlorotUniform.initializer(),
            _ => Initializer::KaimingUniform {
                gain: 1.0 / 3.0f64.sqrt(),
                fan_out_only: false,
            },
        }
    }
}

impl FromStr for WeightInit {
    type Err = StackError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        WeightInit::from_name(name).ok_or_else(|| StackError::NoSuchInitializer {
            name: name.to_string(),
        })
    }
}

/// Weight regularization handle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Regularizer {
    /// No regularization.
    #[default]
    None,
    /// L1 penalty: factor * sum(|w|)
    L1 { factor: f64 },
    /// L2 penalty: factor * sum(w^2)
    L2 { factor: f64 },
}

impl Regularizer {
    /// Computes the penalty for a weight tensor, `None` when unregularized.
    pub fn penalty<B: Backend, const D: usize>(
        &self,
        weight: Tensor<B, D>,
    ) -> Option<Tensor<B, 1>> {
        match self {
            Regularizer::None => None,
            Regularizer::L1 { factor } => Some(weight.abs().sum() * *factor),
            Regularizer::L2 { factor } => Some(weight.powf_scalar(2.0).sum() * *factor),
        }
    }

    /// Encodes the regularizer as primitives for storage in a Module.
    pub fn to_parts(&self) -> (u8, f64) {
        match self {
            Regularizer::None => (0, 0.0),
            Regularizer::L1 { factor } => (1, *factor),
            Regularizer::L2 { factor } => (2, *factor),
        }
    }

    /// Decodes a regularizer stored as primitives.
    pub fn from_parts(id: u8, factor: f64) -> Self {
        match id {
            1 => Regularizer::L1 { factor },
            2 => Regularizer::L2 { factor },
            _ => Regularizer::None,
        }
    }
}
