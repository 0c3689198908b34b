//! Normalization selection for fully-connected layers.

use std::str::FromStr;

use burn::module::Module;
use burn::nn::{BatchNorm, BatchNormConfig};
use burn::tensor::{Tensor, backend::Backend};
use serde::{Deserialize, Serialize};

use crate::errors::StackError;

/// Which normalization, if any, follows the affine transform.
///
/// A closed set: unrecognized normalization names are rejected at
/// configuration time rather than silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Norm {
    /// No normalization.
    #[default]
    None,
    /// Batch normalization, driven by batch statistics during training and
    /// running statistics during inference.
    Batch,
    /// Layer normalization, independent of batch composition.
    Layer,
}

impl Norm {
    /// Resolves a normalization from its configuration name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "none" => Some(Norm::None),
            "batch" => Some(Norm::Batch),
            "layer" => Some(Norm::Layer),
            _ => None,
        }
    }
}

impl FromStr for Norm {
    type Err = StackError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Norm::from_name(name).ok_or_else(|| StackError::NoSuchNorm {
            name: name.to_string(),
        })
    }
}

/// Batch normalization over rank-2 `[batch, features]` tensors.
///
/// Burn's `BatchNorm` normalizes the channel dimension of rank-3 and higher
/// inputs, so the feature dimension is exposed as channels via a reshape.
/// Training vs. inference behavior follows the backend's autodiff flag.
#[derive(Module, Debug)]
pub struct BatchNorm1d<B: Backend> {
    inner: BatchNorm<B, 1>,
    num_features: usize,
}

impl<B: Backend> BatchNorm1d<B> {
    pub fn new(num_features: usize, device: &B::Device) -> Self {
        let inner = BatchNormConfig::new(num_features).init(device);
        Self {
            inner,
            num_features,
        }
    }

    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, features] = input.dims();
        let input_3d = input.reshape([batch, features, 1]);
        let output_3d = self.inner.forward(input_3d);
        output_3d.reshape([batch, features])
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }
}
