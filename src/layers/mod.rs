//! Building blocks for fully-connected stacks.
//!
//! This module contains the per-layer pieces: the closed activation
//! enumeration, normalization selection, initializer/regularizer handles,
//! and the fully-connected unit itself.

pub mod activation;
pub mod fc;
pub mod init;
pub mod norm;

pub use activation::Activation;
pub use fc::{FcLayer, FcLayerConfig, UnitKind};
pub use init::{Regularizer, WeightInit};
pub use norm::{BatchNorm1d, Norm};
