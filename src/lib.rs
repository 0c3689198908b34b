//! # fcstack
//!
//! A Rust library for building configurable stacks of fully-connected layers
//! on top of the Burn framework.
//!
//! Each layer is an affine transform optionally followed by normalization
//! (batch or layer), an activation, and dropout. The crate is a declarative
//! builder: weight variables, gradients, and the training-mode distinction
//! are owned by Burn, not by this code. Training mode is expressed through
//! the backend — dropout and batch statistics are active under an autodiff
//! backend and inert otherwise.
//!
//! ## Features
//!
//! - **Burn backend**: works with any Burn backend; WGPU aliases are provided
//!   for GPU acceleration without external dependencies.
//! - **Per-layer configuration with stack defaults**: supply explicit layer
//!   specs or a layer count, with absent fields filled from defaults.
//! - **Closed option sets**: activations, normalizations, and initializers
//!   are enumerations; unrecognized names fail fast.
//!
//! ## Example
//!
//! ```
//! use fcstack::prelude::*;
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//!
//! type B = NdArray;
//!
//! let device = <B as burn::tensor::backend::Backend>::Device::default();
//!
//! // Two fully-connected layers with the stack defaults.
//! let stack: FcStack<B> = FcStackConfig::new(4)
//!     .num_layers(2)
//!     .default_fc_size(8)
//!     .build(&device)
//!     .expect("Failed to build stack");
//!
//! let input = Tensor::<B, 2>::zeros([3, 4], &device);
//! let output = stack.forward(input);
//! assert_eq!(output.dims(), [3, 8]);
//! ```

pub mod errors;
pub mod layers;
pub mod stack;

// Re-exports for convenience
pub use errors::StackError;
pub use layers::activation::Activation;
pub use layers::fc::{FcLayer, FcLayerConfig, UnitKind};
pub use layers::init::{Regularizer, WeightInit};
pub use layers::norm::{BatchNorm1d, Norm};
pub use stack::{FcStack, FcStackConfig, LayerSpec};

/// Backend type alias for WGPU with autodiff support (training mode).
pub type Backend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Backend type for inference (no autodiff; dropout and batch statistics inert).
pub type InferenceBackend = burn::backend::Wgpu;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::errors::StackError;
    pub use crate::layers::activation::Activation;
    pub use crate::layers::fc::{FcLayer, FcLayerConfig, UnitKind};
    pub use crate::layers::init::{Regularizer, WeightInit};
    pub use crate::layers::norm::Norm;
    pub use crate::stack::{FcStack, FcStackConfig, LayerSpec};
    pub use crate::{Backend, InferenceBackend};
}
