//! The fully-connected stack: an ordered chain of `FcLayer` units built from
//! per-layer configuration with stack-level defaults.

use burn::module::Module;
use burn::tensor::{Tensor, backend::Backend};
use serde::{Deserialize, Serialize};

use crate::errors::StackError;
use crate::layers::fc::{FcLayer, FcLayerConfig, UnitKind};
use crate::layers::init::{Regularizer, WeightInit};
use crate::layers::norm::Norm;
use crate::layers::Activation;

/// Partial per-layer configuration.
///
/// Every field is optional; absent fields are filled from the stack-level
/// defaults when the stack is resolved. Filling is pure: a caller's specs are
/// never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub fc_size: Option<usize>,
    pub activation: Option<Activation>,
    pub norm: Option<Norm>,
    pub dropout_rate: Option<f64>,
    pub use_bias: Option<bool>,
    pub weights_initializer: Option<WeightInit>,
    pub weights_regularizer: Option<Regularizer>,
}

impl LayerSpec {
    /// Creates an empty spec; every field inherits the stack default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output width.
    pub fn fc_size(mut self, size: usize) -> Self {
        self.fc_size = Some(size);
        self
    }

    /// Sets the activation function.
    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = Some(activation);
        self
    }

    /// Sets the normalization.
    pub fn norm(mut self, norm: Norm) -> Self {
        self.norm = Some(norm);
        self
    }

    /// Sets the dropout rate.
    pub fn dropout_rate(mut self, rate: f64) -> Self {
        self.dropout_rate = Some(rate);
        self
    }

    /// Sets whether the layer carries a bias vector.
    pub fn use_bias(mut self, use_bias: bool) -> Self {
        self.use_bias = Some(use_bias);
        self
    }

    /// Sets the weight initializer.
    pub fn weights_initializer(mut self, init: WeightInit) -> Self {
        self.weights_initializer = Some(init);
        self
    }

    /// Sets the weight regularizer.
    pub fn weights_regularizer(mut self, reg: Regularizer) -> Self {
        self.weights_regularizer = Some(reg);
        self
    }
}

/// Configuration for building an [`FcStack`].
///
/// Accepts either an explicit ordered list of [`LayerSpec`]s or a layer count
/// for which empty specs are synthesized. Missing per-layer fields are filled
/// from the stack-level defaults.
#[derive(Debug, Clone)]
pub struct FcStackConfig {
    /// Input width of the stack.
    pub d_input: usize,
    /// Explicit per-layer specs; when absent, `num_layers` empty specs are used.
    pub layers: Option<Vec<LayerSpec>>,
    /// Number of synthesized layers when no explicit specs are given.
    pub num_layers: usize,
    pub default_fc_size: usize,
    pub default_activation: Activation,
    pub default_norm: Norm,
    pub default_dropout_rate: f64,
    pub default_use_bias: bool,
    pub default_weights_initializer: WeightInit,
    pub default_weights_regularizer: Regularizer,
}

impl FcStackConfig {
    /// Creates a configuration with the original stack defaults: one layer of
    /// width 256, relu activation, no normalization, no dropout, bias on,
    /// glorot_uniform initializer, no regularizer.
    pub fn new(d_input: usize) -> Self {
        Self {
            d_input,
            layers: None,
            num_layers: 1,
            default_fc_size: 256,
            default_activation: Activation::Relu,
            default_norm: Norm::None,
            default_dropout_rate: 0.0,
            default_use_bias: true,
            default_weights_initializer: WeightInit::GlorotUniform,
            default_weights_regularizer: Regularizer::None,
        }
    }

    /// Sets the number of synthesized layers (ignored when explicit specs are set).
    pub fn num_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    /// Replaces the per-layer specs.
    pub fn layers(mut self, layers: Vec<LayerSpec>) -> Self {
        self.layers = Some(layers);
        self
    }

    /// Appends a per-layer spec.
    pub fn layer(mut self, spec: LayerSpec) -> Self {
        self.layers.get_or_insert_with(Vec::new).push(spec);
        self
    }

    /// Sets the default output width.
    pub fn default_fc_size(mut self, size: usize) -> Self {
        self.default_fc_size = size;
        self
    }

    /// Sets the default activation.
    pub fn default_activation(mut self, activation: Activation) -> Self {
        self.default_activation = activation;
        self
    }

    /// Sets the default normalization.
    pub fn default_norm(mut self, norm: Norm) -> Self {
        self.default_norm = norm;
        self
    }

    /// Sets the default dropout rate.
    pub fn default_dropout_rate(mut self, rate: f64) -> Self {
        self.default_dropout_rate = rate;
        self
    }

    /// Sets the default bias presence.
    pub fn default_use_bias(mut self, use_bias: bool) -> Self {
        self.default_use_bias = use_bias;
        self
    }

    /// Sets the default weight initializer.
    pub fn default_weights_initializer(mut self, init: WeightInit) -> Self {
        self.default_weights_initializer = init;
        self
    }

    /// Sets the default weight regularizer.
    pub fn default_weights_regularizer(mut self, reg: Regularizer) -> Self {
        self.default_weights_regularizer = reg;
        self
    }

    /// The per-layer specs the stack will be built from, before default fill.
    fn effective_specs(&self) -> Vec<LayerSpec> {
        match &self.layers {
            Some(layers) => layers.clone(),
            None => vec![LayerSpec::new(); self.num_layers],
        }
    }

    /// Fills absent fields from the stack-level defaults.
    ///
    /// Pure and idempotent: present fields are never overwritten, so filling
    /// an already-filled list returns it unchanged.
    pub fn fill_defaults(&self, specs: &[LayerSpec]) -> Vec<LayerSpec> {
        specs
            .iter()
            .map(|spec| LayerSpec {
                fc_size: spec.fc_size.or(Some(self.default_fc_size)),
                activation: spec.activation.or(Some(self.default_activation)),
                norm: spec.norm.or(Some(self.default_norm)),
                dropout_rate: spec.dropout_rate.or(Some(self.default_dropout_rate)),
                use_bias: spec.use_bias.or(Some(self.default_use_bias)),
                weights_initializer: spec
                    .weights_initializer
                    .or(Some(self.default_weights_initializer)),
                weights_regularizer: spec
                    .weights_regularizer
                    .or(Some(self.default_weights_regularizer)),
            })
            .collect()
    }

    /// Resolves the configuration into one validated [`FcLayerConfig`] per
    /// layer, chaining widths from `d_input` through every `fc_size`.
    pub fn resolve(&self) -> Result<Vec<FcLayerConfig>, StackError> {
        if self.d_input == 0 {
            return Err(StackError::NoInputFeatures);
        }

        let specs = self.fill_defaults(&self.effective_specs());
        let mut configs = Vec::with_capacity(specs.len());
        let mut in_count = self.d_input;

        for spec in &specs {
            let out_count = spec.fc_size.unwrap_or(self.default_fc_size);
            if out_count == 0 {
                return Err(StackError::InvalidFcSize);
            }
            let dropout_rate = spec.dropout_rate.unwrap_or(self.default_dropout_rate);
            if !(0.0..1.0).contains(&dropout_rate) {
                return Err(StackError::InvalidDropoutRate { rate: dropout_rate });
            }

            let config = FcLayerConfig {
                in_count,
                out_count,
                activation: spec.activation.unwrap_or(self.default_activation),
                norm: spec.norm.unwrap_or(self.default_norm),
                dropout_rate,
                use_bias: spec.use_bias.unwrap_or(self.default_use_bias),
                weights_initializer: spec.weights_initializer,
                weights_regularizer: spec
                    .weights_regularizer
                    .unwrap_or(self.default_weights_regularizer),
            };
            in_count = out_count;
            configs.push(config);
        }

        Ok(configs)
    }

    /// Builds the stack, instantiating every layer exactly once, in order.
    pub fn build<B: Backend>(&self, device: &B::Device) -> Result<FcStack<B>, StackError> {
        let configs = self.resolve()?;

        let mut layers = Vec::with_capacity(configs.len());
        for config in &configs {
            layers.push(config.init(device)?);
        }

        let d_output = configs.last().map(|c| c.out_count).unwrap_or(self.d_input);

        Ok(FcStack {
            layers,
            d_input: self.d_input,
            d_output,
        })
    }
}

/// An ordered stack of fully-connected layers.
///
/// Layers are instantiated once at build time; forward passes thread the
/// input tensor through every layer in configuration order. Training-mode
/// behavior (dropout, batch statistics) follows the backend: autodiff
/// backends train, plain backends infer.
#[derive(Module, Debug)]
pub struct FcStack<B: Backend> {
    layers: Vec<FcLayer<B>>,
    d_input: usize,
    d_output: usize,
}

impl<B: Backend> FcStack<B> {
    /// Creates a new configuration builder.
    pub fn config(d_input: usize) -> FcStackConfig {
        FcStackConfig::new(d_input)
    }

    /// Composes a stack from already-initialized layers.
    ///
    /// Layers run in the given order; the caller is responsible for the
    /// widths lining up.
    pub fn from_layers(d_input: usize, layers: Vec<FcLayer<B>>) -> Self {
        let d_output = layers.last().map(|l| l.out_count()).unwrap_or(d_input);
        Self {
            layers,
            d_input,
            d_output,
        }
    }

    /// Performs a forward pass through every layer in order.
    ///
    /// An empty stack returns the input unchanged.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut hidden = input;
        for layer in &self.layers {
            hidden = layer.forward(hidden);
        }
        hidden
    }

    /// Computes the output shape for a `[batch, features]` input shape.
    pub fn output_shape(&self, input_shape: [usize; 2]) -> [usize; 2] {
        if self.layers.is_empty() {
            input_shape
        } else {
            [input_shape[0], self.d_output]
        }
    }

    /// Returns the input width of the stack.
    pub fn d_input(&self) -> usize {
        self.d_input
    }

    /// Returns the output width of the stack (the input width when empty).
    pub fn d_output(&self) -> usize {
        self.d_output
    }

    /// Returns the number of layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Returns the layers in order.
    pub fn layers(&self) -> &[FcLayer<B>] {
        &self.layers
    }

    /// Reports the flat ordered sub-unit sequence across all layers.
    pub fn unit_kinds(&self) -> Vec<UnitKind> {
        self.layers
            .iter()
            .flat_map(|layer| layer.unit_kinds())
            .collect()
    }

    /// Sums the weight regularization penalties of every regularized layer,
    /// `None` when no layer carries a regularizer.
    pub fn penalty(&self) -> Option<Tensor<B, 1>> {
        let mut total: Option<Tensor<B, 1>> = None;
        for layer in &self.layers {
            if let Some(penalty) = layer.penalty() {
                total = Some(match total {
                    Some(sum) => sum + penalty,
                    None => penalty,
                });
            }
        }
        total
    }
}
