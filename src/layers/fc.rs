//! The single fully-connected unit: affine transform with optional
//! normalization, activation, and dropout.

use burn::module::{Module, Param};
use burn::nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig};
use burn::tensor::{Tensor, backend::Backend};
use serde::{Deserialize, Serialize};

use crate::errors::StackError;
use crate::layers::init::{Regularizer, WeightInit};
use crate::layers::norm::{BatchNorm1d, Norm};
use crate::layers::Activation;

/// Small positive bias default, so units start slightly active instead of dead.
const BIAS_INIT: f64 = 0.01;

/// The kind of sub-unit a layer contributes to the stack's flat sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Dense,
    BatchNorm,
    LayerNorm,
    Activation,
    Dropout,
}

/// Resolved configuration for a single fully-connected unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcLayerConfig {
    /// Input width.
    pub in_count: usize,
    /// Output width.
    pub out_count: usize,
    /// Elementwise nonlinearity applied after normalization.
    pub activation: Activation,
    /// Normalization applied directly after the affine transform.
    pub norm: Norm,
    /// Dropout rate in [0, 1); zero disables dropout.
    pub dropout_rate: f64,
    /// Whether the unit carries a bias vector.
    pub use_bias: bool,
    /// Explicit weight initializer; when absent, a default is picked per
    /// activation (he_uniform for relu, glorot_uniform for sigmoid/tanh,
    /// otherwise the framework default).
    pub weights_initializer: Option<WeightInit>,
    /// Weight regularization handle, surfaced through [`FcLayer::penalty`].
    pub weights_regularizer: Regularizer,
}

impl FcLayerConfig {
    /// Creates a configuration with the original defaults: relu activation,
    /// no normalization, no dropout, bias on, activation-derived initializer.
    pub fn new(in_count: usize, out_count: usize) -> Self {
        Self {
            in_count,
            out_count,
            activation: Activation::Relu,
            norm: Norm::None,
            dropout_rate: 0.0,
            use_bias: true,
            weights_initializer: None,
            weights_regularizer: Regularizer::None,
        }
    }

    /// Sets the activation function.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Sets the normalization.
    pub fn with_norm(mut self, norm: Norm) -> Self {
        self.norm = norm;
        self
    }

    /// Sets the dropout rate.
    pub fn with_dropout_rate(mut self, rate: f64) -> Self {
        self.dropout_rate = rate;
        self
    }

    /// Sets whether the unit carries a bias vector.
    pub fn with_bias(mut self, use_bias: bool) -> Self {
        self.use_bias = use_bias;
        self
    }

    /// Sets an explicit weight initializer.
    pub fn with_weights_initializer(mut self, init: WeightInit) -> Self {
        self.weights_initializer = Some(init);
        self
    }

    /// Sets the weight regularizer.
    pub fn with_weights_regularizer(mut self, reg: Regularizer) -> Self {
        self.weights_regularizer = reg;
        self
    }

    fn validate(&self) -> Result<(), StackError> {
        if self.in_count == 0 {
            return Err(StackError::NoInputFeatures);
        }
        if self.out_count == 0 {
            return Err(StackError::InvalidFcSize);
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(StackError::InvalidDropoutRate {
                rate: self.dropout_rate,
            });
        }
        Ok(())
    }

    /// Initializes the unit, allocating fresh weight and bias parameters.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<FcLayer<B>, StackError> {
        self.validate()?;

        let initializer = match self.weights_initializer {
            Some(init) => init.initializer(),
            None => WeightInit::for_activation(self.activation),
        };
        // Kaiming and Xavier initializers need the fans supplied explicitly.
        let weight: Param<Tensor<B, 2>> = initializer.init_with(
            [self.in_count, self.out_count],
            Some(self.in_count),
            Some(self.out_count),
            device,
        );
        tracing::debug!(
            "fc weights: shape [{}, {}], initializer {:?}",
            self.in_count,
            self.out_count,
            self.weights_initializer,
        );

        let bias: Option<Param<Tensor<B, 1>>> = if self.use_bias {
            Some(self.default_bias(device))
        } else {
            None
        };
        tracing::debug!(
            "fc biases: shape [{}], present {}",
            self.out_count,
            bias.is_some()
        );

        Ok(self.assemble(weight, bias))
    }

    /// Initializes the unit around caller-supplied tensors.
    ///
    /// A missing bias is still allocated at the 0.01 constant unless the
    /// configuration disables biases.
    pub fn init_with<B: Backend>(
        &self,
        weight: Tensor<B, 2>,
        bias: Option<Tensor<B, 1>>,
    ) -> Result<FcLayer<B>, StackError> {
        self.validate()?;

        let [actual_in, actual_out] = weight.dims();
        if actual_in != self.in_count || actual_out != self.out_count {
            return Err(StackError::WeightShapeMismatch {
                expected_in: self.in_count,
                expected_out: self.out_count,
                actual_in,
                actual_out,
            });
        }

        tracing::debug!(
            "fc weights: shape [{}, {}], supplied",
            self.in_count,
            self.out_count,
        );

        let device = weight.device();
        let bias = match bias {
            Some(bias) => {
                let [actual] = bias.dims();
                if actual != self.out_count {
                    return Err(StackError::BiasShapeMismatch {
                        expected: self.out_count,
                        actual,
                    });
                }
                Some(Param::from_tensor(bias))
            }
            None if self.use_bias => Some(self.default_bias(&device)),
            None => None,
        };
        tracing::debug!(
            "fc biases: shape [{}], present {}",
            self.out_count,
            bias.is_some()
        );

        Ok(self.assemble(Param::from_tensor(weight), bias))
    }

    fn default_bias<B: Backend>(&self, device: &B::Device) -> Param<Tensor<B, 1>> {
        let initializer = burn::nn::Initializer::Constant { value: BIAS_INIT };
        initializer.init([self.out_count], device)
    }

    fn assemble<B: Backend>(
        &self,
        weight: Param<Tensor<B, 2>>,
        bias: Option<Param<Tensor<B, 1>>>,
    ) -> FcLayer<B> {
        let device = weight.val().device();
        let (batch_norm, layer_norm) = match self.norm {
            Norm::None => (None, None),
            Norm::Batch => (Some(BatchNorm1d::new(self.out_count, &device)), None),
            Norm::Layer => (
                None,
                Some(LayerNormConfig::new(self.out_count).init(&device)),
            ),
        };

        let dropout = if self.dropout_rate > 0.0 {
            tracing::debug!("fc dropout: rate {}", self.dropout_rate);
            Some(DropoutConfig::new(self.dropout_rate).init())
        } else {
            None
        };

        let (reg_id, reg_factor) = self.weights_regularizer.to_parts();

        FcLayer {
            weight,
            bias,
            batch_norm,
            layer_norm,
            dropout,
            activation_id: self.activation.to_id(),
            reg_id,
            reg_factor,
            in_count: self.in_count,
            out_count: self.out_count,
        }
    }
}

/// A fully-connected unit: `y = x·W (+ b)`, then optional normalization,
/// activation, and dropout.
///
/// Weight and bias parameters are owned by Burn's module system; dropout and
/// batch normalization are active only under an autodiff backend, which is how
/// the framework expresses training mode.
#[derive(Module, Debug)]
pub struct FcLayer<B: Backend> {
    weight: Param<Tensor<B, 2>>,
    bias: Option<Param<Tensor<B, 1>>>,
    batch_norm: Option<BatchNorm1d<B>>,
    layer_norm: Option<LayerNorm<B>>,
    dropout: Option<Dropout>,
    activation_id: u8,
    reg_id: u8,
    reg_factor: f64,
    in_count: usize,
    out_count: usize,
}

impl<B: Backend> FcLayer<B> {
    /// Performs the forward pass, returning `[batch, out_count]`.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut hidden = input.matmul(self.weight.val());
        if let Some(bias) = &self.bias {
            hidden = hidden + bias.val().unsqueeze();
        }
        if let Some(norm) = &self.batch_norm {
            hidden = norm.forward(hidden);
        }
        if let Some(norm) = &self.layer_norm {
            hidden = norm.forward(hidden);
        }
        hidden = self.activation().apply(hidden);
        if let Some(dropout) = &self.dropout {
            hidden = dropout.forward(hidden);
        }
        hidden
    }

    /// Returns the input width of this unit.
    pub fn in_count(&self) -> usize {
        self.in_count
    }

    /// Returns the output width of this unit.
    pub fn out_count(&self) -> usize {
        self.out_count
    }

    /// Returns the activation function.
    pub fn activation(&self) -> Activation {
        Activation::from_id(self.activation_id)
    }

    /// Returns the configured weight regularizer.
    pub fn regularizer(&self) -> Regularizer {
        Regularizer::from_parts(self.reg_id, self.reg_factor)
    }

    /// Returns the weight tensor, shape `[in_count, out_count]`.
    pub fn weight(&self) -> Tensor<B, 2> {
        self.weight.val()
    }

    /// Returns the bias tensor, shape `[out_count]`, when the unit has one.
    pub fn bias(&self) -> Option<Tensor<B, 1>> {
        self.bias.as_ref().map(|b| b.val())
    }

    /// Computes the weight regularization penalty, `None` when unregularized.
    pub fn penalty(&self) -> Option<Tensor<B, 1>> {
        self.regularizer().penalty(self.weight.val())
    }

    /// Reports the ordered sub-unit composition of this layer.
    pub fn unit_kinds(&self) -> Vec<UnitKind> {
        let mut kinds = vec![UnitKind::Dense];
        if self.batch_norm.is_some() {
            kinds.push(UnitKind::BatchNorm);
        }
        if self.layer_norm.is_some() {
            kinds.push(UnitKind::LayerNorm);
        }
        kinds.push(UnitKind::Activation);
        if self.dropout.is_some() {
            kinds.push(UnitKind::Dropout);
        }
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::backend::Backend;

    type TestBackend = NdArray;

    #[test]
    fn test_fc_layer_config_creation() {
        let config = FcLayerConfig::new(10, 5)
            .with_activation(Activation::Sigmoid)
            .with_norm(Norm::Layer)
            .with_dropout_rate(0.25);

        assert_eq!(config.in_count, 10);
        assert_eq!(config.out_count, 5);
        assert_eq!(config.activation, Activation::Sigmoid);
        assert_eq!(config.norm, Norm::Layer);
        assert!((config.dropout_rate - 0.25).abs() < 1e-12);
        assert!(config.use_bias);
    }

    #[test]
    fn test_fc_layer_forward_shape() {
        let device = <TestBackend as Backend>::Device::default();
        let layer: FcLayer<TestBackend> = FcLayerConfig::new(4, 2)
            .init(&device)
            .expect("layer init should succeed");

        let input = Tensor::<TestBackend, 2>::zeros([3, 4], &device);
        let output = layer.forward(input);

        assert_eq!(output.dims(), [3, 2]);
        assert_eq!(layer.in_count(), 4);
        assert_eq!(layer.out_count(), 2);
    }

    #[test]
    fn test_bias_defaults_to_small_constant() {
        let device = <TestBackend as Backend>::Device::default();
        let layer: FcLayer<TestBackend> = FcLayerConfig::new(3, 4)
            .init(&device)
            .expect("layer init should succeed");

        let bias: Vec<f32> = layer.bias().unwrap().to_data().to_vec().unwrap();
        assert_eq!(bias.len(), 4);
        for value in bias {
            assert!((value - 0.01).abs() < 1e-6);
        }
    }

    #[test]
    fn test_relu_layer_defaults_to_he_uniform_weights() {
        let device = <TestBackend as Backend>::Device::default();
        let layer: FcLayer<TestBackend> = FcLayerConfig::new(6, 8)
            .init(&device)
            .expect("layer init should succeed");

        // he_uniform bound = sqrt(6 / fan_in)
        let bound = (6.0f32 / 6.0).sqrt();
        let weights: Vec<f32> = layer.weight().to_data().to_vec().unwrap();
        assert_eq!(weights.len(), 48);
        assert!(weights.iter().all(|w| w.abs() <= bound + 1e-6));
        // With 48 uniform samples some should exceed the narrower glorot
        // bound, distinguishing the he_uniform choice.
        let glorot_bound = (6.0f32 / 14.0).sqrt();
        assert!(weights.iter().any(|w| w.abs() > glorot_bound));
    }

    #[test]
    fn test_tanh_layer_defaults_to_glorot_uniform_weights() {
        let device = <TestBackend as Backend>::Device::default();
        let layer: FcLayer<TestBackend> = FcLayerConfig::new(4, 8)
            .with_activation(Activation::Tanh)
            .init(&device)
            .expect("layer init should succeed");

        // glorot_uniform bound = sqrt(6 / (fan_in + fan_out))
        let bound = (6.0f32 / 12.0).sqrt();
        let weights: Vec<f32> = layer.weight().to_data().to_vec().unwrap();
        assert!(weights.iter().all(|w| w.abs() <= bound + 1e-6));
        assert!(weights.iter().any(|w| *w != 0.0));
    }

    #[test]
    fn test_explicit_initializer_overrides_activation_default() {
        let device = <TestBackend as Backend>::Device::default();
        let layer: FcLayer<TestBackend> = FcLayerConfig::new(4, 4)
            .with_activation(Activation::Relu)
            .with_weights_initializer(WeightInit::Zeros)
            .init(&device)
            .expect("layer init should succeed");

        let weights: Vec<f32> = layer.weight().to_data().to_vec().unwrap();
        assert_eq!(weights, vec![0.0; 16]);
    }

    #[test]
    fn test_no_bias_when_disabled() {
        let device = <TestBackend as Backend>::Device::default();
        let layer: FcLayer<TestBackend> = FcLayerConfig::new(3, 4)
            .with_bias(false)
            .init(&device)
            .expect("layer init should succeed");

        assert!(layer.bias().is_none());
    }

    #[test]
    fn test_explicit_weights_are_used_verbatim() {
        let device = <TestBackend as Backend>::Device::default();
        let weight = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0], [0.0, 1.0]], &device);
        let bias = Tensor::<TestBackend, 1>::from_floats([0.5, -0.5], &device);

        let layer: FcLayer<TestBackend> = FcLayerConfig::new(2, 2)
            .with_activation(Activation::Relu)
            .init_with(weight, Some(bias))
            .expect("layer init should succeed");

        let input = Tensor::<TestBackend, 2>::from_floats([[1.0, -2.0]], &device);
        let output: Vec<f32> = layer.forward(input).to_data().to_vec().unwrap();

        // [1, -2] . I + [0.5, -0.5] = [1.5, -2.5], relu -> [1.5, 0]
        assert!((output[0] - 1.5).abs() < 1e-6);
        assert!((output[1] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_weight_shape_mismatch_is_rejected() {
        let device = <TestBackend as Backend>::Device::default();
        let weight = Tensor::<TestBackend, 2>::zeros([3, 2], &device);

        let result = FcLayerConfig::new(2, 2).init_with(weight, None);
        assert!(matches!(
            result,
            Err(StackError::WeightShapeMismatch {
                expected_in: 2,
                expected_out: 2,
                actual_in: 3,
                actual_out: 2,
            })
        ));
    }

    #[test]
    fn test_bias_shape_mismatch_is_rejected() {
        let device = <TestBackend as Backend>::Device::default();
        let weight = Tensor::<TestBackend, 2>::zeros([2, 2], &device);
        let bias = Tensor::<TestBackend, 1>::zeros([3], &device);

        let result = FcLayerConfig::new(2, 2).init_with(weight, Some(bias));
        assert!(matches!(
            result,
            Err(StackError::BiasShapeMismatch {
                expected: 2,
                actual: 3,
            })
        ));
    }

    #[test]
    fn test_invalid_dropout_rate_is_rejected() {
        let device = <TestBackend as Backend>::Device::default();
        let result: Result<FcLayer<TestBackend>, _> = FcLayerConfig::new(2, 2)
            .with_dropout_rate(1.0)
            .init(&device);
        assert!(matches!(
            result,
            Err(StackError::InvalidDropoutRate { rate }) if rate == 1.0
        ));
    }

    #[test]
    fn test_zero_fc_size_is_rejected() {
        let device = <TestBackend as Backend>::Device::default();
        let result: Result<FcLayer<TestBackend>, _> = FcLayerConfig::new(2, 0).init(&device);
        assert!(matches!(result, Err(StackError::InvalidFcSize)));
    }

    #[test]
    fn test_unit_kinds_composition() {
        let device = <TestBackend as Backend>::Device::default();

        let plain: FcLayer<TestBackend> = FcLayerConfig::new(2, 2).init(&device).unwrap();
        assert_eq!(plain.unit_kinds(), vec![UnitKind::Dense, UnitKind::Activation]);

        let full: FcLayer<TestBackend> = FcLayerConfig::new(2, 2)
            .with_norm(Norm::Batch)
            .with_dropout_rate(0.5)
            .init(&device)
            .unwrap();
        assert_eq!(
            full.unit_kinds(),
            vec![
                UnitKind::Dense,
                UnitKind::BatchNorm,
                UnitKind::Activation,
                UnitKind::Dropout,
            ]
        );

        let layer_norm: FcLayer<TestBackend> = FcLayerConfig::new(2, 2)
            .with_norm(Norm::Layer)
            .init(&device)
            .unwrap();
        assert_eq!(
            layer_norm.unit_kinds(),
            vec![UnitKind::Dense, UnitKind::LayerNorm, UnitKind::Activation]
        );
    }

    #[test]
    fn test_layer_norm_output_is_normalized() {
        let device = <TestBackend as Backend>::Device::default();
        let weight = Tensor::<TestBackend, 2>::from_floats(
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &device,
        );

        let layer: FcLayer<TestBackend> = FcLayerConfig::new(2, 3)
            .with_activation(Activation::None)
            .with_norm(Norm::Layer)
            .with_bias(false)
            .init_with(weight, None)
            .expect("layer init should succeed");

        // x . W = [1, 2, 0]; layer norm gives mean ~0 across features.
        let input = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0]], &device);
        let output: Vec<f32> = layer.forward(input).to_data().to_vec().unwrap();
        let mean: f32 = output.iter().sum::<f32>() / output.len() as f32;
        assert!(mean.abs() < 1e-4);
    }

    #[test]
    fn test_dropout_is_inactive_without_autodiff() {
        let device = <TestBackend as Backend>::Device::default();
        let weight = Tensor::<TestBackend, 2>::from_floats([[2.0], [3.0]], &device);

        let layer: FcLayer<TestBackend> = FcLayerConfig::new(2, 1)
            .with_activation(Activation::None)
            .with_dropout_rate(0.9)
            .with_bias(false)
            .init_with(weight, None)
            .expect("layer init should succeed");

        let input = Tensor::<TestBackend, 2>::from_floats([[1.0, 1.0]], &device);
        let output: Vec<f32> = layer.forward(input).to_data().to_vec().unwrap();
        assert!((output[0] - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_penalty_reflects_regularizer() {
        let device = <TestBackend as Backend>::Device::default();
        let weight = Tensor::<TestBackend, 2>::from_floats([[1.0, -1.0], [2.0, -2.0]], &device);

        let layer: FcLayer<TestBackend> = FcLayerConfig::new(2, 2)
            .with_weights_regularizer(Regularizer::L1 { factor: 0.5 })
            .init_with(weight, None)
            .expect("layer init should succeed");

        let penalty: Vec<f32> = layer.penalty().unwrap().to_data().to_vec().unwrap();
        assert!((penalty[0] - 3.0).abs() < 1e-5);

        let unregularized: FcLayer<TestBackend> =
            FcLayerConfig::new(2, 2).init(&device).unwrap();
        assert!(unregularized.penalty().is_none());
    }
}
