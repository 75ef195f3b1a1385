use super::{mlp_forward, MlpConfig};
use crate::model::{SubModel1, SubModel2};
use anyhow::Result;
use candle_core::{Device, Tensor, D};
use candle_nn::{Init, Linear, VarBuilder};

/// Linear layer with Xavier-uniform weights and fan-in uniform biases.
fn linear(in_dim: usize, out_dim: usize, vb: VarBuilder) -> Result<Linear> {
    let a = (6.0 / (in_dim + out_dim) as f64).sqrt();
    let ws = vb.get_with_hints((out_dim, in_dim), "weight", Init::Uniform { lo: -a, up: a })?;
    let b = 1.0 / (in_dim as f64).sqrt();
    let bs = vb.get_with_hints(out_dim, "bias", Init::Uniform { lo: -b, up: b })?;
    Ok(Linear::new(ws, Some(bs)))
}

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(prefix: &str, vb: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let vb = vb.pp(prefix);
    config
        .layer_dims()
        .into_iter()
        .enumerate()
        .map(|(i, (in_dim, out_dim))| linear(in_dim, out_dim, vb.pp(format!("ln{}", i))))
        .collect()
}

/// Multilayer perceptron with ReLU activation function.
///
/// As [`SubModel2`], the two inputs are concatenated along the last dimension,
/// so `in_dim` must be the sum of their dimensions.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
}

impl Mlp {
    fn _build(vb: VarBuilder, config: MlpConfig) -> Result<Self> {
        config.check()?;
        let device = vb.device().clone();
        let layers = create_linear_layers("mlp", vb, &config)?;

        Ok(Self {
            config,
            device,
            layers,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MlpConfig {
        &self.config
    }
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let xs = xs.to_device(&self.device)?;
        mlp_forward(xs, &self.layers, &self.config.activation_out)
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        Self::_build(vb, config)
    }
}

impl SubModel2 for Mlp {
    type Config = MlpConfig;
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = Tensor;

    fn forward(&self, input1: &Self::Input1, input2: &Self::Input2) -> Result<Self::Output> {
        let input1 = input1.to_device(&self.device)?;
        let input2 = input2.to_device(&self.device)?;
        let input = Tensor::cat(&[input1, input2], D::Minus1)?;
        mlp_forward(input, &self.layers, &self.config.activation_out)
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        Self::_build(vb, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Activation;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_layer_dims_and_parameters() -> Result<()> {
        let config = MlpConfig::new(3, vec![8, 4], 1, Activation::None);
        assert_eq!(config.layer_dims(), vec![(3, 8), (8, 4), (4, 1)]);

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let _mlp = <Mlp as SubModel1>::build(vb, config)?;

        let data = varmap.data().lock().unwrap();
        let mut names = data.keys().cloned().collect::<Vec<_>>();
        names.sort();
        assert_eq!(
            names,
            vec![
                "mlp.ln0.bias",
                "mlp.ln0.weight",
                "mlp.ln1.bias",
                "mlp.ln1.weight",
                "mlp.ln2.bias",
                "mlp.ln2.weight"
            ]
        );

        // Xavier-uniform bound of the first layer
        let w = data["mlp.ln0.weight"].as_tensor().flatten_all()?.to_vec1::<f32>()?;
        let a = (6f32 / 11.0).sqrt();
        assert!(w.iter().all(|v| v.abs() <= a + 1e-6));
        Ok(())
    }

    #[test]
    fn test_forward_shapes() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F64, &Device::Cpu);
        let actor = <Mlp as SubModel1>::build(
            vb.pp("actor"),
            MlpConfig::new(3, vec![16], 2, Activation::Tanh),
        )?;
        let critic = <Mlp as SubModel2>::build(
            vb.pp("critic"),
            MlpConfig::new(5, vec![16], 1, Activation::None),
        )?;

        let obs = Tensor::randn(0f64, 10f64, (4, 3), &Device::Cpu)?;
        let act = SubModel1::forward(&actor, &obs)?;
        assert_eq!(act.dims(), &[4, 2]);
        assert_eq!(act.dtype(), DType::F64);
        let act_v = act.flatten_all()?.to_vec1::<f64>()?;
        assert!(act_v.iter().all(|v| v.abs() <= 1.0));

        let q = SubModel2::forward(&critic, &obs, &act)?;
        assert_eq!(q.dims(), &[4, 1]);
        Ok(())
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = MlpConfig::new(3, vec![0], 1, Activation::None);
        assert!(<Mlp as SubModel1>::build(vb, config).is_err());
    }
}
