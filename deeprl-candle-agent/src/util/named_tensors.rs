use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use std::{collections::HashMap, path::Path};

/// Detached CPU copy of model parameters.
///
/// Used to hand over the parameters of a network, e.g., the policy of a
/// trained agent, without exposing its [`VarMap`].
#[derive(Clone, Debug)]
pub struct NamedTensors {
    pub named_tensors: HashMap<String, Tensor>,
}

impl NamedTensors {
    /// Copy data of [`VarMap`] to CPU.
    pub fn copy_from(vm: &VarMap) -> Result<Self> {
        let data = vm
            .data()
            .lock()
            .map_err(|e| anyhow!("Failed to lock variables: {}", e))?;
        let mut named_tensors = HashMap::with_capacity(data.len());
        for (k, v) in data.iter() {
            let t = v.as_tensor().detach().to_device(&Device::Cpu)?.copy()?;
            named_tensors.insert(k.clone(), t);
        }
        Ok(Self { named_tensors })
    }

    /// Copy named tensors to [`VarMap`].
    ///
    /// Every variable in `vm` must have a counterpart with the same name.
    pub fn copy_to(&self, vm: &VarMap) -> Result<()> {
        let data = vm
            .data()
            .lock()
            .map_err(|e| anyhow!("Failed to lock variables: {}", e))?;
        for (k, v) in data.iter() {
            let src = self
                .named_tensors
                .get(k)
                .ok_or_else(|| anyhow!("Tensor {} is not found", k))?;
            let src = src.to_device(v.device())?.to_dtype(v.dtype())?;
            v.set(&src)?;
        }
        Ok(())
    }

    /// Returns the names of the tensors in ascending order.
    pub fn names(&self) -> Vec<&String> {
        let mut names = self.named_tensors.keys().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Saves the tensors in safetensors format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        candle_core::safetensors::save(&self.named_tensors, path)?;
        Ok(())
    }

    /// Loads tensors saved with [`NamedTensors::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let named_tensors = candle_core::safetensors::load(path, &Device::Cpu)?;
        Ok(Self { named_tensors })
    }
}

#[cfg(test)]
mod test {
    use super::NamedTensors;
    use anyhow::Result;
    use candle_core::{DType, Device, Module, Tensor};
    use candle_nn::{linear, VarBuilder, VarMap};
    use tempdir::TempDir;

    #[test]
    fn test_named_tensors() -> Result<()> {
        let input = Tensor::new(&[[1f32, 2., 3.]], &Device::Cpu)?;

        let vm1 = VarMap::new();
        let vb1 = VarBuilder::from_varmap(&vm1, DType::F32, &Device::Cpu);
        let model1 = linear(3, 2, vb1.pp("layer1"))?;

        let vm2 = VarMap::new();
        let vb2 = VarBuilder::from_varmap(&vm2, DType::F32, &Device::Cpu);
        let model2 = linear(3, 2, vb2.pp("layer1"))?;

        let t1 = model1.forward(&input)?.to_vec2::<f32>()?;
        let nt = NamedTensors::copy_from(&vm1)?;
        assert_eq!(nt.names(), vec!["layer1.bias", "layer1.weight"]);

        let dir = TempDir::new("named_tensors")?;
        let path = dir.path().join("params.safetensors");
        nt.save(&path)?;
        NamedTensors::load(&path)?.copy_to(&vm2)?;

        let t2 = model2.forward(&input)?.to_vec2::<f32>()?;
        assert_eq!(t1, t2);
        Ok(())
    }
}
