//! Interface of neural networks used in RL agents.
use crate::util::track;
use anyhow::{anyhow, Result};
use candle_core::Tensor;
use candle_nn::{VarBuilder, VarMap};
use log::info;
use std::path::Path;

/// Neural network model not owing its [`VarMap`] internally.
pub trait SubModel1 {
    /// Configuration from which [`SubModel1`] is constructed.
    type Config;

    /// Input of the [`SubModel1`].
    type Input;

    /// Output of the [`SubModel1`].
    type Output;

    /// Builds [`SubModel1`] with [`VarBuilder`] and [`SubModel1::Config`].
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// A generalized forward function.
    fn forward(&self, input: &Self::Input) -> Result<Self::Output>;
}

/// Neural network model not owing its [`VarMap`] internally.
///
/// The difference from [`SubModel1`] is that this trait takes two inputs.
pub trait SubModel2 {
    /// Configuration from which [`SubModel2`] is constructed.
    type Config;

    /// Input of the [`SubModel2`].
    type Input1;

    /// Input of the [`SubModel2`].
    type Input2;

    /// Output of the [`SubModel2`].
    type Output;

    /// Builds [`SubModel2`].
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// A generalized forward function.
    fn forward(&self, input1: &Self::Input1, input2: &Self::Input2) -> Result<Self::Output>;
}

/// Capabilities of a network owning its parameters and optimizer.
pub trait ModelBase {
    /// Returns the variables of the network.
    fn varmap(&self) -> &VarMap;

    /// Performs one optimization step minimizing `loss`.
    fn backward_step(&mut self, loss: &Tensor) -> Result<()>;

    /// Returns copies of the parameters sorted by name.
    ///
    /// Names are stable across networks built from the same configuration.
    fn parameters(&self) -> Result<Vec<(String, Tensor)>> {
        let data = self
            .varmap()
            .data()
            .lock()
            .map_err(|e| anyhow!("Failed to lock variables: {}", e))?;
        let mut params = data
            .iter()
            .map(|(k, v)| Ok((k.clone(), v.as_tensor().detach().copy()?)))
            .collect::<Result<Vec<_>>>()?;
        params.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(params)
    }

    /// Moves parameters toward those of `src`: `dest = tau * src + (1 - tau) * dest`.
    fn soft_update(&self, src: &Self, tau: f64) -> Result<()>
    where
        Self: Sized,
    {
        track(self.varmap(), src.varmap(), tau)
    }

    /// Saves the parameters in safetensors format.
    fn save(&self, path: &Path) -> Result<()> {
        self.varmap().save(path)?;
        info!("Saved parameters to {:?}", path);
        Ok(())
    }

    /// Loads parameters saved with [`ModelBase::save`].
    fn load(&mut self, path: &Path) -> Result<()>;
}
