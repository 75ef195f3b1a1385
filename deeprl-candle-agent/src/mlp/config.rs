use crate::{error_invalid_config, util::InOutDim, Activation};
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Mlp`](super::Mlp).
pub struct MlpConfig {
    pub(super) in_dim: usize,
    pub(super) units: Vec<usize>,
    pub(super) out_dim: usize,
    pub(super) activation_out: Activation,
}

impl MlpConfig {
    /// Creates configuration of MLP.
    ///
    /// Hidden layers have `units` neurons with ReLU activation,
    /// `activation_out` is applied to the final layer.
    pub fn new(in_dim: usize, units: Vec<usize>, out_dim: usize, activation_out: Activation) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
            activation_out,
        }
    }

    /// Returns `(in_dim, out_dim)` of every linear layer.
    pub fn layer_dims(&self) -> Vec<(usize, usize)> {
        let dims = std::iter::once(self.in_dim)
            .chain(self.units.iter().copied())
            .chain(std::iter::once(self.out_dim))
            .collect::<Vec<_>>();
        dims.windows(2).map(|w| (w[0], w[1])).collect()
    }

    pub(super) fn check(&self) -> Result<()> {
        if self.in_dim == 0 || self.out_dim == 0 || self.units.iter().any(|&u| u == 0) {
            return error_invalid_config(format!("MLP dimensions must be positive: {:?}", self));
        }
        Ok(())
    }
}

impl InOutDim for MlpConfig {
    fn in_dim(&self) -> usize {
        self.in_dim
    }

    fn out_dim(&self) -> usize {
        self.out_dim
    }
}
