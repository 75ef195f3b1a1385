//! Optimizers.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use candle_optimisers::{
    adam::{Adam, ParamsAdam},
    Decay,
};
use serde::{Deserialize, Serialize};

/// Configuration of optimizer for training neural networks in an RL agent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// AdamW optimizer.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Exponential decay rate of the first moment.
        #[serde(default = "default_beta1")]
        beta1: f64,
        /// Exponential decay rate of the second moment.
        #[serde(default = "default_beta2")]
        beta2: f64,
        /// Term added to the denominator for numerical stability.
        #[serde(default = "default_eps")]
        eps: f64,
        /// Decoupled weight decay.
        #[serde(default = "default_weight_decay")]
        weight_decay: f64,
    },

    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,

        /// L2 penalty added to the gradients. Disabled when `0`.
        #[serde(default)]
        weight_decay: f64,
    },
}

fn default_beta1() -> f64 {
    ParamsAdamW::default().beta1
}

fn default_beta2() -> f64 {
    ParamsAdamW::default().beta2
}

fn default_eps() -> f64 {
    ParamsAdamW::default().eps
}

fn default_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

impl OptimizerConfig {
    /// Constructs an optimizer of the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => {
                let params = ParamsAdamW {
                    lr: *lr,
                    beta1: *beta1,
                    beta2: *beta2,
                    eps: *eps,
                    weight_decay: *weight_decay,
                };
                let opt = AdamW::new(vars, params)?;
                Ok(Optimizer::AdamW(opt))
            }
            OptimizerConfig::Adam { lr, weight_decay } => {
                let weight_decay = match *weight_decay {
                    wd if wd > 0.0 => Some(Decay::WeightDecay(wd)),
                    _ => None,
                };
                let params = ParamsAdam {
                    lr: *lr,
                    weight_decay,
                    ..ParamsAdam::default()
                };
                let opt = Adam::new(vars, params)?;
                Ok(Optimizer::Adam(opt))
            }
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::AdamW {
                lr: _,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            },
            Self::Adam {
                lr: _,
                weight_decay,
            } => Self::Adam { lr, weight_decay },
        }
    }

    /// Override weight decay.
    pub fn weight_decay(self, weight_decay: f64) -> Self {
        match self {
            Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay: _,
            } => Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            },
            Self::Adam { lr, weight_decay: _ } => Self::Adam { lr, weight_decay },
        }
    }

    /// Returns the learning rate.
    pub fn lr(&self) -> f64 {
        match self {
            Self::AdamW { lr, .. } => *lr,
            Self::Adam { lr, .. } => *lr,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam {
            lr: 1e-3,
            weight_decay: 0.0,
        }
    }
}

/// Optimizers.
///
/// This is a thin wrapper of optimizers in [`candle_nn`] and [`candle_optimisers`].
pub enum Optimizer {
    /// AdamW optimizer.
    AdamW(AdamW),

    /// Adam optimizer.
    Adam(Adam),
}

impl Optimizer {
    /// Computes gradients of `loss` and updates the variables.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::AdamW(opt) => Ok(opt.backward_step(loss)?),
            Self::Adam(opt) => Ok(opt.backward_step(loss)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn test_override() {
        let config = OptimizerConfig::default()
            .learning_rate(3e-4)
            .weight_decay(1e-2);
        assert_eq!(
            config,
            OptimizerConfig::Adam {
                lr: 3e-4,
                weight_decay: 1e-2
            }
        );
        assert_eq!(config.lr(), 3e-4);
    }

    #[test]
    fn test_adam_step_descends() -> Result<()> {
        // minimize (x - 3)^2 from x = 0
        let x = Var::zeros((1,), DType::F32, &Device::Cpu)?;
        let config = OptimizerConfig::Adam {
            lr: 0.1,
            weight_decay: 1e-3,
        };
        let mut opt = config.build(vec![x.clone()])?;
        for _ in 0..10 {
            let loss = (x.as_tensor() - 3.0)?.sqr()?.sum_all()?;
            opt.backward_step(&loss)?;
        }
        let v = x.as_tensor().to_vec1::<f32>()?[0];
        assert!(v > 0.5 && v < 3.0, "x = {}", v);
        Ok(())
    }
}
