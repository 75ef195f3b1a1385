//! Actor of TD3 agent.
use crate::{
    model::{ModelBase, SubModel1},
    opt::{Optimizer, OptimizerConfig},
    util::{track, InOutDim},
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Actor`].
pub struct ActorConfig<P> {
    pub pi_config: Option<P>,
    pub opt_config: OptimizerConfig,
}

impl<P> Default for ActorConfig<P> {
    fn default() -> Self {
        Self {
            pi_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<P> ActorConfig<P>
where
    P: DeserializeOwned + Serialize,
{
    /// Sets configurations for the policy network.
    pub fn pi_config(mut self, v: P) -> Self {
        self.pi_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`ActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ActorConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Deterministic policy of TD3 agents.
pub struct Actor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InOutDim + Clone,
{
    device: Device,
    dtype: DType,
    varmap: VarMap,

    pi_config: P::Config,
    pi: P,

    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<P> Actor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InOutDim + Clone,
{
    /// Constructs [`Actor`].
    pub fn build(config: ActorConfig<P::Config>, device: Device, dtype: DType) -> Result<Self> {
        let pi_config = config.pi_config.context("pi_config is not set.")?;
        let varmap = VarMap::new();
        let pi = {
            let vb = VarBuilder::from_varmap(&varmap, dtype, &device);
            P::build(vb, pi_config.clone())?
        };
        let opt_config = config.opt_config;
        let opt = opt_config.build(varmap.all_vars())?;

        Ok(Self {
            device,
            dtype,
            varmap,
            pi_config,
            pi,
            opt_config,
            opt,
        })
    }

    /// Builds an actor with the same configuration and a copy of the parameters.
    ///
    /// The copy does not share parameters with `self`.
    pub fn try_clone(&self) -> Result<Self> {
        let config = ActorConfig {
            pi_config: Some(self.pi_config.clone()),
            opt_config: self.opt_config.clone(),
        };
        let actor = Self::build(config, self.device.clone(), self.dtype)?;
        track(&actor.varmap, &self.varmap, 1.0)?;
        Ok(actor)
    }

    /// Returns actions given observations.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        let act = self.pi.forward(obs)?;
        debug_assert_eq!(act.dims().last(), Some(&self.pi_config.out_dim()));
        Ok(act)
    }

    /// Dimension of observations.
    pub fn in_dim(&self) -> usize {
        self.pi_config.in_dim()
    }

    /// Dimension of actions.
    pub fn out_dim(&self) -> usize {
        self.pi_config.out_dim()
    }
}

impl<P> ModelBase for Actor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InOutDim + Clone,
{
    fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.varmap.load(path)?;
        info!("Loaded actor from {:?}", path);
        Ok(())
    }
}
