//! Configuration of TD3 agent.
use super::{ActorConfig, CriticConfig};
use crate::{
    error_invalid_config,
    model::{SubModel1, SubModel2},
    noise::{ClippedGaussianNoise, GaussianNoiseConfig},
    util::InOutDim,
    Device, Precision,
};
use anyhow::Result;
use candle_core::Tensor;
use deeprl_core::generic_replay_buffer::SimpleReplayBufferConfig;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Td3`](super::Td3).
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct Td3Config<P, Q>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
{
    /// Configuration of the actor.
    pub actor_config: ActorConfig<P::Config>,

    /// Configuration of the critics. Both critics share it.
    pub critic_config: CriticConfig<Q::Config>,

    /// Configuration of the replay buffer owned by the agent.
    pub replay_buffer_config: SimpleReplayBufferConfig,

    /// Discount factor.
    pub gamma: f64,

    /// Target smoothing coefficient.
    ///
    /// Formula: target_params = tau * params + (1.0 - tau) * target_params
    pub tau: f64,

    /// The actor and the target networks are updated once per `policy_delay`
    /// updates of the critics.
    pub policy_delay: usize,

    /// Batch size for training.
    pub batch_size: usize,

    /// Minimum action value.
    pub action_min: f64,

    /// Maximum action value.
    pub action_max: f64,

    /// Noise added to actions taken in the environment.
    pub exploration_noise: GaussianNoiseConfig,

    /// Noise added to target actions.
    pub target_noise: ClippedGaussianNoise,

    /// Precision of the networks.
    pub precision: Precision,

    /// Random seed. Overrides the seed of the replay buffer if given.
    pub seed: Option<u64>,

    /// Device used for the actor and critic models.
    pub device: Option<Device>,
}

impl<P, Q> Clone for Td3Config<P, Q>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
{
    fn clone(&self) -> Self {
        Self {
            actor_config: self.actor_config.clone(),
            critic_config: self.critic_config.clone(),
            replay_buffer_config: self.replay_buffer_config.clone(),
            gamma: self.gamma,
            tau: self.tau,
            policy_delay: self.policy_delay,
            batch_size: self.batch_size,
            action_min: self.action_min,
            action_max: self.action_max,
            exploration_noise: self.exploration_noise.clone(),
            target_noise: self.target_noise.clone(),
            precision: self.precision,
            seed: self.seed,
            device: self.device,
        }
    }
}

impl<P, Q> Default for Td3Config<P, Q>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
{
    fn default() -> Self {
        Self {
            actor_config: Default::default(),
            critic_config: Default::default(),
            replay_buffer_config: Default::default(),
            gamma: 0.99,
            tau: 0.005,
            policy_delay: 2,
            batch_size: 100,
            action_min: -1.0,
            action_max: 1.0,
            exploration_noise: Default::default(),
            target_noise: Default::default(),
            precision: Precision::F32,
            seed: None,
            device: None,
        }
    }
}

impl<P, Q> Td3Config<P, Q>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
{
    /// Configuration of actor.
    pub fn actor_config(mut self, actor_config: ActorConfig<P::Config>) -> Self {
        self.actor_config = actor_config;
        self
    }

    /// Configuration of critics.
    pub fn critic_config(mut self, critic_config: CriticConfig<Q::Config>) -> Self {
        self.critic_config = critic_config;
        self
    }

    /// Configuration of the replay buffer.
    pub fn replay_buffer_config(mut self, v: SimpleReplayBufferConfig) -> Self {
        self.replay_buffer_config = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Sets the interval of actor updates in critic updates.
    pub fn policy_delay(mut self, v: usize) -> Self {
        self.policy_delay = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the range of actions.
    pub fn action_range(mut self, min: f64, max: f64) -> Self {
        self.action_min = min;
        self.action_max = max;
        self
    }

    /// Exploration noise.
    pub fn exploration_noise(mut self, v: GaussianNoiseConfig) -> Self {
        self.exploration_noise = v;
        self
    }

    /// Target policy smoothing noise.
    pub fn target_noise(mut self, v: ClippedGaussianNoise) -> Self {
        self.target_noise = v;
        self
    }

    /// Precision of the networks.
    pub fn precision(mut self, v: Precision) -> Self {
        self.precision = v;
        self
    }

    /// Random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = Some(v);
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Checks the ranges of the parameters.
    pub fn check(&self) -> Result<()> {
        if self.batch_size == 0 {
            return error_invalid_config("batch_size must be positive");
        }
        if !(self.tau > 0.0 && self.tau < 1.0) {
            return error_invalid_config(format!("tau must be in (0, 1), got {}", self.tau));
        }
        if !(self.gamma >= 0.0 && self.gamma <= 1.0) {
            return error_invalid_config(format!("gamma must be in [0, 1], got {}", self.gamma));
        }
        if self.policy_delay == 0 {
            return error_invalid_config("policy_delay must be positive");
        }
        if !(self.action_min < self.action_max) {
            return error_invalid_config(format!(
                "action_min ({}) must be less than action_max ({})",
                self.action_min, self.action_max
            ));
        }
        if self.replay_buffer_config.capacity == 0 {
            return error_invalid_config("capacity of replay buffer must be positive");
        }
        self.target_noise.check()?;

        if let (Some(pi_config), Some(q_config)) =
            (&self.actor_config.pi_config, &self.critic_config.q_config)
        {
            if q_config.in_dim() != pi_config.in_dim() + pi_config.out_dim() {
                return error_invalid_config(format!(
                    "input dimension of critics ({}) must be the sum of the dimensions of observations ({}) and actions ({})",
                    q_config.in_dim(),
                    pi_config.in_dim(),
                    pi_config.out_dim()
                ));
            }
            if q_config.out_dim() != 1 {
                return error_invalid_config("output dimension of critics must be 1");
            }
        }
        Ok(())
    }

    /// Constructs [`Td3Config`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`Td3Config`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
