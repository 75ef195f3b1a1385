//! Configuration of the TD3 training program.
//!
//! A YAML file holds two sections, `env` for the interaction loop and `td3`
//! for the hyperparameters of the agent:
//!
//! ```yaml
//! env:
//!   name: Pendulum
//!   device: cpu
//!   seed: 42
//!   num_episodes: 200
//!   max_episode_steps: 200
//!   checkpoint_interval: 20
//! td3:
//!   memory_capacity: 1000000
//!   batch_size: 100
//!   discount_factor: 0.99
//!   polyak: 0.005
//!   action_noise_stddev: 0.1
//!   action_noise_decay_const: 0.0
//!   clip_bound: 0.5
//!   stddev: 0.2
//!   hidden_dims: [256, 256]
//!   actor_lr: 0.001
//!   critic_lr: 0.001
//!   weight_decay: 0.0
//!   policy_delay: 2
//! ```
use crate::pendulum::{PendulumConfig, DIM_ACT, DIM_OBS};
use anyhow::{anyhow, Result};
use deeprl_candle_agent::{
    mlp::{Mlp, MlpConfig},
    noise::{ClippedGaussianNoise, GaussianNoiseConfig, NoiseDecay},
    opt::OptimizerConfig,
    td3::{ActorConfig, CriticConfig, Td3Config},
    Activation, Device,
};
use deeprl_core::{
    error::DeeprlError, generic_replay_buffer::SimpleReplayBufferConfig, TrainerConfig,
};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

fn invalid_config<T>(msg: impl Into<String>) -> Result<T> {
    Err(DeeprlError::InvalidConfig(msg.into()).into())
}

/// Configuration of the interaction loop.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EnvConfig {
    /// Name of the environment.
    pub name: String,

    /// Device of the networks, `cpu`, `cuda` or `cuda:N`.
    pub device: String,

    /// Random seed of the environment and the agent.
    pub seed: u64,

    /// The number of training episodes.
    pub num_episodes: usize,

    /// Episodes are truncated after this number of steps.
    pub max_episode_steps: usize,

    /// Interval of checkpoints in episodes.
    pub checkpoint_interval: usize,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            name: "Pendulum".to_string(),
            device: "cpu".to_string(),
            seed: 42,
            num_episodes: 200,
            max_episode_steps: 200,
            checkpoint_interval: 20,
        }
    }
}

impl EnvConfig {
    /// Checks the name of the environment and the step and episode counts.
    ///
    /// `Pendulum` is the only environment available.
    pub fn check(&self) -> Result<()> {
        if self.name != "Pendulum" {
            return invalid_config(format!("unknown environment: {}", self.name));
        }
        if self.max_episode_steps == 0 {
            return invalid_config("max_episode_steps must be positive");
        }
        if self.checkpoint_interval == 0 {
            return invalid_config("checkpoint_interval must be positive");
        }
        Ok(())
    }

    /// Parses the device string.
    pub fn device(&self) -> Result<Device> {
        match self.device.as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda(0)),
            s => s
                .strip_prefix("cuda:")
                .and_then(|n| n.parse::<usize>().ok())
                .map(Device::Cuda)
                .ok_or_else(|| anyhow!("Unknown device: {}", s)),
        }
    }
}

/// Hyperparameters of the TD3 agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Td3HyperParams {
    /// Capacity of the replay buffer.
    pub memory_capacity: usize,

    /// Batch size.
    pub batch_size: usize,

    /// Discount factor.
    pub discount_factor: f64,

    /// Coefficient of soft updates of the target networks.
    pub polyak: f64,

    /// Initial standard deviation of the exploration noise.
    pub action_noise_stddev: f64,

    /// Decay constant of the exploration noise.
    pub action_noise_decay_const: f64,

    /// Decay schedule of the exploration noise.
    #[serde(default = "default_action_noise_decay")]
    pub action_noise_decay: NoiseDecay,

    /// Clip bound of the target smoothing noise.
    pub clip_bound: f64,

    /// Standard deviation of the target smoothing noise.
    pub stddev: f64,

    /// Units of the hidden layers of the actor and the critics.
    pub hidden_dims: Vec<usize>,

    /// Learning rate of the actor.
    pub actor_lr: f64,

    /// Learning rate of the critics.
    pub critic_lr: f64,

    /// Weight decay of the optimizers.
    pub weight_decay: f64,

    /// Interval of actor updates in critic updates.
    #[serde(default = "default_policy_delay")]
    pub policy_delay: usize,
}

fn default_action_noise_decay() -> NoiseDecay {
    NoiseDecay::Linear
}

fn default_policy_delay() -> usize {
    2
}

impl Default for Td3HyperParams {
    fn default() -> Self {
        Self {
            memory_capacity: 1_000_000,
            batch_size: 100,
            discount_factor: 0.99,
            polyak: 0.005,
            action_noise_stddev: 0.1,
            action_noise_decay_const: 0.0,
            action_noise_decay: NoiseDecay::Linear,
            clip_bound: 0.5,
            stddev: 0.2,
            hidden_dims: vec![256, 256],
            actor_lr: 1e-3,
            critic_lr: 1e-3,
            weight_decay: 0.0,
            policy_delay: 2,
        }
    }
}

/// Configuration of the TD3 training program.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct TrainTd3Config {
    /// Interaction loop.
    pub env: EnvConfig,

    /// Agent.
    pub td3: Td3HyperParams,
}

impl TrainTd3Config {
    /// Constructs [`TrainTd3Config`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainTd3Config`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    /// Configuration of the agent acting on the pendulum.
    pub fn td3_config(&self) -> Result<Td3Config<Mlp, Mlp>> {
        self.env.check()?;
        let p = &self.td3;
        let actor_config = ActorConfig::default()
            .pi_config(MlpConfig::new(
                DIM_OBS,
                p.hidden_dims.clone(),
                DIM_ACT,
                Activation::Tanh,
            ))
            .opt_config(OptimizerConfig::Adam {
                lr: p.actor_lr,
                weight_decay: p.weight_decay,
            });
        let critic_config = CriticConfig::default()
            .q_config(MlpConfig::new(
                DIM_OBS + DIM_ACT,
                p.hidden_dims.clone(),
                1,
                Activation::None,
            ))
            .opt_config(OptimizerConfig::Adam {
                lr: p.critic_lr,
                weight_decay: p.weight_decay,
            });
        let exploration_noise = GaussianNoiseConfig::default()
            .stddev(p.action_noise_stddev)
            .decay_const(p.action_noise_decay_const)
            .decay(p.action_noise_decay);
        let replay_buffer_config = SimpleReplayBufferConfig::default()
            .capacity(p.memory_capacity)
            .seed(self.env.seed);

        Ok(Td3Config::default()
            .actor_config(actor_config)
            .critic_config(critic_config)
            .replay_buffer_config(replay_buffer_config)
            .batch_size(p.batch_size)
            .discount_factor(p.discount_factor)
            .tau(p.polyak)
            .policy_delay(p.policy_delay)
            .action_range(-1.0, 1.0)
            .exploration_noise(exploration_noise)
            .target_noise(ClippedGaussianNoise::new(p.stddev, p.clip_bound)?)
            .seed(self.env.seed)
            .device(self.env.device()?))
    }

    /// Configuration of the trainer. Checkpoints are saved in `model_dir` if given.
    pub fn trainer_config(&self, model_dir: Option<&str>) -> Result<TrainerConfig> {
        self.env.check()?;
        let config = TrainerConfig::default()
            .num_episodes(self.env.num_episodes)
            .checkpoint_interval(self.env.checkpoint_interval)
            .seed(self.env.seed as i64);
        Ok(match model_dir {
            Some(dir) => config.model_dir(dir),
            None => config,
        })
    }

    /// Configuration of the environment.
    pub fn env_config(&self) -> Result<PendulumConfig> {
        self.env.check()?;
        Ok(PendulumConfig::default().max_episode_steps(self.env.max_episode_steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_train_td3_config() -> Result<()> {
        let config = TrainTd3Config::default();
        let dir = TempDir::new("train_td3_config")?;
        let path = dir.path().join("train_td3.yaml");
        config.save(&path)?;
        let config_ = TrainTd3Config::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_optional_fields() -> Result<()> {
        let yaml = r#"
env:
  name: Pendulum
  device: cuda:1
  seed: 0
  num_episodes: 10
  max_episode_steps: 50
  checkpoint_interval: 5
td3:
  memory_capacity: 1000
  batch_size: 32
  discount_factor: 0.9
  polyak: 0.01
  action_noise_stddev: 0.3
  action_noise_decay_const: 0.001
  clip_bound: 0.5
  stddev: 0.2
  hidden_dims: [64]
  actor_lr: 0.0003
  critic_lr: 0.0003
  weight_decay: 0.0
"#;
        let config: TrainTd3Config = serde_yaml::from_str(yaml)?;
        assert_eq!(config.td3.policy_delay, 2);
        assert_eq!(config.td3.action_noise_decay, NoiseDecay::Linear);
        assert_eq!(config.env.device()?, Device::Cuda(1));
        Ok(())
    }

    #[test]
    fn test_td3_config() -> Result<()> {
        let mut config = TrainTd3Config::default();
        config.td3.hidden_dims = vec![32, 16];
        config.td3.weight_decay = 1e-4;
        let td3_config = config.td3_config()?;
        td3_config.check()?;

        let pi_config = td3_config.actor_config.pi_config.as_ref().unwrap();
        assert_eq!(pi_config.layer_dims(), vec![(3, 32), (32, 16), (16, 1)]);
        let q_config = td3_config.critic_config.q_config.as_ref().unwrap();
        assert_eq!(q_config.layer_dims(), vec![(4, 32), (32, 16), (16, 1)]);
        assert_eq!(td3_config.tau, config.td3.polyak);
        assert_eq!(td3_config.seed, Some(42));
        assert_eq!(td3_config.replay_buffer_config.capacity, 1_000_000);
        assert_eq!(td3_config.actor_config.opt_config.lr(), 1e-3);
        Ok(())
    }

    #[test]
    fn test_trainer_config() -> Result<()> {
        let config = TrainTd3Config::default();
        let trainer_config = config.trainer_config(Some("model"))?;
        assert_eq!(trainer_config.num_episodes, 200);
        assert_eq!(trainer_config.checkpoint_interval, 20);
        assert_eq!(trainer_config.model_dir, Some("model".to_string()));
        assert_eq!(config.trainer_config(None)?.model_dir, None);
        assert_eq!(config.env_config()?.max_episode_steps, 200);
        Ok(())
    }

    fn assert_invalid_config<T>(result: Result<T>) {
        match result {
            Err(e) => assert!(matches!(
                e.downcast_ref::<DeeprlError>(),
                Some(DeeprlError::InvalidConfig(_))
            )),
            Ok(_) => panic!("configuration must be rejected"),
        }
    }

    #[test]
    fn test_unknown_environment_is_rejected() {
        let mut config = TrainTd3Config::default();
        config.env.name = "CartPole".to_string();
        assert_invalid_config(config.td3_config());
        assert_invalid_config(config.trainer_config(None));
        assert_invalid_config(config.env_config());
    }

    #[test]
    fn test_zero_checkpoint_interval_is_rejected() {
        let mut config = TrainTd3Config::default();
        config.env.checkpoint_interval = 0;
        assert_invalid_config(config.trainer_config(Some("model")));

        let mut config = TrainTd3Config::default();
        config.env.max_episode_steps = 0;
        assert_invalid_config(config.env_config());
    }

    #[test]
    fn test_unknown_device() {
        let mut config = EnvConfig::default();
        config.device = "tpu".to_string();
        assert!(config.device().is_err());
    }
}
