use super::{Actor, Critic, Td3Config};
use crate::{
    model::{ModelBase, SubModel1, SubModel2},
    noise::{ClippedGaussianNoise, GaussianNoise},
    util::{InOutDim, NamedTensors},
    Precision, TensorBatch,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::loss::mse;
use deeprl_core::{
    error::DeeprlError,
    generic_replay_buffer::SimpleReplayBufferConfig,
    record::{Record, RecordValue},
    Agent, Configurable, Env, ExperienceBufferBase, Policy, ReplayBufferBase, TransitionBatch,
};
use log::{debug, info, trace};
use serde::{de::DeserializeOwned, Serialize};
use std::{convert::TryFrom, fmt::Debug, fs, marker::PhantomData, path::Path};

/// Clipped double-Q target `r + gamma * not_terminated * min(q1, q2)`.
///
/// All tensors have the shape `[batch_size]`.
pub fn clipped_double_q_target(
    reward: &Tensor,
    not_terminated: &Tensor,
    q1: &Tensor,
    q2: &Tensor,
    gamma: f64,
) -> Result<Tensor> {
    let q_min = q1.minimum(q2)?;
    Ok((reward + ((not_terminated * gamma)? * q_min)?)?)
}

fn to_scalar(t: &Tensor) -> Result<f32> {
    Ok(t.to_dtype(DType::F32)?.to_scalar::<f32>()?)
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// TD3 agent.
///
/// The agent owns the actor, two critics, their target networks and the
/// replay buffer. Transitions are given with [`Agent::observe_and_update`],
/// which performs an update once the buffer holds `batch_size` transitions:
///
/// ```mermaid
/// graph TD
///     A[push transition] --> B{len >= batch_size}
///     B -->|no| Z[skip]
///     B -->|yes| C[sample batch]
///     C --> D[critic targets with smoothed target actions]
///     D --> E[update critic 1 and critic 2]
///     E --> F{n_opts % policy_delay == 0}
///     F -->|yes| G[update actor, soft update of targets]
///     F -->|no| H[n_opts += 1]
///     G --> H
/// ```
pub struct Td3<E, P, Q, R>
where
    E: Env,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    R: ExperienceBufferBase + ReplayBufferBase,
{
    actor: Actor<P>,
    actor_tgt: Actor<P>,
    critic1: Critic<Q>,
    critic2: Critic<Q>,
    critic1_tgt: Critic<Q>,
    critic2_tgt: Critic<Q>,
    buffer: R,
    exploration_noise: GaussianNoise,
    target_noise: ClippedGaussianNoise,
    gamma: f64,
    tau: f64,
    policy_delay: usize,
    batch_size: usize,
    action_min: f64,
    action_max: f64,
    n_opts: usize,
    train: bool,
    device: Device,
    dtype: DType,
    phantom: PhantomData<E>,
}

impl<E, P, Q, R> Td3<E, P, Q, R>
where
    E: Env,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    R: ExperienceBufferBase + ReplayBufferBase<Config = SimpleReplayBufferConfig>,
    R::Batch: TransitionBatch<ObsBatch = TensorBatch, ActBatch = TensorBatch>,
{
    /// Checks the last dimension of `t` and moves it to the device of the agent.
    ///
    /// A 1-dimensional tensor is regarded as a single sample.
    fn prepare(&self, t: Tensor, dim: usize, context: &str) -> Result<Tensor> {
        Precision::try_from(t.dtype())?;
        let t = match t.rank() {
            1 => t.unsqueeze(0)?,
            _ => t,
        };
        if t.rank() != 2 || t.dims()[1] != dim {
            return Err(DeeprlError::ShapeMismatch {
                context: context.to_string(),
                expected: vec![dim],
                actual: t.dims().to_vec(),
            }
            .into());
        }
        Ok(t.to_device(&self.device)?.to_dtype(self.dtype)?)
    }

    /// Returns `1 - is_terminated` as a tensor of shape `[batch_size]`.
    fn not_terminated(&self, is_terminated: &[i8]) -> Result<Tensor> {
        let v = is_terminated
            .iter()
            .map(|&x| 1.0 - x as f64)
            .collect::<Vec<_>>();
        Ok(Tensor::from_vec(v, (is_terminated.len(),), &self.device)?.to_dtype(self.dtype)?)
    }

    /// Returns targets of the critics, detached from the graph.
    fn critic_target(
        &self,
        next_obs: &Tensor,
        reward: &Tensor,
        not_terminated: &Tensor,
    ) -> Result<Tensor> {
        let next_act = self.actor_tgt.forward(next_obs)?;
        let noise = self
            .target_noise
            .sample(next_act.dims(), self.dtype, &self.device)?;
        let next_act = (next_act + noise)?.clamp(self.action_min, self.action_max)?;
        let q1 = self.critic1_tgt.forward(next_obs, &next_act)?.squeeze(D::Minus1)?;
        let q2 = self.critic2_tgt.forward(next_obs, &next_act)?.squeeze(D::Minus1)?;
        let tgt = clipped_double_q_target(reward, not_terminated, &q1, &q2, self.gamma)?;
        Ok(tgt.detach())
    }

    fn update_critics(&mut self, obs: &Tensor, act: &Tensor, tgt: &Tensor) -> Result<(f32, f32)> {
        let pred1 = self.critic1.forward(obs, act)?.squeeze(D::Minus1)?;
        let loss1 = mse(&pred1, tgt)?;
        self.critic1.backward_step(&loss1)?;

        let pred2 = self.critic2.forward(obs, act)?.squeeze(D::Minus1)?;
        let loss2 = mse(&pred2, tgt)?;
        self.critic2.backward_step(&loss2)?;

        Ok((to_scalar(&loss1)?, to_scalar(&loss2)?))
    }

    fn update_actor(&mut self, obs: &Tensor) -> Result<f32> {
        let act = self.actor.forward(obs)?;
        let loss = self.critic1.forward(obs, &act)?.mean_all()?.neg()?;
        self.actor.backward_step(&loss)?;
        to_scalar(&loss)
    }

    fn soft_update(&mut self) -> Result<()> {
        self.actor_tgt.soft_update(&self.actor, self.tau)?;
        self.critic1_tgt.soft_update(&self.critic1, self.tau)?;
        self.critic2_tgt.soft_update(&self.critic2, self.tau)?;
        Ok(())
    }

    fn update(&mut self) -> Result<Record> {
        let batch = self.buffer.batch(self.batch_size)?;
        let (obs, act, next_obs, reward, is_terminated, _, _) = batch.unpack();
        let obs_dim = self.actor.in_dim();
        let act_dim = self.actor.out_dim();
        let obs = self.prepare(obs.into_tensor()?, obs_dim, "observation batch")?;
        let act = self.prepare(act.into_tensor()?, act_dim, "action batch")?;
        let next_obs = self.prepare(next_obs.into_tensor()?, obs_dim, "next observation batch")?;
        let reward = {
            let n = reward.len();
            Tensor::from_vec(reward, (n,), &self.device)?.to_dtype(self.dtype)?
        };
        let not_terminated = self.not_terminated(&is_terminated)?;

        trace!("critic_target()");
        let tgt = self.critic_target(&next_obs, &reward, &not_terminated)?;

        trace!("update_critics()");
        let (loss_critic1, loss_critic2) = self.update_critics(&obs, &act, &tgt)?;

        let mut record = Record::from_slice(&[
            ("loss_critic1", RecordValue::Scalar(loss_critic1)),
            ("loss_critic2", RecordValue::Scalar(loss_critic2)),
            (
                "loss_critic",
                RecordValue::Scalar(0.5 * (loss_critic1 + loss_critic2)),
            ),
        ]);

        if self.n_opts % self.policy_delay == 0 {
            trace!("update_actor()");
            let loss_actor = self.update_actor(&obs)?;
            record.insert("loss_actor", RecordValue::Scalar(loss_actor));

            trace!("soft_update()");
            self.soft_update()?;
        }
        self.n_opts += 1;

        record.insert(
            "exploration_stddev",
            RecordValue::Scalar(self.exploration_noise.stddev() as f32),
        );
        record.insert("opt_steps", RecordValue::Scalar(self.n_opts as f32));
        debug!(
            "opt_steps = {}, loss_critic = {}",
            self.n_opts,
            0.5 * (loss_critic1 + loss_critic2)
        );

        Ok(record)
    }

    /// The number of updates performed so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Current standard deviation of the exploration noise.
    pub fn exploration_stddev(&self) -> f64 {
        self.exploration_noise.stddev()
    }

    /// Returns a copy of the actor parameters.
    pub fn actor_params(&self) -> Result<NamedTensors> {
        NamedTensors::copy_from(self.actor.varmap())
    }

    /// Returns the actor.
    pub fn actor(&self) -> &Actor<P> {
        &self.actor
    }

    /// Returns the target actor.
    pub fn actor_tgt(&self) -> &Actor<P> {
        &self.actor_tgt
    }

    /// Returns the critics.
    pub fn critics(&self) -> (&Critic<Q>, &Critic<Q>) {
        (&self.critic1, &self.critic2)
    }

    /// Returns the target critics.
    pub fn critics_tgt(&self) -> (&Critic<Q>, &Critic<Q>) {
        (&self.critic1_tgt, &self.critic2_tgt)
    }
}

impl<E, P, Q, R> Configurable for Td3<E, P, Q, R>
where
    E: Env,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    R: ExperienceBufferBase + ReplayBufferBase<Config = SimpleReplayBufferConfig>,
    R::Batch: TransitionBatch<ObsBatch = TensorBatch, ActBatch = TensorBatch>,
{
    type Config = Td3Config<P, Q>;

    /// Constructs [`Td3`] agent.
    ///
    /// Target networks start as copies of the online networks.
    fn build(config: Self::Config) -> Result<Self> {
        config.check()?;
        let device = candle_core::Device::try_from(config.device.unwrap_or(crate::Device::Cpu))?;
        let dtype = config.precision.dtype();
        if let Some(seed) = config.seed {
            if device.is_cuda() {
                device.set_seed(seed)?;
            }
        }

        let actor = Actor::build(config.actor_config.clone(), device.clone(), dtype)?;
        let critic1 = Critic::build(config.critic_config.clone(), device.clone(), dtype)?;
        let critic2 = Critic::build(config.critic_config.clone(), device.clone(), dtype)?;
        let actor_tgt = actor.try_clone()?;
        let critic1_tgt = critic1.try_clone()?;
        let critic2_tgt = critic2.try_clone()?;

        let buffer = {
            let mut buffer_config = config.replay_buffer_config.clone();
            if let Some(seed) = config.seed {
                buffer_config.seed = seed;
            }
            R::build(&buffer_config)?
        };
        info!(
            "Built TD3 agent: obs_dim = {}, act_dim = {}, device = {:?}, precision = {:?}",
            actor.in_dim(),
            actor.out_dim(),
            device,
            config.precision
        );

        Ok(Self {
            actor,
            actor_tgt,
            critic1,
            critic2,
            critic1_tgt,
            critic2_tgt,
            buffer,
            exploration_noise: GaussianNoise::build(&config.exploration_noise)?,
            target_noise: config.target_noise,
            gamma: config.gamma,
            tau: config.tau,
            policy_delay: config.policy_delay,
            batch_size: config.batch_size,
            action_min: config.action_min,
            action_max: config.action_max,
            n_opts: 0,
            train: false,
            device,
            dtype,
            phantom: PhantomData,
        })
    }
}

impl<E, P, Q, R> Policy<E> for Td3<E, P, Q, R>
where
    E: Env,
    E::Obs: Into<Tensor>,
    E::Act: From<Tensor>,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    R: ExperienceBufferBase + ReplayBufferBase<Config = SimpleReplayBufferConfig>,
    R::Batch: TransitionBatch<ObsBatch = TensorBatch, ActBatch = TensorBatch>,
{
    /// Returns an action for the given observation.
    ///
    /// In training mode, exploration noise is added to the output of the actor.
    /// The action is clipped to `[action_min, action_max]`.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let obs = self.prepare(obs.clone().into(), self.actor.in_dim(), "observation")?;
        let act = self.actor.forward(&obs)?.detach();
        let act = if self.train {
            let noise = self
                .exploration_noise
                .sample(act.dims(), self.dtype, &self.device)?;
            (act + noise)?
        } else {
            act
        };
        let act = act.clamp(self.action_min, self.action_max)?;
        Ok(act.into())
    }
}

impl<E, P, Q, R> Agent<E, R> for Td3<E, P, Q, R>
where
    E: Env,
    E::Obs: Into<Tensor>,
    E::Act: From<Tensor>,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InOutDim + Debug + PartialEq + Clone,
    R: ExperienceBufferBase + ReplayBufferBase<Config = SimpleReplayBufferConfig>,
    R::Batch: TransitionBatch<ObsBatch = TensorBatch, ActBatch = TensorBatch>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn observe_and_update(&mut self, transition: R::Item) -> Result<Option<Record>> {
        self.buffer.push(transition)?;
        if self.buffer.len() < self.batch_size {
            trace!(
                "Skip update: {} of {} transitions",
                self.buffer.len(),
                self.batch_size
            );
            return Ok(None);
        }
        Ok(Some(self.update()?))
    }

    fn buffer(&self) -> &R {
        &self.buffer
    }

    /// Saves the online networks. Target networks are not saved.
    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.actor.save(&path.join("actor.safetensors"))?;
        self.critic1.save(&path.join("critic1.safetensors"))?;
        self.critic2.save(&path.join("critic2.safetensors"))?;
        info!("Saved TD3 agent in {:?}", path);
        Ok(())
    }

    /// Loads the online networks and copies them to the target networks.
    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.actor.load(&path.join("actor.safetensors"))?;
        self.critic1.load(&path.join("critic1.safetensors"))?;
        self.critic2.load(&path.join("critic2.safetensors"))?;
        self.actor_tgt.soft_update(&self.actor, 1.0)?;
        self.critic1_tgt.soft_update(&self.critic1, 1.0)?;
        self.critic2_tgt.soft_update(&self.critic2, 1.0)?;
        info!("Loaded TD3 agent from {:?}", path);
        Ok(())
    }
}
