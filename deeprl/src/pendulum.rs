//! Pendulum swing-up task.
//!
//! The pendulum starts at a random angle and angular velocity. The agent applies
//! a torque at the free end to swing it up and keep it upright. Observations are
//! `[cos(theta), sin(theta), theta_dot]` and actions are normalized torques in
//! `[-1, 1]`, scaled by [`MAX_TORQUE`] inside the environment.
use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use deeprl_candle_agent::TensorBatch;
use deeprl_core::{
    record::{Record, RecordValue},
    Act, Env, Obs, Step,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Maximum angular velocity.
pub const MAX_SPEED: f32 = 8.0;

/// Maximum torque.
pub const MAX_TORQUE: f32 = 2.0;

/// Time step in seconds.
pub const DT: f32 = 0.05;

/// Gravitational acceleration.
pub const G: f32 = 10.0;

/// Mass of the pendulum.
pub const M: f32 = 1.0;

/// Length of the pendulum.
pub const L: f32 = 1.0;

/// Dimension of observations.
pub const DIM_OBS: usize = 3;

/// Dimension of actions.
pub const DIM_ACT: usize = 1;

/// Observation of [`Pendulum`], a tensor of shape `[1, 3]`.
#[derive(Clone, Debug)]
pub struct PendulumObs(pub Tensor);

impl Obs for PendulumObs {
    fn len(&self) -> usize {
        self.0.dims().first().copied().unwrap_or(0)
    }
}

impl From<PendulumObs> for Tensor {
    fn from(obs: PendulumObs) -> Tensor {
        obs.0
    }
}

impl From<PendulumObs> for TensorBatch {
    fn from(obs: PendulumObs) -> Self {
        TensorBatch::from_tensor(obs.0)
    }
}

/// Action of [`Pendulum`], a tensor of shape `[1, 1]` holding the normalized torque.
#[derive(Clone, Debug)]
pub struct PendulumAct(pub Tensor);

impl Act for PendulumAct {}

impl From<Tensor> for PendulumAct {
    fn from(t: Tensor) -> Self {
        Self(t)
    }
}

impl From<PendulumAct> for TensorBatch {
    fn from(act: PendulumAct) -> Self {
        TensorBatch::from_tensor(act.0)
    }
}

impl PendulumAct {
    /// Returns the torque applied to the pendulum.
    fn torque(&self) -> Result<f32> {
        let v = self
            .0
            .to_device(&Device::Cpu)?
            .to_dtype(DType::F32)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        let u = v.first().ok_or_else(|| anyhow!("Empty action"))?;
        Ok((u * MAX_TORQUE).clamp(-MAX_TORQUE, MAX_TORQUE))
    }
}

/// Configuration of [`Pendulum`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PendulumConfig {
    /// Episodes are truncated after this number of steps.
    pub max_episode_steps: usize,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            max_episode_steps: 200,
        }
    }
}

impl PendulumConfig {
    /// Sets the maximum number of steps in an episode.
    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = v;
        self
    }
}

/// Pendulum environment.
pub struct Pendulum {
    max_episode_steps: usize,
    rng: StdRng,
    theta: f32,
    theta_dot: f32,
    t: usize,
}

fn angle_normalize(x: f32) -> f32 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

impl Pendulum {
    fn obs(&self) -> Result<PendulumObs> {
        let v = [self.theta.cos(), self.theta.sin(), self.theta_dot];
        Ok(PendulumObs(Tensor::new(&[v], &Device::Cpu)?))
    }

    /// Sets the state of the pendulum and returns the observation.
    pub fn set_state(&mut self, theta: f32, theta_dot: f32) -> Result<PendulumObs> {
        self.theta = theta;
        self.theta_dot = theta_dot;
        self.t = 0;
        self.obs()
    }
}

impl Env for Pendulum {
    type Config = PendulumConfig;
    type Obs = PendulumObs;
    type Act = PendulumAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.max_episode_steps == 0 {
            return Err(anyhow!("max_episode_steps must be positive"));
        }
        Ok(Self {
            max_episode_steps: config.max_episode_steps,
            rng: StdRng::seed_from_u64(seed as u64),
            theta: 0.0,
            theta_dot: 0.0,
            t: 0,
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        let u = a.torque()?;
        let (th, thdot) = (self.theta, self.theta_dot);
        let cost = angle_normalize(th).powi(2) + 0.1 * thdot.powi(2) + 0.001 * u.powi(2);

        let thdot = thdot + (3.0 * G / (2.0 * L) * th.sin() + 3.0 / (M * L * L) * u) * DT;
        let thdot = thdot.clamp(-MAX_SPEED, MAX_SPEED);
        self.theta = th + thdot * DT;
        self.theta_dot = thdot;
        self.t += 1;

        let is_truncated = (self.t >= self.max_episode_steps) as i8;
        let step = Step::new(
            self.obs()?,
            a.clone(),
            vec![-cost],
            vec![0],
            vec![is_truncated],
            (),
        );
        let record = Record::from_slice(&[("torque", RecordValue::Scalar(u))]);
        Ok((step, record))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        let theta = self.rng.gen_range(-PI..PI);
        let theta_dot = self.rng.gen_range(-1.0..1.0);
        self.set_state(theta, theta_dot)
    }

    /// Resets the pendulum to an initial state determined by `ix`.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = StdRng::seed_from_u64(ix as u64);
        self.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn act(u: f32) -> Result<PendulumAct> {
        Ok(PendulumAct(Tensor::new(&[[u]], &Device::Cpu)?))
    }

    #[test]
    fn test_observation() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default(), 0)?;
        let obs = env.reset()?;
        assert_eq!(obs.0.dims(), &[1, DIM_OBS]);
        let v = obs.0.flatten_all()?.to_vec1::<f32>()?;
        assert!((v[0].powi(2) + v[1].powi(2) - 1.0).abs() < 1e-5);
        assert!(v[2].abs() <= 1.0);
        Ok(())
    }

    #[test]
    fn test_upright_at_rest_has_zero_reward() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default(), 0)?;
        env.set_state(0.0, 0.0)?;
        let (step, _) = env.step(&act(0.0)?)?;
        assert_eq!(step.reward, vec![0.0]);
        assert_eq!(step.is_terminated, vec![0]);
        Ok(())
    }

    #[test]
    fn test_reward_and_torque_scaling() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default(), 0)?;
        env.set_state(PI, 1.0)?;
        let (step, record) = env.step(&act(3.0)?)?;
        // Normalized torque is clipped to the torque limit.
        assert_eq!(record.get_scalar("torque")?, MAX_TORQUE);
        let expected = -(PI * PI + 0.1 + 0.001 * 4.0);
        assert!((step.reward[0] - expected).abs() < 1e-4);
        Ok(())
    }

    #[test]
    fn test_truncation() -> Result<()> {
        let config = PendulumConfig::default().max_episode_steps(3);
        let mut env = Pendulum::build(&config, 0)?;
        env.reset()?;
        let a = act(0.5)?;
        for t in 1..=3 {
            let (step, _) = env.step(&a)?;
            assert_eq!(step.is_done(), t == 3);
            assert!(step.obs.0.flatten_all()?.to_vec1::<f32>()?[2].abs() <= MAX_SPEED);
        }
        Ok(())
    }

    #[test]
    fn test_reset_with_index_is_reproducible() -> Result<()> {
        let mut env1 = Pendulum::build(&PendulumConfig::default(), 0)?;
        let mut env2 = Pendulum::build(&PendulumConfig::default(), 1)?;
        let o1 = env1.reset_with_index(5)?.0.flatten_all()?.to_vec1::<f32>()?;
        let o2 = env2.reset_with_index(5)?.0.flatten_all()?.to_vec1::<f32>()?;
        assert_eq!(o1, o2);
        Ok(())
    }

    #[test]
    fn test_zero_max_episode_steps() {
        let config = PendulumConfig::default().max_episode_steps(0);
        assert!(Pendulum::build(&config, 0).is_err());
    }
}
