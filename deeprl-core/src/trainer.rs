//! Train [`Agent`].
mod config;
use crate::{
    error::DeeprlError,
    record::{
        Record,
        RecordValue::{DateTime, Scalar},
        Recorder,
    },
    Agent, Env, ExperienceBufferBase, Policy, ReplayBufferBase, StepProcessor,
};
use anyhow::Result;
use chrono::Local;
pub use config::TrainerConfig;
use log::{info, warn};
use std::{marker::PhantomData, path::Path};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the episode-driven training loop.
///
/// # Training loop
///
/// For each of `num_episodes` episodes:
///
/// 1. Reset [`Env`] and [`StepProcessor`] with the initial observation.
/// 2. Sample an action with [`Policy::sample`] and apply it to the environment.
/// 3. Turn the [`Step`] into a transition with the [`StepProcessor`] and hand it
///    to [`Agent::observe_and_update`], which stores it in the replay buffer
///    owned by the agent and performs an optimization step once the buffer
///    holds enough transitions.
/// 4. Repeat 2-3 until the episode is terminated or truncated.
/// 5. Write a record with `episode`, `episodic_return`, `episode_length`, the
///    wall-clock `datetime` and the values of the last optimization step to
///    the [`Recorder`].
/// 6. If `episode % checkpoint_interval == 0`, save the agent in
///    `(model_dir)/ep(episode)`.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|"Step&lt;E: Env&gt;"|C[StepProcessor]
///     C -->|ExperienceBufferBase::Item|A
///     A -->|Record|D[Recorder]
/// ```
///
/// [`Step`]: crate::Step
pub struct Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    env_config: E::Config,
    step_proc_config: P::Config,
    num_episodes: usize,
    checkpoint_interval: usize,
    model_dir: Option<String>,
    seed: i64,
    phantom: PhantomData<R>,
}

impl<E, P, R> Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    /// Constructs a trainer.
    ///
    /// Fails if `checkpoint_interval` is zero.
    pub fn build(
        config: TrainerConfig,
        env_config: E::Config,
        step_proc_config: P::Config,
    ) -> Result<Self> {
        if config.checkpoint_interval == 0 {
            return Err(DeeprlError::InvalidConfig(
                "checkpoint_interval must be positive".to_string(),
            )
            .into());
        }
        Ok(Self {
            env_config,
            step_proc_config,
            num_episodes: config.num_episodes,
            checkpoint_interval: config.checkpoint_interval,
            model_dir: config.model_dir,
            seed: config.seed,
            phantom: PhantomData,
        })
    }

    fn save_checkpoint<A: Agent<E, R>>(agent: &A, model_dir: &str, episode: usize) {
        let path = Path::new(model_dir).join(format!("ep{}", episode));
        match agent.save_params(&path) {
            Ok(()) => info!("Saved the model in {:?}", &path),
            Err(e) => warn!("Failed to save the model in {:?}: {}", &path, e),
        }
    }

    /// Runs a single episode and returns its record.
    fn run_episode<A: Agent<E, R>>(
        &self,
        env: &mut E,
        step_proc: &mut P,
        agent: &mut A,
    ) -> Result<Record> {
        let mut obs = env.reset()?;
        step_proc.reset(obs.clone());
        let mut episodic_return = 0f32;
        let mut episode_length = 0usize;
        let mut record_agent = None;

        loop {
            let act = agent.sample(&obs)?;
            let (step, _) = env.step(&act)?;
            episodic_return += step.reward[0];
            episode_length += 1;
            let is_done = step.is_done();
            let next_obs = step.obs.clone();

            let transition = step_proc.process(step)?;
            if let Some(record) = agent.observe_and_update(transition)? {
                record_agent = Some(record);
            }

            if is_done {
                break;
            }
            obs = next_obs;
        }

        let mut record = record_agent.unwrap_or_else(Record::empty);
        record.insert("episodic_return", Scalar(episodic_return));
        record.insert("episode_length", Scalar(episode_length as f32));
        Ok(record)
    }

    /// Trains the agent.
    pub fn train<A>(&mut self, agent: &mut A, recorder: &mut dyn Recorder) -> Result<()>
    where
        A: Agent<E, R>,
    {
        let mut env = E::build(&self.env_config, self.seed)?;
        let mut step_proc = P::build(&self.step_proc_config);
        agent.train();

        for episode in 0..self.num_episodes {
            let mut record = self.run_episode(&mut env, &mut step_proc, agent)?;
            info!(
                "Episode {}: return = {:.3}, length = {}, transitions = {}",
                episode,
                record.get_scalar("episodic_return")?,
                record.get_scalar("episode_length")?,
                agent.buffer().len()
            );
            record.insert("episode", Scalar(episode as f32));
            record.insert("datetime", DateTime(Local::now()));
            recorder.write(record);

            if episode % self.checkpoint_interval == 0 {
                if let Some(model_dir) = &self.model_dir {
                    Self::save_checkpoint(agent, model_dir, episode);
                }
            }
        }
        recorder.flush();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{ConstAgent, CounterBuffer, CounterEnv, Scalars},
        generic_replay_buffer::{SimpleStepProcessor, SimpleStepProcessorConfig},
        record::BufferedRecorder,
    };
    use tempdir::TempDir;

    type CounterTrainer =
        Trainer<CounterEnv, SimpleStepProcessor<CounterEnv, Scalars, Scalars>, CounterBuffer>;

    #[test]
    fn test_episode_records() -> Result<()> {
        let config = TrainerConfig::default().num_episodes(3);
        let mut trainer =
            CounterTrainer::build(config, 4, SimpleStepProcessorConfig::default())?;
        let mut agent = ConstAgent::new(0.5, 6, 100)?;
        let mut recorder = BufferedRecorder::new();

        trainer.train(&mut agent, &mut recorder)?;

        assert!(agent.is_train());
        assert_eq!(agent.buffer().len(), 12);
        // optimization steps start when the buffer holds 6 transitions
        assert_eq!(agent.n_opts(), 7);

        let records = recorder.iter().collect::<Vec<_>>();
        assert_eq!(records.len(), 3);
        for (episode, record) in records.iter().enumerate() {
            assert_eq!(record.get_scalar("episode")?, episode as f32);
            assert_eq!(record.get_scalar("episodic_return")?, 2.0);
            assert_eq!(record.get_scalar("episode_length")?, 4.0);
            assert!(record.get_datetime("datetime")? <= Local::now());
        }
        assert!(records[0].get_datetime("datetime")? <= records[2].get_datetime("datetime")?);
        assert!(records[0].get_scalar("opt_steps").is_err());
        assert_eq!(records[1].get_scalar("opt_steps")?, 3.0);
        assert_eq!(records[2].get_scalar("opt_steps")?, 7.0);
        Ok(())
    }

    #[test]
    fn test_checkpoints() -> Result<()> {
        let dir = TempDir::new("trainer")?;
        let model_dir = dir.path().to_string_lossy().to_string();
        let config = TrainerConfig::default()
            .num_episodes(5)
            .checkpoint_interval(2)
            .model_dir(&model_dir);
        let mut trainer =
            CounterTrainer::build(config, 2, SimpleStepProcessorConfig::default())?;
        let mut agent = ConstAgent::new(1.0, 1, 100)?;
        let mut recorder = BufferedRecorder::new();

        trainer.train(&mut agent, &mut recorder)?;

        for episode in [0, 2, 4] {
            assert!(dir.path().join(format!("ep{}", episode)).exists());
        }
        for episode in [1, 3] {
            assert!(!dir.path().join(format!("ep{}", episode)).exists());
        }

        let mut loaded = ConstAgent::new(1.0, 1, 100)?;
        loaded.load_params(&dir.path().join("ep4"))?;
        assert_eq!(loaded.n_opts(), 10);
        Ok(())
    }

    #[test]
    fn test_zero_checkpoint_interval_is_rejected() {
        let config = TrainerConfig::default().num_episodes(1).checkpoint_interval(0);
        let err = CounterTrainer::build(config, 2, SimpleStepProcessorConfig::default())
            .err()
            .expect("zero checkpoint_interval must be rejected");
        assert!(matches!(
            err.downcast_ref::<DeeprlError>(),
            Some(DeeprlError::InvalidConfig(_))
        ));
    }
}
