//! Conversion of environment steps into transitions.
use super::{BatchBase, GenericTransitionBatch};
use crate::{error::DeeprlError, Env, Obs, Step, StepProcessor};
use anyhow::Result;
use std::{default::Default, marker::PhantomData};

/// Configuration of [`SimpleStepProcessor`].
#[derive(Clone, Debug, Default)]
pub struct SimpleStepProcessorConfig {}

/// Produces 1-step transitions for non-vectorized environments.
///
/// The processor keeps the observation of the previous step, which becomes
/// `o_t` of the next transition. [`StepProcessor::reset`] must be called with
/// the initial observation at the beginning of every episode.
pub struct SimpleStepProcessor<E, O, A> {
    prev_obs: Option<O>,
    phantom: PhantomData<(E, A)>,
}

impl<E, O, A> StepProcessor<E> for SimpleStepProcessor<E, O, A>
where
    E: Env,
    O: BatchBase + From<E::Obs>,
    A: BatchBase + From<E::Act>,
{
    type Config = SimpleStepProcessorConfig;
    type Output = GenericTransitionBatch<O, A>;

    fn build(_config: &Self::Config) -> Self {
        Self {
            prev_obs: None,
            phantom: PhantomData,
        }
    }

    fn reset(&mut self, init_obs: E::Obs) {
        self.prev_obs = Some(init_obs.into());
    }

    fn process(&mut self, step: Step<E>) -> Result<Self::Output> {
        debug_assert_eq!(step.obs.len(), 1);

        let next_obs = step.obs.clone().into();
        let obs = self
            .prev_obs
            .replace(step.obs.into())
            .ok_or(DeeprlError::StepProcessorNotReset)?;

        Ok(GenericTransitionBatch {
            obs,
            act: step.act.into(),
            next_obs,
            reward: step.reward,
            is_terminated: step.is_terminated,
            is_truncated: step.is_truncated,
            ix_sample: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{CounterAct, CounterEnv, CounterObs, Scalars},
        Env,
    };

    type Processor = SimpleStepProcessor<CounterEnv, Scalars, Scalars>;

    #[test]
    fn test_process_before_reset() -> Result<()> {
        let mut env = CounterEnv::build(&3, 0)?;
        let mut processor = Processor::build(&SimpleStepProcessorConfig::default());
        let (step, _) = env.step(&CounterAct(1.0))?;

        let err = processor.process(step).err().expect("process must fail");
        assert!(matches!(
            err.downcast_ref::<DeeprlError>(),
            Some(DeeprlError::StepProcessorNotReset)
        ));
        Ok(())
    }

    #[test]
    fn test_consecutive_transitions() -> Result<()> {
        let mut env = CounterEnv::build(&2, 0)?;
        let mut processor = Processor::build(&SimpleStepProcessorConfig::default());
        processor.reset(env.reset()?);

        let (step, _) = env.step(&CounterAct(0.3))?;
        let tr1 = processor.process(step)?;
        assert_eq!(tr1.obs, Scalars(vec![0.]));
        assert_eq!(tr1.act, Scalars(vec![0.3]));
        assert_eq!(tr1.next_obs, Scalars(vec![1.]));
        assert_eq!(tr1.is_terminated, vec![0]);

        let (step, _) = env.step(&CounterAct(0.7))?;
        let tr2 = processor.process(step)?;
        assert_eq!(tr2.obs, Scalars(vec![1.]));
        assert_eq!(tr2.next_obs, Scalars(vec![2.]));
        assert_eq!(tr2.reward, vec![0.7]);
        assert_eq!(tr2.is_terminated, vec![1]);

        processor.reset(CounterObs(5.));
        let (step, _) = env.step(&CounterAct(0.0))?;
        assert_eq!(processor.process(step)?.obs, Scalars(vec![5.]));
        Ok(())
    }
}
