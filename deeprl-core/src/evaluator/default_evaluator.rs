//! Mean episodic return over a fixed number of episodes.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Env, Policy,
};
use anyhow::Result;

/// Runs a fixed number of episodes and reports the mean return.
///
/// The returned record holds `episode_return`, the mean of the returns, and
/// `episode_returns`, the return of each episode.
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::<Pendulum>::new(&env_config, 0, 10)?;
/// agent.eval();
/// let record = evaluator.evaluate(&mut agent)?;
/// println!("{}", record.get_scalar("episode_return")?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E>,
    {
        let mut returns = Vec::with_capacity(self.n_episodes);

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;
            let mut r_total = 0f32;

            loop {
                let act = policy.sample(&prev_obs)?;
                let (step, _) = self.env.step(&act)?;
                r_total += step.reward[0];
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }
            returns.push(r_total);
        }

        let mean = returns.iter().sum::<f32>() / self.n_episodes.max(1) as f32;
        let mut record = Record::from_scalar("episode_return", mean);
        record.insert("episode_returns", RecordValue::Array1(returns));
        Ok(record)
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs an evaluator running `n_episodes` episodes per evaluation.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::{ConstAgent, CounterEnv};

    #[test]
    fn test_mean_return() -> Result<()> {
        let mut evaluator = DefaultEvaluator::<CounterEnv>::new(&5, 0, 3)?;
        let mut agent = ConstAgent::new(-0.5, 1, 10)?;
        let record = evaluator.evaluate(&mut agent)?;

        assert_eq!(record.get_scalar("episode_return")?, -2.5);
        assert_eq!(record.get_array1("episode_returns")?, vec![-2.5; 3]);
        Ok(())
    }
}
