//! Minimal environment and agent used in tests.
use crate::{
    generic_replay_buffer::{BatchBase, SimpleReplayBuffer, SimpleReplayBufferConfig},
    record::Record,
    Act, Agent, Env, ExperienceBufferBase, Obs, Policy, ReplayBufferBase, Step,
};
use anyhow::Result;
use std::path::Path;

/// Scalar samples stored in a vector.
#[derive(Clone, Debug, PartialEq)]
pub struct Scalars(pub Vec<f32>);

impl BatchBase for Scalars {
    fn new(capacity: usize) -> Self {
        Self(vec![0.; capacity])
    }

    fn push(&mut self, ix: usize, data: Self) -> Result<()> {
        let capacity = self.0.len();
        for (j, v) in data.0.into_iter().enumerate() {
            self.0[(ix + j) % capacity] = v;
        }
        Ok(())
    }

    fn sample(&self, ixs: &[usize]) -> Result<Self> {
        Ok(Self(ixs.iter().map(|&ix| self.0[ix]).collect()))
    }
}

#[derive(Clone, Debug)]
pub struct CounterObs(pub f32);

impl Obs for CounterObs {
    fn len(&self) -> usize {
        1
    }
}

impl From<CounterObs> for Scalars {
    fn from(obs: CounterObs) -> Self {
        Scalars(vec![obs.0])
    }
}

#[derive(Clone, Debug)]
pub struct CounterAct(pub f32);

impl Act for CounterAct {}

impl From<CounterAct> for Scalars {
    fn from(act: CounterAct) -> Self {
        Scalars(vec![act.0])
    }
}

/// Observes the step count, rewards the action value, terminates after
/// `episode_len` steps.
pub struct CounterEnv {
    episode_len: usize,
    t: usize,
}

impl Env for CounterEnv {
    type Config = usize;
    type Obs = CounterObs;
    type Act = CounterAct;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            episode_len: *config,
            t: 0,
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        self.t += 1;
        let is_terminated = (self.t >= self.episode_len) as i8;
        let step = Step::new(
            CounterObs(self.t as f32),
            a.clone(),
            vec![a.0],
            vec![is_terminated],
            vec![0],
            (),
        );
        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.t = 0;
        Ok(CounterObs(0.))
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }
}

pub type CounterBuffer = SimpleReplayBuffer<Scalars, Scalars>;

/// Acts with a constant, stores transitions and counts updates.
pub struct ConstAgent {
    act: f32,
    batch_size: usize,
    n_opts: usize,
    train: bool,
    buffer: CounterBuffer,
}

impl ConstAgent {
    pub fn new(act: f32, batch_size: usize, capacity: usize) -> Result<Self> {
        let config = SimpleReplayBufferConfig::default().capacity(capacity);
        Ok(Self {
            act,
            batch_size,
            n_opts: 0,
            train: false,
            buffer: CounterBuffer::build(&config)?,
        })
    }

    pub fn n_opts(&self) -> usize {
        self.n_opts
    }
}

impl Policy<CounterEnv> for ConstAgent {
    fn sample(&mut self, _obs: &CounterObs) -> Result<CounterAct> {
        Ok(CounterAct(self.act))
    }
}

impl Agent<CounterEnv, CounterBuffer> for ConstAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn observe_and_update(
        &mut self,
        transition: <CounterBuffer as ExperienceBufferBase>::Item,
    ) -> Result<Option<Record>> {
        self.buffer.push(transition)?;
        if self.buffer.len() < self.batch_size {
            return Ok(None);
        }
        let _batch = self.buffer.batch(self.batch_size)?;
        self.n_opts += 1;
        Ok(Some(Record::from_scalar("opt_steps", self.n_opts as f32)))
    }

    fn buffer(&self) -> &CounterBuffer {
        &self.buffer
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        std::fs::write(path.join("n_opts.txt"), self.n_opts.to_string())?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.n_opts = std::fs::read_to_string(path.join("n_opts.txt"))?.parse()?;
        Ok(())
    }
}
