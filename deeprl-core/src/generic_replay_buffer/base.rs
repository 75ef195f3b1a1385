//! Ring buffer of transitions with uniform sampling.
use super::{BatchBase, GenericTransitionBatch, SimpleReplayBufferConfig};
use crate::{error::DeeprlError, ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A replay buffer storing transitions of arbitrary observation and action types.
///
/// Transitions are written at a cursor that wraps around at `capacity`, so the
/// oldest transitions are overwritten once the buffer is full. Batches are
/// drawn uniformly at random with replacement.
///
/// # Examples
///
/// ```ignore
/// let config = SimpleReplayBufferConfig::default().capacity(10000);
/// let mut buffer = SimpleReplayBuffer::<TensorBatch, TensorBatch>::build(&config)?;
///
/// buffer.push(transition)?;
/// let batch = buffer.batch(32)?;
/// ```
pub struct SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    capacity: usize,

    /// Index where the next transition is written.
    i: usize,

    /// Number of stored transitions.
    size: usize,

    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    is_truncated: Vec<i8>,
    rng: StdRng,
}

impl<O, A> SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    #[inline]
    fn push_values<T: Copy>(capacity: usize, dest: &mut [T], i: usize, src: &[T]) {
        let mut j = i;
        for v in src.iter() {
            dest[j] = *v;
            j += 1;
            if j == capacity {
                j = 0;
            }
        }
    }

    fn gather(&self, ixs: Vec<usize>) -> Result<GenericTransitionBatch<O, A>> {
        Ok(GenericTransitionBatch {
            obs: self.obs.sample(&ixs)?,
            act: self.act.sample(&ixs)?,
            next_obs: self.next_obs.sample(&ixs)?,
            reward: ixs.iter().map(|&ix| self.reward[ix]).collect(),
            is_terminated: ixs.iter().map(|&ix| self.is_terminated[ix]).collect(),
            is_truncated: ixs.iter().map(|&ix| self.is_truncated[ix]).collect(),
            ix_sample: Some(ixs),
        })
    }

    /// Returns the maximum number of transitions the buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns all stored transitions, from the oldest to the newest.
    ///
    /// This copies the whole buffer and is intended for inspection.
    pub fn contents(&self) -> Result<GenericTransitionBatch<O, A>> {
        let ixs = if self.size < self.capacity {
            (0..self.size).collect::<Vec<_>>()
        } else {
            (self.i..self.capacity).chain(0..self.i).collect()
        };
        self.gather(ixs)
    }
}

impl<O, A> ExperienceBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Item = GenericTransitionBatch<O, A>;

    fn len(&self) -> usize {
        self.size
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        let len = tr.len();
        let (obs, act, next_obs, reward, is_terminated, is_truncated, _) = tr.unpack();
        self.obs.push(self.i, obs)?;
        self.act.push(self.i, act)?;
        self.next_obs.push(self.i, next_obs)?;
        Self::push_values(self.capacity, &mut self.reward, self.i, &reward);
        Self::push_values(self.capacity, &mut self.is_terminated, self.i, &is_terminated);
        Self::push_values(self.capacity, &mut self.is_truncated, self.i, &is_truncated);

        self.i = (self.i + len) % self.capacity;
        self.size = (self.size + len).min(self.capacity);

        Ok(())
    }
}

impl<O, A> ReplayBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Config = SimpleReplayBufferConfig;
    type Batch = GenericTransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Result<Self> {
        let capacity = config.capacity;
        if capacity == 0 {
            return Err(DeeprlError::InvalidConfig(
                "capacity of replay buffer must be positive".to_string(),
            )
            .into());
        }

        Ok(Self {
            capacity,
            i: 0,
            size: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            is_terminated: vec![0; capacity],
            is_truncated: vec![0; capacity],
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Samples `size` transitions uniformly with replacement.
    ///
    /// Fails with [`DeeprlError::InsufficientData`] when fewer than `size`
    /// transitions are stored.
    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if self.size < size || self.size == 0 {
            return Err(DeeprlError::InsufficientData {
                requested: size,
                available: self.size,
            }
            .into());
        }

        let ixs = (0..size)
            .map(|_| self.rng.gen_range(0..self.size))
            .collect::<Vec<_>>();
        self.gather(ixs)
    }
}
