//! Generic implementation of transition batches.
use crate::TransitionBatch;
use anyhow::Result;

/// Storage of observations or actions in a replay buffer and in batches.
///
/// # Examples
///
/// ```ignore
/// struct RowBatch {
///     rows: Vec<Vec<f32>>,
/// }
///
/// impl BatchBase for RowBatch {
///     fn new(capacity: usize) -> Self {
///         Self { rows: vec![vec![]; capacity] }
///     }
///
///     fn push(&mut self, ix: usize, data: Self) -> Result<()> {
///         let capacity = self.rows.len();
///         for (j, row) in data.rows.into_iter().enumerate() {
///             self.rows[(ix + j) % capacity] = row;
///         }
///         Ok(())
///     }
///
///     fn sample(&self, ixs: &[usize]) -> Result<Self> {
///         Ok(Self { rows: ixs.iter().map(|&ix| self.rows[ix].clone()).collect() })
///     }
/// }
/// ```
pub trait BatchBase {
    /// Creates storage for `capacity` samples.
    fn new(capacity: usize) -> Self;

    /// Writes the samples in `data` starting at index `ix`.
    ///
    /// Samples beyond the capacity wrap around to the beginning of the storage.
    fn push(&mut self, ix: usize, data: Self) -> Result<()>;

    /// Gathers the samples at the given indices.
    fn sample(&self, ixs: &[usize]) -> Result<Self>
    where
        Self: Sized;
}

/// Transitions `(o_t, a_t, o_t+1, r_t, is_terminated_t, is_truncated_t)`.
///
/// The same type is used for transitions pushed into [`SimpleReplayBuffer`]
/// and for batches sampled from it.
///
/// [`SimpleReplayBuffer`]: super::SimpleReplayBuffer
pub struct GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Observations.
    pub obs: O,

    /// Actions.
    pub act: A,

    /// Next observations.
    pub next_obs: O,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Termination flags.
    pub is_terminated: Vec<i8>,

    /// Truncation flags.
    pub is_truncated: Vec<i8>,

    /// Indices of sampled transitions in the replay buffer.
    pub ix_sample: Option<Vec<usize>>,
}

impl<O, A> TransitionBatch for GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type ObsBatch = O;
    type ActBatch = A;

    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
        Vec<i8>,
        Option<Vec<usize>>,
    ) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_terminated,
            self.is_truncated,
            self.ix_sample,
        )
    }

    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &Self::ObsBatch {
        &self.obs
    }

    fn act(&self) -> &Self::ActBatch {
        &self.act
    }
}
