//! Replay buffer interface.
use anyhow::Result;

/// Interface of buffers that store experiences from environments.
pub trait ExperienceBufferBase {
    /// Items pushed into the buffer.
    ///
    /// An item may hold more than one transition.
    type Item;

    /// Pushes an item into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the number of transitions in the buffer.
    fn len(&self) -> usize;
}

/// Interface of replay buffers generating batches for training.
pub trait ReplayBufferBase {
    /// Configuration of the replay buffer.
    type Config: Clone;

    /// Batch generated from the buffer.
    type Batch;

    /// Builds a replay buffer from the given configuration.
    ///
    /// Fails if the configuration is invalid, e.g., zero capacity.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Constructs a batch of `size` transitions.
    ///
    /// Fails with [`DeeprlError::InsufficientData`] if the buffer holds fewer than
    /// `size` transitions.
    ///
    /// [`DeeprlError::InsufficientData`]: crate::error::DeeprlError::InsufficientData
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
