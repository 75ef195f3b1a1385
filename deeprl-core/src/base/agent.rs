//! Agent.
use super::{Env, ExperienceBufferBase, Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
///
/// An agent owns its replay buffer `R`. Transitions produced by the interaction
/// loop are handed over with [`Agent::observe_and_update`], which stores them
/// and, when the buffer holds enough data, performs an optimization step.
pub trait Agent<E: Env, R: ExperienceBufferBase + ReplayBufferBase>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Stores a transition and performs an optimization step if possible.
    ///
    /// Returns `Ok(None)` when the optimization step was skipped because the
    /// replay buffer does not hold enough transitions yet. This is the normal
    /// situation at the beginning of training and is not an error.
    fn observe_and_update(&mut self, transition: R::Item) -> Result<Option<Record>>;

    /// Returns the replay buffer owned by the agent.
    fn buffer(&self) -> &R;

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
