#![warn(missing_docs)]
//! Core components of the deeprl library.
//!
//! This crate is independent of any tensor backend. It provides the interfaces
//! connecting environments and agents ([`Env`], [`Policy`], [`Agent`]), a uniform
//! experience replay buffer ([`generic_replay_buffer`]), an episode-driven
//! [`Trainer`], a [`DefaultEvaluator`] and the [`record`] types used to report
//! metrics.
pub mod error;
pub mod generic_replay_buffer;
pub mod record;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, ExperienceBufferBase, Info, Obs, Policy, ReplayBufferBase,
    Step, StepProcessor, TransitionBatch,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Trainer, TrainerConfig};

#[cfg(test)]
mod dummy;
