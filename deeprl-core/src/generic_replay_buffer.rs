//! Uniform experience replay.
//!
//! [`SimpleReplayBuffer`] is a fixed-capacity ring buffer of transitions with
//! arbitrary observation and action types, sampled uniformly at random with
//! replacement. Observation and action storage is delegated to types
//! implementing [`BatchBase`], so that tensor backends can keep the data in
//! preallocated tensors.
//!
//! # Examples
//!
//! ```ignore
//! use deeprl_core::{
//!     generic_replay_buffer::{
//!         SimpleReplayBuffer, SimpleReplayBufferConfig, SimpleStepProcessor,
//!         SimpleStepProcessorConfig,
//!     },
//!     ReplayBufferBase, StepProcessor,
//! };
//!
//! let config = SimpleReplayBufferConfig::default().capacity(10000).seed(42);
//! let mut buffer = SimpleReplayBuffer::<TensorBatch, TensorBatch>::build(&config)?;
//!
//! let processor_config = SimpleStepProcessorConfig::default();
//! let mut processor = SimpleStepProcessor::<MyEnv, TensorBatch, TensorBatch>::build(&processor_config);
//! ```
mod base;
mod batch;
mod config;
mod step_proc;
pub use base::SimpleReplayBuffer;
pub use batch::{BatchBase, GenericTransitionBatch};
pub use config::SimpleReplayBufferConfig;
pub use step_proc::{SimpleStepProcessor, SimpleStepProcessorConfig};
