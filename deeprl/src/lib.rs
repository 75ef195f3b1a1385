//! TD3 reinforcement learning on a pendulum swing-up task.
//!
//! The workspace consists of the following crates:
//!
//! * [deeprl-core](../deeprl_core/index.html) provides traits of environments and
//!   agents, the uniform replay buffer, the episode-driven trainer, the evaluator
//!   and records.
//! * [deeprl-candle-agent](../deeprl_candle_agent/index.html) implements the TD3
//!   agent with [candle](https://crates.io/crates/candle-core).
//! * [deeprl-tensorboard](../deeprl_tensorboard/index.html) has
//!   `TensorboardRecorder` writing records which can be shown in Tensorboard.
//! * This crate has the [`pendulum`] environment, the configuration of the
//!   training program in [`conf`] and the program `train_td3` in `examples/`.
pub mod conf;
pub mod pendulum;
