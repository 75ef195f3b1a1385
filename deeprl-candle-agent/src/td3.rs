//! TD3 agent.
//!
//! Twin Delayed Deep Deterministic policy gradient (TD3) learns a
//! deterministic policy for continuous actions with two critics. The critic
//! target takes the smaller of the two target critics' values at a smoothed
//! target action, and the actor and the target networks are updated less
//! frequently than the critics.
mod actor;
mod base;
mod config;
mod critic;
pub use actor::{Actor, ActorConfig};
pub use base::{clipped_double_q_target, Td3};
pub use config::Td3Config;
pub use critic::{Critic, CriticConfig};
