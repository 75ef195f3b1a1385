//! Records of metrics produced during training and evaluation.
//!
//! A [`Record`] is a set of key-value pairs. Agents return a record from every
//! optimization step, the [`Trainer`](crate::Trainer) adds per-episode values
//! to it and hands the result to a [`Recorder`].
//!
//! ```rust
//! use deeprl_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(1.0));
//! record.insert("episodic_return", RecordValue::Scalar(-1234.5));
//! record.insert("obs", RecordValue::Array1(vec![1.0, 0.0, 0.5]));
//! assert_eq!(record.get_scalar("episode").unwrap(), 1.0);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
