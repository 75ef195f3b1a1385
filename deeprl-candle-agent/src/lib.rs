//! TD3 agent implemented with [candle](https://crates.io/crates/candle-core).
//!
//! The agent [`td3::Td3`] is built from an actor and twin critics, each a
//! multilayer perceptron ([`mlp::Mlp`]), together with the noise generators in
//! [`noise`] and the uniform replay buffer of `deeprl-core`.
pub mod mlp;
pub mod model;
pub mod noise;
pub mod opt;
pub mod td3;
mod tensor_batch;
pub mod util;
use anyhow::Result;
use candle_core::{DType, Tensor};
use deeprl_core::error::DeeprlError;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
pub use tensor_batch::TensorBatch;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    fn try_from(device: Device) -> std::result::Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}

/// Activation function applied to the output of a network.
#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
pub enum Activation {
    /// Identity.
    None,

    /// Rectified linear unit.
    ReLU,

    /// Hyperbolic tangent, bounding outputs in `[-1, 1]`.
    Tanh,
}

impl Activation {
    /// Applies the activation function.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        Ok(match self {
            Self::None => xs.clone(),
            Self::ReLU => xs.relu()?,
            Self::Tanh => xs.tanh()?,
        })
    }
}

/// Floating point precision of network parameters and computations.
///
/// Matches the numeric type of observations given by the environment.
#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
pub enum Precision {
    /// Single precision.
    F32,

    /// Double precision.
    F64,
}

impl Precision {
    /// Returns the corresponding [`DType`].
    pub fn dtype(&self) -> DType {
        match self {
            Self::F32 => DType::F32,
            Self::F64 => DType::F64,
        }
    }
}

impl TryFrom<DType> for Precision {
    type Error = DeeprlError;

    fn try_from(dtype: DType) -> Result<Self, Self::Error> {
        match dtype {
            DType::F32 => Ok(Self::F32),
            DType::F64 => Ok(Self::F64),
            dtype => Err(DeeprlError::UnsupportedPrecision(format!("{:?}", dtype))),
        }
    }
}

pub(crate) fn error_invalid_config<T>(msg: impl Into<String>) -> Result<T> {
    Err(DeeprlError::InvalidConfig(msg.into()).into())
}
