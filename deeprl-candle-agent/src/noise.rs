//! Noise added to actions.
//!
//! [`GaussianNoise`] perturbs actions taken in the environment for
//! exploration. Its standard deviation decays after every draw.
//! [`ClippedGaussianNoise`] smooths the target policy when computing the
//! targets of the critics.
use crate::error_invalid_config;
use anyhow::Result;
use candle_core::{DType, Device, Shape, Tensor};
use serde::{Deserialize, Serialize};

/// Decay schedule of the standard deviation of [`GaussianNoise`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum NoiseDecay {
    /// `stddev = max(stddev - decay_const, 0)`.
    Linear,

    /// `stddev = stddev * decay_const`.
    Geometric,
}

/// Configuration of [`GaussianNoise`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct GaussianNoiseConfig {
    /// Initial standard deviation.
    pub stddev: f64,

    /// Amount of decay applied after every draw.
    pub decay_const: f64,

    /// Decay schedule.
    pub decay: NoiseDecay,
}

impl Default for GaussianNoiseConfig {
    fn default() -> Self {
        Self {
            stddev: 0.1,
            decay_const: 0.0,
            decay: NoiseDecay::Linear,
        }
    }
}

impl GaussianNoiseConfig {
    /// Sets the initial standard deviation.
    pub fn stddev(mut self, v: f64) -> Self {
        self.stddev = v;
        self
    }

    /// Sets the decay constant.
    pub fn decay_const(mut self, v: f64) -> Self {
        self.decay_const = v;
        self
    }

    /// Sets the decay schedule.
    pub fn decay(mut self, v: NoiseDecay) -> Self {
        self.decay = v;
        self
    }

    fn check(&self) -> Result<()> {
        if !(self.stddev > 0.0) {
            return error_invalid_config(format!(
                "stddev of exploration noise must be positive, got {}",
                self.stddev
            ));
        }
        match self.decay {
            NoiseDecay::Linear if !(self.decay_const >= 0.0) => error_invalid_config(format!(
                "linear decay constant must be non-negative, got {}",
                self.decay_const
            )),
            NoiseDecay::Geometric if !(self.decay_const > 0.0 && self.decay_const <= 1.0) => {
                error_invalid_config(format!(
                    "geometric decay constant must be in (0, 1], got {}",
                    self.decay_const
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Gaussian noise with decaying standard deviation.
///
/// ```
/// use candle_core::{DType, Device};
/// use deeprl_candle_agent::noise::{GaussianNoise, GaussianNoiseConfig, NoiseDecay};
///
/// let config = GaussianNoiseConfig::default()
///     .stddev(1.0)
///     .decay_const(0.1)
///     .decay(NoiseDecay::Linear);
/// let mut noise = GaussianNoise::build(&config).unwrap();
/// let _ = noise.sample((1, 2), DType::F32, &Device::Cpu).unwrap();
/// assert!((noise.stddev() - 0.9).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    stddev: f64,
    decay_const: f64,
    decay: NoiseDecay,
}

impl GaussianNoise {
    /// Constructs the noise generator.
    pub fn build(config: &GaussianNoiseConfig) -> Result<Self> {
        config.check()?;
        Ok(Self {
            stddev: config.stddev,
            decay_const: config.decay_const,
            decay: config.decay,
        })
    }

    /// Current standard deviation.
    pub fn stddev(&self) -> f64 {
        self.stddev
    }

    /// Draws i.i.d. samples with the current standard deviation, then decays it.
    pub fn sample<S: Into<Shape>>(&mut self, shape: S, dtype: DType, device: &Device) -> Result<Tensor> {
        let noise = if self.stddev > 0.0 {
            Tensor::randn(0f64, self.stddev, shape, device)?.to_dtype(dtype)?
        } else {
            Tensor::zeros(shape, dtype, device)?
        };
        self.decay();
        Ok(noise)
    }

    fn decay(&mut self) {
        self.stddev = match self.decay {
            NoiseDecay::Linear => (self.stddev - self.decay_const).max(0.0),
            NoiseDecay::Geometric => self.stddev * self.decay_const,
        };
    }
}

/// Gaussian noise clipped to `[-clip_bound, clip_bound]`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ClippedGaussianNoise {
    /// Standard deviation.
    pub stddev: f64,

    /// Bound of the absolute value of samples.
    pub clip_bound: f64,
}

impl Default for ClippedGaussianNoise {
    fn default() -> Self {
        Self {
            stddev: 0.2,
            clip_bound: 0.5,
        }
    }
}

impl ClippedGaussianNoise {
    /// Constructs the noise generator.
    pub fn new(stddev: f64, clip_bound: f64) -> Result<Self> {
        let noise = Self { stddev, clip_bound };
        noise.check()?;
        Ok(noise)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if !(self.stddev > 0.0 && self.clip_bound > 0.0) {
            return error_invalid_config(format!(
                "stddev and clip bound of smoothing noise must be positive, got {:?}",
                self
            ));
        }
        Ok(())
    }

    /// Draws clipped samples.
    pub fn sample<S: Into<Shape>>(&self, shape: S, dtype: DType, device: &Device) -> Result<Tensor> {
        let noise = Tensor::randn(0f64, self.stddev, shape, device)?
            .clamp(-self.clip_bound, self.clip_bound)?
            .to_dtype(dtype)?;
        Ok(noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_decay() -> Result<()> {
        let config = GaussianNoiseConfig::default()
            .stddev(1.0)
            .decay_const(0.1)
            .decay(NoiseDecay::Linear);
        let mut noise = GaussianNoise::build(&config)?;
        for _ in 0..3 {
            let xs = noise.sample((2, 3), DType::F32, &Device::Cpu)?;
            assert_eq!(xs.dims(), &[2, 3]);
            assert_eq!(xs.dtype(), DType::F32);
        }
        assert!((noise.stddev() - 0.7).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_linear_decay_stops_at_zero() -> Result<()> {
        let config = GaussianNoiseConfig::default()
            .stddev(0.25)
            .decay_const(0.1);
        let mut noise = GaussianNoise::build(&config)?;
        for _ in 0..5 {
            noise.sample(4, DType::F64, &Device::Cpu)?;
            assert!(noise.stddev() >= 0.0);
        }
        assert_eq!(noise.stddev(), 0.0);

        let xs = noise.sample(4, DType::F64, &Device::Cpu)?.to_vec1::<f64>()?;
        assert_eq!(xs, vec![0.0; 4]);
        Ok(())
    }

    #[test]
    fn test_geometric_decay() -> Result<()> {
        let config = GaussianNoiseConfig::default()
            .stddev(0.8)
            .decay_const(0.5)
            .decay(NoiseDecay::Geometric);
        let mut noise = GaussianNoise::build(&config)?;
        noise.sample(1, DType::F32, &Device::Cpu)?;
        noise.sample(1, DType::F32, &Device::Cpu)?;
        assert!((noise.stddev() - 0.2).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_invalid_configs() {
        let linear = GaussianNoiseConfig::default().decay(NoiseDecay::Linear);
        let geometric = GaussianNoiseConfig::default().decay(NoiseDecay::Geometric);
        assert!(GaussianNoise::build(&linear.clone().stddev(0.0)).is_err());
        assert!(GaussianNoise::build(&linear.decay_const(-0.1)).is_err());
        assert!(GaussianNoise::build(&geometric.clone().decay_const(0.0)).is_err());
        assert!(GaussianNoise::build(&geometric.decay_const(1.5)).is_err());
        assert!(ClippedGaussianNoise::new(0.2, 0.0).is_err());
        assert!(ClippedGaussianNoise::new(-0.2, 0.5).is_err());
    }

    #[test]
    fn test_clip_bound() -> Result<()> {
        let noise = ClippedGaussianNoise::new(1.0, 0.5)?;
        let xs = noise
            .sample((100, 10), DType::F32, &Device::Cpu)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        assert!(xs.iter().all(|x| x.abs() <= 0.5));
        // with stddev twice the bound, some samples hit the bound
        assert!(xs.iter().any(|x| x.abs() == 0.5));
        Ok(())
    }
}
