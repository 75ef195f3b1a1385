use anyhow::{anyhow, Result};
use candle_core::{Device, IndexOp, Tensor};
use deeprl_core::generic_replay_buffer::BatchBase;

/// Storage of observations or actions backed by a [`Tensor`].
///
/// The first dimension is the batch dimension. The storage of a replay buffer
/// is allocated on the CPU with the shape and dtype of the first pushed data.
#[derive(Clone, Debug)]
pub struct TensorBatch {
    buf: Option<Tensor>,
    capacity: usize,
}

impl TensorBatch {
    /// Wraps a tensor whose first dimension is the batch dimension.
    pub fn from_tensor(t: Tensor) -> Self {
        let capacity = t.dims().first().copied().unwrap_or(0);
        Self {
            buf: Some(t),
            capacity,
        }
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.buf
            .as_ref()
            .and_then(|t| t.dims().first().copied())
            .unwrap_or(0)
    }

    /// Returns `true` if no data is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the tensor, failing if no data has been pushed.
    pub fn into_tensor(self) -> Result<Tensor> {
        self.buf.ok_or_else(|| anyhow!("TensorBatch holds no data"))
    }

    /// Returns a reference to the tensor, if any.
    pub fn as_tensor(&self) -> Option<&Tensor> {
        self.buf.as_ref()
    }
}

impl BatchBase for TensorBatch {
    fn new(capacity: usize) -> Self {
        Self {
            buf: None,
            capacity,
        }
    }

    /// Pushes given data.
    ///
    /// If the internal buffer is empty, it will be initialized with the shape
    /// `[capacity, data.buf.dims()[1..]]`.
    fn push(&mut self, index: usize, data: Self) -> Result<()> {
        let data = match data.buf {
            Some(t) if t.dims().first().copied().unwrap_or(0) > 0 => t,
            _ => return Ok(()),
        };
        let batch_size = data.dims()[0];

        if self.buf.is_none() {
            let mut shape = data.dims().to_vec();
            shape[0] = self.capacity;
            self.buf = Some(Tensor::zeros(shape, data.dtype(), &Device::Cpu)?);
        }
        let buf = self
            .buf
            .as_ref()
            .ok_or_else(|| anyhow!("TensorBatch is not allocated"))?;
        if buf.dims()[1..] != data.dims()[1..] {
            return Err(anyhow!(
                "Shape of pushed data {:?} does not match the buffer {:?}",
                data.dims(),
                buf.dims()
            ));
        }
        let data = data.to_device(&Device::Cpu)?.to_dtype(buf.dtype())?;

        if index + batch_size > self.capacity {
            let n1 = self.capacity - index;
            buf.slice_set(&data.i((..n1,))?, 0, index)?;
            buf.slice_set(&data.i((n1..,))?, 0, 0)?;
        } else {
            buf.slice_set(&data, 0, index)?;
        }
        Ok(())
    }

    fn sample(&self, ixs: &[usize]) -> Result<Self> {
        let buf = self
            .buf
            .as_ref()
            .ok_or_else(|| anyhow!("Sampling from an empty TensorBatch"))?;
        let capacity = ixs.len();
        let ixs = {
            let ixs = ixs.iter().map(|x| *x as u32).collect::<Vec<_>>();
            Tensor::from_vec(ixs, &[capacity], buf.device())?
        };
        Ok(Self {
            buf: Some(buf.index_select(&ixs, 0)?),
            capacity,
        })
    }
}

impl From<Tensor> for TensorBatch {
    fn from(t: Tensor) -> Self {
        Self::from_tensor(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;

    fn rows(from: u32, n: usize) -> Result<TensorBatch> {
        let t = Tensor::arange(from, from + n as u32, &Device::Cpu)?
            .to_dtype(DType::F32)?
            .reshape((n, 1))?;
        Ok(TensorBatch::from_tensor(t))
    }

    #[test]
    fn test_push_wraps_around() -> Result<()> {
        let mut b = TensorBatch::new(4);
        b.push(0, rows(0, 3)?)?;
        b.push(3, rows(10, 2)?)?;
        let t = b.into_tensor()?.flatten_all()?.to_vec1::<f32>()?;
        assert_eq!(t, vec![11., 1., 2., 10.]);
        Ok(())
    }

    #[test]
    fn test_sample() -> Result<()> {
        let mut b = TensorBatch::new(3);
        b.push(0, rows(5, 3)?)?;
        let s = b.sample(&[2, 2, 0])?;
        assert_eq!(s.len(), 3);
        assert_eq!(s.into_tensor()?.flatten_all()?.to_vec1::<f32>()?, vec![7., 7., 5.]);
        Ok(())
    }

    #[test]
    fn test_shape_mismatch() -> Result<()> {
        let mut b = TensorBatch::new(3);
        b.push(0, rows(0, 1)?)?;
        let wide = TensorBatch::from_tensor(Tensor::zeros((1, 2), DType::F32, &Device::Cpu)?);
        assert!(b.push(1, wide).is_err());
        Ok(())
    }
}
