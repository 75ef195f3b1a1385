//! Utilities.
use anyhow::{anyhow, Result};
use candle_nn::VarMap;
use log::trace;
mod named_tensors;
pub use named_tensors::NamedTensors;

/// Interface for handling input and output dimensions of a network.
pub trait InOutDim {
    /// Returns the input dimension.
    fn in_dim(&self) -> usize;

    /// Returns the output dimension.
    fn out_dim(&self) -> usize;
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
///
/// With `tau == 1.0` the source values are copied as they are.
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("track with tau = {}", tau);
    let dest = dest
        .data()
        .lock()
        .map_err(|e| anyhow!("Failed to lock variables: {}", e))?;
    let src = src
        .data()
        .lock()
        .map_err(|e| anyhow!("Failed to lock variables: {}", e))?;

    for (k_dest, v_dest) in dest.iter() {
        let t_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("Variable {} is not found in the source", k_dest))?
            .as_tensor();
        let t_dest = v_dest.as_tensor();
        let t = if tau == 1.0 {
            t_src.copy()?
        } else {
            ((tau * t_src)? + ((1.0 - tau) * t_dest)?)?
        };
        v_dest.set(&t)?;
    }

    Ok(())
}
