//! Error taxonomy for the RCS engine.

use rcs_compute::ComputeError;
use thiserror::Error;

/// Errors that can occur while configuring or running an RCS sweep.
#[derive(Debug, Error)]
pub enum RcsError {
    /// Malformed or out-of-range configuration. Raised before any computation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The size parameter is too small for a stable evaluation of the
    /// second-kind spherical Bessel functions, which diverge as `x -> 0`.
    #[error("Size parameter kr = {size_parameter:.3e} is below the stable threshold {threshold:.3e}")]
    NumericalSingularity { size_parameter: f64, threshold: f64 },

    /// A Hankel-type denominator vanished for one order of the series.
    #[error("Degenerate Mie coefficient at order {order} (kr = {size_parameter:.6e})")]
    DegenerateCoefficient { order: usize, size_parameter: f64 },

    #[error("Compute backend error: {0}")]
    Backend(#[from] ComputeError),
}
