//! Compute backend trait and device abstraction.
//!
//! The [`ComputeBackend`] trait abstracts over execution environments so that
//! the physics code in `rcs-core` stays agnostic of how per-point work is
//! scheduled.

use thiserror::Error;

/// Errors originating from compute backends.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Backend not available: {0}")]
    Unavailable(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// Describes the capabilities of a compute backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub backend_type: BackendType,
    pub compute_units: Option<usize>,
}

/// The type of compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Serial,
    Cpu,
}

/// Abstraction over compute backends.
///
/// Implementations must call `task` exactly once for every index in
/// `0..len` before returning. The order in which indices are visited is
/// unspecified, so tasks must not depend on one another.
pub trait ComputeBackend: Send + Sync {
    /// Return information about the device.
    fn device_info(&self) -> DeviceInfo;

    /// Run an independent task for every index in `0..len`.
    fn for_each_index(
        &self,
        len: usize,
        task: &(dyn Fn(usize) + Send + Sync),
    ) -> Result<(), ComputeError>;
}
