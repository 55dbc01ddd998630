//! # RCS Compute
//!
//! Execution backend abstraction for sphere RCS sweeps. Every frequency
//! point of a sweep is independent, so the [`ComputeBackend`](backend::ComputeBackend)
//! trait only has to run an indexed task over `0..len`; how the indices are
//! scheduled is the backend's business.
//!
//! ## Available backends
//!
//! | Backend | Feature flag | Scheduling |
//! |---------|-------------|------------|
//! | Serial | always | caller's thread, index order |
//! | CPU (Rayon) | `cpu` (default) | work-stealing thread pool |

pub mod backend;
pub mod serial;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo};
pub use serial::SerialBackend;

#[cfg(feature = "cpu")]
pub use cpu::CpuBackend;
