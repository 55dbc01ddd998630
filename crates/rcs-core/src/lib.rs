//! # RCS Core
//!
//! The numerical backbone of the sphere RCS workspace. This crate computes the
//! monostatic radar cross-section of a perfectly conducting sphere over a
//! frequency sweep using the exact Mie series.
//!
//! ## Architecture
//!
//! Data flows one way: frequency → size parameter → per-order coefficients →
//! truncated sum → RCS. The driver ([`sweep::RcsSweep`]) is a pure function of
//! an immutable [`types::SweepConfig`] and its [`sweep::SweepOptions`]; points
//! are scheduled through an `rcs_compute::ComputeBackend`.
//!
//! ## Modules
//!
//! - [`types`]: Sweep configuration, frequency grid, result containers.
//! - [`bessel`]: Spherical Bessel functions $j_n$, $y_n$ and derivatives.
//! - [`mie`]: Mie coefficients $a_n$, $b_n$ of a perfect conductor.
//! - [`sweep`]: Series summation and the frequency sweep driver.
//! - [`error`]: The [`RcsError`](error::RcsError) taxonomy.

pub mod bessel;
pub mod error;
pub mod mie;
pub mod sweep;
pub mod types;

pub use error::RcsError;
pub use sweep::{compute_rcs, RcsSweep, SingularityPolicy, SweepOptions};
pub use types::{RcsResult, RcsSpectrum, SweepConfig};
