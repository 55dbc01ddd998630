//! Core types shared across the RCS engine.
//!
//! This module defines the immutable sweep configuration, the frequency grid
//! it expands to, and the result containers handed to result sinks.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::RcsError;

/// Speed of light used by the model (m/s).
///
/// The rounded value is part of the model: results are compared against
/// tabulations produced with it.
pub const SPEED_OF_LIGHT: f64 = 3.0e8;

/// Series truncation order used when none is configured.
pub const DEFAULT_N_MAX: usize = 49;

/// Smallest size parameter accepted by the special-function evaluator.
pub const DEFAULT_MIN_SIZE_PARAMETER: f64 = 1e-6;

/// Largest truncation order a sweep accepts.
pub const MAX_N_MAX: usize = 5000;

/// Frequency sweep over a perfectly conducting sphere.
///
/// Fields are private: a `SweepConfig` only exists once its invariants
/// (`D > 0`, `0 < fmin < fmax`, `N >= 2`, all finite) have been checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepConfig {
    diameter_m: f64,
    fmin_hz: f64,
    fmax_hz: f64,
    num_points: usize,
}

impl SweepConfig {
    /// Validate and build a sweep configuration.
    ///
    /// # Arguments
    /// * `diameter_m` - Sphere diameter in metres.
    /// * `fmin_hz` - Lowest frequency of the grid (Hz).
    /// * `fmax_hz` - Highest frequency of the grid (Hz).
    /// * `num_points` - Number of grid points, both ends included.
    ///
    /// # Errors
    /// [`RcsError::InvalidConfig`] when any value is non-finite, `diameter_m`
    /// or `fmin_hz` is not positive, `fmax_hz <= fmin_hz`, `num_points < 2`,
    /// or the range is too narrow for `num_points` distinct frequencies.
    /// `fmin_hz == fmax_hz` is rejected: a single frequency is evaluated with
    /// [`RcsSweep::evaluate_frequency`](crate::sweep::RcsSweep::evaluate_frequency).
    pub fn new(
        diameter_m: f64,
        fmin_hz: f64,
        fmax_hz: f64,
        num_points: usize,
    ) -> Result<Self, RcsError> {
        if !diameter_m.is_finite() || diameter_m <= 0.0 {
            return Err(RcsError::InvalidConfig(format!(
                "diameter must be a positive finite length, got {}",
                diameter_m
            )));
        }
        if !fmin_hz.is_finite() || fmin_hz <= 0.0 {
            return Err(RcsError::InvalidConfig(format!(
                "fmin must be a positive finite frequency, got {}",
                fmin_hz
            )));
        }
        if !fmax_hz.is_finite() || fmax_hz <= fmin_hz {
            return Err(RcsError::InvalidConfig(format!(
                "fmax ({}) must be finite and greater than fmin ({})",
                fmax_hz, fmin_hz
            )));
        }
        if num_points < 2 {
            return Err(RcsError::InvalidConfig(format!(
                "at least 2 frequency points are required, got {}",
                num_points
            )));
        }
        let config = Self {
            diameter_m,
            fmin_hz,
            fmax_hz,
            num_points,
        };
        let grid = config.frequencies();
        if !grid.iter().zip(grid.iter().skip(1)).all(|(lo, hi)| hi > lo) {
            return Err(RcsError::InvalidConfig(format!(
                "range [{}, {}] Hz is too narrow for {} distinct frequencies",
                fmin_hz, fmax_hz, num_points
            )));
        }
        Ok(config)
    }

    pub fn diameter(&self) -> f64 {
        self.diameter_m
    }

    pub fn radius(&self) -> f64 {
        0.5 * self.diameter_m
    }

    pub fn fmin(&self) -> f64 {
        self.fmin_hz
    }

    pub fn fmax(&self) -> f64 {
        self.fmax_hz
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// Geometric cross-section $\pi r^2$ (m²), the optical-limit RCS.
    pub fn geometric_cross_section(&self) -> f64 {
        std::f64::consts::PI * self.radius() * self.radius()
    }

    /// Uniform frequency grid over `[fmin, fmax]`.
    ///
    /// The last sample is pinned to `fmax` so that both endpoints are exact.
    pub fn frequencies(&self) -> Array1<f64> {
        let mut grid = Array1::linspace(self.fmin_hz, self.fmax_hz, self.num_points);
        grid[0] = self.fmin_hz;
        grid[self.num_points - 1] = self.fmax_hz;
        grid
    }

    /// The grid as indexed frequency points.
    pub fn frequency_points(&self) -> Vec<FrequencyPoint> {
        self.frequencies()
            .iter()
            .enumerate()
            .map(|(index, &frequency_hz)| FrequencyPoint { index, frequency_hz })
            .collect()
    }
}

/// One sample of the frequency grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyPoint {
    /// Position in the grid (0-based).
    pub index: usize,
    /// Frequency (Hz).
    pub frequency_hz: f64,
}

/// Size parameter $kr = 2\pi f r / c$.
pub fn size_parameter(frequency_hz: f64, radius_m: f64, speed_of_light: f64) -> f64 {
    2.0 * std::f64::consts::PI * frequency_hz * radius_m / speed_of_light
}

/// How the truncated series behaved at one frequency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesDiagnostics {
    /// Highest order included in the sum. Smaller than the configured
    /// truncation order when $y_n$ overflows double precision first.
    pub orders_summed: usize,
    /// Orders dropped because their coefficient was degenerate.
    pub excluded_orders: Vec<usize>,
    /// $|(n + \tfrac12)(b_n - a_n)|$ of the last included order.
    pub last_term_magnitude: f64,
}

/// Backscatter RCS at a single frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcsResult {
    /// Frequency (Hz).
    pub frequency_hz: f64,
    /// Free-space wavelength $c/f$ (m).
    pub wavelength_m: f64,
    /// Radar cross-section (m²).
    pub rcs_m2: f64,
    /// Size parameter $kr$ at this frequency.
    pub size_parameter: f64,
    pub diagnostics: SeriesDiagnostics,
}

impl RcsResult {
    /// True when one or more orders had to be left out of the sum.
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.excluded_orders.is_empty()
    }
}

/// A frequency point that was not evaluated under the skip policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPoint {
    pub point: FrequencyPoint,
    pub reason: String,
}

/// Complete output of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RcsSpectrum {
    /// Results in grid order.
    pub results: Vec<RcsResult>,
    /// Points left out by [`SingularityPolicy::Skip`](crate::sweep::SingularityPolicy::Skip).
    pub skipped: Vec<SkippedPoint>,
}

impl RcsSpectrum {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.frequency_hz).collect()
    }

    pub fn wavelengths(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.wavelength_m).collect()
    }

    pub fn rcs_values(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.rcs_m2).collect()
    }

    /// Number of results flagged as degraded.
    pub fn degraded_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_degraded()).count()
    }

    /// Result with the largest RCS, if any.
    pub fn peak(&self) -> Option<&RcsResult> {
        self.results
            .iter()
            .max_by(|a, b| a.rcs_m2.total_cmp(&b.rcs_m2))
    }
}
