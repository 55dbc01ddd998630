//! Series summation and the frequency sweep driver.
//!
//! For every grid frequency the driver evaluates the size parameter
//! $kr = 2\pi f r / c$, sums the truncated backscatter series
//!
//! $$S = \sum_{n=1}^{n_{\max}} (-1)^n \left(n + \tfrac12\right)(b_n - a_n)$$
//!
//! and converts it to the monostatic RCS
//!
//! $$\sigma = \frac{\lambda^2}{\pi} |S|^2, \qquad \lambda = c / f.$$
//!
//! Points are independent, so the work is handed to a
//! [`ComputeBackend`](rcs_compute::ComputeBackend) and reassembled in grid
//! order afterwards. The truncation order is fixed per sweep; the magnitude
//! of the last included term is reported so callers can judge convergence.

use std::f64::consts::PI;
use std::sync::{Arc, OnceLock};

use log::{debug, warn};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use rcs_compute::{ComputeBackend, ComputeError, SerialBackend};

use crate::bessel::SphericalBesselTable;
use crate::error::RcsError;
use crate::mie::{MieCoefficientPair, DEFAULT_DEGENERATE_TOLERANCE};
use crate::types::{
    size_parameter, RcsResult, RcsSpectrum, SeriesDiagnostics, SkippedPoint, SweepConfig,
    DEFAULT_MIN_SIZE_PARAMETER, DEFAULT_N_MAX, MAX_N_MAX, SPEED_OF_LIGHT,
};

/// What a sweep does with a frequency whose size parameter is too small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SingularityPolicy {
    /// Fail the whole sweep with [`RcsError::NumericalSingularity`].
    #[default]
    Abort,
    /// Leave the point out and record it in [`RcsSpectrum::skipped`].
    Skip,
}

/// Numerical settings of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOptions {
    /// Highest multipole order of the truncated series.
    pub n_max: usize,
    /// Propagation speed used for $k$ and $\lambda$ (m/s).
    pub speed_of_light: f64,
    /// Size parameters below this are reported as singular.
    pub min_size_parameter: f64,
    /// Relative tolerance for [`RcsError::DegenerateCoefficient`].
    pub degenerate_tolerance: f64,
    pub on_singularity: SingularityPolicy,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            n_max: DEFAULT_N_MAX,
            speed_of_light: SPEED_OF_LIGHT,
            min_size_parameter: DEFAULT_MIN_SIZE_PARAMETER,
            degenerate_tolerance: DEFAULT_DEGENERATE_TOLERANCE,
            on_singularity: SingularityPolicy::Abort,
        }
    }
}

impl SweepOptions {
    /// Check the options before any point is evaluated.
    pub fn validate(&self) -> Result<(), RcsError> {
        if self.n_max == 0 || self.n_max > MAX_N_MAX {
            return Err(RcsError::InvalidConfig(format!(
                "n_max must lie in 1..={}, got {}",
                MAX_N_MAX, self.n_max
            )));
        }
        if !self.speed_of_light.is_finite() || self.speed_of_light <= 0.0 {
            return Err(RcsError::InvalidConfig(format!(
                "speed_of_light must be positive and finite, got {}",
                self.speed_of_light
            )));
        }
        if !self.min_size_parameter.is_finite() || self.min_size_parameter < 0.0 {
            return Err(RcsError::InvalidConfig(format!(
                "min_size_parameter must be finite and non-negative, got {}",
                self.min_size_parameter
            )));
        }
        if !(0.0..1.0).contains(&self.degenerate_tolerance) {
            return Err(RcsError::InvalidConfig(format!(
                "degenerate_tolerance must lie in [0, 1), got {}",
                self.degenerate_tolerance
            )));
        }
        Ok(())
    }
}

/// Frequency-sweep RCS engine for a perfectly conducting sphere.
///
/// Holds only immutable settings; every call to [`run`](Self::run) builds a
/// fresh [`RcsSpectrum`].
pub struct RcsSweep {
    options: SweepOptions,
    backend: Arc<dyn ComputeBackend>,
}

impl RcsSweep {
    /// Sweep evaluated on the calling thread.
    pub fn new(options: SweepOptions) -> Self {
        Self::with_backend(options, Arc::new(SerialBackend::new()))
    }

    pub fn with_backend(options: SweepOptions, backend: Arc<dyn ComputeBackend>) -> Self {
        Self { options, backend }
    }

    pub fn options(&self) -> &SweepOptions {
        &self.options
    }

    pub fn backend(&self) -> &dyn ComputeBackend {
        self.backend.as_ref()
    }

    /// Evaluate the RCS at every point of the configured frequency grid.
    ///
    /// # Errors
    /// - [`RcsError::InvalidConfig`] for bad options, before any evaluation.
    /// - [`RcsError::NumericalSingularity`] under [`SingularityPolicy::Abort`].
    /// - [`RcsError::Backend`] if the backend fails or leaves a point unvisited.
    pub fn run(&self, config: &SweepConfig) -> Result<RcsSpectrum, RcsError> {
        self.options.validate()?;

        let points = config.frequency_points();
        debug!(
            "RCS sweep: D={} m, {} points in [{:.4e}, {:.4e}] Hz, n_max={}, backend={}",
            config.diameter(),
            points.len(),
            config.fmin(),
            config.fmax(),
            self.options.n_max,
            self.backend.device_info().name
        );

        let slots: Vec<OnceLock<Result<RcsResult, RcsError>>> =
            points.iter().map(|_| OnceLock::new()).collect();
        self.backend.for_each_index(points.len(), &|i| {
            let outcome = self.evaluate_frequency(config.diameter(), points[i].frequency_hz);
            let _ = slots[i].set(outcome);
        })?;

        let mut spectrum = RcsSpectrum {
            results: Vec::with_capacity(points.len()),
            skipped: Vec::new(),
        };
        for (point, slot) in points.into_iter().zip(slots) {
            let outcome = slot.into_inner().ok_or_else(|| {
                RcsError::Backend(ComputeError::Unavailable(format!(
                    "frequency point {} was never evaluated",
                    point.index
                )))
            })?;
            match outcome {
                Ok(result) => {
                    if result.is_degraded() {
                        warn!(
                            "f={:.4e} Hz: orders {:?} excluded from the series",
                            result.frequency_hz, result.diagnostics.excluded_orders
                        );
                    }
                    spectrum.results.push(result);
                }
                Err(err @ RcsError::NumericalSingularity { .. }) => match self.options.on_singularity {
                    SingularityPolicy::Abort => return Err(err),
                    SingularityPolicy::Skip => {
                        warn!("Skipping f={:.4e} Hz: {}", point.frequency_hz, err);
                        spectrum.skipped.push(SkippedPoint {
                            point,
                            reason: err.to_string(),
                        });
                    }
                },
                Err(err) => return Err(err),
            }
        }

        debug!(
            "RCS sweep finished: {} results, {} skipped, {} degraded",
            spectrum.results.len(),
            spectrum.skipped.len(),
            spectrum.degraded_count()
        );
        Ok(spectrum)
    }

    /// Backscatter RCS of a sphere of diameter `diameter_m` at one frequency.
    pub fn evaluate_frequency(
        &self,
        diameter_m: f64,
        frequency_hz: f64,
    ) -> Result<RcsResult, RcsError> {
        self.options.validate()?;
        if !diameter_m.is_finite() || diameter_m <= 0.0 {
            return Err(RcsError::InvalidConfig(format!(
                "diameter must be a positive finite length, got {}",
                diameter_m
            )));
        }
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            return Err(RcsError::InvalidConfig(format!(
                "frequency must be positive and finite, got {}",
                frequency_hz
            )));
        }

        let c = self.options.speed_of_light;
        let wavelength_m = c / frequency_hz;
        let kr = size_parameter(frequency_hz, 0.5 * diameter_m, c);

        let table =
            SphericalBesselTable::evaluate(kr, self.options.n_max, self.options.min_size_parameter)?;
        let top = self.options.n_max.min(table.max_order());

        let tolerance = self.options.degenerate_tolerance;
        let (sum, diagnostics) = sum_backscatter_series(
            (1..=top).map(|n| MieCoefficientPair::from_table(&table, n, tolerance)),
        )?;

        Ok(RcsResult {
            frequency_hz,
            wavelength_m,
            rcs_m2: wavelength_m * wavelength_m / PI * sum.norm_sqr(),
            size_parameter: kr,
            diagnostics,
        })
    }
}

impl Default for RcsSweep {
    fn default() -> Self {
        Self::new(SweepOptions::default())
    }
}

/// Accumulate $\sum (-1)^n (n + \tfrac12)(b_n - a_n)$ over coefficient pairs
/// given in increasing order.
///
/// A [`RcsError::DegenerateCoefficient`] leaves its order out of the sum and
/// records it in [`SeriesDiagnostics::excluded_orders`]; any other error is
/// returned.
pub fn sum_backscatter_series<I>(pairs: I) -> Result<(Complex64, SeriesDiagnostics), RcsError>
where
    I: IntoIterator<Item = Result<MieCoefficientPair, RcsError>>,
{
    let mut sum = Complex64::new(0.0, 0.0);
    let mut diagnostics = SeriesDiagnostics::default();
    for pair in pairs {
        match pair {
            Ok(pair) => {
                let term = pair.backscatter_term();
                sum += term;
                diagnostics.orders_summed = pair.order;
                diagnostics.last_term_magnitude = term.norm();
            }
            Err(RcsError::DegenerateCoefficient { order, size_parameter }) => {
                warn!("kr={:.6e}: order {} is degenerate, left out of the series", size_parameter, order);
                diagnostics.excluded_orders.push(order);
            }
            Err(err) => return Err(err),
        }
    }
    Ok((sum, diagnostics))
}

/// Sweep with default options on the calling thread.
pub fn compute_rcs(config: &SweepConfig) -> Result<Vec<RcsResult>, RcsError> {
    Ok(RcsSweep::default().run(config)?.results)
}
