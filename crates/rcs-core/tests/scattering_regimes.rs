//! Integration test: RCS of a conducting sphere against the classical limits.
//!
//! - Rayleigh regime ($kr \ll 1$): $\sigma \approx 9 \pi r^2 (kr)^4$.
//! - Resonance regime: first peak $\sigma / \pi r^2 \approx 3.65$ near $kr \approx 1$.
//! - Optical regime ($kr \gg 1$): $\sigma$ oscillates about $\pi r^2$ with a
//!   creeping-wave ripple that decays as $kr$ grows.

use std::f64::consts::PI;

use approx::assert_relative_eq;

use rcs_core::types::SPEED_OF_LIGHT;
use rcs_core::{RcsSweep, SweepConfig};

const DIAMETER: f64 = 70e-3;
const RADIUS: f64 = 0.5 * DIAMETER;

fn geometric_cross_section() -> f64 {
    PI * RADIUS * RADIUS
}

/// Frequency at which the sphere has size parameter `kr`.
fn frequency_for(kr: f64) -> f64 {
    kr * SPEED_OF_LIGHT / (2.0 * PI * RADIUS)
}

fn normalised_rcs(kr: f64) -> f64 {
    let r = RcsSweep::default()
        .evaluate_frequency(DIAMETER, frequency_for(kr))
        .expect("evaluation inside the stable range");
    r.rcs_m2 / geometric_cross_section()
}

#[test]
fn test_rayleigh_regime_follows_fourth_power_law() {
    for &kr in &[0.1, 0.05, 0.02, 0.01, 0.005, 0.001] {
        let ratio = normalised_rcs(kr) / (9.0 * kr.powi(4));
        assert_relative_eq!(ratio, 1.0, max_relative = 0.02);
    }
}

#[test]
fn test_rayleigh_regime_decreases_monotonically_with_kr() {
    let krs = [0.2, 0.1, 0.05, 0.02, 0.01, 0.005, 0.002, 0.001];
    let values: Vec<f64> = krs.iter().map(|&kr| normalised_rcs(kr)).collect();
    for w in values.windows(2) {
        assert!(w[1] < w[0], "RCS must shrink with kr: {:?}", values);
    }
}

#[test]
fn test_rayleigh_sweep_rises_with_frequency() {
    // kr at fmax is ~0.073
    let cfg = SweepConfig::new(DIAMETER, 1e7, 1e8, 50).unwrap();
    let spectrum = RcsSweep::default().run(&cfg).unwrap();
    let rcs = spectrum.rcs_values();
    assert!(rcs.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn test_first_resonance_peak() {
    let (peak, kr_at_peak) = (0..=1500)
        .map(|i| 0.5 + i as f64 * 1e-3)
        .map(|kr| (normalised_rcs(kr), kr))
        .fold((0.0_f64, 0.0_f64), |best, cur| if cur.0 > best.0 { cur } else { best });
    assert_relative_eq!(peak, 3.65, max_relative = 0.01);
    assert_relative_eq!(kr_at_peak, 1.03, max_relative = 0.02);
}

#[test]
fn test_optical_regime_approaches_geometric_cross_section() {
    let mut sum = 0.0;
    let mut count = 0;
    for i in 0..=80 {
        let kr = 10.0 + 0.25 * i as f64;
        let ratio = normalised_rcs(kr);
        assert!(
            (ratio - 1.0).abs() < 0.2,
            "sigma/(pi r^2) = {:.4} at kr = {}",
            ratio,
            kr
        );
        if kr >= 15.0 {
            sum += ratio;
            count += 1;
        }
    }
    // The creeping-wave ripple averages out.
    assert_relative_eq!(sum / count as f64, 1.0, max_relative = 0.02);
}
