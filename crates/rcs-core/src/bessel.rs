//! Spherical Bessel functions of the first and second kind.
//!
//! The Mie series needs $j_n(x)$, $y_n(x)$ and their derivatives for every
//! order $0 \ldots n_{\max}$ at a single argument, so the whole order range is
//! evaluated in one pass and stored in a [`SphericalBesselTable`].
//!
//! # Recurrences
//!
//! Both kinds satisfy
//! $$f_{n+1}(x) = \frac{2n+1}{x} f_n(x) - f_{n-1}(x).$$
//!
//! - $y_n$ grows with $n$, so the upward recurrence is stable for all orders.
//!   For tiny $x$ it overflows double precision at some order; the table
//!   stops there and reports the last finite order.
//! - $j_n$ decays once $n > x$, where the upward recurrence loses all
//!   significant digits. Orders $n \le \lfloor x \rfloor$ are computed upward;
//!   the rest come from the downward recurrence of the ratios
//!   $r_k = j_k / j_{k-1} = x / (2k + 1 - x\,r_{k+1})$, anchored at
//!   $j_{\lfloor x \rfloor}$. That anchor has no zero below $\lfloor x \rfloor + 1$,
//!   so every ratio is well defined.
//!
//! Derivatives follow from $f_n'(x) = f_{n-1}(x) - \frac{n+1}{x} f_n(x)$ and
//! $f_0' = -f_1$.

use num_complex::Complex64;

use crate::error::RcsError;

/// Orders above the requested maximum at which the ratio recurrence starts.
const RATIO_START_PADDING: usize = 20;

/// Values of both kinds and their derivatives at a single order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalOrder {
    /// $j_n(x)$
    pub j: f64,
    /// $y_n(x)$
    pub y: f64,
    /// $j_n'(x)$
    pub j_prime: f64,
    /// $y_n'(x)$
    pub y_prime: f64,
}

impl SphericalOrder {
    /// Outgoing spherical Hankel function $h_n = j_n + i\,y_n$.
    pub fn hankel(&self) -> Complex64 {
        Complex64::new(self.j, self.y)
    }

    /// $h_n' = j_n' + i\,y_n'$
    pub fn hankel_prime(&self) -> Complex64 {
        Complex64::new(self.j_prime, self.y_prime)
    }
}

/// $j_n(x)$ and $y_n(x)$ for all orders up to a maximum, at one argument.
#[derive(Debug, Clone)]
pub struct SphericalBesselTable {
    x: f64,
    j: Vec<f64>,
    y: Vec<f64>,
}

impl SphericalBesselTable {
    /// Evaluate orders `0..=n_max` at `x`.
    ///
    /// At least orders 0 and 1 are always computed, since $j_0'$ needs $j_1$.
    ///
    /// # Errors
    /// [`RcsError::NumericalSingularity`] when `x` is not finite, not
    /// positive, below `min_argument`, or so small that $y_1(x)$ already
    /// overflows.
    pub fn evaluate(x: f64, n_max: usize, min_argument: f64) -> Result<Self, RcsError> {
        let singular = || RcsError::NumericalSingularity {
            size_parameter: x,
            threshold: min_argument,
        };
        if !x.is_finite() || x <= 0.0 || x < min_argument {
            return Err(singular());
        }

        let len = n_max.max(1) + 1;
        let y = second_kind(x, len);
        if y.len() < 2 {
            return Err(singular());
        }
        let j = first_kind(x, len);

        Ok(Self { x, j, y })
    }

    /// The argument $x$ the table was evaluated at.
    pub fn argument(&self) -> f64 {
        self.x
    }

    /// Highest order for which both kinds are finite.
    pub fn max_order(&self) -> usize {
        self.y.len() - 1
    }

    pub fn j(&self, n: usize) -> Option<f64> {
        (n <= self.max_order()).then(|| self.j[n])
    }

    pub fn y(&self, n: usize) -> Option<f64> {
        self.y.get(n).copied()
    }

    /// $h_n(x) = j_n(x) + i\,y_n(x)$
    pub fn hankel(&self, n: usize) -> Option<Complex64> {
        Some(Complex64::new(self.j(n)?, self.y(n)?))
    }

    /// Both kinds and their derivatives at order `n`, or `None` past
    /// [`max_order`](Self::max_order).
    pub fn order(&self, n: usize) -> Option<SphericalOrder> {
        if n > self.max_order() {
            return None;
        }
        let (j_prime, y_prime) = if n == 0 {
            (-self.j[1], -self.y[1])
        } else {
            let scale = (n + 1) as f64 / self.x;
            (
                self.j[n - 1] - scale * self.j[n],
                self.y[n - 1] - scale * self.y[n],
            )
        };
        Some(SphericalOrder {
            j: self.j[n],
            y: self.y[n],
            j_prime,
            y_prime,
        })
    }
}

/// Upward recurrence for $y_n$, stopping before the first non-finite value.
fn second_kind(x: f64, len: usize) -> Vec<f64> {
    let (s, c) = x.sin_cos();
    let mut y = Vec::with_capacity(len);

    let y0 = -c / x;
    let y1 = -c / (x * x) - s / x;
    for v in [y0, y1] {
        if !v.is_finite() {
            return y;
        }
        y.push(v);
    }

    for k in 2..len {
        let next = (2 * k - 1) as f64 / x * y[k - 1] - y[k - 2];
        if !next.is_finite() {
            break;
        }
        y.push(next);
    }
    y
}

/// $j_n$ for `0..len`: upward while $n \le x$, downward ratios above.
fn first_kind(x: f64, len: usize) -> Vec<f64> {
    let n_max = len - 1;
    let (s, c) = x.sin_cos();
    let mut j = vec![0.0; len];

    j[0] = s / x;
    // `as` saturates, so huge arguments simply use the upward branch throughout.
    let anchor = (x.floor() as usize).min(n_max);
    if anchor >= 1 {
        j[1] = s / (x * x) - c / x;
    }
    for k in 2..=anchor {
        j[k] = (2 * k - 1) as f64 / x * j[k - 1] - j[k - 2];
    }

    if anchor < n_max {
        let start = n_max + RATIO_START_PADDING;
        let mut ratios = vec![0.0; len];
        let mut r = 0.0;
        for k in (anchor + 1..=start).rev() {
            r = x / ((2 * k + 1) as f64 - x * r);
            if k <= n_max {
                ratios[k] = r;
            }
        }
        for k in anchor + 1..=n_max {
            j[k] = j[k - 1] * ratios[k];
        }
    }
    j
}

/// Spherical Bessel function of the first kind $j_n(x)$, for $x \ge 0$.
pub fn spherical_jn(n: usize, x: f64) -> f64 {
    if x == 0.0 {
        return if n == 0 { 1.0 } else { 0.0 };
    }
    match SphericalBesselTable::evaluate(x, n, 0.0) {
        Ok(table) => table.j[n],
        Err(_) => f64::NAN,
    }
}

/// Spherical Bessel function of the second kind $y_n(x)$, for $x \ge 0$.
///
/// Returns $-\infty$ where the value overflows, including at $x = 0$.
pub fn spherical_yn(n: usize, x: f64) -> f64 {
    if x == 0.0 {
        return f64::NEG_INFINITY;
    }
    match SphericalBesselTable::evaluate(x, n, 0.0) {
        Ok(table) => table.y(n).unwrap_or(f64::NEG_INFINITY),
        Err(_) if x > 0.0 => f64::NEG_INFINITY,
        Err(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_low_orders_match_closed_forms() {
        for &x in &[0.3, 1.0, 2.5, 7.0, 19.0] {
            let (s, c) = f64::sin_cos(x);
            let t = SphericalBesselTable::evaluate(x, 2, 1e-6).unwrap();
            assert_relative_eq!(t.j(0).unwrap(), s / x, max_relative = 1e-13);
            assert_relative_eq!(t.y(0).unwrap(), -c / x, max_relative = 1e-13);
            assert_relative_eq!(t.y(1).unwrap(), -c / (x * x) - s / x, max_relative = 1e-13);
            let j2 = (3.0 / (x * x) - 1.0) * s / x - 3.0 * c / (x * x);
            assert_abs_diff_eq!(t.j(2).unwrap(), j2, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_high_order_small_argument_against_reference() {
        // Reference values from 40-digit evaluations of sqrt(pi/2x) J_{n+1/2}(x).
        let t = SphericalBesselTable::evaluate(3.0, 49, 1e-6).unwrap();
        assert_relative_eq!(t.j(49).unwrap(), 8.3975838411254392e-56, max_relative = 1e-11);
        assert_relative_eq!(t.y(49).unwrap(), -4.0168776385703835e52, max_relative = 1e-11);
        assert_relative_eq!(t.j(5).unwrap(), 0.016397480955999103, max_relative = 1e-12);
        assert_relative_eq!(t.y(5).unwrap(), -2.2470233284653901, max_relative = 1e-12);

        let t = SphericalBesselTable::evaluate(2.0, 30, 1e-6).unwrap();
        assert_relative_eq!(t.j(30).unwrap(), 5.8366178875224873e-34, max_relative = 1e-11);
        assert_relative_eq!(t.y(30).unwrap(), -1.4073938710385495e31, max_relative = 1e-11);
    }

    #[test]
    fn test_values_and_derivatives_in_oscillatory_region() {
        let t = SphericalBesselTable::evaluate(7.0, 10, 1e-6).unwrap();
        let o = t.order(3).unwrap();
        assert_relative_eq!(o.j, -0.0016120468591568731, max_relative = 1e-10);
        assert_relative_eq!(o.y, 0.15272867116070546, max_relative = 1e-12);
        assert_relative_eq!(o.j_prime, -0.13334510115999693, max_relative = 1e-12);
        assert_relative_eq!(o.y_prime, -0.026390770906124859, max_relative = 1e-12);

        let t = SphericalBesselTable::evaluate(18.3, 49, 1e-6).unwrap();
        let o = t.order(20).unwrap();
        assert_relative_eq!(o.j, 0.017624986273874913, max_relative = 1e-11);
        assert_relative_eq!(o.y, -0.17288904280730639, max_relative = 1e-11);
        assert_relative_eq!(o.j_prime, 0.0097190314115776472, max_relative = 1e-10);
        assert_relative_eq!(o.y_prime, 0.074084658253108977, max_relative = 1e-11);
    }

    #[test]
    fn test_small_argument_derivatives() {
        let t = SphericalBesselTable::evaluate(1e-3, 5, 1e-6).unwrap();
        let o = t.order(1).unwrap();
        assert_relative_eq!(o.j, 0.00033333330000000119, max_relative = 1e-12);
        assert_relative_eq!(o.y, -1000000.499999875, max_relative = 1e-12);
        assert_relative_eq!(o.j_prime, 0.33333323333333929, max_relative = 1e-9);
        assert_relative_eq!(o.y_prime, 2000000000.00025, max_relative = 1e-12);
    }

    #[test]
    fn test_wronskian_holds_across_orders() {
        // j_n y_n' - j_n' y_n = 1/x^2
        for &x in &[0.05, 0.8, 4.0, 12.5, 30.0] {
            let t = SphericalBesselTable::evaluate(x, 49, 1e-6).unwrap();
            for n in (0..=t.max_order().min(49)).step_by(7) {
                let o = t.order(n).unwrap();
                let w = o.j * o.y_prime - o.j_prime * o.y;
                assert_relative_eq!(w, 1.0 / (x * x), max_relative = 1e-8);
            }
        }
    }

    #[test]
    fn test_below_threshold_is_singular() {
        let err = SphericalBesselTable::evaluate(1e-7, 49, 1e-6).unwrap_err();
        assert!(matches!(err, RcsError::NumericalSingularity { .. }));
        assert!(SphericalBesselTable::evaluate(0.0, 10, 0.0).is_err());
        assert!(SphericalBesselTable::evaluate(f64::NAN, 10, 0.0).is_err());
        assert!(SphericalBesselTable::evaluate(-1.0, 10, 0.0).is_err());
    }

    #[test]
    fn test_overflowing_orders_are_cut_off() {
        let t = SphericalBesselTable::evaluate(1e-6, 49, 1e-6).unwrap();
        let top = t.max_order();
        assert!(top < 49 && top > 30, "max order {}", top);
        assert!(t.y(top).unwrap().is_finite());
        assert!(t.order(top + 1).is_none());
        assert!(t.hankel(top + 1).is_none());
    }

    #[test]
    fn test_order_zero_is_always_paired_with_order_one() {
        let t = SphericalBesselTable::evaluate(2.0, 0, 1e-6).unwrap();
        let o = t.order(0).unwrap();
        assert_relative_eq!(o.j_prime, -t.j[1], max_relative = 1e-15);
    }

    #[test]
    fn test_free_functions() {
        assert_eq!(spherical_jn(0, 0.0), 1.0);
        assert_eq!(spherical_jn(3, 0.0), 0.0);
        assert_eq!(spherical_yn(2, 0.0), f64::NEG_INFINITY);
        assert_relative_eq!(spherical_jn(2, 10.0), 0.077942193628562445, max_relative = 1e-12);
        assert_relative_eq!(spherical_yn(2, 10.0), -0.065069304993734793, max_relative = 1e-12);
        assert_relative_eq!(spherical_jn(10, 0.5), 7.0641239636618782e-14, max_relative = 1e-11);
    }
}
