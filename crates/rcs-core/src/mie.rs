//! Mie coefficients of a perfectly conducting sphere.
//!
//! With the Riccati–Bessel functions $\psi_n(x) = x j_n(x)$ and
//! $\xi_n(x) = x h_n(x)$, $h_n = j_n + i y_n$, the exterior coefficients of a
//! perfect conductor are
//!
//! $$a_n = \frac{\psi_n(x)}{\xi_n(x)} = \frac{j_n}{h_n}, \qquad
//!   b_n = \frac{\psi_n'(x)}{\xi_n'(x)} = \frac{x j_{n-1} - n j_n}{x h_{n-1} - n h_n}.$$
//!
//! The second form of $b_n$ uses $\psi_n' = x j_{n-1} - n j_n$, so only orders
//! $n-1$ and $n$ of the table are needed. For real $x$ both coefficients lie on
//! the circle $\operatorname{Re} c = |c|^2$, in particular $|c| \le 1$.
//!
//! # Reference
//! Bohren & Huffman, *Absorption and Scattering of Light by Small Particles* (1983), §4.4.

use num_complex::Complex64;

use crate::bessel::{SphericalBesselTable, SphericalOrder};
use crate::error::RcsError;

/// Default relative tolerance below which a denominator counts as vanished.
pub const DEFAULT_DEGENERATE_TOLERANCE: f64 = 1e-12;

/// The pair of scattering coefficients of one multipole order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MieCoefficientPair {
    /// Multipole order $n \ge 1$.
    pub order: usize,
    /// $a_n = j_n / h_n$
    pub a: Complex64,
    /// $b_n = [x j_{n-1} - n j_n] / [x h_{n-1} - n h_n]$
    pub b: Complex64,
}

impl MieCoefficientPair {
    /// Compute the coefficients of order `n` from a precomputed table.
    pub fn from_table(
        table: &SphericalBesselTable,
        n: usize,
        tolerance: f64,
    ) -> Result<Self, RcsError> {
        if n == 0 || n > table.max_order() {
            return Err(RcsError::InvalidConfig(format!(
                "Mie order {} outside the evaluated range 1..={}",
                n,
                table.max_order()
            )));
        }
        // Both orders exist once n <= max_order.
        let lower = table.order(n - 1).ok_or_else(|| missing_order(n - 1))?;
        let upper = table.order(n).ok_or_else(|| missing_order(n))?;
        mie_coefficients(table.argument(), n, &lower, &upper, tolerance)
    }

    /// Contribution $(-1)^n (n + \tfrac12)(b_n - a_n)$ to the backscatter sum.
    pub fn backscatter_term(&self) -> Complex64 {
        let sign = if self.order % 2 == 0 { 1.0 } else { -1.0 };
        (self.b - self.a) * (sign * (self.order as f64 + 0.5))
    }
}

fn missing_order(n: usize) -> RcsError {
    RcsError::InvalidConfig(format!("order {} missing from Bessel table", n))
}

/// Compute $a_n$ and $b_n$ from the orders $n-1$ (`lower`) and $n$ (`upper`).
///
/// # Errors
/// [`RcsError::DegenerateCoefficient`] when either denominator is zero, not
/// finite, or smaller than `tolerance` times its numerator.
pub fn mie_coefficients(
    size_parameter: f64,
    n: usize,
    lower: &SphericalOrder,
    upper: &SphericalOrder,
    tolerance: f64,
) -> Result<MieCoefficientPair, RcsError> {
    let x = size_parameter;
    let nf = n as f64;
    let degenerate = || RcsError::DegenerateCoefficient {
        order: n,
        size_parameter: x,
    };

    let h_n = upper.hankel();
    let h_nm1 = lower.hankel();

    let a = checked_quotient(Complex64::from(upper.j), h_n, tolerance).ok_or_else(degenerate)?;

    let psi_prime = Complex64::from(x * lower.j - nf * upper.j);
    let xi_prime = h_nm1 * x - h_n * nf;
    let b = checked_quotient(psi_prime, xi_prime, tolerance).ok_or_else(degenerate)?;

    Ok(MieCoefficientPair { order: n, a, b })
}

/// `num / den`, or `None` if the denominator has effectively vanished.
fn checked_quotient(num: Complex64, den: Complex64, tolerance: f64) -> Option<Complex64> {
    if !den.re.is_finite() || !den.im.is_finite() {
        return None;
    }
    let den_norm = den.norm();
    if den_norm == 0.0 || den_norm <= tolerance * num.norm() {
        return None;
    }
    let q = scaled_div(num, den);
    (q.re.is_finite() && q.im.is_finite()).then_some(q)
}

/// Complex division without forming $|d|^2$ (Smith's algorithm).
///
/// Near the bottom of the size-parameter range $|h_n|$ reaches $10^{200}$ and
/// more, where the textbook quotient would overflow.
fn scaled_div(num: Complex64, den: Complex64) -> Complex64 {
    if den.re.abs() >= den.im.abs() {
        let r = den.im / den.re;
        let d = den.re + den.im * r;
        Complex64::new((num.re + num.im * r) / d, (num.im - num.re * r) / d)
    } else {
        let r = den.re / den.im;
        let d = den.im + den.re * r;
        Complex64::new((num.re * r + num.im) / d, (num.im * r - num.re) / d)
    }
}
