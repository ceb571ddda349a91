// src/analytics/bs_analytic.rs
//! Analytical Black-Scholes-Merton formulas for European options
//!
//! # Mathematical Foundation
//!
//! With a continuous dividend yield q the underlying follows:
//! ```text
//! dS_t = (r - q) S_t dt + σ S_t dW_t
//! ```
//!
//! and European options have closed-form values in terms of the cumulative
//! normal distribution function Φ(x).

use crate::math_utils::norm_cdf;

fn d1_d2(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> (f64, f64) {
    let vol_sqrt_t = sigma * t.sqrt();
    let d1 = ((s / k).ln() + (r - q + 0.5 * sigma * sigma) * t) / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

/// Black-Scholes-Merton European call price
///
/// # Formula
/// ```text
/// C = S e^(-qT) Φ(d₁) - K e^(-rT) Φ(d₂)
/// d₁ = [ln(S/K) + (r - q + σ²/2)T] / (σ√T)
/// d₂ = d₁ - σ√T
/// ```
pub fn bs_call_price(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> f64 {
    let (d1, d2) = d1_d2(s, k, r, q, sigma, t);
    s * (-q * t).exp() * norm_cdf(d1) - k * (-r * t).exp() * norm_cdf(d2)
}

/// Black-Scholes-Merton European put price
///
/// ```text
/// P = K e^(-rT) Φ(-d₂) - S e^(-qT) Φ(-d₁)
/// ```
pub fn bs_put_price(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> f64 {
    let (d1, d2) = d1_d2(s, k, r, q, sigma, t);
    k * (-r * t).exp() * norm_cdf(-d2) - s * (-q * t).exp() * norm_cdf(-d1)
}

/// Call delta `∂C/∂S = e^(-qT) Φ(d₁)`
pub fn bs_call_delta(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> f64 {
    let (d1, _) = d1_d2(s, k, r, q, sigma, t);
    (-q * t).exp() * norm_cdf(d1)
}

/// Call vega `∂C/∂σ = S e^(-qT) φ(d₁) √T`
pub fn bs_call_vega(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> f64 {
    let (d1, _) = d1_d2(s, k, r, q, sigma, t);
    s * (-q * t).exp() * crate::math_utils::norm_pdf(d1) * t.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_reference_value() {
        // Hull, S=42 K=40 r=10% σ=20% T=0.5
        let c = bs_call_price(42.0, 40.0, 0.1, 0.0, 0.2, 0.5);
        assert!((c - 4.759422).abs() < 1e-5, "call = {}", c);
    }

    #[test]
    fn test_put_call_parity_with_dividend() {
        let (s, k, r, q, sigma, t) = (100.0, 95.0, 0.06, 0.03, 0.25, 1.5);
        let c = bs_call_price(s, k, r, q, sigma, t);
        let p = bs_put_price(s, k, r, q, sigma, t);
        let parity = s * (-q * t).exp() - k * (-r * t).exp();
        assert!((c - p - parity).abs() < 1e-10);
    }

    #[test]
    fn test_delta_matches_finite_difference() {
        let (s, k, r, q, sigma, t) = (100.0, 100.0, 0.06, 0.03, 0.2, 1.0);
        let h = 1e-4;
        let fd = (bs_call_price(s + h, k, r, q, sigma, t) - bs_call_price(s - h, k, r, q, sigma, t))
            / (2.0 * h);
        assert!((bs_call_delta(s, k, r, q, sigma, t) - fd).abs() < 1e-6);
    }
}
