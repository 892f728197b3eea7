//! Special functions and exact tests behind the classification metrics.
//!
//! - `ln_gamma`: Lanczos series (Numerical Recipes `gammln`, g = 5)
//! - `regularized_beta`: continued fraction by the modified Lentz method
//! - `regularized_gamma_lower`: power series for P(a, x)
//!
//! The tests built on them are the Clopper-Pearson interval, the one-sided
//! binomial tail and McNemar's chi-square test.

use crate::error::RfError;

const SERIES_MAX_ITER: usize = 1000;
const CF_MAX_ITER: usize = 300;
const EPS: f64 = 1e-15;
const FPMIN: f64 = 1e-300;

/// Natural log of the gamma function for `x > 0`.
///
/// Returns `f64::INFINITY` for non-positive `x`.
#[must_use]
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.001_208_650_973_866_179,
        -5.395_239_384_953e-6,
    ];

    if x <= 0.0 {
        return f64::INFINITY;
    }

    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000_000_000_190_015_f64;
    for c in COEFFS {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * ser / x).ln()
}

/// Regularized lower incomplete gamma function P(a, x).
///
/// Returns 0.0 for non-positive `x` and 1.0 far in the right tail.
#[must_use]
pub fn regularized_gamma_lower(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x > a + 200.0 {
        return 1.0;
    }

    let mut term = 1.0 / a;
    let mut sum = term;
    let mut denom = a;
    for _ in 0..SERIES_MAX_ITER {
        denom += 1.0;
        term *= x / denom;
        sum += term;
        if term.abs() < EPS * sum.abs() {
            break;
        }
    }

    let log_result = a.mul_add(x.ln(), -x) - ln_gamma(a) + sum.ln();
    if log_result > 0.0 {
        1.0
    } else {
        log_result.exp().clamp(0.0, 1.0)
    }
}

/// Continued fraction for the incomplete beta function.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=CF_MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Regularized incomplete beta function I_x(a, b) for `a, b > 0`.
///
/// `x` is clamped to [0, 1].
#[must_use]
pub fn regularized_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front =
        ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The fraction converges fast only on one side of the mean.
    if x < (a + 1.0) / (a + b + 2.0) {
        (front * beta_continued_fraction(a, b, x) / a).clamp(0.0, 1.0)
    } else {
        (1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b).clamp(0.0, 1.0)
    }
}

/// Quantile of the Beta(a, b) distribution by bisection on `regularized_beta`.
#[must_use]
pub fn beta_quantile(p: f64, a: f64, b: f64) -> f64 {
    if p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return 1.0;
    }

    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if regularized_beta(mid, a, b) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-14 {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// Clopper-Pearson exact interval for `successes` out of `n` trials.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RfError::EmptyDataset`] | `n == 0` |
/// | [`RfError::InvalidConfidenceLevel`] | `level` not in (0, 1) |
pub fn clopper_pearson(successes: usize, n: usize, level: f64) -> Result<(f64, f64), RfError> {
    if n == 0 {
        return Err(RfError::EmptyDataset);
    }
    if !(level > 0.0 && level < 1.0) {
        return Err(RfError::InvalidConfidenceLevel { level });
    }

    let alpha = 1.0 - level;
    let x = successes.min(n) as f64;
    let n = n as f64;

    let lower = if x == 0.0 {
        0.0
    } else {
        beta_quantile(alpha / 2.0, x, n - x + 1.0)
    };
    let upper = if x == n {
        1.0
    } else {
        beta_quantile(1.0 - alpha / 2.0, x + 1.0, n - x)
    };

    // Bisection error must not push the bounds past the point estimate.
    let p_hat = x / n;
    Ok((lower.min(p_hat), upper.max(p_hat)))
}

/// P(X >= k) for X ~ Binomial(n, p).
#[must_use]
pub fn binomial_upper_tail(k: usize, n: usize, p: f64) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if k > n {
        return 0.0;
    }
    if p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return 1.0;
    }
    regularized_beta(p, k as f64, (n - k + 1) as f64)
}

/// McNemar's test with continuity correction on the discordant counts.
///
/// `b` and `c` are the two off-diagonal cells of a 2x2 confusion matrix.
/// Returns `None` when there are no discordant pairs.
#[must_use]
pub fn mcnemar_p_value(b: usize, c: usize) -> Option<f64> {
    let discordant = b + c;
    if discordant == 0 {
        return None;
    }
    let diff = (b as f64 - c as f64).abs() - 1.0;
    let statistic = diff * diff / discordant as f64;
    // Chi-square with one degree of freedom: survival = 1 - P(1/2, s/2).
    Some((1.0 - regularized_gamma_lower(0.5, statistic / 2.0)).clamp(0.0, 1.0))
}
