use crate::factorial::LnFactorial;

/// Poisson probability mass, `e^−λ λ^k / k!`.
#[inline]
pub fn univariate(k: u16, lambda: f64, factorial: &impl LnFactorial) -> f64 {
    f64::exp(ln_univariate(k, lambda, factorial))
}

/// Natural logarithm of the Poisson probability mass. Evaluated directly in log space so that
/// large counts neither overflow `λ^k` nor `k!`.
#[inline]
pub fn ln_univariate(k: u16, lambda: f64, factorial: &impl LnFactorial) -> f64 {
    if k == 0 {
        -lambda
    } else {
        k as f64 * lambda.ln() - lambda - factorial.ln(k)
    }
}
