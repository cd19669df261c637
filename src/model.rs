//! The Dixon-Coles match model: expected scoring rates, the low-score correction and the
//! log-likelihood of a single observed result.

use thiserror::Error;

use crate::factorial::LnFactorial;
use crate::poisson;

/// Expected scoring rates of one fixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    /// Home expected score, λ.
    pub home: f64,
    /// Away expected score, μ.
    pub away: f64,
}
impl Rates {
    /// Log-linear rates: `λ = exp(α_home + β_away + γ)`, `μ = exp(α_away + β_home)`. Strictly
    /// positive for every finite input.
    #[inline]
    pub fn new(home: &Strength, away: &Strength, home_adv: f64) -> Self {
        Self {
            home: f64::exp(home.attack + away.defence + home_adv),
            away: f64::exp(away.attack + home.defence),
        }
    }
}

/// Log-scale attack (α) and defence (β) of one team.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strength {
    pub attack: f64,
    pub defence: f64,
}

/// Dixon-Coles correction applied to the product of the two independent Poisson terms. Only the
/// four lowest scorelines are adjusted.
#[inline]
pub fn tau(home_score: u16, away_score: u16, rates: &Rates, rho: f64) -> f64 {
    match (home_score, away_score) {
        (0, 0) => 1.0 - rates.home * rates.away * rho,
        (0, 1) => 1.0 + rates.home * rho,
        (1, 0) => 1.0 + rates.away * rho,
        (1, 1) => 1.0 - rho,
        _ => 1.0,
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("non-positive correction factor {tau} for {home_score}-{away_score}")]
    NonPositiveCorrection {
        home_score: u16,
        away_score: u16,
        tau: f64,
    },

    #[error("score probability underflowed for {home_score}-{away_score} at rates {rates:?}")]
    Underflow {
        home_score: u16,
        away_score: u16,
        rates: Rates,
    },
}

/// Log-likelihood of observing `home_score`-`away_score` given the fixture's rates and `rho`.
pub fn log_likelihood(
    home_score: u16,
    away_score: u16,
    rates: &Rates,
    rho: f64,
    factorial: &impl LnFactorial,
) -> Result<f64, DomainError> {
    let tau = tau(home_score, away_score, rates, rho);
    if tau <= 0.0 || tau.is_nan() {
        return Err(DomainError::NonPositiveCorrection {
            home_score,
            away_score,
            tau,
        });
    }

    let ln_prob = tau.ln()
        + poisson::ln_univariate(home_score, rates.home, factorial)
        + poisson::ln_univariate(away_score, rates.away, factorial);
    if ln_prob.is_finite() {
        Ok(ln_prob)
    } else {
        Err(DomainError::Underflow {
            home_score,
            away_score,
            rates: *rates,
        })
    }
}
