//! The negative log-likelihood of a match history, optionally time-weighted.

use tracing::trace;

use crate::data::Dataset;
use crate::factorial::Lookup;
use crate::model::{self, Rates};
use crate::params::Layout;

/// Contribution of a match whose likelihood is outside the model's domain. Large enough to steer
/// the search away, finite so that differences and line searches stay well-defined.
pub const DOMAIN_PENALTY: f64 = 1e10;

pub struct Objective<'a> {
    dataset: &'a Dataset,
    layout: Layout,
    weights: Vec<f64>,
    factorial: Lookup,
}
impl<'a> Objective<'a> {
    /// Builds an objective over `dataset`, with one weight per match.
    pub fn new(dataset: &'a Dataset, weights: Vec<f64>) -> Self {
        assert_eq!(
            dataset.matches().len(),
            weights.len(),
            "exactly one weight must be specified for each match"
        );
        Self {
            dataset,
            layout: Layout::new(dataset.roster().len()),
            weights,
            factorial: Lookup::default(),
        }
    }

    pub fn unweighted(dataset: &'a Dataset) -> Self {
        Self::new(dataset, vec![1.0; dataset.matches().len()])
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// `−Σ wᵢ · llᵢ` over the match history, summed in dataset order.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        debug_assert_eq!(self.layout.len(), values.len());
        let rho = values[self.layout.rho()];
        let home_adv = values[self.layout.home_adv()];
        let mut sum = 0.0;
        for (m, &weight) in self.dataset.matches().iter().zip(&self.weights) {
            let rates = Rates::new(
                &self.layout.strength(values, m.home),
                &self.layout.strength(values, m.away),
                home_adv,
            );
            match model::log_likelihood(m.home_score, m.away_score, &rates, rho, &self.factorial) {
                Ok(log_likelihood) => sum -= weight * log_likelihood,
                Err(err) => {
                    trace!("penalising: {err}");
                    sum += DOMAIN_PENALTY;
                }
            }
        }
        sum
    }
}
