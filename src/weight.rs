//! Exponential time decay of match weights.

use anyhow::bail;
use chrono::NaiveDate;

use crate::data::{Dataset, ValidationError};

/// `exp(−xi · elapsed_days)`. `elapsed_days` must be non-negative.
#[inline]
pub fn decay(xi: f64, elapsed_days: u32) -> f64 {
    f64::exp(-xi * elapsed_days as f64)
}

/// Weighting of matches relative to a reference date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWeighting {
    /// Decay rate per day.
    pub xi: f64,
    /// Defaults to the most recent match date in the dataset.
    pub reference_date: Option<NaiveDate>,
}
impl TimeWeighting {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.xi.is_finite() || self.xi < 0.0 {
            bail!("decay rate xi ({}) must be finite and non-negative", self.xi);
        }
        Ok(())
    }

    pub fn is_uniform(&self) -> bool {
        self.xi == 0.0
    }

    /// Computes one weight per match of the dataset. With `xi = 0` dates are ignored and every
    /// weight is 1; otherwise every match must be dated no later than the reference date.
    pub fn weights(&self, dataset: &Dataset) -> Result<Vec<f64>, ValidationError> {
        let matches = dataset.matches();
        if self.is_uniform() {
            return Ok(vec![1.0; matches.len()]);
        }

        let reference = match self.reference_date.or_else(|| dataset.latest_date()) {
            Some(reference) => reference,
            None => return Err(missing_date(dataset, 0)),
        };
        matches
            .iter()
            .enumerate()
            .map(|(index, m)| {
                let date = m.date.ok_or_else(|| missing_date(dataset, index))?;
                if date > reference {
                    return Err(ValidationError::FutureMatch {
                        index,
                        home_team: dataset.roster().name(m.home).to_string(),
                        away_team: dataset.roster().name(m.away).to_string(),
                        date,
                        reference,
                    });
                }
                let elapsed_days = (reference - date).num_days() as u32;
                Ok(decay(self.xi, elapsed_days))
            })
            .collect()
    }
}

impl Default for TimeWeighting {
    fn default() -> Self {
        Self {
            xi: 0.0,
            reference_date: None,
        }
    }
}

fn missing_date(dataset: &Dataset, index: usize) -> ValidationError {
    let m = &dataset.matches()[index];
    ValidationError::MissingDate {
        index,
        home_team: dataset.roster().name(m.home).to_string(),
        away_team: dataset.roster().name(m.away).to_string(),
    }
}
