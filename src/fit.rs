//! Maximum-likelihood estimation of team strengths, home advantage and the low-score correction.

use std::collections::BTreeMap;
use std::error::Error;

use anyhow::bail;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tinyrand::Rand;
use tracing::{debug, warn};

use crate::data::{Dataset, MatchRecord, Roster, ValidationError};
use crate::model::{Rates, Strength};
use crate::objective::Objective;
use crate::opt::{bfgs, BfgsConfig, Termination};
use crate::params::Layout;
use crate::scoregrid::ScoreGrid;
use crate::weight::TimeWeighting;

/// Which parameters are free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum ModelKind {
    /// Attack, defence, home advantage and `rho`.
    #[strum(to_string = "dc", serialize = "dixon_coles")]
    DixonColes,

    /// Independent Poisson scores: `rho` is held at zero.
    #[strum(to_string = "poisson", serialize = "bp")]
    Poisson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub model: ModelKind,
    pub max_iterations: u64,
    /// Relative objective decrease below which the search is deemed converged.
    pub tolerance: f64,
    /// Gradient magnitude below which the search is deemed converged.
    pub gradient_tolerance: f64,
    /// Mean attack strength imposed on the solution.
    pub attack_mean: f64,
    /// Daily decay rate of match weights; zero weighs every match equally.
    pub xi: f64,
    /// Date the weights decay from; defaults to the latest match.
    pub reference_date: Option<NaiveDate>,
}
impl SolverConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.bfgs().validate()?;
        self.time_weighting().validate()?;
        if !self.attack_mean.is_finite() {
            bail!("attack mean ({}) must be finite", self.attack_mean);
        }
        Ok(())
    }

    fn bfgs(&self) -> BfgsConfig {
        BfgsConfig {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            gradient_tolerance: self.gradient_tolerance,
        }
    }

    fn time_weighting(&self) -> TimeWeighting {
        TimeWeighting {
            xi: self.xi,
            reference_date: self.reference_date,
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        let bfgs = BfgsConfig::default();
        Self {
            model: ModelKind::DixonColes,
            max_iterations: bfgs.max_iterations,
            tolerance: bfgs.tolerance,
            gradient_tolerance: bfgs.gradient_tolerance,
            attack_mean: 1.0,
            xi: 0.0,
            reference_date: None,
        }
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(#[from] pub Box<dyn Error>);

impl From<anyhow::Error> for ConfigError {
    fn from(value: anyhow::Error) -> Self {
        ConfigError(value.into())
    }
}

#[derive(Debug, Error)]
pub enum FitError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("expected {expected} finite initial values, got {actual:?}")]
    InitialValues { expected: usize, actual: Vec<f64> },

    #[error(transparent)]
    Solver(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Convergence {
    pub converged: bool,
    pub termination: Termination,
    pub iterations: u64,
    /// Objective at the returned parameters.
    pub objective: f64,
    /// Objective at the starting parameters.
    pub initial_objective: f64,
}

/// Fitted parameters, addressable by team.
#[derive(Debug, Clone, Serialize)]
pub struct Estimate {
    pub model: ModelKind,
    /// Parameter name to value: `attack_<team>`, `defence_<team>`, `rho` and `home_adv`.
    pub parameters: BTreeMap<String, f64>,
    pub convergence: Convergence,
    #[serde(skip)]
    roster: Roster,
    #[serde(skip)]
    values: Vec<f64>,
}
impl Estimate {
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn layout(&self) -> Layout {
        Layout::new(self.roster.len())
    }

    /// The flat parameter vector: attacks, defences, `rho`, home advantage.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn rho(&self) -> f64 {
        self.values[self.layout().rho()]
    }

    pub fn home_adv(&self) -> f64 {
        self.values[self.layout().home_adv()]
    }

    pub fn strength(&self, team: &str) -> Result<Strength, ValidationError> {
        let index = self.roster.index_of(team)?;
        Ok(self.layout().strength(&self.values, index))
    }

    /// Expected scores of `home` hosting `away`.
    pub fn rates(&self, home: &str, away: &str) -> Result<Rates, ValidationError> {
        if home == away {
            return Err(ValidationError::SelfMatch {
                home_team: home.to_string(),
            });
        }
        Ok(Rates::new(
            &self.strength(home)?,
            &self.strength(away)?,
            self.home_adv(),
        ))
    }

    /// Score distribution of `home` hosting `away`, up to `max_score` goals per side.
    pub fn predict(&self, home: &str, away: &str, max_score: u16) -> Result<ScoreGrid, ValidationError> {
        let rates = self.rates(home, away)?;
        Ok(ScoreGrid::new(&rates, self.rho(), max_score))
    }
}

pub struct Estimator {
    config: SolverConfig,
}
impl Estimator {
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Fits the model from a random starting point drawn from `rand`.
    pub fn fit(&self, records: &[MatchRecord], rand: &mut impl Rand) -> Result<Estimate, FitError> {
        let dataset = Dataset::try_from(records)?;
        let init_values = Layout::new(dataset.roster().len()).random(rand);
        self.solve(dataset, init_values)
    }

    /// Fits the model from caller-supplied starting values, laid out as per [Layout].
    pub fn fit_from(
        &self,
        records: &[MatchRecord],
        init_values: &[f64],
    ) -> Result<Estimate, FitError> {
        let dataset = Dataset::try_from(records)?;
        let layout = Layout::new(dataset.roster().len());
        if init_values.len() != layout.len() || init_values.iter().any(|value| !value.is_finite()) {
            return Err(FitError::InitialValues {
                expected: layout.len(),
                actual: init_values.to_vec(),
            });
        }
        self.solve(dataset, init_values.to_vec())
    }

    fn solve(&self, dataset: Dataset, mut init_values: Vec<f64>) -> Result<Estimate, FitError> {
        let weights = self.config.time_weighting().weights(&dataset)?;
        let objective = Objective::new(&dataset, weights);
        let layout = *objective.layout();
        let free = FreeParams {
            model: self.config.model,
            layout,
        };

        if self.config.model == ModelKind::Poisson {
            init_values[layout.rho()] = 0.0;
        }
        layout.normalise(&mut init_values, self.config.attack_mean);
        let initial_objective = objective.evaluate(&init_values);
        debug!(
            "fitting {} model to {} matches between {} teams; initial objective: {initial_objective}",
            self.config.model,
            dataset.matches().len(),
            layout.teams()
        );

        let mut full = init_values.clone();
        let attack_mean = self.config.attack_mean;
        let outcome = bfgs(
            &self.config.bfgs(),
            free.reduce(&init_values),
            |values| layout.normalise(values, attack_mean),
            |values| {
                free.expand(values, &mut full);
                objective.evaluate(&full)
            },
        )?;

        let mut values = vec![0.0; layout.len()];
        free.expand(&outcome.optimal_values, &mut values);
        let convergence = Convergence {
            converged: outcome.converged(),
            termination: outcome.termination,
            iterations: outcome.iterations,
            objective: outcome.optimal_residual,
            initial_objective,
        };
        if convergence.converged {
            debug!("fitted: {convergence:?}");
        } else {
            warn!(
                "did not converge within {} iterations; objective: {}",
                convergence.iterations, convergence.objective
            );
        }

        let roster = dataset.roster().clone();
        let parameters = layout
            .names(roster.teams())
            .into_iter()
            .zip(values.iter().copied())
            .collect();
        Ok(Estimate {
            model: self.config.model,
            parameters,
            convergence,
            roster,
            values,
        })
    }
}

impl TryFrom<SolverConfig> for Estimator {
    type Error = ConfigError;

    fn try_from(config: SolverConfig) -> Result<Self, Self::Error> {
        config.validate()?;
        Ok(Self { config })
    }
}

/// Maps between the full parameter vector and the subset the search is free to move.
#[derive(Debug, Clone, Copy)]
struct FreeParams {
    model: ModelKind,
    layout: Layout,
}
impl FreeParams {
    fn reduce(&self, full: &[f64]) -> Vec<f64> {
        match self.model {
            ModelKind::DixonColes => full.to_vec(),
            ModelKind::Poisson => full
                .iter()
                .enumerate()
                .filter(|&(index, _)| index != self.layout.rho())
                .map(|(_, &value)| value)
                .collect(),
        }
    }

    fn expand(&self, free: &[f64], full: &mut [f64]) {
        match self.model {
            ModelKind::DixonColes => full.copy_from_slice(free),
            ModelKind::Poisson => {
                let rho = self.layout.rho();
                full[..rho].copy_from_slice(&free[..rho]);
                full[rho] = 0.0;
                full[rho + 1..].copy_from_slice(&free[rho..]);
            }
        }
    }
}

#[cfg(test)]
mod tests;
