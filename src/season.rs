//! Monte Carlo simulation of the remainder of a season.

use anyhow::bail;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tinyrand::Rand;
use tracing::debug;

use crate::data::{MatchRecord, ValidationError};
use crate::fit::{ConfigError, Estimate};
use crate::params::random_f64;
use crate::scoregrid::{Score, ScoreGrid};

/// Competition points awarded per result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Points {
    pub win: u16,
    pub draw: u16,
    pub loss: u16,
}
impl Points {
    fn award(&self, scored: u16, conceded: u16) -> u16 {
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => self.win,
            std::cmp::Ordering::Equal => self.draw,
            std::cmp::Ordering::Less => self.loss,
        }
    }
}

impl Default for Points {
    fn default() -> Self {
        Self {
            win: 2,
            draw: 1,
            loss: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub trials: u64,
    /// Scores above this are not sampled.
    pub max_score: u16,
    pub points: Points,
}
impl SimulationConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.trials == 0 {
            bail!("at least one trial must be run");
        }
        if self.max_score == 0 {
            bail!("maximum score must be positive");
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: 10_000,
            max_score: 60,
            points: Points::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Running totals of one team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub points: u32,
    pub scored: u32,
    pub conceded: u32,
}
impl Tally {
    fn record(&mut self, scored: u16, conceded: u16, points: &Points) {
        self.points += points.award(scored, conceded) as u32;
        self.scored += scored as u32;
        self.conceded += conceded as u32;
    }

    pub fn goal_difference(&self) -> i64 {
        self.scored as i64 - self.conceded as i64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    pub team: String,
    /// Points already earned from played matches.
    pub points: u32,
    pub expected_points: f64,
    /// Probability of finishing in each position, from first to last.
    pub positions: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Season {
    pub trials: u64,
    /// Standings ordered by descending expected points.
    pub standings: Vec<Standing>,
}
impl Season {
    pub fn simulate(
        estimate: &Estimate,
        fixtures: &[(String, String)],
        config: &SimulationConfig,
        rand: &mut impl Rand,
    ) -> Result<Self, SimulationError> {
        Self::simulate_from(estimate, &[], fixtures, config, rand)
    }

    /// Simulates `fixtures` on top of the table produced by the `played` matches.
    pub fn simulate_from(
        estimate: &Estimate,
        played: &[MatchRecord],
        fixtures: &[(String, String)],
        config: &SimulationConfig,
        rand: &mut impl Rand,
    ) -> Result<Self, SimulationError> {
        config.validate().map_err(ConfigError::from)?;
        let roster = estimate.roster();
        let teams = roster.len();

        let mut base = vec![Tally::default(); teams];
        for record in played {
            let (home, away) = (roster.index_of(&record.home_team)?, roster.index_of(&record.away_team)?);
            base[home].record(record.home_score, record.away_score, &config.points);
            base[away].record(record.away_score, record.home_score, &config.points);
        }

        let samplers = fixtures
            .iter()
            .map(|(home_team, away_team)| {
                let grid = estimate.predict(home_team, away_team, config.max_score)?;
                Ok(FixtureSampler {
                    home: roster.index_of(home_team)?,
                    away: roster.index_of(away_team)?,
                    sampler: Sampler::from(&grid),
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;
        debug!(
            "simulating {} fixtures between {teams} teams over {} trials",
            samplers.len(),
            config.trials
        );

        let mut points_sum = vec![0u64; teams];
        let mut position_counts = vec![vec![0u64; teams]; teams];
        let mut tallies = base.clone();
        let mut order: Vec<usize> = (0..teams).collect();
        for _ in 0..config.trials {
            tallies.copy_from_slice(&base);
            for fixture in &samplers {
                let score = fixture.sampler.sample(rand);
                tallies[fixture.home].record(score.home, score.away, &config.points);
                tallies[fixture.away].record(score.away, score.home, &config.points);
            }
            rank(&tallies, &mut order);
            for (position, &team) in order.iter().enumerate() {
                position_counts[team][position] += 1;
                points_sum[team] += tallies[team].points as u64;
            }
        }

        let trials = config.trials as f64;
        let mut standings: Vec<_> = roster
            .teams()
            .iter()
            .enumerate()
            .map(|(team, name)| Standing {
                team: name.clone(),
                points: base[team].points,
                expected_points: points_sum[team] as f64 / trials,
                positions: position_counts[team]
                    .iter()
                    .map(|&count| count as f64 / trials)
                    .collect(),
            })
            .collect();
        standings.sort_by(|a, b| b.expected_points.total_cmp(&a.expected_points));
        Ok(Self {
            trials: config.trials,
            standings,
        })
    }
}

/// Orders team indices by points, then goal difference, then goals scored, all descending. Ties
/// fall back to the roster order, which is alphabetical.
fn rank(tallies: &[Tally], order: &mut [usize]) {
    for (index, team) in order.iter_mut().enumerate() {
        *team = index;
    }
    order.sort_by(|&a, &b| {
        let (a_tally, b_tally) = (&tallies[a], &tallies[b]);
        b_tally
            .points
            .cmp(&a_tally.points)
            .then_with(|| b_tally.goal_difference().cmp(&a_tally.goal_difference()))
            .then_with(|| b_tally.scored.cmp(&a_tally.scored))
            .then_with(|| a.cmp(&b))
    });
}

struct FixtureSampler {
    home: usize,
    away: usize,
    sampler: Sampler,
}

/// Inverse-CDF sampling over the flattened cells of a score grid.
struct Sampler {
    cumulative: Vec<f64>,
    cols: usize,
}
impl Sampler {
    fn sample(&self, rand: &mut impl Rand) -> Score {
        let total = self.cumulative[self.cumulative.len() - 1];
        let random = random_f64(rand) * total;
        let index = self
            .cumulative
            .partition_point(|&cumulative| cumulative < random)
            .min(self.cumulative.len() - 1);
        Score::new((index / self.cols) as u16, (index % self.cols) as u16)
    }
}

impl From<&ScoreGrid> for Sampler {
    fn from(grid: &ScoreGrid) -> Self {
        let mut sum = 0.0;
        let cumulative = grid
            .matrix()
            .flatten()
            .iter()
            .map(|&prob| {
                sum += prob;
                sum
            })
            .collect();
        Self {
            cumulative,
            cols: grid.matrix().cols(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;
    use tinyrand::{Seeded, StdRand};

    use super::*;
    use crate::fit::{Estimator, ModelKind, SolverConfig};
    use crate::model::Rates;
    use crate::testing::four_teams;

    fn fitted() -> Estimate {
        let estimator = Estimator::try_from(SolverConfig {
            model: ModelKind::Poisson,
            ..SolverConfig::default()
        })
        .unwrap();
        estimator.fit(&four_teams(), &mut StdRand::seed(42)).unwrap()
    }

    fn fixtures(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|&(home, away)| (home.to_string(), away.to_string()))
            .collect()
    }

    fn remaining() -> Vec<(String, String)> {
        fixtures(&[
            ("DVO", "Fortuna"),
            ("TOP", "PKC"),
            ("PKC", "DVO"),
            ("Fortuna", "TOP"),
        ])
    }

    #[test]
    fn probabilities_sum_to_one() {
        let estimate = fitted();
        let config = SimulationConfig {
            trials: 2_000,
            ..SimulationConfig::default()
        };
        let season = Season::simulate(&estimate, &remaining(), &config, &mut StdRand::seed(0)).unwrap();
        println!("season: {season:?}");
        assert_eq!(4, season.standings.len());
        for standing in &season.standings {
            assert_float_absolute_eq!(1.0, standing.positions.iter().sum::<f64>(), 1e-9);
        }
        for position in 0..4 {
            let sum: f64 = season.standings.iter().map(|standing| standing.positions[position]).sum();
            assert_float_absolute_eq!(1.0, sum, 1e-9);
        }
    }

    #[test]
    fn expected_points_total_equals_points_on_offer() {
        let estimate = fitted();
        let config = SimulationConfig {
            trials: 1_000,
            ..SimulationConfig::default()
        };
        let played = four_teams();
        let season =
            Season::simulate_from(&estimate, &played, &remaining(), &config, &mut StdRand::seed(1))
                .unwrap();
        let earned: u32 = season.standings.iter().map(|standing| standing.points).sum();
        assert_eq!(2 * 12, earned);
        let expected: f64 = season.standings.iter().map(|standing| standing.expected_points).sum();
        assert_float_absolute_eq!((2 * (12 + 4)) as f64, expected, 1e-9);
    }

    #[test]
    fn played_points_carried() {
        let estimate = fitted();
        let config = SimulationConfig {
            trials: 100,
            ..SimulationConfig::default()
        };
        let season =
            Season::simulate_from(&estimate, &four_teams(), &[], &config, &mut StdRand::seed(2)).unwrap();
        // Fortuna: five wins and a draw; nothing left to play
        let leader = &season.standings[0];
        assert_eq!("Fortuna", leader.team);
        assert_eq!(11, leader.points);
        assert_eq!(11.0, leader.expected_points);
        assert_eq!(1.0, leader.positions[0]);
    }

    #[test]
    fn reproducible_with_seed() {
        let estimate = fitted();
        let config = SimulationConfig {
            trials: 500,
            ..SimulationConfig::default()
        };
        let first = Season::simulate(&estimate, &remaining(), &config, &mut StdRand::seed(5)).unwrap();
        let second = Season::simulate(&estimate, &remaining(), &config, &mut StdRand::seed(5)).unwrap();
        for (first, second) in first.standings.iter().zip(&second.standings) {
            assert_eq!(first.team, second.team);
            assert_eq!(first.positions, second.positions);
        }
    }

    #[test]
    fn unknown_team_in_fixtures() {
        let estimate = fitted();
        let err = Season::simulate(
            &estimate,
            &fixtures(&[("DVO", "Ajax")]),
            &SimulationConfig::default(),
            &mut StdRand::seed(0),
        )
        .unwrap_err();
        assert!(
            matches!(err, SimulationError::Validation(ValidationError::UnknownTeam(ref team)) if team == "Ajax"),
            "{err:?}"
        );
    }

    #[test]
    fn zero_trials_rejected() {
        let estimate = fitted();
        let config = SimulationConfig {
            trials: 0,
            ..SimulationConfig::default()
        };
        let err = Season::simulate(&estimate, &remaining(), &config, &mut StdRand::seed(0)).unwrap_err();
        assert_eq!("at least one trial must be run", err.to_string());
    }

    #[test]
    fn rank_tiebreaks() {
        let tallies = [
            Tally { points: 4, scored: 40, conceded: 38 },
            Tally { points: 6, scored: 30, conceded: 35 },
            Tally { points: 4, scored: 42, conceded: 40 },
            Tally { points: 4, scored: 35, conceded: 30 },
            Tally { points: 4, scored: 40, conceded: 38 },
        ];
        let mut order = [0; 5];
        rank(&tallies, &mut order);
        assert_eq!([1, 3, 2, 0, 4], order);
    }

    #[test]
    fn sampler_matches_grid() {
        let grid = ScoreGrid::new(&Rates { home: 1.4, away: 0.8 }, 0.0, 12);
        let sampler = Sampler::from(&grid);
        let mut rand = StdRand::seed(9);
        const TRIALS: usize = 100_000;
        let mut nil_nil = 0;
        let mut home_total = 0;
        for _ in 0..TRIALS {
            let score = sampler.sample(&mut rand);
            if score == Score::new(0, 0) {
                nil_nil += 1;
            }
            home_total += score.home as usize;
        }
        assert_float_absolute_eq!(grid.matrix()[(0, 0)], nil_nil as f64 / TRIALS as f64, 0.01);
        assert_float_absolute_eq!(1.4, home_total as f64 / TRIALS as f64, 0.02);
    }
}
