//! Joint distribution of full-time scores, and the probabilities of outcomes derived from it.

use serde::Serialize;
use strum_macros::Display;

use crate::factorial::{LnFactorial, Lookup};
use crate::linear::Matrix;
use crate::model::{self, Rates};
use crate::poisson;

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize)]
pub struct Score {
    pub home: u16,
    pub away: u16,
}
impl Score {
    pub fn new(home: u16, away: u16) -> Self {
        Self { home, away }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Display, Serialize)]
pub enum Side {
    Home,
    Away,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Outcome {
    Win(Side),
    Draw,
    /// Combined score strictly below the given total.
    GoalsUnder(u16),
    /// Combined score strictly above the given total.
    GoalsOver(u16),
    CorrectScore(Score),
}
impl Outcome {
    pub fn gather(&self, scoregrid: &Matrix) -> f64 {
        match self {
            Outcome::Win(side) => Self::gather_win(side, scoregrid),
            Outcome::Draw => Self::gather_draw(scoregrid),
            Outcome::GoalsUnder(goals) => Self::gather_goals_under(*goals, scoregrid),
            Outcome::GoalsOver(goals) => Self::gather_goals_over(*goals, scoregrid),
            Outcome::CorrectScore(score) => Self::gather_correct_score(score, scoregrid),
        }
    }

    fn gather_win(side: &Side, scoregrid: &Matrix) -> f64 {
        let mut prob = 0.0;
        match side {
            Side::Home => {
                for row in 1..scoregrid.rows() {
                    for col in 0..usize::min(row, scoregrid.cols()) {
                        prob += scoregrid[(row, col)];
                    }
                }
            }
            Side::Away => {
                for col in 1..scoregrid.cols() {
                    for row in 0..usize::min(col, scoregrid.rows()) {
                        prob += scoregrid[(row, col)];
                    }
                }
            }
        }
        prob
    }

    fn gather_draw(scoregrid: &Matrix) -> f64 {
        let mut prob = 0.0;
        for index in 0..usize::min(scoregrid.rows(), scoregrid.cols()) {
            prob += scoregrid[(index, index)];
        }
        prob
    }

    fn gather_goals_over(goals: u16, scoregrid: &Matrix) -> f64 {
        let goals = goals as usize;
        let mut prob = 0.0;
        for row in 0..scoregrid.rows() {
            for col in 0..scoregrid.cols() {
                if row + col > goals {
                    prob += scoregrid[(row, col)];
                }
            }
        }
        prob
    }

    fn gather_goals_under(goals: u16, scoregrid: &Matrix) -> f64 {
        let goals = goals as usize;
        let mut prob = 0.0;
        for row in 0..scoregrid.rows() {
            for col in 0..scoregrid.cols() {
                if row + col < goals {
                    prob += scoregrid[(row, col)];
                }
            }
        }
        prob
    }

    fn gather_correct_score(score: &Score, scoregrid: &Matrix) -> f64 {
        let (row, col) = (score.home as usize, score.away as usize);
        if row < scoregrid.rows() && col < scoregrid.cols() {
            scoregrid[(row, col)]
        } else {
            0.0
        }
    }
}

/// Score probabilities for one fixture, truncated at `max_score` goals per side.
#[derive(Clone, Debug)]
pub struct ScoreGrid {
    rates: Rates,
    rho: f64,
    matrix: Matrix,
}
impl ScoreGrid {
    /// Each cell is `tau · Poisson(home; λ) · Poisson(away; μ)`. Cells where the correction turns
    /// negative are clamped to zero.
    pub fn new(rates: &Rates, rho: f64, max_score: u16) -> Self {
        let size = max_score as usize + 1;
        let factorial = Lookup::default();
        let home_probs = marginal(rates.home, max_score, &factorial);
        let away_probs = marginal(rates.away, max_score, &factorial);
        let mut matrix = Matrix::allocate(size, size);
        for (home_score, &home_prob) in home_probs.iter().enumerate() {
            for (away_score, &away_prob) in away_probs.iter().enumerate() {
                let tau = model::tau(home_score as u16, away_score as u16, rates, rho);
                matrix[(home_score, away_score)] = f64::max(0.0, tau * home_prob * away_prob);
            }
        }
        Self {
            rates: *rates,
            rho,
            matrix,
        }
    }

    pub fn rates(&self) -> &Rates {
        &self.rates
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    pub fn max_score(&self) -> u16 {
        (self.matrix.rows() - 1) as u16
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Total probability captured by the grid; short of 1 by the truncated tails.
    pub fn mass(&self) -> f64 {
        self.matrix.flatten().iter().sum()
    }

    pub fn probability(&self, outcome: &Outcome) -> f64 {
        outcome.gather(&self.matrix)
    }

    /// Expected home and away scores over the grid.
    pub fn expectations(&self) -> (f64, f64) {
        let (mut home_expectation, mut away_expectation) = (0.0, 0.0);
        for home_score in 0..self.matrix.rows() {
            for away_score in 0..self.matrix.cols() {
                let prob = self.matrix[(home_score, away_score)];
                home_expectation += home_score as f64 * prob;
                away_expectation += away_score as f64 * prob;
            }
        }
        (home_expectation, away_expectation)
    }

    /// The single most probable score.
    pub fn mode(&self) -> Score {
        let (index, _) = self.matrix.flatten().iter().enumerate().fold(
            (0, f64::NEG_INFINITY),
            |(best_index, best_prob), (index, &prob)| {
                if prob > best_prob {
                    (index, prob)
                } else {
                    (best_index, best_prob)
                }
            },
        );
        let cols = self.matrix.cols();
        Score::new((index / cols) as u16, (index % cols) as u16)
    }
}

fn marginal(rate: f64, max_score: u16, factorial: &impl LnFactorial) -> Vec<f64> {
    (0..=max_score)
        .map(|score| poisson::univariate(score, rate, factorial))
        .collect()
}
