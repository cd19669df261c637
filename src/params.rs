//! Layout of the flat parameter vector: an attack block, a defence block, then `rho` and the
//! home advantage `gamma`.

use tinyrand::Rand;

use crate::model::Strength;

pub const RHO: &str = "rho";
pub const HOME_ADV: &str = "home_adv";

/// Index arithmetic over a `2n + 2` parameter vector for `n` teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    teams: usize,
}
impl Layout {
    pub fn new(teams: usize) -> Self {
        Self { teams }
    }

    pub fn teams(&self) -> usize {
        self.teams
    }

    pub fn len(&self) -> usize {
        2 * self.teams + 2
    }

    #[inline]
    pub fn attack(&self, team: usize) -> usize {
        debug_assert!(team < self.teams);
        team
    }

    #[inline]
    pub fn defence(&self, team: usize) -> usize {
        debug_assert!(team < self.teams);
        self.teams + team
    }

    #[inline]
    pub fn rho(&self) -> usize {
        2 * self.teams
    }

    #[inline]
    pub fn home_adv(&self) -> usize {
        2 * self.teams + 1
    }

    #[inline]
    pub fn strength(&self, values: &[f64], team: usize) -> Strength {
        Strength {
            attack: values[self.attack(team)],
            defence: values[self.defence(team)],
        }
    }

    /// Shifts every attack by `c` and every defence by `−c` so that the mean attack equals
    /// `attack_mean`. All scoring rates, and hence the likelihood, are invariant under the shift.
    /// Only the leading attack and defence blocks of `values` are touched.
    pub fn normalise(&self, values: &mut [f64], attack_mean: f64) {
        debug_assert!(values.len() >= 2 * self.teams);
        let (attacks, rest) = values.split_at_mut(self.teams);
        let defences = &mut rest[..self.teams];
        let mean = attacks.iter().sum::<f64>() / self.teams as f64;
        let shift = attack_mean - mean;
        for attack in attacks {
            *attack += shift;
        }
        for defence in defences {
            *defence -= shift;
        }
    }

    /// Draws a starting vector: attacks from U(0, 1), defences from U(−1, 0), `rho` at 0 and the
    /// home advantage at 1.
    pub fn random(&self, rand: &mut impl Rand) -> Vec<f64> {
        let mut values = vec![0.0; self.len()];
        for team in 0..self.teams {
            values[self.attack(team)] = random_f64(rand);
            values[self.defence(team)] = -random_f64(rand);
        }
        values[self.rho()] = 0.0;
        values[self.home_adv()] = 1.0;
        values
    }

    /// Parameter names, in vector order, for the given team names.
    pub fn names(&self, teams: &[String]) -> Vec<String> {
        debug_assert_eq!(self.teams, teams.len());
        let mut names = Vec::with_capacity(self.len());
        names.extend(teams.iter().map(|team| format!("attack_{team}")));
        names.extend(teams.iter().map(|team| format!("defence_{team}")));
        names.push(RHO.to_string());
        names.push(HOME_ADV.to_string());
        names
    }
}

#[inline]
pub(crate) fn random_f64(rand: &mut impl Rand) -> f64 {
    rand.next_u64() as f64 / u64::MAX as f64
}
