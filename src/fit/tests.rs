use assert_float_eq::*;
use std::str::FromStr;
use tinyrand::{Seeded, StdRand};

use super::*;
use crate::testing::{four_teams, two_teams};

fn poisson_config() -> SolverConfig {
    SolverConfig {
        model: ModelKind::Poisson,
        ..SolverConfig::default()
    }
}

fn mean_attack(estimate: &Estimate) -> f64 {
    let teams = estimate.roster().teams();
    teams
        .iter()
        .map(|team| estimate.strength(team).unwrap().attack)
        .sum::<f64>()
        / teams.len() as f64
}

#[test]
fn two_teams_stronger_attack_for_higher_scorer() {
    let estimator = Estimator::try_from(poisson_config()).unwrap();
    // symmetric start: equal attacks, equal defences
    let estimate = estimator
        .fit_from(&two_teams(), &[1.0, 1.0, 0.0, 0.0, 0.0, 0.1])
        .unwrap();
    println!("estimate: {estimate:?}");
    assert!(estimate.convergence.converged, "{:?}", estimate.convergence);
    let (a, b) = (estimate.strength("A").unwrap(), estimate.strength("B").unwrap());
    assert!(a.attack > b.attack, "{a:?} vs {b:?}");
    assert_float_absolute_eq!(1.0, mean_attack(&estimate), 1e-9);
    assert_eq!(0.0, estimate.rho());

    // the pooled home and away totals pin down the home advantage: e^γ = 38 / 31
    assert_float_absolute_eq!(f64::ln(38.0 / 31.0), estimate.home_adv(), 1e-3);
    assert!(estimate.convergence.objective <= estimate.convergence.initial_objective);
}

#[test]
fn two_teams_rates_reproduce_totals() {
    let estimator = Estimator::try_from(poisson_config()).unwrap();
    let estimate = estimator
        .fit_from(&two_teams(), &[1.0, 1.0, 0.0, 0.0, 0.0, 0.1])
        .unwrap();
    let a_home = estimate.rates("A", "B").unwrap();
    let b_home = estimate.rates("B", "A").unwrap();
    // at the optimum, expected and observed goal totals agree
    assert_float_relative_eq!(38.0, a_home.home + b_home.home, 1e-3);
    assert_float_relative_eq!(31.0, a_home.away + b_home.away, 1e-3);
    assert_float_relative_eq!(36.0, a_home.home + b_home.away, 1e-3);
    assert_float_relative_eq!(33.0, b_home.home + a_home.away, 1e-3);
}

#[test]
fn four_teams_dixon_coles() {
    let estimator = Estimator::try_from(SolverConfig::default()).unwrap();
    let estimate = estimator.fit(&four_teams(), &mut StdRand::seed(42)).unwrap();
    println!("estimate: {estimate:?}");
    assert!(estimate.convergence.converged, "{:?}", estimate.convergence);
    assert!(estimate.convergence.objective <= estimate.convergence.initial_objective);
    assert_float_absolute_eq!(1.0, mean_attack(&estimate), 1e-9);
    assert_eq!(2 * 4 + 2, estimate.parameters.len());
    assert_eq!(estimate.rho(), estimate.parameters["rho"]);
    assert_eq!(estimate.home_adv(), estimate.parameters["home_adv"]);
    assert_eq!(
        estimate.strength("PKC").unwrap().defence,
        estimate.parameters["defence_PKC"]
    );

    // Fortuna is unbeaten; DVO is winless
    let fortuna = estimate.strength("Fortuna").unwrap();
    let dvo = estimate.strength("DVO").unwrap();
    assert!(fortuna.attack > dvo.attack, "{fortuna:?} vs {dvo:?}");
}

#[test]
fn four_teams_reproducible_with_seed() {
    let estimator = Estimator::try_from(SolverConfig::default()).unwrap();
    let first = estimator.fit(&four_teams(), &mut StdRand::seed(7)).unwrap();
    let second = estimator.fit(&four_teams(), &mut StdRand::seed(7)).unwrap();
    assert_eq!(first.values(), second.values());
}

#[test]
fn poisson_holds_rho_at_zero() {
    let estimator = Estimator::try_from(poisson_config()).unwrap();
    let estimate = estimator.fit(&four_teams(), &mut StdRand::seed(3)).unwrap();
    assert!(estimate.convergence.converged, "{:?}", estimate.convergence);
    assert_eq!(0.0, estimate.rho());
    assert_eq!(ModelKind::Poisson, estimate.model);
}

#[test]
fn time_weighted_fit() {
    let uniform = Estimator::try_from(poisson_config())
        .unwrap()
        .fit(&four_teams(), &mut StdRand::seed(11))
        .unwrap();
    let weighted = Estimator::try_from(SolverConfig {
        xi: 0.05,
        ..poisson_config()
    })
    .unwrap()
    .fit(&four_teams(), &mut StdRand::seed(11))
    .unwrap();
    assert!(weighted.convergence.converged, "{:?}", weighted.convergence);
    // down-weighting the older matches lowers the objective's magnitude
    assert!(weighted.convergence.objective < uniform.convergence.objective);
    assert_ne!(uniform.values(), weighted.values());
}

#[test]
fn time_weighted_fit_requires_dates() {
    let estimator = Estimator::try_from(SolverConfig {
        xi: 0.01,
        ..SolverConfig::default()
    })
    .unwrap();
    let err = estimator.fit(&two_teams(), &mut StdRand::seed(0)).unwrap_err();
    assert!(
        matches!(err, FitError::Validation(ValidationError::MissingDate { index: 0, .. })),
        "{err:?}"
    );
}

#[test]
fn unbalanced_roster() {
    let records = vec![
        MatchRecord::new("A", 20, "B", 15),
        MatchRecord::new("C", 18, "A", 16),
    ];
    let estimator = Estimator::try_from(SolverConfig::default()).unwrap();
    let err = estimator.fit(&records, &mut StdRand::seed(0)).unwrap_err();
    let FitError::Validation(err) = err else {
        panic!("unexpected {err:?}");
    };
    assert_eq!(
        ValidationError::UnbalancedRoster {
            home_only: vec!["C".to_string()],
            away_only: vec!["B".to_string()],
        },
        err
    );
}

#[test]
fn initial_values_of_wrong_length() {
    let estimator = Estimator::try_from(SolverConfig::default()).unwrap();
    let err = estimator.fit_from(&two_teams(), &[1.0, 1.0, 0.0]).unwrap_err();
    assert_eq!(
        "expected 6 finite initial values, got [1.0, 1.0, 0.0]",
        err.to_string()
    );
}

#[test]
fn rates_for_unknown_or_same_team() {
    let estimator = Estimator::try_from(poisson_config()).unwrap();
    let estimate = estimator
        .fit_from(&two_teams(), &[1.0, 1.0, 0.0, 0.0, 0.0, 0.1])
        .unwrap();
    assert_eq!(
        ValidationError::UnknownTeam("C".to_string()),
        estimate.rates("A", "C").unwrap_err()
    );
    assert_eq!(
        ValidationError::SelfMatch {
            home_team: "A".to_string()
        },
        estimate.rates("A", "A").unwrap_err()
    );
}

#[test]
fn invalid_config() {
    let config = SolverConfig {
        xi: -0.1,
        ..SolverConfig::default()
    };
    assert!(Estimator::try_from(config).is_err());
    let config = SolverConfig {
        attack_mean: f64::NAN,
        ..SolverConfig::default()
    };
    assert_eq!(
        "attack mean (NaN) must be finite",
        Estimator::try_from(config).err().unwrap().to_string()
    );
}

#[test]
fn model_kind_from_str() {
    assert_eq!(ModelKind::DixonColes, ModelKind::from_str("dc").unwrap());
    assert_eq!(ModelKind::DixonColes, ModelKind::from_str("Dixon_Coles").unwrap());
    assert_eq!(ModelKind::Poisson, ModelKind::from_str("poisson").unwrap());
    assert_eq!(ModelKind::Poisson, ModelKind::from_str("bp").unwrap());
    assert!(ModelKind::from_str("negbin").is_err());
    assert_eq!("dc", ModelKind::DixonColes.to_string());
}

#[test]
fn config_from_partial_json() {
    let config: SolverConfig = serde_json::from_str(r#"{"model": "poisson", "xi": 0.002}"#).unwrap();
    assert_eq!(ModelKind::Poisson, config.model);
    assert_eq!(0.002, config.xi);
    assert_eq!(SolverConfig::default().max_iterations, config.max_iterations);
}

#[test]
fn predict_uses_fitted_rates() {
    let estimator = Estimator::try_from(SolverConfig::default()).unwrap();
    let estimate = estimator.fit(&four_teams(), &mut StdRand::seed(42)).unwrap();
    let grid = estimate.predict("Fortuna", "DVO", 60).unwrap();
    assert_eq!(&estimate.rates("Fortuna", "DVO").unwrap(), grid.rates());
    assert_eq!(estimate.rho(), grid.rho());
    assert_float_absolute_eq!(1.0, grid.mass(), 1e-6);
    assert!(estimate.predict("Fortuna", "Ajax", 60).is_err());
}
