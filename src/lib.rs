//! Maximum-likelihood estimation of team strengths from korfball results, using an independent
//! Poisson or a Dixon-Coles score model. Fitted models predict the score distribution of a fixture
//! and project the final standings of a league by Monte Carlo simulation.

pub mod csv;
pub mod data;
pub mod factorial;
pub mod file;
pub mod fit;
pub mod linear;
pub mod model;
pub mod objective;
pub mod opt;
pub mod params;
pub mod poisson;
pub mod print;
pub mod scoregrid;
pub mod season;
pub mod weight;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
