//! Multivariate minimisation.

use anyhow::bail;
use serde::Serialize;
use strum_macros::Display;
use tracing::{debug, trace};

use crate::linear::{dot, Matrix};

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO: f64 = 1e-4;

const MAX_BACKTRACKS: usize = 60;

/// Cube root of machine epsilon: the relative step of a central difference.
const DIFF_STEP: f64 = 6.055454452393343e-6;

#[derive(Clone, Debug)]
pub struct BfgsConfig {
    pub max_iterations: u64,
    /// Stop once an iteration reduces the loss by no more than this fraction of its magnitude.
    pub tolerance: f64,
    /// Stop once no component of the gradient exceeds this magnitude.
    pub gradient_tolerance: f64,
}
impl BfgsConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_iterations == 0 {
            bail!("at least one iteration must be allowed")
        }
        if !(self.tolerance >= 0.0) {
            bail!("tolerance must be non-negative")
        }
        if !(self.gradient_tolerance >= 0.0) {
            bail!("gradient tolerance must be non-negative")
        }
        Ok(())
    }
}

impl Default for BfgsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            tolerance: 1e-10,
            gradient_tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The gradient vanished to within tolerance.
    Gradient,
    /// Successive losses agreed to within tolerance.
    Tolerance,
    /// Not even a steepest-descent step reduced the loss.
    Stalled,
    /// The iteration budget ran out.
    MaxIterations,
}

#[derive(Debug)]
pub struct BfgsOutcome {
    pub iterations: u64,
    pub optimal_values: Vec<f64>,
    pub optimal_residual: f64,
    pub termination: Termination,
}
impl BfgsOutcome {
    pub fn converged(&self) -> bool {
        self.termination != Termination::MaxIterations
    }
}

/// Quasi-Newton (BFGS) minimisation of `loss_f` with central-difference gradients and a
/// backtracking line search.
///
/// `project_f` is applied to the initial values and to every trial point. It must not change the
/// loss; it exists to pin down directions along which the loss is flat.
pub fn bfgs(
    config: &BfgsConfig,
    init_values: Vec<f64>,
    mut project_f: impl FnMut(&mut [f64]),
    mut loss_f: impl FnMut(&[f64]) -> f64,
) -> Result<BfgsOutcome, anyhow::Error> {
    config.validate()?;
    if init_values.is_empty() {
        bail!("at least one search dimension must be specified")
    }

    let dimensions = init_values.len();
    let mut values = init_values;
    project_f(&mut values);
    let mut residual = loss_f(&values);
    if !residual.is_finite() {
        bail!("loss at the initial values is not finite ({residual})")
    }

    let mut scratch = vec![0.0; dimensions];
    let mut gradient = vec![0.0; dimensions];
    central_difference(&mut loss_f, &values, &mut scratch, &mut gradient);

    let mut inv_hessian = Matrix::identity(dimensions);
    let mut is_identity = true;
    let mut direction = vec![0.0; dimensions];
    let mut new_values = vec![0.0; dimensions];
    let mut new_gradient = vec![0.0; dimensions];
    let (mut s, mut y, mut hy) = (
        vec![0.0; dimensions],
        vec![0.0; dimensions],
        vec![0.0; dimensions],
    );

    let mut iterations = 0;
    let termination = loop {
        if inf_norm(&gradient) <= config.gradient_tolerance {
            break Termination::Gradient;
        }
        if iterations == config.max_iterations {
            break Termination::MaxIterations;
        }
        iterations += 1;

        inv_hessian.mul_vec(&gradient, &mut direction);
        negate(&mut direction);
        let mut slope = dot(&gradient, &direction);
        if !(slope < 0.0) {
            trace!("not a descent direction (slope {slope}); resetting to steepest descent");
            inv_hessian.set_identity();
            is_identity = true;
            direction.copy_from_slice(&gradient);
            negate(&mut direction);
            slope = -dot(&gradient, &gradient);
        }

        let mut step = 1.0;
        let mut new_residual = f64::NAN;
        let mut accepted = false;
        for _ in 0..MAX_BACKTRACKS {
            for (index, new_value) in new_values.iter_mut().enumerate() {
                *new_value = values[index] + step * direction[index];
            }
            project_f(&mut new_values);
            new_residual = loss_f(&new_values);
            trace!("step: {step}, new_residual: {new_residual}");
            if new_residual.is_finite() && new_residual <= residual + ARMIJO * step * slope {
                accepted = true;
                break;
            }
            step *= 0.5;
        }

        if !accepted {
            if is_identity {
                break Termination::Stalled;
            }
            debug!("line search failed at iteration {iterations}; resetting to steepest descent");
            inv_hessian.set_identity();
            is_identity = true;
            continue;
        }

        central_difference(&mut loss_f, &new_values, &mut scratch, &mut new_gradient);
        for index in 0..dimensions {
            s[index] = new_values[index] - values[index];
            y[index] = new_gradient[index] - gradient[index];
        }
        let decrease = residual - new_residual;
        let scale = f64::max(f64::max(residual.abs(), new_residual.abs()), 1.0);
        debug!(
            "iteration: {iterations}, residual: {new_residual}, step: {step}, gradient: {:e}",
            inf_norm(&new_gradient)
        );
        values.copy_from_slice(&new_values);
        gradient.copy_from_slice(&new_gradient);
        residual = new_residual;

        let sy = dot(&s, &y);
        if sy > f64::EPSILON * dot(&y, &y).sqrt() * dot(&s, &s).sqrt() {
            if is_identity {
                // scale the initial approximation to the curvature just observed
                let yy = dot(&y, &y);
                for diagonal in 0..dimensions {
                    inv_hessian[(diagonal, diagonal)] = sy / yy;
                }
            }
            update_inv_hessian(&mut inv_hessian, &s, &y, sy, &mut hy);
            is_identity = false;
        }

        if decrease <= config.tolerance * scale {
            break Termination::Tolerance;
        }
    };

    debug!("terminated after {iterations} iterations: {termination}, residual: {residual}");
    Ok(BfgsOutcome {
        iterations,
        optimal_values: values,
        optimal_residual: residual,
        termination,
    })
}

/// `H ← (I − ρ s yᵀ) H (I − ρ y sᵀ) + ρ s sᵀ`, with `ρ = 1 / sᵀy`, expanded so as not to allocate.
fn update_inv_hessian(inv_hessian: &mut Matrix, s: &[f64], y: &[f64], sy: f64, hy: &mut [f64]) {
    let rho = 1.0 / sy;
    inv_hessian.mul_vec(y, hy);
    let yhy = dot(y, hy);
    let ss_coefficient = rho * rho * yhy + rho;
    for row in 0..s.len() {
        for col in 0..s.len() {
            inv_hessian[(row, col)] +=
                ss_coefficient * s[row] * s[col] - rho * (hy[row] * s[col] + s[row] * hy[col]);
        }
    }
}

/// Central-difference approximation of the gradient of `loss_f` at `values`.
pub fn central_difference(
    loss_f: &mut impl FnMut(&[f64]) -> f64,
    values: &[f64],
    scratch: &mut [f64],
    gradient: &mut [f64],
) {
    scratch.copy_from_slice(values);
    for (index, &value) in values.iter().enumerate() {
        let step = DIFF_STEP * f64::max(value.abs(), 1.0);
        let (upper, lower) = (value + step, value - step);
        scratch[index] = upper;
        let upper_residual = loss_f(scratch);
        scratch[index] = lower;
        let lower_residual = loss_f(scratch);
        scratch[index] = value;
        gradient[index] = (upper_residual - lower_residual) / (upper - lower);
    }
}

#[inline]
fn inf_norm(vector: &[f64]) -> f64 {
    vector.iter().fold(0.0, |norm, element| f64::max(norm, element.abs()))
}

#[inline]
fn negate(vector: &mut [f64]) {
    for element in vector {
        *element = -*element;
    }
}
