//! Bounded Levenberg-Marquardt least squares.
//!
//! Minimizes `||r(p)||^2` over a box of parameter bounds: finite-difference
//! Jacobian, damped normal equations, and projection of each step onto the
//! bounds. The residual closure is fallible so that envelope domain
//! violations surface instead of poisoning the solve with NaNs.

use crate::error::Error;
use crate::fit::{EnvelopeKernel, EnvelopeParams, ParamBounds};
use crate::kernel::ConfigError;

use alloc::vec::Vec;

use nalgebra::{DMatrix, DVector};
use num_traits::Float;

/// Options for [`curve_fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFitOptions {
    /// Maximum solver iterations.
    pub max_iter: usize,
    /// Relative cost-decrease tolerance.
    pub f_tol: f64,
    /// Step-size tolerance.
    pub x_tol: f64,
    /// Gradient infinity-norm tolerance.
    pub g_tol: f64,
    /// Base step for the finite-difference Jacobian.
    pub fd_step: f64,
}

impl Default for CurveFitOptions {
    fn default() -> Self {
        Self {
            max_iter: 100,
            f_tol: 1e-8,
            x_tol: 1e-8,
            g_tol: 1e-8,
            fd_step: 1e-8,
        }
    }
}

fn norm(v: &[f64]) -> f64 {
    Float::sqrt(v.iter().map(|&x| x * x).sum())
}

/// Forward difference, flipped to backward at the active upper bound so the
/// probe never leaves the box.
fn jacobian_column<R>(
    residual: &R,
    x: &[f64],
    fx: &[f64],
    j: usize,
    upper: &[f64],
    fd_step: f64,
) -> Result<Vec<f64>, Error>
where
    R: Fn(&[f64]) -> Result<Vec<f64>, Error>,
{
    let h = fd_step * f64::max(Float::abs(x[j]), 1.0);
    let step = if x[j] + h <= upper[j] { h } else { -h };
    let mut probe = x.to_vec();
    probe[j] += step;
    let f_probe = residual(&probe)?;
    Ok(fx
        .iter()
        .zip(f_probe.iter())
        .map(|(&f0, &f1)| (f1 - f0) / step)
        .collect())
}

/// Bounded nonlinear least squares over a fallible residual closure.
///
/// `p0` must already lie inside the box; the solver never retries with a
/// different seed, window adjustment is the caller's recovery strategy.
/// Returns the fitted parameters or [`Error::FitConvergence`].
pub fn curve_fit<R>(
    residual: R,
    p0: &[f64],
    lower: &[f64],
    upper: &[f64],
    options: &CurveFitOptions,
) -> Result<Vec<f64>, Error>
where
    R: Fn(&[f64]) -> Result<Vec<f64>, Error>,
{
    let n = p0.len();
    if n == 0 || lower.len() != n || upper.len() != n {
        return Err(Error::Config(ConfigError::LengthMismatch {
            arg: "bounds",
            expected: n,
            got: lower.len().min(upper.len()),
        }));
    }
    let in_bounds = p0
        .iter()
        .zip(lower.iter().zip(upper.iter()))
        .all(|(&v, (&l, &u))| v >= l && v <= u);
    if !in_bounds {
        return Err(Error::FitConvergence { iterations: 0 });
    }

    let mut x = p0.to_vec();
    let mut fx = residual(&x)?;
    let mut cost: f64 = fx.iter().map(|&r| r * r).sum();

    let mut lambda = 1e-3;
    let lambda_up = 10.0;
    let lambda_down = 0.1;

    for _ in 0..options.max_iter {
        let mut columns = Vec::with_capacity(n);
        for j in 0..n {
            columns.push(jacobian_column(&residual, &x, &fx, j, upper, options.fd_step)?);
        }
        let m = fx.len();
        let jac = DMatrix::from_fn(m, n, |r, c| columns[c][r]);
        let jt = jac.transpose();
        let grad = &jt * DVector::from_column_slice(&fx);

        if grad.amax() < options.g_tol {
            return Ok(x);
        }

        let mut damped = &jt * &jac;
        for i in 0..n {
            damped[(i, i)] *= 1.0 + lambda;
            if damped[(i, i)] < f64::MIN_POSITIVE {
                damped[(i, i)] = f64::MIN_POSITIVE;
            }
        }

        let step = match damped.lu().solve(&(-&grad)) {
            Some(dx) => dx,
            None => {
                lambda *= lambda_up;
                continue;
            }
        };

        let x_new: Vec<f64> = x
            .iter()
            .zip(step.iter())
            .enumerate()
            .map(|(i, (&xi, &di))| (xi + di).clamp(lower[i], upper[i]))
            .collect();

        // A trial point outside the model's domain is a rejected step, not
        // a hard failure.
        let fx_new = match residual(&x_new) {
            Ok(r) => r,
            Err(Error::FittingDomain { .. }) => {
                lambda *= lambda_up;
                continue;
            }
            Err(err) => return Err(err),
        };
        let cost_new: f64 = fx_new.iter().map(|&r| r * r).sum();

        if cost_new <= cost {
            let moved: Vec<f64> = x_new.iter().zip(x.iter()).map(|(a, b)| a - b).collect();
            let small_step = norm(&moved) < options.x_tol * (norm(&x) + options.x_tol);
            let small_decrease = cost - cost_new <= options.f_tol * f64::max(cost, options.f_tol);

            x = x_new;
            fx = fx_new;
            cost = cost_new;
            lambda = f64::max(lambda * lambda_down, 1e-12);

            if small_step || small_decrease {
                return Ok(x);
            }
        } else {
            lambda = f64::min(lambda * lambda_up, 1e10);
        }
    }

    Err(Error::FitConvergence {
        iterations: options.max_iter,
    })
}

/// Fit envelope parameters through `(t, y)` samples inside `bounds`.
///
/// This is the warm-start path used by the window resolver: `p0` carries the
/// previous window's parameters.
pub fn fit_envelope(
    model: &EnvelopeKernel,
    t: &[f64],
    y: &[f64],
    p0: &EnvelopeParams,
    bounds: &ParamBounds,
    options: &CurveFitOptions,
) -> Result<EnvelopeParams, Error> {
    if t.len() != y.len() {
        return Err(Error::Config(ConfigError::LengthMismatch {
            arg: "y",
            expected: t.len(),
            got: y.len(),
        }));
    }
    if t.is_empty() {
        return Err(Error::Config(ConfigError::EmptyInput { arg: "t" }));
    }

    let residual = |p: &[f64]| -> Result<Vec<f64>, Error> {
        let params = EnvelopeParams::from_slice(p);
        let trend = model.evaluate(t, &params)?;
        Ok(trend.iter().zip(y.iter()).map(|(&m, &v)| m - v).collect())
    };

    let fitted = curve_fit(
        residual,
        &p0.to_array(),
        &bounds.lower.to_array(),
        &bounds.upper.to_array(),
        options,
    )?;
    Ok(EnvelopeParams::from_slice(&fitted))
}
