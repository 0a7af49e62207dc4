//! Windowed iterative extremum resolution.
//!
//! A resolution starts from a reference index and a warm-started envelope,
//! then alternates two refinements until they agree: the data window is
//! grown or shrunk (in units of orbital phase) until it holds exactly the
//! requested number of trend-subtracted extrema on each side of the
//! reference, and the envelope is refit through the extrema found so far.
//! Near the end of the data the right-side target is allowed to fall short
//! by exactly one extremum, which is the end-of-data signal for the outer
//! sequence walk.

use crate::error::Error;
use crate::extrema::sequence::ExtremaType;
use crate::extrema::series::{Series, PHASE_PER_ORBIT};
use crate::fit::{fit_envelope, CurveFitOptions, EnvelopeKernel, EnvelopeParams, ParamBounds};
use crate::kernel::{ConfigError, KernelLifecycle};
use crate::signal::peak::{find_peaks, FindPeaksOptions};

use alloc::vec::Vec;

use num_traits::Float;

/// Window widening margin, in radial periods, applied past the outermost
/// extremum already found on a short side.
const WIDEN_MARGIN_PERIODS: f64 = 1.5;

/// Constructor config for [`WindowResolver`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    /// Extrema required strictly before the reference index.
    pub n_before: usize,
    /// Extrema required at or after the reference index.
    pub n_after: usize,
    /// Convergence tolerance on the extremum frequency values.
    pub tol: f64,
    /// Allow the reference index to advance when the data starts too late
    /// to seat `n_before` extrema on the left.
    pub advance_idx_ref: bool,
    /// Cap on window-correction passes.
    pub max_window_passes: usize,
    /// Cap on envelope refit passes.
    pub max_fit_passes: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            n_before: 4,
            n_after: 3,
            tol: 1e-8,
            advance_idx_ref: true,
            max_window_passes: 10,
            max_fit_passes: 100,
        }
    }
}

/// Warm-start state carried between consecutive window resolutions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSeed {
    /// Anchor index around which extrema are sought.
    pub idx_ref: usize,
    /// Current periastron-advance estimate, phase per extremum in units of
    /// one orbit.
    pub k: f64,
    /// Current envelope parameters.
    pub params: EnvelopeParams,
}

/// A stabilized window of extrema.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Strictly increasing extremum indices into the full series.
    pub idx_extrema: Vec<usize>,
    /// Envelope parameters that produced the extrema by trend subtraction.
    pub params: EnvelopeParams,
    /// Updated periastron-advance estimate.
    pub k: f64,
    /// Final (possibly advanced) reference index.
    pub idx_ref: usize,
}

/// Outcome of one resolution pass, routed by the resolution loop.
enum StepOutcome {
    /// Counts and frequencies are stable at the full target size.
    Converged(Vec<usize>),
    /// Stable, but one extremum short on the right at the series end.
    EndOfData(Vec<usize>),
    /// A window bound moved; extrema must be re-detected.
    WindowChanged,
    /// Counts match but the envelope fit has not settled yet.
    Refit,
}

struct ResolveState {
    idx_lo: usize,
    idx_hi: usize,
    idx_ref: usize,
    k: f64,
    params: EnvelopeParams,
    prev_omega: Option<Vec<f64>>,
    prev_window: (usize, usize),
    window_changed_at: usize,
    pass_idx: usize,
}

/// Iterative window/fit resolver for one extrema window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowResolver {
    config: ResolverConfig,
}

impl KernelLifecycle for WindowResolver {
    type Config = ResolverConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.n_before == 0 || config.n_after == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "n_before/n_after",
                reason: "extremum targets must be at least one per side",
            });
        }
        if !(config.tol > 0.0) || !config.tol.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "tol",
                reason: "tolerance must be positive and finite",
            });
        }
        if config.max_window_passes == 0 || config.max_fit_passes == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "max_window_passes/max_fit_passes",
                reason: "iteration caps must be at least one",
            });
        }
        Ok(Self { config })
    }
}

impl WindowResolver {
    /// Resolve one window of extrema around `seed.idx_ref`.
    ///
    /// Returns the stabilized extrema together with the refit envelope, the
    /// updated periastron-advance estimate, and the (never decreased)
    /// reference index. The extrema set has `n_before + n_after` entries,
    /// or one fewer when the series ends before the last right-side
    /// extremum.
    pub fn resolve(
        &self,
        series: &Series,
        env: &EnvelopeKernel,
        bounds: &ParamBounds,
        fit_options: &CurveFitOptions,
        extrema_type: ExtremaType,
        seed: ResolverSeed,
    ) -> Result<Resolution, Error> {
        if seed.idx_ref >= series.len() {
            return Err(Error::Config(ConfigError::InvalidArgument {
                arg: "idx_ref",
                reason: "reference index is out of range",
            }));
        }
        let cfg = &self.config;
        let phase = series.phase();
        let delta = PHASE_PER_ORBIT * seed.k;

        let mut state = ResolveState {
            idx_lo: series
                .first_index_phase_above(phase[seed.idx_ref] - delta * cfg.n_before as f64)
                .unwrap_or(0),
            idx_hi: series
                .first_index_phase_above(phase[seed.idx_ref] + delta * cfg.n_after as f64)
                .unwrap_or(series.len()),
            idx_ref: seed.idx_ref,
            k: seed.k,
            params: seed.params,
            prev_omega: None,
            prev_window: (usize::MAX, usize::MAX),
            window_changed_at: 0,
            pass_idx: 0,
        };

        let mut window_passes = 0;
        let mut fit_passes = 0;
        loop {
            state.pass_idx += 1;
            match self.pass(series, env, bounds, fit_options, extrema_type, &mut state)? {
                StepOutcome::Converged(idx_extrema) | StepOutcome::EndOfData(idx_extrema) => {
                    return Ok(Resolution {
                        idx_extrema,
                        params: state.params,
                        k: state.k,
                        idx_ref: state.idx_ref,
                    });
                }
                StepOutcome::WindowChanged => {
                    window_passes += 1;
                    if window_passes > cfg.max_window_passes {
                        return Err(Error::WindowStall {
                            iterations: window_passes,
                        });
                    }
                }
                StepOutcome::Refit => {
                    fit_passes += 1;
                    if fit_passes > cfg.max_fit_passes {
                        return Err(Error::ResolverNonConvergence {
                            iterations: fit_passes,
                        });
                    }
                }
            }
        }
    }

    /// One detect/correct/check pass over the current window.
    fn pass(
        &self,
        series: &Series,
        env: &EnvelopeKernel,
        bounds: &ParamBounds,
        fit_options: &CurveFitOptions,
        extrema_type: ExtremaType,
        state: &mut ResolveState,
    ) -> Result<StepOutcome, Error> {
        let cfg = &self.config;
        let t = series.t();
        let phase = series.phase();
        let omega = series.omega();
        let sign = extrema_type.sign();

        if state.idx_lo >= state.idx_hi {
            return Err(Error::WindowStall {
                iterations: state.pass_idx,
            });
        }

        let trend = env.evaluate(&t[state.idx_lo..state.idx_hi], &state.params)?;
        let residual: Vec<f64> = omega[state.idx_lo..state.idx_hi]
            .iter()
            .zip(trend.iter())
            .map(|(&w, &m)| sign * (w - m))
            .collect();
        let peaks: Vec<usize> = find_peaks(&residual, FindPeaksOptions::default())
            .into_iter()
            .map(|i| i + state.idx_lo)
            .collect();

        if peaks.len() >= 2 {
            let span = phase[*peaks.last().unwrap()] - phase[peaks[0]];
            state.k = span / (PHASE_PER_ORBIT * (peaks.len() - 1) as f64);
        }

        let n_left = peaks.partition_point(|&i| i < state.idx_ref);
        let mut n_right = peaks.len() - n_left;

        if n_left != cfg.n_before || n_right != cfg.n_after {
            if n_left > cfg.n_before {
                // drop the excess by moving the bound between the last
                // discarded and first kept extremum
                let excess = n_left - cfg.n_before;
                state.idx_lo = (peaks[excess - 1] + peaks[excess]) / 2;
            } else if n_left < cfg.n_before {
                if state.idx_lo == 0 {
                    if !cfg.advance_idx_ref {
                        return Err(Error::InsufficientLeftExtrema {
                            idx_ref: state.idx_ref,
                            target: cfg.n_before,
                        });
                    }
                    if n_right >= 2 {
                        // shift the reference one extremum to the right;
                        // the decremented right count steers the widening
                        // below in the same pass
                        state.idx_ref = (peaks[n_left] + peaks[n_left + 1]) / 2;
                        n_right -= 1;
                    }
                    // with fewer than two right extrema, let the right-side
                    // widening run first and come back here
                } else {
                    let first = *peaks.first().ok_or(Error::WindowStall {
                        iterations: state.pass_idx,
                    })?;
                    let phase_lo =
                        phase[first] - state.k * PHASE_PER_ORBIT * WIDEN_MARGIN_PERIODS;
                    state.idx_lo = series.first_index_phase_above(phase_lo).unwrap_or(0);
                }
            }

            if n_right > cfg.n_after {
                let excess = n_right - cfg.n_after;
                let boundary = peaks.len() - excess;
                state.idx_hi = (peaks[boundary - 1] + peaks[boundary]) / 2;
            } else if n_right < cfg.n_after {
                if state.idx_hi < series.len() {
                    let last = *peaks.last().ok_or(Error::WindowStall {
                        iterations: state.pass_idx,
                    })?;
                    let phase_hi =
                        phase[last] + state.k * PHASE_PER_ORBIT * WIDEN_MARGIN_PERIODS;
                    state.idx_hi = series
                        .first_index_phase_above(phase_hi)
                        .unwrap_or(series.len());
                } else if n_right + 1 < cfg.n_after {
                    // two or more short with the window fully extended: one
                    // extra refit pass is granted right after a window
                    // change, in case the new fit surfaces another extremum
                    let window_stable = (state.idx_lo, state.idx_hi) == state.prev_window
                        && state.pass_idx > state.window_changed_at + 1;
                    if window_stable {
                        return Err(Error::InsufficientRightExtrema {
                            idx_ref: state.idx_ref,
                            target: cfg.n_after,
                            found: n_right,
                        });
                    }
                }
                // exactly one short at the series end falls through as the
                // end-of-data signal
            }

            if (state.idx_lo, state.idx_hi) != state.prev_window {
                state.window_changed_at = state.pass_idx;
                state.prev_window = (state.idx_lo, state.idx_hi);
                return Ok(StepOutcome::WindowChanged);
            }
        }

        if peaks.is_empty() {
            return Err(Error::WindowStall {
                iterations: state.pass_idx,
            });
        }

        let omega_now: Vec<f64> = peaks.iter().map(|&i| omega[i]).collect();
        let converged = match state.prev_omega.as_ref() {
            Some(prev) if prev.len() == omega_now.len() => {
                let worst = prev
                    .iter()
                    .zip(omega_now.iter())
                    .map(|(&a, &b)| Float::abs(a - b))
                    .fold(0.0, f64::max);
                worst < cfg.tol
            }
            // extrema count changed near the series end, or first pass
            _ => false,
        };
        if converged {
            return Ok(if peaks.len() == cfg.n_before + cfg.n_after {
                StepOutcome::Converged(peaks)
            } else {
                StepOutcome::EndOfData(peaks)
            });
        }

        let t_peaks: Vec<f64> = peaks.iter().map(|&i| t[i]).collect();
        state.params = fit_envelope(env, &t_peaks, &omega_now, &state.params, bounds, fit_options)?;
        state.prev_omega = Some(omega_now);
        Ok(StepOutcome::Refit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extrema::testutil::{analytic_extrema_indices, inspiral, inspiral_bounds};
    use crate::fit::EnvelopeConfig;

    fn resolver(advance: bool) -> WindowResolver {
        WindowResolver::try_new(ResolverConfig {
            advance_idx_ref: advance,
            ..Default::default()
        })
        .expect("valid config")
    }

    #[test]
    fn config_validation_rejects_degenerate_targets() {
        let err = WindowResolver::try_new(ResolverConfig {
            n_after: 0,
            ..Default::default()
        })
        .expect_err("zero target");
        assert!(matches!(err, ConfigError::InvalidArgument { .. }));
    }

    #[test]
    fn mid_series_window_matches_analytic_extrema() {
        let syn = inspiral(2000, 0.1);
        let series = &syn.series;
        let env = EnvelopeKernel::try_new(EnvelopeConfig { t0: syn.t_mid }).expect("kernel");
        let bounds = inspiral_bounds(series);

        let idx_ref = series.len() / 2;
        let res = resolver(true)
            .resolve(
                series,
                &env,
                &bounds,
                &CurveFitOptions::default(),
                ExtremaType::Maxima,
                ResolverSeed {
                    idx_ref,
                    k: 1.2,
                    params: syn.trend_params,
                },
            )
            .expect("resolution");

        assert_eq!(res.idx_extrema.len(), 7);
        assert!(res.idx_extrema.windows(2).all(|w| w[1] > w[0]));
        assert!(res.idx_ref >= idx_ref);
        // periastron advance of the synthetic series is exactly one orbit
        assert!((res.k - 1.0).abs() < 0.05);

        let analytic = analytic_extrema_indices(series, ExtremaType::Maxima);
        for &idx in &res.idx_extrema {
            let nearest = analytic
                .iter()
                .map(|&a| (a as i64 - idx as i64).abs())
                .min()
                .expect("analytic extrema exist");
            assert!(nearest <= 3, "extremum {idx} off by {nearest} samples");
        }
    }

    #[test]
    fn early_reference_fails_without_advance_permission() {
        let syn = inspiral(2000, 0.1);
        let series = &syn.series;
        let env = EnvelopeKernel::try_new(EnvelopeConfig { t0: syn.t_mid }).expect("kernel");
        let bounds = inspiral_bounds(series);

        // one orbit into the data, far fewer than four maxima to the left
        let idx_ref = series
            .first_index_phase_above(series.phase()[0] + PHASE_PER_ORBIT)
            .expect("in range");
        let err = resolver(false)
            .resolve(
                series,
                &env,
                &bounds,
                &CurveFitOptions::default(),
                ExtremaType::Maxima,
                ResolverSeed {
                    idx_ref,
                    k: 1.2,
                    params: syn.trend_params,
                },
            )
            .expect_err("cannot seat the left extrema");
        assert!(matches!(err, Error::InsufficientLeftExtrema { .. }));
    }

    #[test]
    fn early_reference_advances_when_permitted() {
        let syn = inspiral(2000, 0.1);
        let series = &syn.series;
        let env = EnvelopeKernel::try_new(EnvelopeConfig { t0: syn.t_mid }).expect("kernel");
        let bounds = inspiral_bounds(series);

        let idx_ref = series
            .first_index_phase_above(series.phase()[0] + PHASE_PER_ORBIT)
            .expect("in range");
        let res = resolver(true)
            .resolve(
                series,
                &env,
                &bounds,
                &CurveFitOptions::default(),
                ExtremaType::Maxima,
                ResolverSeed {
                    idx_ref,
                    k: 1.2,
                    params: syn.trend_params,
                },
            )
            .expect("resolution with advanced reference");
        assert!(res.idx_ref > idx_ref);
        assert_eq!(res.idx_extrema.len(), 7);
    }

    #[test]
    fn reference_near_series_end_comes_back_one_short() {
        let syn = inspiral(2000, 0.1);
        let series = &syn.series;
        let env = EnvelopeKernel::try_new(EnvelopeConfig { t0: syn.t_mid }).expect("kernel");
        let bounds = inspiral_bounds(series);

        // two orbits before the end of the data, so the right side comes
        // up one maximum short of its target of three
        let last_phase = *series.phase().last().unwrap();
        let idx_ref = series
            .first_index_phase_above(last_phase - 2.0 * PHASE_PER_ORBIT)
            .expect("in range");
        let res = resolver(true)
            .resolve(
                series,
                &env,
                &bounds,
                &CurveFitOptions::default(),
                ExtremaType::Maxima,
                ResolverSeed {
                    idx_ref,
                    k: 1.0,
                    params: syn.trend_params,
                },
            )
            .expect("end of data is not an error");
        assert_eq!(res.idx_extrema.len(), 6);
    }
}
