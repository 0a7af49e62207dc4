//! Outer extrema sequence walk.
//!
//! One global envelope fit seeds the first window; after that the walk
//! advances the reference index one extremum at a time, keeping each
//! collected extremum bracketed by fit support on both sides. Reaching the
//! end of the data is the normal termination and is signalled by a short
//! window, not by an error.

use crate::error::Error;
use crate::extrema::resolver::{ResolverConfig, ResolverSeed, WindowResolver};
use crate::extrema::series::{Series, PHASE_PER_ORBIT};
use crate::fit::{
    fit_envelope, CurveFitOptions, EnvelopeConfig, EnvelopeKernel, EnvelopeParams, ParamBounds,
};
use crate::kernel::{ConfigError, KernelLifecycle};

use alloc::string::String;
use alloc::vec::Vec;

use core::str::FromStr;

/// Leading-order post-Newtonian exponent of the frequency envelope, used
/// only to seed the global fit.
const PN_EXPONENT: f64 = -3.0 / 8.0;

/// Which kind of orbital-frequency extremum to search for.
///
/// Maxima of the (2,2)-mode frequency are periastron passages, minima are
/// apastron passages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremaType {
    /// Local maxima (periastron passages).
    Maxima,
    /// Local minima (apastron passages).
    Minima,
}

impl ExtremaType {
    /// Sign applied to the residual before peak detection.
    pub(crate) fn sign(self) -> f64 {
        match self {
            ExtremaType::Maxima => 1.0,
            ExtremaType::Minima => -1.0,
        }
    }
}

impl FromStr for ExtremaType {
    type Err = Error;

    /// Accepts `maxima`/`peaks` and `minima`/`troughs`.
    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "maxima" | "peaks" => Ok(ExtremaType::Maxima),
            "minima" | "troughs" => Ok(ExtremaType::Minima),
            other => Err(Error::InvalidExtremaType {
                name: String::from(other),
            }),
        }
    }
}

/// Constructor config for [`ExtremaFinder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremaFinderConfig {
    /// Extrema targeted on each side of the reference index. The resolver
    /// windows hold one more on the left so the collected extremum stays
    /// bracketed.
    pub n_extrema_side: usize,
    /// Startup periastron-advance estimate, refined from the data after the
    /// first window.
    pub k0: f64,
    /// Convergence tolerance on extremum frequency values.
    pub tol: f64,
    /// Absolute cap on outer steps. A runaway guard only; valid input
    /// terminates by reaching the end of the data long before this.
    pub max_outer_steps: usize,
}

impl Default for ExtremaFinderConfig {
    fn default() -> Self {
        Self {
            n_extrema_side: 3,
            k0: 1.2,
            tol: 1e-8,
            max_outer_steps: 1000,
        }
    }
}

/// Sequence driver collecting one extremum per resolved window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremaFinder {
    config: ExtremaFinderConfig,
}

impl KernelLifecycle for ExtremaFinder {
    type Config = ExtremaFinderConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.n_extrema_side == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "n_extrema_side",
                reason: "at least one extremum per side is required",
            });
        }
        if !(config.k0 > 0.0) || !config.k0.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "k0",
                reason: "periastron-advance estimate must be positive and finite",
            });
        }
        if !(config.tol > 0.0) || !config.tol.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "tol",
                reason: "tolerance must be positive and finite",
            });
        }
        if config.max_outer_steps == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "max_outer_steps",
                reason: "the runaway guard must allow at least one step",
            });
        }
        Ok(Self { config })
    }
}

impl ExtremaFinder {
    /// Walk the series and collect every locatable extremum of the given
    /// type, in strictly increasing index order.
    ///
    /// The series is expected in the merger-aligned convention: time
    /// samples sit before the merger at `t = 0`.
    pub fn find_extrema(
        &self,
        series: &Series,
        extrema_type: ExtremaType,
    ) -> Result<Vec<usize>, Error> {
        let n = self.config.n_extrema_side;
        let t = series.t();
        let phase = series.phase();
        let omega = series.omega();
        let last = series.len() - 1;

        let t_mid = 0.5 * (t[0] + t[last]);
        if t_mid >= 0.0 {
            return Err(Error::Config(ConfigError::InvalidArgument {
                arg: "series",
                reason: "time samples must be centered before the merger at t = 0",
            }));
        }
        let env = EnvelopeKernel::try_new(EnvelopeConfig { t0: t_mid })?;

        // global fit across the whole series seeds the first window
        let f0 = 0.5 * (omega[0] + omega[last]);
        let seed_params = EnvelopeParams {
            f0,
            f1: -PN_EXPONENT * f0 / (-t_mid),
            t_sing: 0.0,
        };
        let bounds = ParamBounds {
            lower: EnvelopeParams {
                f0: 0.0,
                f1: 0.0,
                t_sing: 0.8 * t[last],
            },
            upper: EnvelopeParams {
                f0: 1.0,
                f1: 10.0 / (-t_mid),
                t_sing: -t_mid,
            },
        };
        let fit_options = CurveFitOptions::default();
        let mut params = fit_envelope(&env, t, omega, &seed_params, &bounds, &fit_options)?;
        let mut k = self.config.k0;

        let startup = phase[0] + k * n as f64 * PHASE_PER_ORBIT;
        let mut idx_ref = match series.first_index_phase_above(startup) {
            Some(i) if i > 0 => i,
            _ => return Err(Error::InsufficientData { len: series.len() }),
        };

        let resolver = WindowResolver::try_new(ResolverConfig {
            n_before: n + 1,
            n_after: n,
            tol: self.config.tol,
            advance_idx_ref: true,
            ..Default::default()
        })?;

        let mut collected = Vec::new();
        for _ in 0..self.config.max_outer_steps {
            let res = resolver.resolve(
                series,
                &env,
                &bounds,
                &fit_options,
                extrema_type,
                ResolverSeed { idx_ref, k, params },
            )?;
            params = res.params;
            k = res.k;
            idx_ref = res.idx_ref;

            // the extremum just left of the reference has fit support on
            // both sides, minimizing edge bias
            if res.idx_extrema.len() > n {
                collected.push(res.idx_extrema[n]);
            }
            if res.idx_extrema.len() <= 2 * n {
                return Ok(collected);
            }
            idx_ref = (res.idx_extrema[n + 1] + res.idx_extrema[n + 2]) / 2;
        }
        Err(Error::RunawayLoop {
            iterations: self.config.max_outer_steps,
        })
    }
}
