//! Secular-trend envelope of the orbital frequency.
//!
//! The inspiral frequency envelope is modelled as `A * (t_sing - t)^n`, a
//! power law diverging at the singularity (merger) time. The fit parameters
//! are not `(A, n)` directly but the function value `f0` and first
//! derivative `f1` at a fixed reference time `t0`, together with `t_sing`.
//! That keeps the parameters at comparable scales for the bounded solver.

use crate::error::Error;
use crate::kernel::{ConfigError, KernelLifecycle, Read1D, Write1D};

use alloc::string::String;
use alloc::vec::Vec;

use num_traits::Float;

/// Envelope parameters: value and slope at the reference time, plus the
/// singularity time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    /// Envelope value at the reference time `t0`.
    pub f0: f64,
    /// Envelope first derivative at the reference time `t0`.
    pub f1: f64,
    /// Singularity (merger) time; must exceed every evaluated sample.
    pub t_sing: f64,
}

impl EnvelopeParams {
    pub(crate) fn to_array(self) -> [f64; 3] {
        [self.f0, self.f1, self.t_sing]
    }

    pub(crate) fn from_slice(p: &[f64]) -> Self {
        Self {
            f0: p[0],
            f1: p[1],
            t_sing: p[2],
        }
    }
}

/// Elementwise box bounds for [`EnvelopeParams`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamBounds {
    /// Lower corner of the box.
    pub lower: EnvelopeParams,
    /// Upper corner of the box.
    pub upper: EnvelopeParams,
}

impl ParamBounds {
    /// Whether `params` lies inside the box (inclusive).
    pub fn contains(&self, params: &EnvelopeParams) -> bool {
        let p = params.to_array();
        let lo = self.lower.to_array();
        let hi = self.upper.to_array();
        p.iter()
            .zip(lo.iter().zip(hi.iter()))
            .all(|(&v, (&l, &u))| v >= l && v <= u)
    }
}

/// Constructor config for [`EnvelopeKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeConfig {
    /// Reference time at which `f0` and `f1` are defined.
    pub t0: f64,
}

/// Power-law envelope kernel with a fixed reference time.
///
/// Evaluation is pure: identical parameters on identical samples yield
/// bit-identical output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeKernel {
    t0: f64,
}

impl KernelLifecycle for EnvelopeKernel {
    type Config = EnvelopeConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if !config.t0.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "t0",
                reason: "reference time must be finite",
            });
        }
        Ok(Self { t0: config.t0 })
    }
}

impl EnvelopeKernel {
    /// Reference time of this kernel.
    pub fn t0(&self) -> f64 {
        self.t0
    }

    /// Power-law exponent `n = -(t_sing - t0) * f1 / f0`.
    ///
    /// A zero `f0` leaves the exponent undefined and is reported as a
    /// domain error rather than propagating infinities into the fit.
    pub fn exponent(&self, params: &EnvelopeParams) -> Result<f64, Error> {
        if params.f0 == 0.0 {
            return Err(Error::FittingDomain {
                t_max: self.t0,
                t_sing: params.t_sing,
            });
        }
        Ok(-(params.t_sing - self.t0) * params.f1 / params.f0)
    }

    /// Power-law amplitude `A = f0 * (t_sing - t0)^(-n)`.
    pub fn amplitude(&self, params: &EnvelopeParams) -> Result<f64, Error> {
        let n = self.exponent(params)?;
        Ok(params.f0 * Float::powf(params.t_sing - self.t0, -n))
    }

    /// Evaluate the envelope over `times` into `out`.
    ///
    /// Fails with [`Error::FittingDomain`] when the largest time sample
    /// reaches `t_sing`; an envelope evaluated through its own singularity
    /// is a window-management bug upstream, never a normal occurrence.
    pub fn evaluate_into<I, O>(
        &self,
        times: &I,
        params: &EnvelopeParams,
        out: &mut O,
    ) -> Result<(), Error>
    where
        I: Read1D<f64> + ?Sized,
        O: Write1D<f64> + ?Sized,
    {
        let t = times.read_slice().map_err(Error::Config)?;
        let out = out.write_slice_mut().map_err(Error::Config)?;
        if out.len() != t.len() {
            return Err(Error::Config(ConfigError::LengthMismatch {
                arg: "out",
                expected: t.len(),
                got: out.len(),
            }));
        }

        let t_max = t.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !t.is_empty() && t_max >= params.t_sing {
            return Err(Error::FittingDomain {
                t_max,
                t_sing: params.t_sing,
            });
        }

        let n = self.exponent(params)?;
        let a = params.f0 * Float::powf(params.t_sing - self.t0, -n);
        for (dst, &ti) in out.iter_mut().zip(t.iter()) {
            *dst = a * Float::powf(params.t_sing - ti, n);
        }
        Ok(())
    }

    /// Evaluate the envelope over `times`, allocating the output.
    pub fn evaluate<I>(&self, times: &I, params: &EnvelopeParams) -> Result<Vec<f64>, Error>
    where
        I: Read1D<f64> + ?Sized,
    {
        let len = times.read_slice().map_err(Error::Config)?.len();
        let mut out = alloc::vec![0.0; len];
        self.evaluate_into(times, params, &mut out)?;
        Ok(out)
    }

    /// Human-readable `A(t - T)^n` form for legends and diagnostics.
    pub fn describe(&self, params: &EnvelopeParams) -> String {
        match (self.amplitude(params), self.exponent(params)) {
            (Ok(a), Ok(n)) => alloc::format!(
                "{a:.3e}(t{t:+.2})^{n:.3}",
                t = -params.t_sing
            ),
            _ => String::from("<undefined envelope>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn kernel() -> EnvelopeKernel {
        EnvelopeKernel::try_new(EnvelopeConfig { t0: -100.0 }).expect("finite t0")
    }

    #[test]
    fn rejects_non_finite_reference_time() {
        let err = EnvelopeKernel::try_new(EnvelopeConfig { t0: f64::NAN }).expect_err("nan t0");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "t0", .. }));
    }

    #[test]
    fn reparameterization_round_trips_a_known_power_law() {
        // 0.5 * (10 - t)^(-3/8) expressed through value and slope at t0
        let k = kernel();
        let t_sing = 10.0;
        let n = -3.0 / 8.0;
        let a = 0.5;
        let f0 = a * (t_sing - k.t0()).powf(n);
        let f1 = -a * n * (t_sing - k.t0()).powf(n - 1.0);
        let params = EnvelopeParams { f0, f1, t_sing };

        assert_abs_diff_eq!(k.exponent(&params).unwrap(), n, epsilon = 1e-12);
        assert_abs_diff_eq!(k.amplitude(&params).unwrap(), a, epsilon = 1e-12);

        let t = [-400.0, -200.0, -50.0, 0.0];
        let trend = k.evaluate(&t, &params).unwrap();
        for (&ti, &v) in t.iter().zip(trend.iter()) {
            assert_abs_diff_eq!(v, a * (t_sing - ti).powf(n), epsilon = 1e-12);
        }
    }

    #[test]
    fn evaluation_is_bit_identical() {
        let k = kernel();
        let params = EnvelopeParams {
            f0: 0.1,
            f1: 3e-4,
            t_sing: 25.0,
        };
        let t = [-300.0, -150.0, -75.0, -1.0];
        let first = k.evaluate(&t, &params).unwrap();
        let second = k.evaluate(&t, &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn domain_guard_rejects_samples_at_or_past_singularity() {
        let k = kernel();
        let params = EnvelopeParams {
            f0: 0.1,
            f1: 3e-4,
            t_sing: 10.0,
        };
        for t_bad in [10.0, 11.0, 1e4] {
            let err = k.evaluate(&[-50.0, t_bad], &params).expect_err("domain");
            assert!(matches!(err, Error::FittingDomain { .. }));
        }
        // strictly below the singularity is fine
        assert!(k.evaluate(&[-50.0, 9.99], &params).is_ok());
    }

    #[test]
    fn evaluate_into_checks_output_length() {
        let k = kernel();
        let params = EnvelopeParams {
            f0: 0.1,
            f1: 3e-4,
            t_sing: 10.0,
        };
        let t = [-50.0, -40.0, -30.0];
        let mut short = [0.0; 2];
        let err = k
            .evaluate_into(&t, &params, &mut short)
            .expect_err("length mismatch");
        assert!(matches!(
            err,
            Error::Config(ConfigError::LengthMismatch { arg: "out", .. })
        ));
    }

    #[test]
    fn describe_reports_amplitude_and_exponent() {
        let k = kernel();
        let params = EnvelopeParams {
            f0: 0.1,
            f1: 3e-4,
            t_sing: 10.0,
        };
        let text = k.describe(&params);
        assert!(text.contains("(t-10.00)^"));
    }
}
