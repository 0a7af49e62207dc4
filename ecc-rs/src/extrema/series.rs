//! Validated waveform series input.

use crate::error::Error;
use crate::kernel::ConfigError;

use alloc::vec::Vec;

use num_traits::Float;

/// Phase advance of the (2,2) mode over one orbit.
pub(crate) const PHASE_PER_ORBIT: f64 = 4.0 * core::f64::consts::PI;

/// Aligned time, phase, and frequency samples of a (2,2) waveform mode.
///
/// `phase` and `t` are strictly increasing; all three sequences have equal
/// length. The extrema pipeline only ever reads slices of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    t: Vec<f64>,
    phase: Vec<f64>,
    omega: Vec<f64>,
}

impl Series {
    /// Validate and take ownership of the three sample sequences.
    pub fn try_new(t: Vec<f64>, phase: Vec<f64>, omega: Vec<f64>) -> Result<Self, ConfigError> {
        if t.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "t" });
        }
        if phase.len() != t.len() {
            return Err(ConfigError::LengthMismatch {
                arg: "phase",
                expected: t.len(),
                got: phase.len(),
            });
        }
        if omega.len() != t.len() {
            return Err(ConfigError::LengthMismatch {
                arg: "omega",
                expected: t.len(),
                got: omega.len(),
            });
        }
        if t.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(ConfigError::InvalidArgument {
                arg: "t",
                reason: "time samples must be strictly increasing",
            });
        }
        if phase.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(ConfigError::InvalidArgument {
                arg: "phase",
                reason: "phase must be strictly increasing",
            });
        }
        Ok(Self { t, phase, omega })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.t.len()
    }

    /// Whether the series holds no samples. Construction forbids this, so
    /// the answer is always `false` for a validated series.
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Time samples.
    pub fn t(&self) -> &[f64] {
        &self.t
    }

    /// Cumulative (2,2)-mode phase samples.
    pub fn phase(&self) -> &[f64] {
        &self.phase
    }

    /// Instantaneous (2,2)-mode frequency samples.
    pub fn omega(&self) -> &[f64] {
        &self.omega
    }

    /// First index whose phase strictly exceeds `target`.
    pub(crate) fn first_index_phase_above(&self, target: f64) -> Option<usize> {
        let i = self.phase.partition_point(|&p| p <= target);
        (i < self.phase.len()).then_some(i)
    }

    /// Truncate the series to end `n_orbits` before merger.
    ///
    /// The merger is taken at the sample closest to `t = 0` (waveforms are
    /// aligned so that merger sits at the time origin) and the cut is placed
    /// where the phase comes within `4 * pi * n_orbits` of the merger phase.
    pub fn exclude_orbits_before_merger(&self, n_orbits: f64) -> Result<Self, Error> {
        let merger_idx = argmin_abs(&self.t);
        let target = self.phase[merger_idx] - PHASE_PER_ORBIT * n_orbits;
        let cut = argmin_by_distance(&self.phase, target);
        if cut == 0 {
            return Err(Error::InsufficientData { len: 0 });
        }
        Ok(Self {
            t: self.t[..cut].to_vec(),
            phase: self.phase[..cut].to_vec(),
            omega: self.omega[..cut].to_vec(),
        })
    }
}

fn argmin_abs(xs: &[f64]) -> usize {
    argmin_by_distance(xs, 0.0)
}

fn argmin_by_distance(xs: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &x) in xs.iter().enumerate() {
        let dist = Float::abs(x - target);
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn construction_validates_shapes_and_ordering() {
        let err = Series::try_new(Vec::new(), Vec::new(), Vec::new()).expect_err("empty");
        assert!(matches!(err, ConfigError::EmptyInput { arg: "t" }));

        let err = Series::try_new(ramp(4), ramp(3), ramp(4)).expect_err("short phase");
        assert!(matches!(err, ConfigError::LengthMismatch { arg: "phase", .. }));

        let err = Series::try_new(ramp(3), alloc::vec![0.0, 2.0, 2.0], ramp(3))
            .expect_err("phase plateau");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "phase", .. }));

        assert!(Series::try_new(ramp(3), ramp(3), ramp(3)).is_ok());
    }

    #[test]
    fn phase_lookup_is_strictly_above() {
        let s = Series::try_new(ramp(5), ramp(5), ramp(5)).expect("series");
        assert_eq!(s.first_index_phase_above(1.0), Some(2));
        assert_eq!(s.first_index_phase_above(3.5), Some(4));
        assert_eq!(s.first_index_phase_above(4.0), None);
    }

    #[test]
    fn merger_truncation_cuts_by_phase() {
        // merger at t = 0, one orbit of phase excluded
        let n = 101;
        let t: Vec<f64> = (0..n).map(|i| -100.0 + i as f64).collect();
        let phase: Vec<f64> = (0..n)
            .map(|i| i as f64 * 3.0 * PHASE_PER_ORBIT / 100.0)
            .collect();
        let omega = alloc::vec![0.1; n];
        let s = Series::try_new(t, phase, omega).expect("series");

        let cut = s.exclude_orbits_before_merger(1.0).expect("truncated");
        // 3 orbits over 100 samples, so one orbit back is about 33 samples
        assert!(cut.len() < n);
        assert!((cut.len() as i64 - 67).abs() <= 1);
        let last_phase = *cut.phase().last().unwrap();
        assert!(last_phase <= 2.0 * PHASE_PER_ORBIT + 0.5);
    }

    #[test]
    fn truncating_everything_is_an_error() {
        let s = Series::try_new(ramp(3), ramp(3), ramp(3)).expect("series");
        // series ends at t = 2 with merger index 0, huge exclusion empties it
        let err = s.exclude_orbits_before_merger(50.0).expect_err("empty cut");
        assert!(matches!(err, Error::InsufficientData { len: 0 }));
    }
}
