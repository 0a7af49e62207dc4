//! Synthetic eccentric-inspiral fixtures shared by the extrema tests.

use crate::extrema::sequence::ExtremaType;
use crate::extrema::series::{Series, PHASE_PER_ORBIT};
use crate::fit::{EnvelopeParams, ParamBounds};

use alloc::vec::Vec;

/// Amplitude of the synthetic secular trend `AMP * (T_SING - t)^EXP`.
const AMP: f64 = 2.9;
/// Singularity time of the synthetic trend.
const T_SING: f64 = 10.0;
/// Leading-order frequency exponent of the synthetic trend.
const EXP: f64 = -3.0 / 8.0;
/// Time span of the synthetic series.
const T_START: f64 = -2000.0;
const T_END: f64 = -10.0;

/// A synthetic inspiral with a known trend and known extrema locations.
pub(crate) struct Synthetic {
    /// The series under test.
    pub series: Series,
    /// Mid-span time, matching the reference time the pipeline picks.
    pub t_mid: f64,
    /// Exact trend parameters expressed at `t_mid`.
    pub trend_params: EnvelopeParams,
}

/// Build a noiseless eccentric inspiral of `n` samples.
///
/// The frequency is `trend(t) * (1 + modulation * sin(phase / 2))`, so the
/// frequency oscillates once per orbit and its maxima sit where the phase
/// crosses `pi` modulo one orbit.
pub(crate) fn inspiral(n: usize, modulation: f64) -> Synthetic {
    let dt = (T_END - T_START) / (n - 1) as f64;
    let t: Vec<f64> = (0..n).map(|i| T_START + dt * i as f64).collect();
    let trend: Vec<f64> = t.iter().map(|&ti| AMP * (T_SING - ti).powf(EXP)).collect();

    let mut phase = Vec::with_capacity(n);
    phase.push(0.0);
    for i in 1..n {
        let prev = phase[i - 1];
        phase.push(prev + 0.5 * (trend[i - 1] + trend[i]) * dt);
    }

    let omega: Vec<f64> = trend
        .iter()
        .zip(phase.iter())
        .map(|(&tr, &ph)| tr * (1.0 + modulation * (ph / 2.0).sin()))
        .collect();

    let t_mid = 0.5 * (T_START + T_END);
    let f0 = AMP * (T_SING - t_mid).powf(EXP);
    let f1 = -AMP * EXP * (T_SING - t_mid).powf(EXP - 1.0);
    let trend_params = EnvelopeParams {
        f0,
        f1,
        t_sing: T_SING,
    };

    Synthetic {
        series: Series::try_new(t, phase, omega).expect("synthetic series is valid"),
        t_mid,
        trend_params,
    }
}

/// The broad parameter box the sequence driver would use for this series.
pub(crate) fn inspiral_bounds(series: &Series) -> ParamBounds {
    let t = series.t();
    let t_mid = 0.5 * (t[0] + t[t.len() - 1]);
    ParamBounds {
        lower: EnvelopeParams {
            f0: 0.0,
            f1: 0.0,
            t_sing: 0.8 * t[t.len() - 1],
        },
        upper: EnvelopeParams {
            f0: 1.0,
            f1: 10.0 / (-t_mid),
            t_sing: -t_mid,
        },
    }
}

/// Sample indices closest to the analytic extrema of the modulation.
///
/// Maxima of `sin(phase / 2)` sit at `phase = pi (mod 4 pi)`, minima at
/// `phase = 3 pi (mod 4 pi)`.
pub(crate) fn analytic_extrema_indices(series: &Series, extrema_type: ExtremaType) -> Vec<usize> {
    let phase = series.phase();
    let last_phase = phase[phase.len() - 1];
    let offset = match extrema_type {
        ExtremaType::Maxima => core::f64::consts::PI,
        ExtremaType::Minima => 3.0 * core::f64::consts::PI,
    };

    let mut out = Vec::new();
    let mut target = offset;
    while target < last_phase {
        let above = phase.partition_point(|&p| p <= target);
        let idx = if above == 0 {
            0
        } else if above >= phase.len() {
            phase.len() - 1
        } else if target - phase[above - 1] <= phase[above] - target {
            above - 1
        } else {
            above
        };
        out.push(idx);
        target += PHASE_PER_ORBIT;
    }
    out
}
