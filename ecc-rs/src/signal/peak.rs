//! Local-extrema detection analogous to the `scipy.signal` peak APIs.
//!
//! The extrema pipeline only needs bare local maxima of a residual, so
//! [`find_peaks`] with default options is the common entry point. The
//! height/distance/prominence/width filters exist for callers that search a
//! raw data channel instead of a trend-subtracted one.

use alloc::vec::Vec;

use core::cmp::Ordering;
use itertools::Itertools;
use num_traits::{Float, FromPrimitive};

/// Options for [`find_peaks`].
///
/// All filters default to off. `rel_height` only participates when `width`
/// is set and defaults to half prominence when left unset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FindPeaksOptions<F>
where
    F: PartialOrd + Copy,
{
    /// Minimum peak height.
    pub height: Option<F>,
    /// Minimum index distance between retained peaks.
    pub distance: Option<usize>,
    /// Minimum peak prominence.
    pub prominence: Option<F>,
    /// Minimum peak width, measured at `rel_height`.
    pub width: Option<F>,
    /// Relative height at which widths are measured.
    pub rel_height: Option<F>,
}

impl<F> Default for FindPeaksOptions<F>
where
    F: PartialOrd + Copy,
{
    fn default() -> Self {
        Self {
            height: None,
            distance: None,
            prominence: None,
            width: None,
            rel_height: None,
        }
    }
}

/// Prominence result bundle for [`peak_prominences`].
#[derive(Debug, Clone, PartialEq)]
pub struct PeakProminencesResult<F>
where
    F: Float + Copy,
{
    /// Prominence value for each input peak index.
    pub prominences: Vec<F>,
    /// Left base index for each peak.
    pub left_bases: Vec<usize>,
    /// Right base index for each peak.
    pub right_bases: Vec<usize>,
}

/// Width result bundle for [`peak_widths`].
#[derive(Debug, Clone, PartialEq)]
pub struct PeakWidthsResult<F>
where
    F: Float + Copy,
{
    /// Width of each peak at the evaluated height.
    pub widths: Vec<F>,
    /// Height level used for each width.
    pub width_heights: Vec<F>,
    /// Left interpolated intersection point (index domain).
    pub left_ips: Vec<F>,
    /// Right interpolated intersection point (index domain).
    pub right_ips: Vec<F>,
}

/// Return indices of relative extrema according to `comparator`.
///
/// An index qualifies when the comparator holds against all `order`
/// neighbors on both sides. Ties never qualify.
pub fn argrelextrema<F, C>(x: &[F], comparator: C, order: usize) -> Vec<usize>
where
    F: PartialOrd + Copy,
    C: Fn(F, F) -> bool,
{
    if order == 0 || x.len() < 2 * order + 1 {
        return Vec::new();
    }
    (order..x.len() - order)
        .filter(|&i| {
            (1..=order).all(|k| comparator(x[i], x[i - k]) && comparator(x[i], x[i + k]))
        })
        .collect()
}

/// Return indices of relative maxima.
pub fn argrelmax<F>(x: &[F], order: usize) -> Vec<usize>
where
    F: PartialOrd + Copy,
{
    argrelextrema(x, |a, b| a > b, order)
}

/// Return indices of relative minima.
pub fn argrelmin<F>(x: &[F], order: usize) -> Vec<usize>
where
    F: PartialOrd + Copy,
{
    argrelextrema(x, |a, b| a < b, order)
}

/// Interior local maxima with flat tops resolved to their midpoint sample.
fn local_maxima<F>(x: &[F]) -> Vec<usize>
where
    F: PartialOrd + Copy,
{
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            // Skip any plateau of equal samples.
            let mut i_ahead = i + 1;
            while i_ahead < i_max && x[i_ahead] == x[i] {
                i_ahead += 1;
            }
            if x[i_ahead] < x[i] {
                peaks.push((i + i_ahead - 1) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Find local peaks with optional height, distance, prominence, and width
/// filtering, applied in that order.
pub fn find_peaks<F>(x: &[F], options: FindPeaksOptions<F>) -> Vec<usize>
where
    F: Float + Copy + FromPrimitive,
{
    let mut peaks = local_maxima(x);

    if let Some(height) = options.height {
        peaks.retain(|&idx| x[idx] >= height);
    }

    if let Some(distance) = options.distance {
        if distance > 1 && !peaks.is_empty() {
            let ranked = peaks
                .iter()
                .copied()
                .sorted_by(|&a, &b| x[b].partial_cmp(&x[a]).unwrap_or(Ordering::Equal));

            let mut selected: Vec<usize> = Vec::new();
            for cand in ranked {
                if selected.iter().all(|&kept| kept.abs_diff(cand) >= distance) {
                    selected.push(cand);
                }
            }
            selected.sort_unstable();
            peaks = selected;
        }
    }

    if let Some(min_prominence) = options.prominence {
        let prom = peak_prominences(x, &peaks);
        let mut keep = prom.prominences.iter().map(|&p| p >= min_prominence);
        peaks.retain(|_| keep.next().unwrap_or(false));
    }

    if let Some(min_width) = options.width {
        let half = F::from_f64(0.5).expect("scalar conversion");
        let rel_height = options.rel_height.unwrap_or(half);
        let widths = peak_widths(x, &peaks, rel_height);
        let mut keep = widths.widths.iter().map(|&w| w >= min_width);
        peaks.retain(|_| keep.next().unwrap_or(false));
    }

    peaks
}

/// Walk outward from `peak` until a higher sample or the boundary, tracking
/// the lowest sample seen. Returns the base index and its value.
fn descend_base<F>(x: &[F], peak: usize, step_left: bool) -> (usize, F)
where
    F: Float + Copy,
{
    let peak_val = x[peak];
    let mut base = peak;
    let mut base_val = peak_val;
    let mut i = peak;
    loop {
        if step_left {
            if i == 0 {
                break;
            }
            i -= 1;
        } else {
            if i + 1 >= x.len() {
                break;
            }
            i += 1;
        }
        if x[i] > peak_val {
            break;
        }
        if x[i] < base_val {
            base_val = x[i];
            base = i;
        }
    }
    (base, base_val)
}

/// Compute peak prominences and base indices.
pub fn peak_prominences<F>(x: &[F], peaks: &[usize]) -> PeakProminencesResult<F>
where
    F: Float + Copy,
{
    let mut prominences = Vec::with_capacity(peaks.len());
    let mut left_bases = Vec::with_capacity(peaks.len());
    let mut right_bases = Vec::with_capacity(peaks.len());

    for &peak in peaks.iter().filter(|&&p| p < x.len()) {
        let (left_base, left_min) = descend_base(x, peak, true);
        let (right_base, right_min) = descend_base(x, peak, false);
        let base_level = if left_min > right_min {
            left_min
        } else {
            right_min
        };
        prominences.push(x[peak] - base_level);
        left_bases.push(left_base);
        right_bases.push(right_base);
    }

    PeakProminencesResult {
        prominences,
        left_bases,
        right_bases,
    }
}

/// Compute peak widths at relative height.
pub fn peak_widths<F>(x: &[F], peaks: &[usize], rel_height: F) -> PeakWidthsResult<F>
where
    F: Float + Copy + FromPrimitive,
{
    let prom = peak_prominences(x, peaks);
    let valid: Vec<usize> = peaks.iter().copied().filter(|&p| p < x.len()).collect();

    let mut widths = Vec::with_capacity(valid.len());
    let mut width_heights = Vec::with_capacity(valid.len());
    let mut left_ips = Vec::with_capacity(valid.len());
    let mut right_ips = Vec::with_capacity(valid.len());

    for (i, peak) in valid.into_iter().enumerate() {
        let width_height = x[peak] - prom.prominences[i] * rel_height;

        let mut l = peak;
        while l > prom.left_bases[i] && x[l] > width_height {
            l -= 1;
        }
        let l_ip = interpolate_crossing(x, l, l + 1, width_height, peak, true);

        let mut r = peak;
        while r < prom.right_bases[i] && x[r] > width_height {
            r += 1;
        }
        let r_ip = interpolate_crossing(x, r, r.saturating_sub(1), width_height, peak, false);

        widths.push(r_ip - l_ip);
        width_heights.push(width_height);
        left_ips.push(l_ip);
        right_ips.push(r_ip);
    }

    PeakWidthsResult {
        widths,
        width_heights,
        left_ips,
        right_ips,
    }
}

/// Fractional index where the signal crosses `level` between `outer` and
/// `inner`, falling back to `outer` on flat segments.
fn interpolate_crossing<F>(
    x: &[F],
    outer: usize,
    inner: usize,
    level: F,
    peak: usize,
    left_side: bool,
) -> F
where
    F: Float + Copy + FromPrimitive,
{
    let at = |i: usize| F::from_usize(i).expect("index conversion");
    let crossed = if left_side { outer < peak } else { outer > peak };
    if !crossed || x[inner] == x[outer] {
        return at(outer);
    }
    let frac = (level - x[outer]) / (x[inner] - x[outer]);
    if left_side {
        at(outer) + frac
    } else {
        at(outer) - frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn strict_local_maxima_are_found() {
        let x = [0.0f64, 1.0, 0.0, -1.0, 0.0, 2.0, 1.0];
        assert_eq!(find_peaks(&x, FindPeaksOptions::default()), vec![1, 5]);
        assert_eq!(argrelmax(&x, 1), vec![1, 5]);
        assert_eq!(argrelmin(&x, 1), vec![3]);
    }

    #[test]
    fn plateau_resolves_to_midpoint() {
        let x = [0.0f64, 1.0, 1.0, 1.0, 0.0, 0.5, 0.0];
        let peaks = find_peaks(&x, FindPeaksOptions::default());
        assert_eq!(peaks, vec![2, 5]);
        // argrelmax refuses the tie, find_peaks does not
        assert_eq!(argrelmax(&x, 1), vec![5]);
    }

    #[test]
    fn endpoint_samples_never_qualify() {
        let x = [3.0f64, 1.0, 2.0, 1.0, 4.0];
        assert_eq!(find_peaks(&x, FindPeaksOptions::default()), vec![2]);
    }

    #[test]
    fn height_and_distance_filters_compose() {
        let x = [0.0f64, 1.0, 0.1, 0.9, 0.0, 2.0, 0.0];
        let peaks = find_peaks(
            &x,
            FindPeaksOptions {
                height: Some(0.5),
                distance: Some(3),
                ..Default::default()
            },
        );
        assert_eq!(peaks, vec![1, 5]);
    }

    #[test]
    fn prominence_filter_drops_shallow_peaks() {
        let x = [0.0f64, 1.0, 0.8, 0.9, 0.0, 2.0, 0.0];
        let peaks = find_peaks(
            &x,
            FindPeaksOptions {
                prominence: Some(0.5),
                ..Default::default()
            },
        );
        assert_eq!(peaks, vec![1, 5]);
    }

    #[test]
    fn width_filter_drops_narrow_peaks() {
        // A narrow spike between broad peaks.
        let x = [
            0.0f64, 0.4, 0.8, 1.0, 0.8, 0.4, 0.0, 1.0, 0.0, 0.4, 0.8, 1.0, 0.8, 0.4, 0.0,
        ];
        let peaks = find_peaks(
            &x,
            FindPeaksOptions {
                width: Some(2.0),
                ..Default::default()
            },
        );
        assert_eq!(peaks, vec![3, 11]);
    }

    #[test]
    fn prominences_and_widths_have_valid_shapes() {
        let x = [0.0f64, 1.0, 0.2, 0.8, 0.1, 2.0, 0.0];
        let peaks = vec![1, 5];
        let prom = peak_prominences(&x, &peaks);
        assert_eq!(prom.prominences.len(), 2);
        assert!(prom.prominences.iter().all(|&p| p > 0.0));

        let widths = peak_widths(&x, &peaks, 0.5);
        assert_eq!(widths.widths.len(), 2);
        assert!(widths.widths.iter().all(|&w| w >= 0.0));
    }

    #[test]
    fn triangle_width_at_half_height() {
        let x = [0.0f64, 1.0, 0.0];
        let widths = peak_widths(&x, &[1], 0.5);
        assert_abs_diff_eq!(widths.widths[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn sine_peaks_land_on_crests() {
        let n = 200usize;
        let x: Vec<f64> = (0..n)
            .map(|i| (i as f64 * core::f64::consts::PI / 25.0).sin())
            .collect();
        let peaks = find_peaks(&x, FindPeaksOptions::default());
        // crests at i = 12.5 + 50k land on either neighbor sample
        assert_eq!(peaks.len(), 4);
        for (k, &p) in peaks.iter().enumerate() {
            let expected = 12.5 + 50.0 * k as f64;
            assert!((p as f64 - expected).abs() <= 0.5);
        }
    }
}
