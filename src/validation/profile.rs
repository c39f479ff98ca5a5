//! 1-D projection profiles and the peak tests shared by the validators.
use crate::detector::params::PeakParams;

/// Thresholds for [`two_peaks_near_thirds`], resolved for one validator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakThresholds {
    pub min_prominence: f32,
    pub min_sep_frac: f32,
    pub thirds_tol: f32,
    pub min_len: usize,
}

impl PeakThresholds {
    pub fn from_params(params: &PeakParams) -> Self {
        Self {
            min_prominence: params.min_line_peak,
            min_sep_frac: params.min_peak_sep,
            thirds_tol: params.thirds_tol,
            min_len: params.min_profile_len,
        }
    }

    /// Caps prominence and separation at `cap`.
    pub fn capped(self, cap: f32) -> Self {
        Self {
            min_prominence: self.min_prominence.min(cap),
            min_sep_frac: self.min_sep_frac.min(cap),
            ..self
        }
    }
}

/// 5-tap box average on interior samples; the two samples at each end are
/// copied unchanged.
pub fn smooth5(p: &[f32]) -> Vec<f32> {
    let mut out = p.to_vec();
    if p.len() < 5 {
        return out;
    }
    for i in 2..p.len() - 2 {
        out[i] = p[i - 2..=i + 2].iter().sum::<f32>() / 5.0;
    }
    out
}

/// Rescale into [0, 1]; `None` when the profile is flat.
pub fn normalize(p: &[f32]) -> Option<Vec<f32>> {
    let lo = p.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = p.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = hi - lo;
    if !range.is_finite() || range < 1e-6 {
        return None;
    }
    Some(p.iter().map(|&v| (v - lo) / range).collect())
}

/// Upper median (`sorted[n / 2]`).
pub fn median(p: &[f32]) -> f32 {
    if p.is_empty() {
        return 0.0;
    }
    let mut sorted = p.to_vec();
    sorted.sort_by(f32::total_cmp);
    sorted[sorted.len() / 2]
}

/// Which third position (`1/3` → 0, `2/3` → 1) `i` lies near, if any.
pub fn nearest_third(i: usize, n: usize, tol_frac: f32) -> Option<usize> {
    let n_f = n as f32;
    let tol = tol_frac * n_f;
    let i = i as f32;
    let da = (i - n_f / 3.0).abs();
    let db = (i - 2.0 * n_f / 3.0).abs();
    match (da <= tol, db <= tol) {
        (true, true) => Some(if da <= db { 0 } else { 1 }),
        (true, false) => Some(0),
        (false, true) => Some(1),
        (false, false) => None,
    }
}

/// Index of the first maximum among `indices`.
fn first_argmax(p: &[f32], indices: impl Iterator<Item = usize>) -> Option<usize> {
    let mut best: Option<usize> = None;
    for i in indices {
        if best.is_none_or(|b| p[i] > p[b]) {
            best = Some(i);
        }
    }
    best
}

/// Two prominent, well separated peaks, one near each third.
///
/// The profile is smoothed and normalised; prominence is measured over the
/// median. The first peak is the global maximum, the second the maximum among
/// positions more than `min_sep_frac · n` away from it.
pub fn two_peaks_near_thirds(p: &[f32], t: &PeakThresholds) -> bool {
    let n = p.len();
    if n < t.min_len.max(1) {
        return false;
    }
    let Some(norm) = normalize(&smooth5(p)) else {
        return false;
    };
    let med = median(&norm);
    let prominence: Vec<f32> = norm.iter().map(|v| v - med).collect();

    let Some(i1) = first_argmax(&prominence, 0..n) else {
        return false;
    };
    let min_sep = t.min_sep_frac * n as f32;
    let far = (0..n).filter(|&j| (j as f32 - i1 as f32).abs() > min_sep);
    let Some(i2) = first_argmax(&prominence, far) else {
        return false;
    };

    if prominence[i1] <= t.min_prominence || prominence[i2] <= t.min_prominence {
        return false;
    }
    match (nearest_third(i1, n, t.thirds_tol), nearest_third(i2, n, t.thirds_tol)) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    }
}

/// Best pair `i < j` with `j ≥ i + min_gap` maximising `p[i] + p[j]`.
pub fn best_cut_pair(p: &[f32], min_gap: usize) -> Option<(usize, usize)> {
    let n = p.len();
    let mut best: Option<(usize, usize, f32)> = None;
    for i in 0..n {
        for j in (i + min_gap.max(1))..n {
            let s = p[i] + p[j];
            if best.is_none_or(|(_, _, b)| s > b) {
                best = Some((i, j, s));
            }
        }
    }
    best.map(|(i, j, _)| (i, j))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> PeakThresholds {
        PeakThresholds::from_params(&PeakParams::default())
    }

    fn profile_with_bumps(n: usize, at: &[usize]) -> Vec<f32> {
        (0..n)
            .map(|i| {
                at.iter()
                    .map(|&c| if i.abs_diff(c) <= 3 { 10.0 } else { 0.0 })
                    .sum::<f32>()
                    + 1.0
            })
            .collect()
    }

    #[test]
    fn smoothing_leaves_the_ends_alone() {
        let s = smooth5(&[5.0, 0.0, 10.0, 0.0, 0.0, 7.0]);
        assert_eq!(s[0], 5.0);
        assert_eq!(s[1], 0.0);
        assert_eq!(s[2], 3.0);
        assert_eq!(s[5], 7.0);
    }

    #[test]
    fn bumps_at_thirds_pass() {
        assert!(two_peaks_near_thirds(&profile_with_bumps(90, &[30, 60]), &thresholds()));
    }

    #[test]
    fn bumps_at_the_edges_fail() {
        assert!(!two_peaks_near_thirds(&profile_with_bumps(90, &[4, 85]), &thresholds()));
    }

    #[test]
    fn single_bump_fails_even_when_the_shoulder_is_far_enough() {
        assert!(!two_peaks_near_thirds(&profile_with_bumps(90, &[30]), &thresholds()));
    }

    #[test]
    fn short_or_flat_profiles_fail() {
        assert!(!two_peaks_near_thirds(&[1.0; 7], &thresholds()));
        assert!(!two_peaks_near_thirds(&[3.0; 40], &thresholds()));
    }

    #[test]
    fn cut_pair_respects_the_gap() {
        let p = [0.0, 9.0, 8.0, 0.0, 0.0, 0.0, 5.0, 0.0];
        assert_eq!(best_cut_pair(&p, 3), Some((1, 6)));
        assert_eq!(best_cut_pair(&p, 1), Some((1, 2)));
    }
}
