//! Color clustering: k-means over a subsampled feature grid, then label
//! transitions along the central row and column must hit both thirds.
use super::profile::nearest_third;
use super::{StructuralValidator, ValidationInput, ValidatorKind};
use crate::detector::params::{ClusterParams, ValidationParams};
use crate::image::ImageView;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct ColorClustering;

type Feature = [f32; 4];

#[inline]
fn dist2(a: &Feature, b: &Feature) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(centers: &[Feature], f: &Feature) -> usize {
    let mut best = 0;
    let mut best_d = f32::INFINITY;
    for (i, c) in centers.iter().enumerate() {
        let d = dist2(c, f);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// k-means++ seeding.
fn seed_centers(samples: &[Feature], k: usize, rng: &mut StdRng) -> Vec<Feature> {
    let mut centers = Vec::with_capacity(k);
    centers.push(samples[rng.random_range(0..samples.len())]);
    let mut d2: Vec<f32> = samples.iter().map(|s| dist2(s, &centers[0])).collect();
    while centers.len() < k {
        let total: f32 = d2.iter().sum();
        let next = if total <= f32::EPSILON {
            samples[rng.random_range(0..samples.len())]
        } else {
            let mut target = rng.random::<f32>() * total;
            let mut pick = samples.len() - 1;
            for (i, &d) in d2.iter().enumerate() {
                target -= d;
                if target <= 0.0 {
                    pick = i;
                    break;
                }
            }
            samples[pick]
        };
        for (d, s) in d2.iter_mut().zip(samples) {
            *d = d.min(dist2(s, &next));
        }
        centers.push(next);
    }
    centers
}

/// Lloyd iterations from k-means++ seeds; returns a label per sample.
pub fn kmeans_labels(samples: &[Feature], params: &ClusterParams) -> Vec<usize> {
    if samples.is_empty() || params.k == 0 {
        return vec![0; samples.len()];
    }
    let k = params.k.min(samples.len());
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut centers = seed_centers(samples, k, &mut rng);
    let mut labels: Vec<usize> = samples.iter().map(|s| nearest(&centers, s)).collect();

    for _ in 0..params.max_iters {
        let mut sums = vec![[0.0f32; 4]; k];
        let mut counts = vec![0usize; k];
        for (s, &l) in samples.iter().zip(&labels) {
            for (acc, v) in sums[l].iter_mut().zip(s) {
                *acc += v;
            }
            counts[l] += 1;
        }
        let mut shift = 0.0f32;
        for c in 0..k {
            if counts[c] == 0 {
                continue;
            }
            let mean = sums[c].map(|v| v / counts[c] as f32);
            shift = shift.max(dist2(&mean, &centers[c]).sqrt());
            centers[c] = mean;
        }
        for (l, s) in labels.iter_mut().zip(samples) {
            *l = nearest(&centers, s);
        }
        if shift < params.epsilon {
            break;
        }
    }
    labels
}

/// Whether the label sequence changes near both thirds.
fn transitions_hit_thirds(labels: &[usize], tol: f32) -> bool {
    let n = labels.len();
    let mut hits = [false; 2];
    for j in 1..n {
        if labels[j] != labels[j - 1] {
            if let Some(t) = nearest_third(j, n, tol) {
                hits[t] = true;
            }
        }
    }
    hits[0] && hits[1]
}

impl StructuralValidator for ColorClustering {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::ColorClustering
    }

    fn accept(&self, input: &ValidationInput, params: &ValidationParams) -> bool {
        let cp = &params.clustering;
        let stride = if input.small { cp.small_stride } else { cp.stride }.max(1);
        let hsv = &input.hsv;
        let (gw, gh) = (hsv.width() / stride, hsv.height() / stride);
        if gw == 0 || gh == 0 || gw * gh < cp.min_samples {
            return false;
        }
        let mut samples = Vec::with_capacity(gw * gh);
        for gy in 0..gh {
            for gx in 0..gw {
                let p = hsv.pixel(gx * stride, gy * stride);
                let s = p.s as f32 / 255.0;
                let (sin, cos) = p.hue_radians().sin_cos();
                samples.push([cos * s, sin * s, s, p.v as f32 / 255.0]);
            }
        }
        let labels = kmeans_labels(&samples, cp);
        let mid_row = &labels[(gh / 2) * gw..(gh / 2 + 1) * gw];
        let mid_col: Vec<usize> = (0..gh).map(|gy| labels[gy * gw + gw / 2]).collect();
        let tol = params.peaks.thirds_tol;
        transitions_hit_thirds(mid_row, tol) && transitions_hit_thirds(&mid_col, tol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn kmeans_separates_two_obvious_groups() {
        let mut samples = vec![[0.0, 0.0, 0.0, 0.0]; 40];
        samples.extend(vec![[1.0, 1.0, 1.0, 1.0]; 40]);
        let params = ClusterParams {
            k: 2,
            ..ClusterParams::default()
        };
        let labels = kmeans_labels(&samples, &params);
        assert!(labels[..40].iter().all(|&l| l == labels[0]));
        assert!(labels[40..].iter().all(|&l| l == labels[40]));
        assert_ne!(labels[0], labels[40]);
    }

    #[test]
    fn seeded_clustering_is_repeatable() {
        let samples: Vec<Feature> = (0..200)
            .map(|i| {
                let t = i as f32 / 200.0;
                [t, 1.0 - t, (t * 7.0).fract(), 0.5]
            })
            .collect();
        let params = ClusterParams::default();
        assert_eq!(kmeans_labels(&samples, &params), kmeans_labels(&samples, &params));
    }

    #[test]
    fn lineless_cells_are_found_by_clustering() {
        let (r, g, b) = ([255, 0, 0], [0, 255, 0], [0, 0, 255]);
        let (c, m, yl) = ([0, 255, 255], [255, 0, 255], [255, 255, 0]);
        let cells = [yl, b, c, g, r, b, m, g, yl];
        let warp = RgbImage::from_fn(180, 180, |x, y| Rgb(cells[(y / 60 * 3 + x / 60) as usize]));
        let params = ValidationParams::default();
        let input = ValidationInput::prepare(&warp, &params);
        assert!(ColorClustering.accept(&input, &params));
    }

    #[test]
    fn crop_narrower_than_the_stride_is_rejected() {
        let mut params = ValidationParams::default();
        params.clustering.min_samples = 0;
        let stride = params.clustering.stride.max(params.clustering.small_stride) as u32;
        let narrow = RgbImage::from_pixel(stride - 1, 90, Rgb([0, 200, 40]));
        let input = ValidationInput::prepare(&narrow, &params);
        assert!(!ColorClustering.accept(&input, &params));
    }

    #[test]
    fn too_few_samples_are_rejected() {
        let params = ValidationParams::default();
        let input = ValidationInput::prepare(&RgbImage::from_pixel(30, 30, Rgb([255, 0, 0])), &params);
        assert!(!ColorClustering.accept(&input, &params));
    }
}
