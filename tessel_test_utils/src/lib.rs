//! utils for tessel tests
#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::all, clippy::missing_const_for_fn)]

use rand::{distr::Uniform, prelude::Distribution, rngs::StdRng, Rng, SeedableRng};
use rand_distr::Normal;
use std::ops::RangeInclusive;

pub type Vertex2 = [f64; 2];
pub type Segment2 = [Vertex2; 2];

fn sample_with<R: Rng>(rng: &mut R, n: usize, range: Option<RangeInclusive<f64>>) -> Vec<Vertex2> {
    let range = range.unwrap_or(-0.5..=0.5);
    let uniform = Uniform::try_from(range).expect("Expected range with a greater start then end");

    let mut vertices: Vec<Vertex2> = Vec::with_capacity(n);
    for _ in 0..n {
        let x = uniform.sample(rng);
        let y = uniform.sample(rng);
        vertices.push([x, y]);
    }

    vertices
}

/// Samples `n` points in 2D space from the [Uniform] distribution.
///
/// If no range is specified, the unit-square centered around the origin is used, `[-0.5, 0.5]`.
pub fn sample_points_2d(n: usize, range: Option<RangeInclusive<f64>>) -> Vec<Vertex2> {
    sample_with(&mut rand::rng(), n, range)
}

/// Same as [`sample_points_2d`], but reproducible for a given `seed`.
pub fn sample_points_2d_seeded(
    n: usize,
    range: Option<RangeInclusive<f64>>,
    seed: u64,
) -> Vec<Vertex2> {
    sample_with(&mut StdRng::seed_from_u64(seed), n, range)
}

/// Samples `n` segments with uniformly distributed endpoints, reproducible for a given `seed`.
pub fn sample_segments_2d(
    n: usize,
    range: Option<RangeInclusive<f64>>,
    seed: u64,
) -> Vec<Segment2> {
    let endpoints = sample_points_2d_seeded(2 * n, range, seed);

    endpoints
        .chunks_exact(2)
        .map(|pair| [pair[0], pair[1]])
        .collect()
}

/// Moves every point by an offset drawn from the [Normal] distribution with mean `0` and `std_dev`.
///
/// Used to produce near-coincident input for the tolerant code paths.
pub fn jitter_points(points: &[Vertex2], std_dev: f64, seed: u64) -> Vec<Vertex2> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, std_dev).expect("Expected a finite, non-negative standard deviation");

    points
        .iter()
        .map(|p| [p[0] + normal.sample(&mut rng), p[1] + normal.sample(&mut rng)])
        .collect()
}
