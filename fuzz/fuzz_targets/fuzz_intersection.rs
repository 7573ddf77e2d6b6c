#![no_main]

use libfuzzer_sys::fuzz_target;
use tessel::{intersect, intersect_brute_force, Vec2};

fuzz_target!(|data: Vec<[(f64, f64); 2]>| {
    let segments: Vec<[Vec2; 2]> = data
        .into_iter()
        .map(|[p0, p1]| [Vec2::from(p0), Vec2::from(p1)])
        .filter(|[p0, p1]| p0.is_finite() && p1.is_finite())
        .collect();

    let _ = intersect(&segments, 0.0);
    let _ = intersect_brute_force(&segments, 0.0);
});
