#![no_main]

use libfuzzer_sys::fuzz_target;
use tessel::{Triangulation, Vec2};

fuzz_target!(|data: Vec<(f64, f64)>| {
    let points: Vec<Vec2> = data
        .into_iter()
        .map(Vec2::from)
        .filter(|p| p.is_finite() && p.x.abs() < 1e6 && p.y.abs() < 1e6)
        .collect();

    if let Ok(triangulation) = Triangulation::new(&points) {
        assert!(triangulation.is_sound());
        let _ = triangulation.is_delaunay();
    }
});
