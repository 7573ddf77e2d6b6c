#![no_main]

use libfuzzer_sys::fuzz_target;
use tessel::{conforming, Pslg, Vec2};

fuzz_target!(|data: (Vec<[(f64, f64); 2]>, Vec<(f64, f64)>)| {
    let (segments, points) = data;
    let segments: Vec<[Vec2; 2]> = segments
        .into_iter()
        .map(|[p0, p1]| [Vec2::from(p0), Vec2::from(p1)])
        .collect();
    let points: Vec<Vec2> = points.into_iter().map(Vec2::from).collect();

    if let Ok(pslg) = Pslg::from_segments(&segments) {
        let _ = conforming::triangulate(&pslg, &points, 1e-9);
    }
});
