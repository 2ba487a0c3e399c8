#![allow(dead_code)]

use docscan::{Point2f, Shape};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_point(max: f32) -> impl Strategy<Value = Point2f> {
    (0.0f32..max, 0.0f32..max).prop_map(|(x, y)| Point2f::new(x, y))
}

/// A roughly axis-aligned quadrilateral: corners jittered by less than a
/// quarter of the half-extent, so each stays in its own quadrant.
pub fn arb_quad() -> impl Strategy<Value = Shape> {
    (
        100.0f32..2000.0,
        100.0f32..2000.0,
        20.0f32..800.0,
        20.0f32..800.0,
        prop::array::uniform8(-1.0f32..1.0),
    )
        .prop_map(|(cx, cy, hw, hh, j)| {
            let jx = hw / 4.0;
            let jy = hh / 4.0;
            Shape::new(
                Point2f::new(cx - hw + j[0] * jx, cy - hh + j[1] * jy),
                Point2f::new(cx + hw + j[2] * jx, cy - hh + j[3] * jy),
                Point2f::new(cx - hw + j[4] * jx, cy + hh + j[5] * jy),
                Point2f::new(cx + hw + j[6] * jx, cy + hh + j[7] * jy),
            )
        })
}

/// Width, height, channels and matching pixel bytes.
pub fn arb_raster(max_side: u32) -> impl Strategy<Value = (u32, u32, usize, Vec<u8>)> {
    (1..=max_side, 1..=max_side, 1usize..=4).prop_flat_map(|(w, h, c)| {
        let len = w as usize * h as usize * c;
        (
            Just(w),
            Just(h),
            Just(c),
            prop::collection::vec(any::<u8>(), len),
        )
    })
}
