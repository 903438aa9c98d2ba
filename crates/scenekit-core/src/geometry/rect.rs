//! Operations over sets of rectangles: bounds, projections, gaps and even
//! distribution along an axis.

use super::{Axis, Rectangle};

/// Tolerance used when deciding whether gaps count as uniform.
pub const DEFAULT_GAP_TOLERANCE: f64 = 1.01;

/// Bounding box of every rectangle, or `None` for an empty slice.
pub fn union(rects: &[Rectangle]) -> Option<Rectangle> {
    let first = rects.first()?;
    let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.right(), first.bottom());
    for rect in &rects[1..] {
        x0 = x0.min(rect.x);
        y0 = y0.min(rect.y);
        x1 = x1.max(rect.right());
        y1 = y1.max(rect.bottom());
    }
    Some(Rectangle::new(x0, y0, x1 - x0, y1 - y0))
}

/// Common range of the rectangles projected onto the counter-axis of `axis`.
///
/// For [`Axis::X`] the vertical ranges `[y, bottom]` are intersected, which
/// answers "do these boxes share a row, so that they can be spaced along x".
/// Touching ranges count as overlapping. Returns `None` for fewer than two
/// rectangles or when the projections do not all overlap.
pub fn axis_projection_intersection(rects: &[Rectangle], axis: Axis) -> Option<(f64, f64)> {
    if rects.len() < 2 {
        return None;
    }
    let counter = axis.counter();
    rects.iter().try_fold(
        (f64::NEG_INFINITY, f64::INFINITY),
        |(lo, hi), rect| {
            let lo = lo.max(rect.start(counter));
            let hi = hi.min(rect.end(counter));
            (lo <= hi).then_some((lo, hi))
        },
    )
}

/// Whether [`axis_projection_intersection`] finds a common range.
pub fn axis_projection_intersects(rects: &[Rectangle], axis: Axis) -> bool {
    axis_projection_intersection(rects, axis).is_some()
}

fn sorted_along(rects: &[Rectangle], axis: Axis) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rects.len()).collect();
    order.sort_by(|&a, &b| rects[a].start(axis).total_cmp(&rects[b].start(axis)));
    order
}

/// Gaps between neighbours after sorting by leading edge on `axis`.
///
/// Overlapping neighbours produce negative gaps.
pub fn gaps(rects: &[Rectangle], axis: Axis) -> Vec<f64> {
    if rects.len() < 2 {
        return Vec::new();
    }
    sorted_along(rects, axis)
        .windows(2)
        .map(|pair| rects[pair[1]].start(axis) - rects[pair[0]].end(axis))
        .collect()
}

/// Representative gap along `axis` plus every individual gap.
///
/// The representative is present only when each gap lies within `tolerance`
/// of their mean. It is the most frequent gap, with ties going to the gap
/// seen first in axis order.
pub fn uniform_gap(rects: &[Rectangle], axis: Axis, tolerance: f64) -> (Option<f64>, Vec<f64>) {
    let gaps = gaps(rects, axis);
    if gaps.is_empty() {
        return (None, gaps);
    }

    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    if gaps.iter().any(|g| (g - mean).abs() > tolerance) {
        return (None, gaps);
    }

    (super::mode(&gaps), gaps)
}

/// Reposition rectangles so the gaps between them are equal, keeping the
/// first and last rectangle on `axis` in place.
///
/// Output order matches input order. Sizes never change. Fewer than two
/// rectangles are returned unchanged.
pub fn distribute_evenly(rects: &[Rectangle], axis: Axis) -> Vec<Rectangle> {
    let Some(bounds) = union(rects).filter(|_| rects.len() >= 2) else {
        return rects.to_vec();
    };

    let occupied: f64 = rects.iter().map(|r| r.size(axis)).sum();
    let gap = (bounds.size(axis) - occupied) / (rects.len() - 1) as f64;

    let mut out = rects.to_vec();
    let mut cursor = bounds.start(axis);
    for index in sorted_along(rects, axis) {
        out[index] = rects[index].with_start(axis, cursor);
        cursor += rects[index].size(axis) + gap;
    }
    out
}
