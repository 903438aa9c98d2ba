use serde::{Deserialize, Serialize};

use super::{Axis, Rectangle};

/// Distance annotation between two rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub a: Rectangle,
    pub b: Rectangle,
    /// Straight-line distance between the nearest edges.
    pub distance: f64,
    /// Space from `a` to `b` going `[top, right, bottom, left]`. A side is
    /// zero unless `b` lies entirely beyond it.
    pub spacing: [f64; 4],
    /// Region between the nearest edges, used to draw the annotation.
    #[serde(rename = "box")]
    pub gap_box: Rectangle,
}

/// Measure the space between `a` and `b`.
///
/// Returns `None` when the interiors overlap, identical rectangles included.
/// Rectangles that only touch measure a distance of zero.
pub fn measure(a: Rectangle, b: Rectangle) -> Option<Measurement> {
    if a.overlaps(&b) {
        return None;
    }

    let (x0, x1) = gap_range(&a, &b, Axis::X);
    let (y0, y1) = gap_range(&a, &b, Axis::Y);
    let horizontal = separation(&a, &b, Axis::X);
    let vertical = separation(&a, &b, Axis::Y);

    let spacing = [
        (a.y - b.bottom()).max(0.0),
        (b.x - a.right()).max(0.0),
        (b.y - a.bottom()).max(0.0),
        (a.x - b.right()).max(0.0),
    ];

    Some(Measurement {
        a,
        b,
        distance: horizontal.hypot(vertical),
        spacing,
        gap_box: Rectangle::new(x0, y0, x1 - x0, y1 - y0),
    })
}

/// Empty space between the two ranges on `axis`, zero when they meet.
fn separation(a: &Rectangle, b: &Rectangle, axis: Axis) -> f64 {
    (b.start(axis) - a.end(axis))
        .max(a.start(axis) - b.end(axis))
        .max(0.0)
}

/// The span between facing edges when the ranges are apart, otherwise the
/// shared span.
fn gap_range(a: &Rectangle, b: &Rectangle, axis: Axis) -> (f64, f64) {
    if b.start(axis) >= a.end(axis) {
        (a.end(axis), b.start(axis))
    } else if a.start(axis) >= b.end(axis) {
        (b.end(axis), a.start(axis))
    } else {
        (a.start(axis).max(b.start(axis)), a.end(axis).min(b.end(axis)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_side_by_side() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(30.0, 2.0, 10.0, 4.0);
        let m = measure(a, b).unwrap();
        assert_eq!(m.distance, 20.0);
        assert_eq!(m.spacing, [0.0, 20.0, 0.0, 0.0]);
        assert_eq!(m.gap_box, Rectangle::new(10.0, 2.0, 20.0, 4.0));
    }

    #[test]
    fn test_diagonal() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(13.0, 14.0, 5.0, 5.0);
        let m = measure(a, b).unwrap();
        assert_eq!(m.distance, 5.0);
        assert_eq!(m.spacing, [0.0, 3.0, 4.0, 0.0]);
        assert_eq!(m.gap_box, Rectangle::new(10.0, 10.0, 3.0, 4.0));

        let back = measure(b, a).unwrap();
        assert_eq!(back.distance, 5.0);
        assert_eq!(back.spacing, [4.0, 0.0, 0.0, 3.0]);
    }

    #[test]
    fn test_overlap_is_none() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        assert!(measure(a, a).is_none());
        assert!(measure(a, Rectangle::new(5.0, 5.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn test_touching_is_zero() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(10.0, 0.0, 10.0, 10.0);
        let m = measure(a, b).unwrap();
        assert_eq!(m.distance, 0.0);
        assert_eq!(m.gap_box.width, 0.0);
    }

    #[test]
    fn test_point_inside() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let p = Rectangle::from_point(Point::new(4.0, 6.0));
        let m = measure(a, p).unwrap();
        assert_eq!(m.distance, 0.0);
        assert_eq!(m.gap_box, p);
    }
}
