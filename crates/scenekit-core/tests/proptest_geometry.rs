//! Property-based tests for the geometry kernel.
//!
//! Verifies:
//! 1. Rational approximation respects the denominator bound and picks the
//!    smallest denominator within tolerance
//! 2. Integers and small fractions are fixed points
//! 3. Evenly spaced rows report their gap
//! 4. Distribution analysis needs at least two rectangles
//! 5. Measurement: overlap gives None, horizontal separation is the distance
//! 6. Union contains every input

use proptest::prelude::*;
use scenekit_core::geometry::rect::{self, DEFAULT_GAP_TOLERANCE};
use scenekit_core::geometry::FRACTION_TOLERANCE;
use scenekit_core::{Axis, Rectangle, analyze_distribution, approximate_fraction, measure};

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_rect() -> impl Strategy<Value = Rectangle> {
    (-500i32..500, -500i32..500, 0i32..200, 0i32..200)
        .prop_map(|(x, y, w, h)| Rectangle::new(x as f64, y as f64, w as f64, h as f64))
}

/// A left-to-right row with integer widths and a constant gap.
fn arb_even_row() -> impl Strategy<Value = (Vec<Rectangle>, f64)> {
    (prop::collection::vec(1i32..50, 2..8), 0i32..100, -200i32..200).prop_map(
        |(widths, gap, start)| {
            let mut x = start as f64;
            let rects = widths
                .into_iter()
                .map(|w| {
                    let rect = Rectangle::new(x, 0.0, w as f64, 10.0);
                    x += w as f64 + gap as f64;
                    rect
                })
                .collect();
            (rects, gap as f64)
        },
    )
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Denominator bound
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fraction_respects_bound(x in -1.0e6f64..1.0e6, max in 1u64..1000) {
        let r = approximate_fraction(x, max).expect("finite input");
        prop_assert!(r.denominator() >= 1);
        prop_assert!(r.denominator() <= max, "{} exceeds {}", r, max);
        prop_assert!((r.value() - x).abs() <= 1.0 / max as f64 + 1e-9);
    }

    #[test]
    fn fraction_has_no_simpler_neighbour(x in -10.0f64..10.0, max in 1u64..500) {
        let r = approximate_fraction(x, max).expect("finite input");
        if (r.value() - x).abs() <= FRACTION_TOLERANCE {
            for q in 1..r.denominator() {
                let p = (x * q as f64).round();
                prop_assert!(
                    (p / q as f64 - x).abs() > FRACTION_TOLERANCE,
                    "{}/{} is simpler than {}",
                    p,
                    q,
                    r
                );
            }
        }
    }

    #[test]
    fn fraction_rejects_zero_bound(x in -1.0e6f64..1.0e6) {
        prop_assert!(approximate_fraction(x, 0).is_none());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Fixed points
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn integers_are_fixed(n in -1_000_000i64..1_000_000, max in 1u64..1000) {
        let r = approximate_fraction(n as f64, max).expect("integer");
        prop_assert_eq!((r.numerator(), r.denominator()), (n, 1));
    }

    #[test]
    fn representable_fractions_are_fixed(p in -1000i64..1000, q in 1u64..1000) {
        let r = approximate_fraction(p as f64 / q as f64, 1000).expect("finite");
        let g = gcd(p.unsigned_abs(), q);
        prop_assert_eq!(r.numerator(), p / g as i64);
        prop_assert_eq!(r.denominator(), q / g);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Uniform gap detection
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn even_rows_report_their_gap((rects, gap) in arb_even_row()) {
        let (found, gaps) = rect::uniform_gap(&rects, Axis::X, DEFAULT_GAP_TOLERANCE);
        prop_assert_eq!(found, Some(gap));
        prop_assert_eq!(gaps.len(), rects.len() - 1);
    }

    #[test]
    fn shuffled_input_keeps_the_gap((rects, gap) in arb_even_row()) {
        let mut reversed = rects.clone();
        reversed.reverse();
        let (found, _) = rect::uniform_gap(&reversed, Axis::X, DEFAULT_GAP_TOLERANCE);
        prop_assert_eq!(found, Some(gap));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Distribution arity floor
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn distribution_needs_two(rects in prop::collection::vec(arb_rect(), 0..2)) {
        let analysis = analyze_distribution(&rects, DEFAULT_GAP_TOLERANCE);
        prop_assert!(analysis.x.is_none());
        prop_assert!(analysis.y.is_none());
    }

    #[test]
    fn analyzed_axes_have_one_gap_per_neighbour(rects in prop::collection::vec(arb_rect(), 2..8)) {
        let analysis = analyze_distribution(&rects, DEFAULT_GAP_TOLERANCE);
        for axis in [Axis::X, Axis::Y] {
            if let Some(gaps) = analysis.axis(axis) {
                prop_assert_eq!(gaps.gaps.len(), rects.len() - 1);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Measurement
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn overlapping_boxes_do_not_measure(a in arb_rect(), dx in 0i32..10, dy in 0i32..10) {
        prop_assume!(a.width > 10.0 && a.height > 10.0);
        let b = Rectangle::new(a.x + dx as f64, a.y + dy as f64, a.width, a.height);
        prop_assert!(measure(a, b).is_none());
    }

    #[test]
    fn horizontal_separation_is_distance(a in arb_rect(), d in 0i32..300) {
        let b = Rectangle::new(a.right() + d as f64, a.y, a.width, a.height);
        let m = measure(a, b).expect("disjoint");
        prop_assert_eq!(m.distance, d as f64);
        prop_assert_eq!(m.spacing[1], d as f64);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Union
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn union_contains_inputs(rects in prop::collection::vec(arb_rect(), 1..8)) {
        let bounds = rect::union(&rects).expect("non-empty");
        for r in &rects {
            prop_assert!(bounds.contains(r));
        }
    }
}
