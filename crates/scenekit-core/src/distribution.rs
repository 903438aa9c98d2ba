//! Spacing analysis over a set of rectangles.

use crate::geometry::rect::{self, DEFAULT_GAP_TOLERANCE};
use crate::geometry::{Axis, Rectangle};
use serde::{Deserialize, Serialize};

/// Gap analysis along a single axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub tolerance: f64,
    /// Representative spacing, present only when the gaps are uniform.
    pub gap: Option<f64>,
    pub gaps: Vec<f64>,
}

/// Result of [`analyze_distribution`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionAnalysis {
    pub rects: Vec<Rectangle>,
    pub x: Option<GapAnalysis>,
    pub y: Option<GapAnalysis>,
}

impl DistributionAnalysis {
    pub fn axis(&self, axis: Axis) -> Option<&GapAnalysis> {
        match axis {
            Axis::X => self.x.as_ref(),
            Axis::Y => self.y.as_ref(),
        }
    }

    /// Rectangles spaced evenly along `axis`, in input order. `None` when the
    /// axis was not analyzable.
    pub fn distribute(&self, axis: Axis) -> Option<Vec<Rectangle>> {
        self.axis(axis)?;
        Some(rect::distribute_evenly(&self.rects, axis))
    }
}

/// Analyze how `rects` are spaced along each axis.
///
/// An axis is only analyzed when all rectangles share a common band on the
/// counter-axis (a row for x, a column for y). Fewer than two rectangles
/// yield no analysis on either axis.
pub fn analyze_distribution(rects: &[Rectangle], tolerance: f64) -> DistributionAnalysis {
    let analyze = |axis: Axis| {
        rect::axis_projection_intersects(rects, axis).then(|| {
            let (gap, gaps) = rect::uniform_gap(rects, axis, tolerance);
            GapAnalysis {
                tolerance,
                gap,
                gaps,
            }
        })
    };

    DistributionAnalysis {
        rects: rects.to_vec(),
        x: analyze(Axis::X),
        y: analyze(Axis::Y),
    }
}

/// [`analyze_distribution`] with [`DEFAULT_GAP_TOLERANCE`].
pub fn analyze_distribution_default(rects: &[Rectangle]) -> DistributionAnalysis {
    analyze_distribution(rects, DEFAULT_GAP_TOLERANCE)
}
