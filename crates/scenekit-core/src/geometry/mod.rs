//! Geometry kernel: rectangles, vectors, rational approximation and
//! axis analysis used by selection, alignment and measurement.
//!
//! Nothing in here panics or returns an error. Inputs that make a result
//! meaningless (empty slices, non-finite numbers, overlapping boxes) yield
//! `None` instead.

mod fraction;
mod measure;
pub mod rect;
mod scalar;

pub use fraction::{DEFAULT_MAX_DENOMINATOR, FRACTION_TOLERANCE, Rational, approximate_fraction};
pub use measure::{Measurement, measure};
pub use scalar::{is_uniform, mode, nearest, quantize};

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Two-component vector. Offsets and translations use kurbo's type directly.
pub type Vector2 = kurbo::Vec2;

/// An axis of the canvas plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// The perpendicular axis.
    pub fn counter(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// Axis-aligned rectangle in canvas space.
///
/// `width` and `height` are expected to be non-negative. Zero-area
/// rectangles (points, lines) are valid inputs to every function here.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub const ZERO: Rectangle = Rectangle {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A zero-size rectangle located at `point`.
    pub fn from_point(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    /// The smallest rectangle containing every point, or `None` for no points.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let rect = points[1..]
            .iter()
            .fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p));
        Some(rect.into())
    }

    /// Convert to a kurbo `Rect`.
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.right(), self.bottom())
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Leading edge along `axis` (`x` or `y`).
    pub fn start(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Trailing edge along `axis` (`right` or `bottom`).
    pub fn end(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.right(),
            Axis::Y => self.bottom(),
        }
    }

    /// Extent along `axis` (`width` or `height`).
    pub fn size(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }

    /// Copy of this rectangle with its leading edge on `axis` moved to `value`.
    pub fn with_start(&self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::X => Self { x: value, ..*self },
            Axis::Y => Self { y: value, ..*self },
        }
    }

    /// Shift by `offset` without changing size.
    pub fn translate(&self, offset: Vector2) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            ..*self
        }
    }

    /// Overlapping region of two rectangles. Touching rectangles yield a
    /// zero-width (or zero-height) result; disjoint ones yield `None`.
    pub fn intersection(&self, other: &Rectangle) -> Option<Rectangle> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x0 > x1 || y0 > y1 {
            return None;
        }
        Some(Rectangle::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// True when the rectangles share any point, edges included.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.intersection(other).is_some()
    }

    /// True when the interiors overlap (positive-area intersection).
    pub fn overlaps(&self, other: &Rectangle) -> bool {
        self.intersection(other).is_some_and(|r| r.area() > 0.0)
    }

    /// True when `other` lies entirely inside this rectangle (edges inclusive).
    pub fn contains(&self, other: &Rectangle) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// True when `point` lies inside or on the edge.
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }
}

impl From<Rect> for Rectangle {
    fn from(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }
}

impl From<Rectangle> for Rect {
    fn from(rect: Rectangle) -> Self {
        rect.as_rect()
    }
}
