//! Rational approximation of real numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default bound on the denominator used for ratio display and snapping.
pub const DEFAULT_MAX_DENOMINATOR: u64 = 100;

/// A candidate within this distance of the input is accepted immediately.
pub const FRACTION_TOLERANCE: f64 = 1e-9;

/// A ratio with a strictly positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    numerator: i64,
    denominator: u64,
}

impl Rational {
    /// Create a ratio. Returns `None` when `denominator` is zero.
    pub fn new(numerator: i64, denominator: u64) -> Option<Self> {
        (denominator > 0).then_some(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Floating point value of the ratio.
    pub fn value(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Approximate `x` by the fraction with the smallest denominator, not
/// exceeding `max_denominator`, that lies within [`FRACTION_TOLERANCE`] of it.
///
/// Descends the Stern–Brocot tree towards `|x|`. Each run of equal turns is
/// the semiconvergent sequence `(p0 + j·p1)/(q0 + j·q1)` leading to the next
/// continued-fraction convergent, and its error shrinks as `j` grows, so the
/// first in-tolerance node of a run is found by bisection. When the bound is
/// reached with nothing in tolerance, the closer of the last convergent and
/// the largest bounded semiconvergent is returned.
///
/// Integers short-circuit to `x/1`. Returns `None` for NaN, infinities,
/// integers outside the `i64` range, or `max_denominator < 1`.
pub fn approximate_fraction(x: f64, max_denominator: u64) -> Option<Rational> {
    if !x.is_finite() || max_denominator < 1 {
        return None;
    }
    if x.fract() == 0.0 {
        if x.abs() >= i64::MAX as f64 {
            return None;
        }
        return Rational::new(x as i64, 1);
    }

    // |x| < 2^53 here: every larger finite f64 is an integer.
    let negative = x < 0.0;
    let value = x.abs();
    let max = max_denominator as u128;

    // (p0/q0) and (p1/q1) are the two most recent convergents.
    let (mut p0, mut q0, mut p1, mut q1) = (0u128, 1u128, 1u128, 0u128);
    let mut remainder = value;

    loop {
        let a = remainder.floor() as u128;
        let error = |j: u128| ((p0 + j * p1) as f64 / (q0 + j * q1) as f64 - value).abs();

        // Only the very first term can be zero, and then 0/1 is the candidate.
        let first = a.min(1);
        let last = if q1 == 0 { a } else { a.min((max - q0) / q1) };
        if last >= first && error(last) <= FRACTION_TOLERANCE {
            let (mut lo, mut hi) = (first, last);
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                if error(mid) <= FRACTION_TOLERANCE {
                    hi = mid;
                } else {
                    lo = mid + 1;
                }
            }
            return signed(p0 + lo * p1, q0 + lo * q1, negative);
        }
        if last < a {
            break;
        }

        let (p2, q2) = (p0 + a * p1, q0 + a * q1);
        (p0, q0, p1, q1) = (p1, q1, p2, q2);

        let fract = remainder - remainder.floor();
        if fract <= f64::EPSILON {
            break;
        }
        remainder = 1.0 / fract;
    }

    // Best semiconvergent that still respects the bound.
    let k = (max - q0) / q1;
    let (sp, sq) = (p0 + k * p1, q0 + k * q1);
    let last_error = (p1 as f64 / q1 as f64 - value).abs();
    let semi_error = (sp as f64 / sq as f64 - value).abs();
    if semi_error < last_error {
        signed(sp, sq, negative)
    } else {
        signed(p1, q1, negative)
    }
}

fn signed(numerator: u128, denominator: u128, negative: bool) -> Option<Rational> {
    let numerator = i64::try_from(numerator).ok()?;
    let denominator = u64::try_from(denominator).ok()?;
    Rational::new(if negative { -numerator } else { numerator }, denominator)
}
