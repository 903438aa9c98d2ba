//! Scalar helpers for snapping and spacing.

/// Round `value` to the nearest multiple of `step`.
///
/// Returns `None` when `step` is not a positive finite number.
pub fn quantize(value: f64, step: f64) -> Option<f64> {
    if !(step > 0.0 && step.is_finite()) {
        return None;
    }
    // Scale into step units first so fractional steps like 0.1 round cleanly.
    let factor = 1.0 / step;
    Some((value * factor).round() / factor)
}

/// The candidate closest to `value`. Ties keep the earlier candidate.
pub fn nearest(value: f64, candidates: &[f64]) -> Option<f64> {
    candidates.iter().copied().fold(None, |best: Option<f64>, c| match best {
        Some(b) if (b - value).abs() <= (c - value).abs() => Some(b),
        _ => Some(c),
    })
}

/// True when every value lies within `tolerance` of the first one.
///
/// Slices with zero or one element are trivially uniform.
pub fn is_uniform(values: &[f64], tolerance: f64) -> bool {
    let Some(first) = values.first() else {
        return true;
    };
    values.iter().all(|v| (v - first).abs() <= tolerance)
}

/// The most frequent value. Ties resolve to the value seen first.
pub fn mode(values: &[f64]) -> Option<f64> {
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for &value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(f64, usize)>, (v, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((v, n)),
        })
        .map(|(v, _)| v)
}
