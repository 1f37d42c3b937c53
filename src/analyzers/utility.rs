/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear-interpolated quantile (`q` in 0.0..=1.0). Returns `None` for empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Relative change of `current` against a baseline `reference` value.
pub fn exceeds_by(current: f64, reference: f64, threshold: f64) -> bool {
    current > reference * (1.0 + threshold)
}

/// Counterpart of [`exceeds_by`] for falling values.
pub fn falls_short_by(current: f64, reference: f64, threshold: f64) -> bool {
    current < reference * (1.0 - threshold)
}
