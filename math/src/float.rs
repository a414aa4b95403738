/// Returns the pair `(a, b)` ordered so that the lesser one comes first.
pub fn min_max(a: f32, b: f32) -> (f32, f32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Compares two floats with a tolerance relative to their magnitude (absolute near zero).
/// ```
/// use math::float::approx_eq;
/// assert!(approx_eq(9.0, 9.00001, 1e-5));
/// assert!(!approx_eq(9.0, 9.1, 1e-5));
/// assert!(approx_eq(0.0, 1e-7, 1e-5));
/// ```
pub fn approx_eq(a: f32, b: f32, tolerance: f32) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= tolerance * scale
}

/// Linearly remaps `x` from `[lo, hi]` onto `[0, 1]`. A degenerate range maps everything to 0.
/// ```
/// use math::float::normalize_to_unit;
/// assert_eq!(normalize_to_unit(3.0, 2.0, 6.0), 0.25);
/// assert_eq!(normalize_to_unit(3.0, 2.0, 2.0), 0.0);
/// ```
pub fn normalize_to_unit(x: f32, lo: f32, hi: f32) -> f32 {
    let len = hi - lo;
    if len > 0.0 && len.is_finite() {
        (x - lo) / len
    } else {
        0.0
    }
}
