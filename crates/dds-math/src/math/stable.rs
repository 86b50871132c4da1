//! Saturating primitives for nanosecond and probability arithmetic.
//!
//! Every helper here is total: NaN inputs, overflowing products and
//! out-of-range conversions map to a fixed value instead of panicking.

/// Larger of two signed nanosecond values.
#[inline]
pub fn max_i64(a: i64, b: i64) -> i64 {
    if a >= b {
        a
    } else {
        b
    }
}

/// Larger of two floats. A NaN on one side yields the other side.
#[inline]
pub fn max_f64(a: f64, b: f64) -> f64 {
    if a.is_nan() {
        return b;
    }
    if b.is_nan() {
        return a;
    }
    if a >= b {
        a
    } else {
        b
    }
}

/// Smaller of two floats. A NaN on one side yields the other side.
#[inline]
pub fn min_f64(a: f64, b: f64) -> f64 {
    if a.is_nan() {
        return b;
    }
    if b.is_nan() {
        return a;
    }
    if a <= b {
        a
    } else {
        b
    }
}

/// Truncate a float nanosecond quantity toward zero.
///
/// Saturates at the `i64` range; NaN maps to 0.
#[inline]
pub fn truncate_ns(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    value.trunc() as i64
}

/// Systematic sampling interval for a target probability.
///
/// Returns `ceil(1 / probability)`, rounding towards sampling less often on
/// non-integral boundaries. Returns 0 ("never sample") when the probability
/// is not positive, or when the ideal interval does not fit in `usize`.
pub fn interval_for_probability(probability: f64) -> usize {
    if probability.is_nan() || probability <= 0.0 {
        return 0;
    }
    let ideal = (1.0 / probability).ceil();
    // usize::MAX as f64 rounds up to 2^64 (or 2^32), which is already out of range.
    if !ideal.is_finite() || ideal >= usize::MAX as f64 {
        return 0;
    }
    ideal as usize
}
