//! Shared helpers: input limits, attribute validation and numeric conversions.

pub mod validation;

/// Convert a count to f64 for averages and percentages
///
/// Counts here stay far below 2^53, so the conversion is exact in practice.
#[inline]
#[must_use]
pub fn count_to_f64(count: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}
