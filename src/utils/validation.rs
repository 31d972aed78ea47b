//! Centralized validation and helper functions.

/// Maximum number of contigs allowed in a single table (DOS protection)
pub const MAX_CONTIGS: usize = 10_000_000;

/// Maximum number of individually displayed groups
pub const MAX_DISPLAY_GROUPS: usize = 256;

/// Check if adding another contig would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new contig.
/// Returns an error message if adding would exceed the limit, None if safe to add.
///
/// # Example
/// ```ignore
/// if check_contig_limit(table.len()).is_some() {
///     return Err(...);
/// }
/// table.insert(new_contig); // Safe to add
/// ```
#[must_use]
pub fn check_contig_limit(count: usize) -> Option<String> {
    if count >= MAX_CONTIGS {
        Some(format!(
            "Too many contigs: adding another would exceed maximum of {MAX_CONTIGS}"
        ))
    } else {
        None
    }
}

/// Accept a GC proportion only if it is a finite value in [0, 1].
///
/// # Examples
///
/// ```
/// use blobstats::utils::validation::validate_gc;
///
/// assert_eq!(validate_gc(0.42), Some(0.42));
/// assert_eq!(validate_gc(1.2), None);
/// assert_eq!(validate_gc(f64::NAN), None);
/// ```
#[must_use]
pub fn validate_gc(gc: f64) -> Option<f64> {
    if gc.is_finite() && (0.0..=1.0).contains(&gc) {
        Some(gc)
    } else {
        None
    }
}

/// Validation errors for policy settings
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("max_display must be between 1 and {MAX_DISPLAY_GROUPS}, got {0}")]
    MaxDisplayOutOfRange(usize),
}

/// Check the number of individually displayed groups
///
/// # Errors
///
/// Returns `ValidationError::MaxDisplayOutOfRange` for 0 or more than
/// [`MAX_DISPLAY_GROUPS`].
pub fn validate_max_display(max_display: usize) -> Result<usize, ValidationError> {
    if (1..=MAX_DISPLAY_GROUPS).contains(&max_display) {
        Ok(max_display)
    } else {
        Err(ValidationError::MaxDisplayOutOfRange(max_display))
    }
}
