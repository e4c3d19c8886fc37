//! Small validation helpers for configuration values.

/// Validates that a floating-point value is strictly positive and finite.
///
/// # Arguments
///
/// * `value` - The value to validate.
///
/// # Returns
///
/// * `Ok(())` if the value is valid.
/// * `Err(&'static str)` if the value is invalid.
pub fn is_positive(value: f64) -> Result<(), &'static str> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err("value must be a positive finite number")
    }
}

/// Validates that an integer count is nonzero.
///
/// # Arguments
///
/// * `value` - The count to validate.
///
/// # Returns
///
/// * `Ok(())` if the count is valid.
/// * `Err(&'static str)` if the count is zero.
pub fn is_nonzero(value: usize) -> Result<(), &'static str> {
    if value > 0 {
        Ok(())
    } else {
        Err("value must be greater than 0")
    }
}

/// Validates that a voltage range is ordered with `min < max`.
///
/// # Arguments
///
/// * `min` - The lower bound of the range.
/// * `max` - The upper bound of the range.
///
/// # Returns
///
/// * `Ok(())` if the range is ordered.
/// * `Err(&'static str)` if the range is empty or inverted.
pub fn is_ordered_range(min: f64, max: f64) -> Result<(), &'static str> {
    if min.is_finite() && max.is_finite() && min < max {
        Ok(())
    } else {
        Err("range minimum must be strictly below maximum")
    }
}
