//! The [`SimState`] contract and domain-check helpers.

/// A field whose value left its declared domain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("field '{field}' is out of domain: {detail}")]
pub struct InvalidField {
    pub field: String,
    pub detail: String,
}

impl InvalidField {
    #[must_use]
    pub fn new(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            detail: detail.into(),
        }
    }
}

/// A subsystem state record that a [`Simulator`](crate::Simulator) can own.
///
/// `check` is run after every rule; a failing check rolls that rule back.
pub trait SimState: Clone {
    /// Returns the first out-of-domain field, if any.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidField`] naming the offending field.
    fn check(&self) -> Result<(), InvalidField>;
}

/// Check that `value` lies in `[0, 1]`.
///
/// # Errors
///
/// Returns [`InvalidField`] when it does not (or is not finite).
pub fn check_unit(field: &str, value: f64) -> Result<(), InvalidField> {
    check_range(field, value, 0.0, 1.0)
}

/// Check that `value` is finite and lies in `[min, max]`.
///
/// # Errors
///
/// Returns [`InvalidField`] when it does not.
pub fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), InvalidField> {
    if !value.is_finite() {
        return Err(InvalidField::new(field, format!("{value} is not finite")));
    }
    if value < min || value > max {
        return Err(InvalidField::new(field, format!("{value} outside [{min}, {max}]")));
    }
    Ok(())
}

/// Check that `value` is finite and non-negative.
///
/// # Errors
///
/// Returns [`InvalidField`] when it is not.
pub fn check_non_negative(field: &str, value: f64) -> Result<(), InvalidField> {
    check_range(field, value, 0.0, f64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_unit() {
        assert!(check_unit("readiness", 0.5).is_ok());
        assert!(check_unit("readiness", 1.2).is_err());
        let err = check_unit("readiness", f64::NAN).unwrap_err();
        assert_eq!(err.field, "readiness");
    }

    #[test]
    fn test_check_non_negative() {
        assert!(check_non_negative("budget", 0.0).is_ok());
        assert!(check_non_negative("budget", -0.01).is_err());
        assert!(check_non_negative("budget", f64::INFINITY).is_err());
    }
}
