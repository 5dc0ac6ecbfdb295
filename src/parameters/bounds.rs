//! Parameter bounds implementation
//!
//! Literal parameters carry a closed `[lower, upper]` range. Edits outside the
//! range are rejected; values are never clamped into it.

use crate::error::{ParamError, Result};
use crate::parameters::path::ParamPath;

/// Represents the declared range of a literal parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Smallest accepted value
    pub lower: f64,

    /// Largest accepted value
    pub upper: f64,
}

impl Bounds {
    /// Create a new range
    ///
    /// # Returns
    ///
    /// A new `Bounds` object if `lower <= upper`, or `MalformedInput` otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtree::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert!(bounds.contains(10.0));
    /// assert!(Bounds::new(10.0, 0.0).is_err());
    /// ```
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(ParamError::malformed(format!(
                "bounds must be finite numbers, got [{}, {}]",
                lower, upper
            )));
        }
        if lower > upper {
            return Err(ParamError::malformed(format!(
                "lower bound {} is greater than upper bound {}",
                lower, upper
            )));
        }

        Ok(Self { lower, upper })
    }

    /// Check whether a value lies inside the closed range
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Reject a write of `value` to `path` if it falls outside the range
    pub fn check(&self, path: &ParamPath, value: f64) -> Result<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(ParamError::OutOfBounds {
                path: path.clone(),
                value,
                lower: self.lower,
                upper: self.upper,
            })
        }
    }
}
