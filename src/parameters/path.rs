//! Hierarchical parameter paths
//!
//! A parameter is addressed by an ordered `(main, sub, item)` triple. Paths
//! travel through the engine as structured data; the `main##sub##item` text
//! form only exists at the expression boundary and in diagnostics.

use crate::error::{ParamError, Result};
use std::fmt;
use std::str::FromStr;

/// Separator between segments in the text form of a path.
pub const DELIMITER: &str = "##";

/// Three-segment identifier of a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamPath {
    pub main: String,
    pub sub: String,
    pub item: String,
}

impl ParamPath {
    pub fn new(main: impl Into<String>, sub: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            sub: sub.into(),
            item: item.into(),
        }
    }

    /// The segments in order.
    pub fn segments(&self) -> [&str; 3] {
        [&self.main, &self.sub, &self.item]
    }
}

impl fmt::Display for ParamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}",
            self.main,
            self.sub,
            self.item,
            d = DELIMITER
        )
    }
}

impl FromStr for ParamPath {
    type Err = ParamError;

    /// Parse the `main##sub##item` text form.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(DELIMITER).collect();
        if parts.len() != 3 {
            return Err(ParamError::malformed(format!(
                "path '{}' must have exactly three segments separated by '{}'",
                s, DELIMITER
            )));
        }
        for part in &parts {
            validate_segment(part)?;
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl<S: Into<String>> From<[S; 3]> for ParamPath {
    fn from(segments: [S; 3]) -> Self {
        let [main, sub, item] = segments;
        Self::new(main, sub, item)
    }
}

impl<A, B, C> From<(A, B, C)> for ParamPath
where
    A: Into<String>,
    B: Into<String>,
    C: Into<String>,
{
    fn from((main, sub, item): (A, B, C)) -> Self {
        Self::new(main, sub, item)
    }
}

/// Check that a category or item name can be embedded in a reference.
///
/// Names must be non-empty, contain neither `#` nor `}`, and carry no leading
/// or trailing whitespace, so the text form splits back into exactly the
/// segments it was built from.
pub fn validate_segment(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ParamError::malformed("empty category or item name"));
    }
    if name.trim() != name {
        return Err(ParamError::malformed(format!(
            "name '{}' must not start or end with whitespace",
            name
        )));
    }
    if name.contains('#') || name.contains('}') {
        return Err(ParamError::malformed(format!(
            "name '{}' must not contain '#' or '}}'",
            name
        )));
    }
    Ok(())
}

/// Characters allowed in a segment of an unbraced reference token.
pub(crate) fn is_bare_segment_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}
