//! Dotted resource names.
//!
//! A resource name such as `"articles.comments"` denotes a nesting chain from
//! the outermost collection (`articles`) to the innermost (`comments`). Every
//! route rule and every resource descriptor is derived from one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResourceError;

/// Separator between the segments of a [`ResourceName`].
pub const SEGMENT_SEPARATOR: char = '.';

/// A validated, dot-separated resource name.
///
/// Invariant: at least one segment, and no segment is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName {
    raw: String,
    segments: Vec<String>,
}

impl ResourceName {
    /// Parses a dotted name.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingResourceName`] for an empty (or
    /// whitespace-only) name and [`ResourceError::InvalidResourceName`] when
    /// any segment is empty, e.g. `"articles..comments"`, or holds a character
    /// that cannot appear in a single URI path segment (whitespace, control
    /// characters, `/`, `?`, `#`, `%`).
    pub fn parse(name: &str) -> Result<Self, ResourceError> {
        if name.trim().is_empty() {
            return Err(ResourceError::MissingResourceName);
        }

        let segments: Vec<String> = name
            .split(SEGMENT_SEPARATOR)
            .map(str::to_string)
            .collect();

        if !segments.iter().all(|s| is_valid_segment(s)) {
            return Err(ResourceError::InvalidResourceName {
                name: name.to_string(),
            });
        }

        Ok(Self {
            raw: name.to_string(),
            segments,
        })
    }

    /// The name exactly as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Segments from outermost to innermost.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments. Always at least one.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The innermost segment, e.g. `comments` for `articles.comments`.
    #[must_use]
    pub fn leaf(&self) -> &str {
        // parse() guarantees at least one segment
        self.segments.last().map_or("", String::as_str)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '%'))
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ResourceName {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceName {
    type Error = ResourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceName> for String {
    fn from(value: ResourceName) -> Self {
        value.raw
    }
}
