//! Address matching for handlers and waiters.
//!
//! | Pattern | Matches |
//! |---------|---------|
//! | `Any` | every address |
//! | `Exact("/tempo/raw")` | that address only |
//! | `Prefix("/browser/result/")` | every address starting with the prefix |
//! | `Glob("/browser/result/*/name")` | `*` stands for exactly one segment |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// AddressPattern
// ============================================================================

/// Predicate over OSC addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AddressPattern {
    /// Matches every address.
    Any,
    /// Matches one address exactly.
    Exact(String),
    /// Matches addresses starting with the given prefix.
    Prefix(String),
    /// Segment-wise match where a `*` segment matches any single segment.
    Glob(String),
}

impl AddressPattern {
    /// Creates an exact pattern.
    #[inline]
    #[must_use]
    pub fn exact(address: impl Into<String>) -> Self {
        Self::Exact(address.into())
    }

    /// Creates a prefix pattern.
    #[inline]
    #[must_use]
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    /// Parses a pattern string.
    ///
    /// `*` yields [`AddressPattern::Any`], a string containing `*` yields a
    /// glob, everything else an exact match.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            Self::Any
        } else if pattern.contains('*') {
            Self::Glob(pattern.to_string())
        } else {
            Self::Exact(pattern.to_string())
        }
    }

    /// Returns `true` if `address` satisfies this pattern.
    #[must_use]
    pub fn matches(&self, address: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == address,
            Self::Prefix(prefix) => address.starts_with(prefix.as_str()),
            Self::Glob(pattern) => glob_matches(pattern, address),
        }
    }
}

impl fmt::Display for AddressPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Exact(address) => f.write_str(address),
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
            Self::Glob(pattern) => f.write_str(pattern),
        }
    }
}

impl From<&str> for AddressPattern {
    fn from(pattern: &str) -> Self {
        Self::parse(pattern)
    }
}

fn glob_matches(pattern: &str, address: &str) -> bool {
    let mut expected = pattern.split('/');
    let mut actual = address.split('/');

    loop {
        match (expected.next(), actual.next()) {
            (None, None) => return true,
            (Some("*"), Some(segment)) if !segment.is_empty() => {}
            (Some(want), Some(got)) if want == got => {}
            _ => return false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
