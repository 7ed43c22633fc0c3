//! OSC message and argument types.
//!
//! A [`Message`] is an immutable pair of address and ordered arguments.
//! Arguments are positional; callers must know the arity and types an
//! address family uses.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

// ============================================================================
// OscType
// ============================================================================

/// A single typed OSC argument.
///
/// Serializes untagged, so JSON output shows plain values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OscType {
    /// 32-bit integer (`i`).
    Int(i32),
    /// 64-bit integer (`h`).
    Long(i64),
    /// 32-bit float (`f`).
    Float(f32),
    /// 64-bit float (`d`).
    Double(f64),
    /// UTF-8 string (`s`).
    String(String),
    /// Boolean (`T` / `F`), carries no payload bytes.
    Bool(bool),
    /// Binary blob (`b`).
    Blob(Vec<u8>),
    /// Nil (`N`), carries no payload bytes.
    Nil,
}

impl OscType {
    /// Returns the OSC type tag character.
    #[inline]
    #[must_use]
    pub const fn type_tag(&self) -> char {
        match self {
            Self::Int(_) => 'i',
            Self::Long(_) => 'h',
            Self::Float(_) => 'f',
            Self::Double(_) => 'd',
            Self::String(_) => 's',
            Self::Bool(true) => 'T',
            Self::Bool(false) => 'F',
            Self::Blob(_) => 'b',
            Self::Nil => 'N',
        }
    }

    /// Interprets the value as a boolean.
    ///
    /// Bitwig reports flags as integers, so any non-zero number is `true`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Int(value) => Some(*value != 0),
            Self::Long(value) => Some(*value != 0),
            Self::Float(value) => Some(*value != 0.0),
            Self::Double(value) => Some(*value != 0.0),
            Self::String(_) | Self::Blob(_) | Self::Nil => None,
        }
    }

    /// Interprets the value as a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(f64::from(*value)),
            Self::Long(value) => Some(*value as f64),
            Self::Float(value) => Some(f64::from(*value)),
            Self::Double(value) => Some(*value),
            Self::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            Self::String(_) | Self::Blob(_) | Self::Nil => None,
        }
    }

    /// Interprets the value as an integer, truncating floats.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(i64::from(*value)),
            Self::Long(value) => Some(*value),
            Self::Float(value) => Some(*value as i64),
            Self::Double(value) => Some(*value as i64),
            Self::Bool(value) => Some(i64::from(*value)),
            Self::String(_) | Self::Blob(_) | Self::Nil => None,
        }
    }

    /// Returns the string payload, if this is a string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for OscType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Long(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Double(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Blob(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Self::Nil => f.write_str("nil"),
        }
    }
}

impl From<i32> for OscType {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for OscType {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f32> for OscType {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for OscType {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for OscType {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for OscType {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OscType {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

// ============================================================================
// Message
// ============================================================================

/// An OSC message: address plus ordered arguments.
///
/// # Example
///
/// ```ignore
/// let message = Message::new("/track/1/volume", vec![OscType::Float(64.0)]);
/// assert_eq!(message.address(), "/track/1/volume");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Slash-delimited control address.
    address: String,
    /// Positional arguments.
    args: Vec<OscType>,
}

impl Message {
    /// Creates a message with the given arguments.
    #[inline]
    #[must_use]
    pub fn new(address: impl Into<String>, args: Vec<OscType>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// Creates a message with no arguments.
    ///
    /// Used both for toggles and for pull-style queries.
    #[inline]
    #[must_use]
    pub fn bare(address: impl Into<String>) -> Self {
        Self::new(address, Vec::new())
    }

    /// Creates a message with a single argument.
    #[inline]
    #[must_use]
    pub fn with_value(address: impl Into<String>, value: impl Into<OscType>) -> Self {
        Self::new(address, vec![value.into()])
    }

    /// Creates an actuator message carrying `1`.
    #[inline]
    #[must_use]
    pub fn trigger(address: impl Into<String>) -> Self {
        Self::with_value(address, 1_i32)
    }

    /// Returns the address.
    #[inline]
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the arguments.
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[OscType] {
        &self.args
    }

    /// Consumes the message, returning address and arguments.
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<OscType>) {
        (self.address, self.args)
    }

    /// Returns the first argument.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&OscType> {
        self.args.first()
    }

    /// Returns the first argument as a boolean.
    #[inline]
    #[must_use]
    pub fn first_bool(&self) -> Option<bool> {
        self.first().and_then(OscType::as_bool)
    }

    /// Returns the first argument as a float.
    #[inline]
    #[must_use]
    pub fn first_f64(&self) -> Option<f64> {
        self.first().and_then(OscType::as_f64)
    }

    /// Returns the first argument as an integer.
    #[inline]
    #[must_use]
    pub fn first_i64(&self) -> Option<i64> {
        self.first().and_then(OscType::as_i64)
    }

    /// Returns the first argument as a string.
    #[inline]
    #[must_use]
    pub fn first_str(&self) -> Option<&str> {
        self.first().and_then(OscType::as_str)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
