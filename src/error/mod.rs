//! Error definitions
//!
//! This module provides error types for testkit-doubles.

use thiserror::Error;

/// Main error type for testkit-doubles
#[derive(Error, Debug)]
pub enum Error {
    /// The receiver has no stub, native method or generated accessor by this name.
    #[error("undefined method `{method}` for {receiver}")]
    UnsupportedMethod {
        /// Type name of the object the call was dispatched to.
        receiver: String,
        /// The method name that could not be resolved.
        method: String,
    },

    /// Model construction input was not a key/value mapping.
    #[error("malformed construction input: expected a mapping, got {0}")]
    MalformedInput(String),

    /// A typed field received a value of the wrong shape.
    #[error("field `{field}` expects {expected}, got {found}")]
    FieldType {
        /// Field name.
        field: String,
        /// Human-readable description of the accepted values.
        expected: &'static str,
        /// JSON type of the rejected value.
        found: String,
    },

    /// A dispatched call carried the wrong number of arguments.
    #[error("wrong number of arguments for `{method}` (given {given}, expected {expected})")]
    WrongArity {
        /// Method name.
        method: String,
        /// Number of parameters the method takes.
        expected: usize,
        /// Number of arguments supplied.
        given: usize,
    },

    /// A dispatched argument could not be decoded into the parameter type.
    #[error("invalid argument {index} for `{method}`: {source}")]
    InvalidArgument {
        /// Method name.
        method: String,
        /// Zero-based argument position.
        index: usize,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },

    /// A native return value could not be encoded as a [`Value`](crate::Value).
    #[error("could not encode return value of `{method}`: {source}")]
    InvalidReturn {
        /// Method name.
        method: String,
        /// Encoding failure.
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create an unsupported dispatch error.
    #[must_use]
    pub fn unsupported(receiver: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            receiver: receiver.into(),
            method: method.into(),
        }
    }

    /// Create a malformed input error describing what was received instead.
    #[must_use]
    pub fn malformed_input(found: impl Into<String>) -> Self {
        Self::MalformedInput(found.into())
    }

    /// Create a wrong arity error.
    #[must_use]
    pub fn wrong_arity(method: impl Into<String>, expected: usize, given: usize) -> Self {
        Self::WrongArity {
            method: method.into(),
            expected,
            given,
        }
    }

    /// Returns `true` if this is an unsupported dispatch error.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedMethod { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
