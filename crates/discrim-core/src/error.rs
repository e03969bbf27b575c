//! # Core Error Types
//!
//! Errors raised by the foundational types themselves. The registry,
//! dispatch, and schema crates define their own error enums close to the
//! operations that raise them; only the conversions shared by all of
//! them live here.

use thiserror::Error;

/// A JSON value could not be used as a discriminator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagValueError {
    /// Numbers outside the `i64` range (floats included) are not stable
    /// discriminators.
    #[error("number {0} is not usable as a discriminator; use a string, integer, or boolean")]
    FloatRejected(String),

    /// Nulls, arrays, and objects cannot name a single shape.
    #[error("{0} is not usable as a discriminator; use a string, integer, or boolean")]
    NotAScalar(&'static str),
}

/// An instance could not be constructed.
#[derive(Error, Debug)]
pub enum InstanceError {
    /// Instances wrap record values; the serialized form must be a JSON
    /// object.
    #[error("serialized value for shape '{0}' is not a JSON object")]
    NotAMap(String),

    /// Serialization through serde failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
