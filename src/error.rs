//! Error types for scene construction.
//!
//! All validation happens when bodies and constraints are created; an entity
//! that would corrupt the running solver never enters the simulation.

use thiserror::Error;

/// Result type alias for simulation setup operations.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised while building bodies, joints or system configuration.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// Body mass must be a positive, finite number.
    #[error("mass must be positive and finite, got {0}")]
    NonPositiveMass(f64),

    /// A geometric extent (radius, width, height) was not positive and finite.
    #[error("{name} must be positive and finite, got {value}")]
    NonPositiveDimension {
        /// Which extent was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A joint referenced a body index that does not exist.
    #[error("body index {index} out of range ({len} bodies)")]
    BodyIndexOutOfRange {
        /// The referenced index.
        index: usize,
        /// Number of bodies in the system.
        len: usize,
    },

    /// Joint attachment points coincide, leaving the constraint gradient undefined.
    #[error("constraint attachment points are coincident")]
    DegenerateConstraint,

    /// Explicit rest length was zero, negative or non-finite.
    #[error("rest length must be positive and finite, got {0}")]
    InvalidRestLength(f64),

    /// Compliance must be zero (rigid) or positive (soft).
    #[error("compliance must be non-negative, got {0}")]
    NegativeCompliance(f64),

    /// The substepped loop needs at least one substep.
    #[error("substep count must be at least 1")]
    InvalidSubstepCount,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_names_the_offending_value() {
        let err = SimError::NonPositiveMass(-2.0);
        assert_eq!(err.to_string(), "mass must be positive and finite, got -2");

        let err = SimError::BodyIndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.to_string(), "body index 4 out of range (2 bodies)");
    }
}
