//! Error types for matchcast.
//!
//! Only a handful of conditions are reported to callers. Everything that can
//! go wrong while evaluating an expression (unknown operators, type
//! mismatches, unresolvable paths) fails closed as "no match" instead.

use thiserror::Error;

use crate::lifecycle::ConsumerId;

/// Validation errors raised before any state is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The item is `Value::Null`.
    #[error("Item must not be null")]
    NullItem,

    /// The consumer reports the nil id.
    #[error("Consumer handle is invalid: {id}")]
    InvalidHandle {
        /// Offending id.
        id: ConsumerId,
    },

    /// The consumer is already registered.
    #[error("Consumer {id} is already selected")]
    DuplicateHandle {
        /// Offending id.
        id: ConsumerId,
    },

    /// An expression could not be decoded.
    #[error("Invalid expression: {reason}")]
    InvalidExpression {
        /// What was wrong.
        reason: String,
    },

    /// A router configuration could not be loaded.
    #[error("Invalid router configuration: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },
}

/// Errors raised while handing an item to a consumer.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Replaying the router's last item during select failed.
    #[error("Replay of last item to consumer {id} failed: {source}")]
    Replay {
        /// Consumer being selected.
        id: ConsumerId,
        /// The consumer's error.
        #[source]
        source: Box<RouterError>,
    },

    /// A consumer refused an item.
    #[error("Consumer rejected item: {reason}")]
    Rejected {
        /// Why it was refused.
        reason: String,
    },
}

/// Top-level error type for matchcast.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Handing an item to a consumer failed.
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Unexpected internal failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl RouterError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates the error a consumer returns when it refuses an item.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Delivery(DeliveryError::Rejected {
            reason: reason.into(),
        })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a delivery error.
    #[must_use]
    pub const fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery(_))
    }

    /// Returns true if a `select` was refused because the consumer is already registered.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Validation(ValidationError::DuplicateHandle { .. }))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for matchcast operations.
pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let msg = format!("{}", ValidationError::NullItem);
        assert!(msg.contains("must not be null"));

        let id = ConsumerId::new();
        let msg = format!("{}", ValidationError::DuplicateHandle { id });
        assert!(msg.contains(&id.to_string()));
        assert!(msg.contains("already selected"));
    }

    #[test]
    fn test_replay_error_keeps_source() {
        let id = ConsumerId::new();
        let err: RouterError = DeliveryError::Replay {
            id,
            source: Box::new(RouterError::rejected("disk full")),
        }
        .into();
        assert!(err.is_delivery());
        let msg = format!("{err}");
        assert!(msg.contains("disk full"));

        let source = std::error::Error::source(&err).and_then(std::error::Error::source);
        assert!(source.is_some());
    }

    #[test]
    fn test_router_error_predicates() {
        let dup: RouterError = ValidationError::DuplicateHandle { id: ConsumerId::new() }.into();
        assert!(dup.is_validation());
        assert!(dup.is_duplicate());
        assert!(!dup.is_delivery());

        let null: RouterError = ValidationError::NullItem.into();
        assert!(!null.is_duplicate());

        let internal = RouterError::internal("unexpected state");
        assert!(internal.is_internal());
        assert!(format!("{internal}").contains("unexpected state"));
    }
}
