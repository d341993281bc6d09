use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid argument: {message}")]
    InvalidArgument {
        message: String,
    },

    #[error("invalid state: current {current}, expected {expected}")]
    InvalidState {
        current: String,
        expected: String,
    },

    #[error("amount mismatch: payment {payment}, allocated {allocated}")]
    AmountMismatch {
        payment: Money,
        allocated: Money,
    },

    #[error("over-allocation on installment {installment_id}: remaining {remaining}, requested {requested}")]
    OverAllocation {
        installment_id: Uuid,
        remaining: Money,
        requested: Money,
    },

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: Uuid,
    },

    #[error("missing idempotency key")]
    MissingIdempotencyKey,

    #[error("serialization failed: {message}")]
    Serialization {
        message: String,
    },
}

impl EngineError {
    /// http status the error maps to at the transport edge
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::InvalidArgument { .. }
            | EngineError::AmountMismatch { .. }
            | EngineError::MissingIdempotencyKey => 400,
            EngineError::NotFound { .. } => 404,
            EngineError::InvalidState { .. } | EngineError::OverAllocation { .. } => 409,
            EngineError::Serialization { .. } => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let err = EngineError::InvalidArgument {
            message: "bad".to_string(),
        };
        assert_eq!(err.status_code(), 400);

        let err = EngineError::NotFound {
            entity: "payment",
            id: Uuid::new_v4(),
        };
        assert_eq!(err.status_code(), 404);

        let err = EngineError::OverAllocation {
            installment_id: Uuid::new_v4(),
            remaining: Money::from_major(10),
            requested: Money::from_major(20),
        };
        assert_eq!(err.status_code(), 409);

        assert_eq!(EngineError::MissingIdempotencyKey.status_code(), 400);
    }
}
