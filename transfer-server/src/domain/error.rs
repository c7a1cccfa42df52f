//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from store, schedule and HTTP errors.

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Invalid leg construction (e.g., arrival before departure)
    #[error("invalid leg: {0}")]
    InvalidLeg(&'static str),

    /// Journey has no legs
    #[error("journey must have at least one leg")]
    EmptyJourney,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidLeg("arrival must not precede departure");
        assert_eq!(
            err.to_string(),
            "invalid leg: arrival must not precede departure"
        );

        let err = DomainError::EmptyJourney;
        assert_eq!(err.to_string(), "journey must have at least one leg");
    }
}
