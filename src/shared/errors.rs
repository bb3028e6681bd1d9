use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("State conflict: {0}")]
    StateConflict(String),

    #[error("Spot {0} is not available")]
    SpotUnavailable(i32),

    /// The call boundary did not answer; the effect of a mutating call is unknown.
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        DomainError::NotFound {
            entity,
            field: "id",
            value: id.to_string(),
        }
    }

    /// Whether the caller must re-query state before re-issuing the call.
    pub fn is_effect_unknown(&self) -> bool {
        matches!(self, DomainError::TransportFailure(_))
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::NotFound { .. } => "not_found",
            DomainError::Validation(_) => "invalid",
            DomainError::StateConflict(_) => "conflict",
            DomainError::SpotUnavailable(_) => "unavailable",
            DomainError::TransportFailure(_) => "transport",
            DomainError::Storage(_) => "storage",
        }
    }

    /// Lost a race or asked for an illegal transition.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::StateConflict(_) | DomainError::SpotUnavailable(_)
        )
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(e: validator::ValidationErrors) -> Self {
        DomainError::Validation(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = DomainError::not_found("ParkingSpot", 42);
        assert_eq!(err.to_string(), "Not found: ParkingSpot with id=42");
    }

    #[test]
    fn only_transport_failure_is_effect_unknown() {
        assert!(DomainError::TransportFailure("deadline".into()).is_effect_unknown());
        assert!(!DomainError::StateConflict("x".into()).is_effect_unknown());
        assert!(!DomainError::SpotUnavailable(1).is_effect_unknown());
    }

    #[test]
    fn conflicts() {
        assert!(DomainError::SpotUnavailable(3).is_conflict());
        assert!(DomainError::StateConflict("busy".into()).is_conflict());
        assert!(!DomainError::Validation("bad".into()).is_conflict());
    }
}
