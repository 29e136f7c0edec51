use thiserror::Error;

use crate::domain::reservation::ReservationKind;
use crate::infrastructure::database::is_write_conflict;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation: {0}")]
    Validation(String),

    #[error("invalid day range: from_day {from_day} is after to_day {to_day}")]
    InvalidRange { from_day: u64, to_day: u64 },

    /// Rendered as the canonical wire message, e.g. `booking already exists`.
    #[error("{0} already exists")]
    ReservationExists(ReservationKind),

    #[error("user already exists")]
    UserExists,

    #[error("wrong password")]
    WrongPassword,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The store refused the commit because a concurrent writer got there first.
    #[error("Commit conflict: {0}")]
    CommitConflict(String),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

/// Coarse classification used by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Auth,
    Conflict,
    Infrastructure,
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_)
            | DomainError::InvalidRange { .. }
            | DomainError::WrongPassword => ErrorKind::Input,
            DomainError::Unauthorized(_) => ErrorKind::Auth,
            DomainError::ReservationExists(_)
            | DomainError::UserExists
            | DomainError::CommitConflict(_) => ErrorKind::Conflict,
            DomainError::Infra(_) => ErrorKind::Infrastructure,
        }
    }

    /// Whether the failed transaction may succeed if run again.
    pub fn is_commit_conflict(&self) -> bool {
        matches!(self, DomainError::CommitConflict(_))
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(err: sea_orm::DbErr) -> Self {
        if is_write_conflict(&err) {
            DomainError::CommitConflict(err.to_string())
        } else {
            DomainError::Infra(InfraError::Database(err))
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Infra(InfraError::Serialization(err))
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sequence {0} exhausted")]
    SequenceExhausted(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_conflict_uses_wire_message() {
        let booking = DomainError::ReservationExists(ReservationKind::Booking);
        let lease = DomainError::ReservationExists(ReservationKind::Lease);
        assert_eq!(booking.to_string(), "booking already exists");
        assert_eq!(lease.to_string(), "lease already exists");
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            DomainError::InvalidRange { from_day: 10, to_day: 5 }.kind(),
            ErrorKind::Input
        );
        assert_eq!(DomainError::UserExists.kind(), ErrorKind::Conflict);
        assert_eq!(
            DomainError::CommitConflict("busy".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            DomainError::Infra(InfraError::SequenceExhausted("s".into())).kind(),
            ErrorKind::Infrastructure
        );
    }

    #[test]
    fn locked_database_is_a_commit_conflict() {
        let err: DomainError = sea_orm::DbErr::Custom("database is locked".into()).into();
        assert!(err.is_commit_conflict());

        let err: DomainError = sea_orm::DbErr::Custom("disk I/O error".into()).into();
        assert!(!err.is_commit_conflict());
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }
}
