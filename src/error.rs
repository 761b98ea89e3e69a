use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Unknown {entity} reference: {id}")]
    ReferenceError { entity: &'static str, id: String },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Persistence error: {0}")]
    PersistenceError(String),
    #[cfg(feature = "storage-postgres")]
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Malformed payload: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Machine-readable error class reported alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Reference,
    NotFound,
    Persistence,
    Serialization,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Reference => "reference",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Serialization => "serialization",
        }
    }
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::ValidationError(_) => ErrorKind::Validation,
            OrderError::ReferenceError { .. } => ErrorKind::Reference,
            OrderError::NotFound { .. } => ErrorKind::NotFound,
            OrderError::PersistenceError(_) => ErrorKind::Persistence,
            #[cfg(feature = "storage-postgres")]
            OrderError::DatabaseError(_) => ErrorKind::Persistence,
            OrderError::SerializationError(_) => ErrorKind::Serialization,
            OrderError::IoError(_) => ErrorKind::Persistence,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        OrderError::ValidationError(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        OrderError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn unknown_reference(entity: &'static str, id: impl ToString) -> Self {
        OrderError::ReferenceError {
            entity,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;
