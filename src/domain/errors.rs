use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Record {record_id} not found in tenant {tenant_id}")]
    RecordNotFound { tenant_id: String, record_id: String },
    #[error("Record {record_id} already exists in tenant {tenant_id}")]
    DuplicateRecord { tenant_id: String, record_id: String },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DomainError {
    /// Recovers a `DomainError` that a repository raised through `anyhow`.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        err.downcast::<DomainError>().unwrap_or_else(DomainError::Other)
    }
}
