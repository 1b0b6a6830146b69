use thiserror::Error;

/// Durable store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A write violated a foreign-key or uniqueness rule. The single write is
    /// dropped; ingestion continues.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The schema could not be created. Fatal at startup.
    #[error("schema initialization failed: {0}")]
    Schema(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn is_constraint(&self) -> bool {
        matches!(self, StoreError::Constraint(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
