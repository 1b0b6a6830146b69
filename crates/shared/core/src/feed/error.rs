use thiserror::Error;

/// A decodable frame that is not a usable event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing mint")]
    MissingMint,

    #[error("missing txType")]
    MissingTxType,
}

/// Errors turning a raw frame into a typed event
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("undecodable frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid event: {0}")]
    Validation(#[from] ValidationError),
}
