/// Errors from persisting documents. Loads never produce these; only
/// saves do.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error writing document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}
