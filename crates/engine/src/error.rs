use visafeed_core::error::CoreError;
use visafeed_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Domain rule violated: {0}")]
    Core(#[from] CoreError),

    #[error("Checkpoint failed: {0}")]
    Store(#[from] StoreError),
}
