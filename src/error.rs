use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Your inventory is full.")]
    FullInventory,

    #[error("snapshot refers to unknown template `{0}`")]
    UnknownTemplate(String),

    #[error("snapshot refers to missing entity #{0}")]
    DanglingEntity(usize),

    #[error("snapshot has no player")]
    MissingPlayer,

    #[error("malformed snapshot: {0}")]
    Decode(#[from] serde_json::Error),
}
