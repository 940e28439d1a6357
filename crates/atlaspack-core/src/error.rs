use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    /// A sprite or sheet violates a structural precondition (source rect outside
    /// its image, non-positive dimensions, inconsistent sheet constraints).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The packer exhausted its search without placing every unique sprite.
    #[error("not all sprites could be packed")]
    NotAllSpritesPacked,
}

pub type Result<T> = std::result::Result<T, PackError>;
