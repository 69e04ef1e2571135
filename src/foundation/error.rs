pub type BlitResult<T> = Result<T, BlitError>;

#[derive(thiserror::Error, Debug)]
pub enum BlitError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("sprite too large: {bytes} bytes exceeds limit of {limit}")]
    SpriteTooLarge { bytes: u64, limit: u64 },

    #[error("decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BlitError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn too_large(bytes: u64, limit: u64) -> Self {
        Self::SpriteTooLarge { bytes, limit }
    }
}
