pub type RastermarkResult<T> = Result<T, RastermarkError>;

#[derive(thiserror::Error, Debug)]
pub enum RastermarkError {
    /// A numeric value outside its allowed range (color channel, alpha).
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A supplied cache directory or font path failed its filesystem checks.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A recognized but unsupported image type.
    #[error("Image type {0} not supported")]
    UnsupportedFormat(String),

    /// I/O failure on a source, cache, or font file, or a decode producing
    /// no image.
    #[error("resource error: {0}")]
    Resource(String),

    /// An operation attempted on a released buffer or an unset
    /// canvas/color/font.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RastermarkError {
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn unsupported_format(mime: impl Into<String>) -> Self {
        Self::UnsupportedFormat(mime.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
