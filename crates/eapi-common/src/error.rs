use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("device request failed: {0}")]
    Transport(String),
    #[error("device returned error {code}: {message}")]
    Device { code: i64, message: String },
    #[error("failed to decode device response: {0}")]
    Decode(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl ExporterError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Transport(_) => "transport",
            Self::Device { .. } => "device",
            Self::Decode(_) => "decode",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InternalError(_) => "internal",
        }
    }

    /// True when the device could not be reached at all, as opposed to the
    /// device answering with an error or an unexpected payload.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
