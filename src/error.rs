use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("font not found: {0}")]
    FontNotFound(String),

    #[error("failed to parse font '{family}': {reason}")]
    FontParse { family: String, reason: String },

    #[error("unit index {index} out of range (document has {len} units)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("nothing to render")]
    EmptyScene,

    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("keyboard hook unavailable: {0}")]
    Hotkey(String),

    #[error("update error: {0}")]
    Update(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<arboard::Error> for Error {
    fn from(err: arboard::Error) -> Self {
        Error::Clipboard(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Update(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
