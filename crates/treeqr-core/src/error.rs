use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Tree not found: {0}")]
    NotFound(String),

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Description generation failed: {0}")]
    GenerationFailed(#[from] GenerationFailure),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Speech service unavailable: {0}")]
    TtsUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why a description could not be generated.
///
/// All of these surface to callers as a single [`Error::GenerationFailed`]; the
/// distinction only feeds logs and tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    #[error("request to generation endpoint failed: {0}")]
    Transport(String),

    #[error("generation endpoint returned status {0}")]
    Status(u16),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("no response from model")]
    NoChoices,
}
