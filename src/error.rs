use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure taxonomy shared by every `EventStore` backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Network or backend failure. Carries the backend's message when it sent one.
    #[error("{0}")]
    Transport(String),
    /// A backend or cached payload that does not decode into events.
    #[error("could not decode events: {0}")]
    Decoding(String),
}

impl StoreError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding(message.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decoding(value.to_string())
    }
}

/// Reasons an intent is dropped before any store call. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("event title is empty")]
    EmptyTitle,
    #[error("event has no start date")]
    MissingStart,
    #[error("event ends before it starts")]
    EndBeforeStart,
    #[error("no event with id `{0}`")]
    UnknownEvent(String),
}
