use thiserror::Error;

/// The stream never completed; the accumulated buffer is discarded and the
/// game state is left untouched.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("narrative service request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("narrative stream interrupted: {0}")]
    Io(#[from] std::io::Error),
    #[error("narrative service returned status {0}")]
    Status(u16),
    #[error("{0}")]
    Other(String),
}

/// The accumulated document could not be turned into a turn payload.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("empty response from narrative service")]
    EmptyResponse,
    #[error("no JSON object found in response")]
    MalformedStructure,
    #[error("failed to decode turn payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Everything that can sink a single turn. Portrait failures are absent on
/// purpose: they are recovered locally with a placeholder image.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl TurnError {
    /// The message shown in place of the thinking placeholder when a turn
    /// fails. Transport and parse failures get distinct wording.
    pub fn player_message(&self) -> &'static str {
        match self {
            TurnError::Transport(_) => {
                "An unexpected error occurred while contacting the storyteller. \
                 Please check your connection or try again."
            }
            TurnError::Parse(_) => {
                "There was a problem generating the next part of the story. \
                 Please try rerolling or rephrasing your action."
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store contains invalid data: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("session {0} not found")]
    NotFound(String),
    #[error("session data too large to persist even after pruning")]
    QuotaExceeded,
}
