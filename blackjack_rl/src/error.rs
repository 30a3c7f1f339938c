use thiserror::Error;

/// Errors raised by the table, the hands and the training machinery.
#[derive(Debug, Error)]
pub enum BlackjackError {
    /// An operation was requested that the current state does not allow.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Expected {expected} rewards for the completed hands, got {actual}")]
    RewardCountMismatch { expected: usize, actual: usize },

    #[error("Invalid cards: {0}")]
    InvalidCards(String),

    #[error("Cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
