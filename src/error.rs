//! Error types for the corpus builder.
//!
//! Data-quality problems (malformed pages, filtered elements, missing images)
//! are not errors: they are counted and skipped where they occur. The variants
//! here cover I/O, configuration mistakes and broken internal invariants.

/// Result type alias for corpus operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or consuming a corpus.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record file does not have the expected shape
    #[error("Invalid record in {source_name}: {reason}")]
    InvalidRecord {
        /// File or record the problem was found in
        source_name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Dataset task name that maps to no generator family
    #[error("Invalid task type: {0}")]
    UnknownTask(String),

    /// Element task not legal for the chosen family
    #[error("Element task '{elem_task}' is not legal for task '{task}'")]
    IllegalElementTask {
        /// Dataset task name
        task: String,
        /// Offending element task
        elem_task: String,
    },

    /// Internal invariant broken while constructing a conversation.
    ///
    /// Signals a generator bug rather than bad input data.
    #[error("Conversation construction failed: {0}")]
    Construction(String),

    /// Tokenizer failure
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failure talking to the text-generation collaborator
    #[error("Generation error: {0}")]
    Generation(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}
