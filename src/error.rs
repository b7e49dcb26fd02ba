//! Error types for song loading and engine setup

/// Error type for sequencer operations
#[derive(thiserror::Error, Debug)]
pub enum SequencerError {
    /// Malformed line in a song source
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number in the source text
        line: u64,
        /// What was wrong with the line
        message: String,
    },

    /// Invalid engine configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the CSV reader while splitting event lines
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error decoding a JSON configuration file
    #[error("Config decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Undecodable or unsupported Standard MIDI file
    #[error("MIDI error: {0}")]
    Midi(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl SequencerError {
    pub(crate) fn parse(line: u64, message: impl Into<String>) -> Self {
        SequencerError::Parse {
            line,
            message: message.into(),
        }
    }
}

impl From<String> for SequencerError {
    fn from(s: String) -> Self {
        SequencerError::Other(s)
    }
}

impl From<&str> for SequencerError {
    fn from(s: &str) -> Self {
        SequencerError::Other(s.to_string())
    }
}

/// Result type for sequencer operations
pub type Result<T> = std::result::Result<T, SequencerError>;
