// Fatal error taxonomy for format I/O.
//
// Only malformed input and I/O failures abort a conversion; per-event and
// per-frame problems stay in the core crate's Diagnostics and never reach
// this type. Parse errors carry the offending line and column so the CLI
// can point at the exact spot.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Malformed input; `line` and `column` are 1-based.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// The path's extension maps to no known format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A 1-based track selection outside the file's track list.
    #[error("invalid track number {selected}: file has {available} tracks")]
    InvalidTrack { selected: usize, available: usize },

    #[error("MIDI error: {0}")]
    Midi(#[from] midly::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn parse(line: usize, column: usize, message: impl Into<String>) -> ConvertError {
        ConvertError::Parse {
            line,
            column,
            message: message.into(),
        }
    }
}
