//! Error types for the ink-count classifier

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A data row with the wrong field count or an unparseable value.
    /// `line` is the one-based line number in the source file, header included.
    #[error("Malformed record on line {line} ({reason}): [{content}]")]
    MalformedRecord {
        line: u64,
        content: String,
        reason: String,
    },

    #[error("No training examples for class {label}")]
    InvalidClassProfile { label: u8 },

    #[error("Training record {id} has no label")]
    UnlabeledTrainingRecord { id: usize },

    #[error("Unable to classify record {id}: no class profile has any training examples")]
    UnclassifiableRecord { id: usize },

    #[error("Hold-out fraction must be strictly between 0 and 1, got {fraction}")]
    InvalidHoldout { fraction: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
