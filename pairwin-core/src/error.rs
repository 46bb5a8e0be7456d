//! Error taxonomy for the window engine.
//!
//! - Configuration errors are raised while building the engine, before any
//!   row is written.
//! - Sink failures carry the destination they were writing to.

use std::io;

use thiserror::Error;

use crate::window::GenomicWindow;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window list is empty")]
    EmptyWindows,

    #[error("window {window} is on a contig missing from the sequence dictionary")]
    UnknownContig { window: GenomicWindow },

    #[error("window {window} is malformed: {reason}")]
    MalformedWindow { window: GenomicWindow, reason: &'static str },

    #[error("window {current} is not sorted after {previous} or overlaps it")]
    UnsortedWindows { previous: GenomicWindow, current: GenomicWindow },

    #[error("window size must be positive")]
    InvalidWindowSize,

    #[error("contig '{0}' appears twice in the sequence dictionary")]
    DuplicateContig(String),

    #[error("invalid column name {0:?}")]
    InvalidColumnName(String),

    #[error("column '{0}' is defined more than once")]
    DuplicateColumn(String),

    #[error("expected {expected} column names for the configured statistics, got {found}")]
    ColumnCountMismatch { expected: usize, found: usize },

    #[error("failed to write to {destination}")]
    SinkWrite {
        destination: String,
        #[source]
        source: io::Error,
    },
}

impl WindowError {
    /// True for the errors raised while configuring the engine.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, WindowError::SinkWrite { .. })
    }
}

pub type Result<T, E = WindowError> = std::result::Result<T, E>;
