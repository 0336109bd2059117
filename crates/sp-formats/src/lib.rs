//! Persistence formats for spatium.
//!
//! Serializes a complete `SessionState` into a section-directory
//! container and restores it bit-for-bit.

mod state_format;

pub use state_format::{load_state, save_state, write_state, FORMAT_VERSION};

use thiserror::Error;

/// Error type for state parsing.
///
/// Only container-level damage is an error; a damaged or missing section
/// falls back to defaults and is logged instead.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Invalid file header or magic bytes
    #[error("invalid header or magic bytes")]
    InvalidHeader,
    /// Unexpected end of data
    #[error("unexpected end of data")]
    UnexpectedEof,
    /// Written by a newer format version
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),
    /// Any other record-level failure
    #[error("malformed record: {0}")]
    Record(String),
}

impl From<binrw::Error> for FormatError {
    fn from(err: binrw::Error) -> Self {
        if err.is_eof() {
            return Self::UnexpectedEof;
        }
        match err {
            binrw::Error::BadMagic { .. } => Self::InvalidHeader,
            other => Self::Record(other.to_string()),
        }
    }
}
