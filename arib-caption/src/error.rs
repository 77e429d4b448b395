//! Error types for caption stream processing.

use thiserror::Error;

/// Errors raised while parsing the transport stream or the caption bitstream.
///
/// Apart from `Io`, every variant describes a problem confined to one packet,
/// section or payload unit. Callers log it and carry on with the next one.
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying reader or writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A length field points past the end of the available data.
    #[error("Truncated data: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// A fixed marker byte had an unexpected value.
    #[error("Invalid {what}: expected 0x{expected:02X}, got 0x{found:02X}")]
    InvalidMarker {
        what: &'static str,
        expected: u8,
        found: u8,
    },

    /// PES packet did not begin with 00 00 01.
    #[error("Invalid PES start code")]
    InvalidStartCode,

    /// PSI section could not be used.
    #[error("Section error: {0}")]
    Section(String),

    /// DRCS glyph definition was rejected.
    #[error("Glyph error: {0}")]
    Glyph(String),
}

/// Result type for caption processing.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn truncated(needed: usize, available: usize) -> Self {
        Error::Truncated { needed, available }
    }
}
