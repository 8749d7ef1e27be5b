//! Validation Error Types

use thiserror::Error;

/// Reasons a packet is rejected by a validator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Fewer bytes than the smallest possible header
    #[error("Packet too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },

    /// Declared payload would extend past the received bytes
    #[error("Declared payload of {declared} bytes exceeds the {available} bytes available")]
    DeclaredLengthOverrun { declared: usize, available: usize },

    /// Control type nibble outside the accepted range
    #[error("Invalid control type code: {0}")]
    InvalidTypeCode(u8),

    /// Buffer ended before a terminating length byte
    #[error("Remaining-length field not terminated within {0} bytes")]
    UnterminatedLength(usize),

    /// Length field continues beyond the maximum number of bytes
    #[error("Remaining-length field longer than {0} bytes")]
    LengthFieldTooLong(usize),

    /// Declared body length exceeds the bytes after the header
    #[error("Remaining length {remaining} exceeds the {available} bytes after the header")]
    BodyOverrun { remaining: u32, available: usize },
}
