//! Envelope and Framing Checks
//!
//! Both checks are pure, single-pass and bounded by the slice length. The
//! slice handed in is the trusted extent of the packet.

use crate::error::ValidationError;

/// Smallest packet either check will look at
pub const MIN_PACKET_LEN: usize = 2;

/// Maximum number of bytes in the remaining-length field
pub const MAX_LENGTH_BYTES: usize = 4;

/// Lowest accepted control type code
pub const MIN_TYPE_CODE: u8 = 1;

/// Highest accepted control type code
pub const MAX_TYPE_CODE: u8 = 14;

/// Largest value the remaining-length field can carry
pub const MAX_REMAINING_LENGTH: u32 = (1 << (7 * MAX_LENGTH_BYTES)) - 1;

/// Result of a passing envelope check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// First byte of the packet
    pub packet_type: u8,
    /// Payload length declared by the second byte
    pub declared_len: u8,
}

/// Header layout found by a passing framing check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    /// First byte: type code in the high nibble, flags in the low nibble
    pub control_byte: u8,
    /// Decoded remaining-length field
    pub remaining_length: u32,
    /// Control byte plus length field, 2..=5 bytes
    pub header_size: usize,
}

impl FrameDescriptor {
    /// Control type code (high nibble of the control byte)
    pub fn type_code(&self) -> u8 {
        self.control_byte >> 4
    }
}

/// Generic two-byte type/length boundary check
pub fn check_envelope(packet: &[u8]) -> Result<Envelope, ValidationError> {
    let (packet_type, declared_len) = match packet {
        [packet_type, declared_len, ..] => (*packet_type, *declared_len),
        _ => {
            return Err(ValidationError::TooShort {
                len: packet.len(),
                min: MIN_PACKET_LEN,
            })
        }
    };

    let available = packet.len() - MIN_PACKET_LEN;
    if usize::from(declared_len) > available {
        return Err(ValidationError::DeclaredLengthOverrun {
            declared: usize::from(declared_len),
            available,
        });
    }

    Ok(Envelope {
        packet_type,
        declared_len,
    })
}

/// Control byte plus base-128 remaining-length framing check
pub fn check_framing(packet: &[u8]) -> Result<FrameDescriptor, ValidationError> {
    if packet.len() < MIN_PACKET_LEN {
        return Err(ValidationError::TooShort {
            len: packet.len(),
            min: MIN_PACKET_LEN,
        });
    }

    let control_byte = packet[0];
    let type_code = control_byte >> 4;
    if !(MIN_TYPE_CODE..=MAX_TYPE_CODE).contains(&type_code) {
        return Err(ValidationError::InvalidTypeCode(type_code));
    }

    let mut remaining_length: u32 = 0;
    let mut offset = 1;
    let mut shift = 0;
    loop {
        let Some(&encoded) = packet.get(offset) else {
            return Err(ValidationError::UnterminatedLength(offset - 1));
        };
        offset += 1;
        remaining_length |= u32::from(encoded & 0x7F) << shift;
        shift += 7;

        if encoded & 0x80 == 0 {
            break;
        }
        if offset - 1 == MAX_LENGTH_BYTES {
            return Err(ValidationError::LengthFieldTooLong(MAX_LENGTH_BYTES));
        }
    }

    let available = packet.len() - offset;
    if remaining_length as usize > available {
        return Err(ValidationError::BodyOverrun {
            remaining: remaining_length,
            available,
        });
    }

    Ok(FrameDescriptor {
        control_byte,
        remaining_length,
        header_size: offset,
    })
}

/// Encode `value` as a remaining-length field; `None` above [`MAX_REMAINING_LENGTH`]
pub fn encode_remaining_length(value: u32) -> Option<Vec<u8>> {
    if value > MAX_REMAINING_LENGTH {
        return None;
    }
    let mut out = Vec::with_capacity(MAX_LENGTH_BYTES);
    let mut rest = value;
    loop {
        let mut byte = (rest & 0x7F) as u8;
        rest >>= 7;
        if rest > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if rest == 0 {
            return Some(out);
        }
    }
}
