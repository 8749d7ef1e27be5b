//! Packet Validation
//!
//! Classifies raw inbound packets with two independent checks:
//! a generic type/length envelope check and a control-byte plus
//! variable-length remaining-length framing check.

mod buffer;
mod error;
mod validator;

pub use buffer::{PacketBuffer, PACKET_CAPACITY};
pub use error::ValidationError;
pub use validator::{
    check_envelope, check_framing, encode_remaining_length, Envelope, FrameDescriptor,
    MAX_LENGTH_BYTES, MAX_REMAINING_LENGTH, MAX_TYPE_CODE, MIN_PACKET_LEN, MIN_TYPE_CODE,
};
