//! Property tests for the packet validators

use packet_validator::{
    check_envelope, check_framing, encode_remaining_length, ValidationError,
    MAX_REMAINING_LENGTH,
};
use proptest::prelude::*;

/// Control bytes whose type code is in the accepted range
fn valid_control_byte() -> impl Strategy<Value = u8> {
    (1u8..=14, 0u8..16).prop_map(|(code, flags)| (code << 4) | flags)
}

proptest! {
    #[test]
    fn short_packets_always_rejected(packet in prop::collection::vec(any::<u8>(), 0..2)) {
        prop_assert!(check_envelope(&packet).is_err());
        prop_assert!(check_framing(&packet).is_err());
    }

    #[test]
    fn envelope_accepts_exactly_when_declared_fits(
        packet_type in any::<u8>(),
        declared in any::<u8>(),
        body in prop::collection::vec(any::<u8>(), 0..300),
    ) {
        let mut packet = vec![packet_type, declared];
        packet.extend_from_slice(&body);

        match check_envelope(&packet) {
            Ok(envelope) => {
                prop_assert!(usize::from(declared) <= body.len());
                prop_assert_eq!(envelope.packet_type, packet_type);
                prop_assert_eq!(envelope.declared_len, declared);
            }
            Err(ValidationError::DeclaredLengthOverrun { .. }) => {
                prop_assert!(usize::from(declared) > body.len());
            }
            Err(other) => prop_assert!(false, "unexpected rejection: {}", other),
        }
    }

    #[test]
    fn reserved_type_codes_rejected(
        flags in 0u8..16,
        high in prop_oneof![Just(0u8), Just(15u8)],
        rest in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        let mut packet = vec![(high << 4) | flags];
        packet.extend_from_slice(&rest);
        prop_assert_eq!(check_framing(&packet), Err(ValidationError::InvalidTypeCode(high)));
    }

    #[test]
    fn well_formed_frames_accepted(
        control in valid_control_byte(),
        remaining in 0u32..2048,
        trailing in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let field = encode_remaining_length(remaining).unwrap();
        let mut packet = vec![control];
        packet.extend_from_slice(&field);
        packet.resize(packet.len() + remaining as usize, 0xA5);
        packet.extend_from_slice(&trailing);

        let frame = check_framing(&packet).unwrap();
        prop_assert_eq!(frame.control_byte, control);
        prop_assert_eq!(frame.remaining_length, remaining);
        prop_assert_eq!(frame.header_size, 1 + field.len());
    }

    #[test]
    fn length_field_decodes_full_range(control in valid_control_byte(), value in 0..=MAX_REMAINING_LENGTH) {
        // Header alone: anything above zero must be reported as a body overrun, never misparsed
        let field = encode_remaining_length(value).unwrap();
        prop_assert!(field.len() <= 4);
        let mut packet = vec![control];
        packet.extend_from_slice(&field);

        match check_framing(&packet) {
            Ok(frame) => prop_assert_eq!(frame.remaining_length, 0),
            Err(ValidationError::BodyOverrun { remaining, available }) => {
                prop_assert_eq!(remaining, value);
                prop_assert_eq!(available, 0);
            }
            Err(other) => prop_assert!(false, "unexpected rejection: {}", other),
        }
    }

    #[test]
    fn validators_are_idempotent(packet in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assert_eq!(check_envelope(&packet), check_envelope(&packet));
        prop_assert_eq!(check_framing(&packet), check_framing(&packet));
    }
}
