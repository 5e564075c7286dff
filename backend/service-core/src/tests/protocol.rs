// Unit tests for the TFTP wire codec

use crate::error::protocol::ProtocolError;
use crate::protocol::{BLOCK_SIZE, ErrorCode, Opcode, Packet, TransferMode};

/// **VALUE**: Pins the exact bytes of the probe's read request.
///
/// **WHY THIS MATTERS**: External daemons (dnsmasq, atftpd) only answer a correctly framed
/// RRQ. The probe is useless if a single byte is off.
///
/// **BUG THIS CATCHES**: Would catch a little-endian opcode, a missing NUL after the
/// filename or mode, or a mode string other than `octet`.
#[test]
fn given_read_request_when_encoded_then_matches_rfc_framing() {
    // GIVEN: The probe's request
    let packet = Packet::read_request("test_file.txt", TransferMode::Octet);

    // WHEN: Encoding
    let bytes = packet.encode();

    // THEN: 0x0001 + filename NUL + "octet" NUL
    assert_eq!(bytes, b"\x00\x01test_file.txt\x00octet\x00".to_vec());
}

/// **VALUE**: Verifies request decoding tolerates mode case and trailing option pairs.
///
/// **WHY THIS MATTERS**: Real clients send `OCTET` or append `blksize` options. The fallback
/// server must still serve them (options are ignored, not rejected).
///
/// **BUG THIS CATCHES**: Would catch a case-sensitive mode match or a decoder that requires
/// exactly two NUL-terminated fields.
#[test]
fn given_request_with_uppercase_mode_and_options_when_decoded_then_ignores_options() {
    // GIVEN: RRQ with upper-case mode and a blksize option
    let datagram = b"\x00\x01boot/pxelinux.0\x00OCTET\x00blksize\x001428\x00";

    // WHEN: Decoding
    let packet = Packet::decode(datagram).expect("request should decode");

    // THEN: Filename and mode extracted
    assert_eq!(
        packet,
        Packet::ReadRequest {
            filename: String::from("boot/pxelinux.0"),
            mode: TransferMode::Octet,
        }
    );
}

/// **VALUE**: Verifies that a request without the terminating NUL on the mode is refused.
///
/// **WHY THIS MATTERS**: A truncated request must get an ERROR reply instead of being served
/// under a guessed mode.
///
/// **BUG THIS CATCHES**: Would catch a decoder that silently accepts unterminated fields.
#[test]
fn given_request_without_mode_terminator_when_decoded_then_returns_decode_error() {
    // GIVEN: Mode missing its trailing NUL
    let datagram = b"\x00\x02upload.bin\x00octet";

    // WHEN: Decoding
    let result = Packet::decode(datagram);

    // THEN: Decode error
    assert!(matches!(result, Err(ProtocolError::Decode { .. })));
}

/// **VALUE**: Verifies unknown opcodes surface as their own error carrying the raw value.
///
/// **WHY THIS MATTERS**: The server logs the opcode when it rejects a datagram; having the
/// value makes misdirected traffic easy to diagnose.
///
/// **BUG THIS CATCHES**: Would catch if unknown opcodes are mapped onto a valid variant.
#[test]
fn given_unknown_opcode_when_decoded_then_reports_raw_value() {
    // GIVEN: Opcode 9
    let datagram = [0x00, 0x09, 0x00, 0x01];

    // WHEN: Decoding
    let result = Packet::decode(&datagram);

    // THEN: UnknownOpcode with 9
    match result {
        Err(ProtocolError::UnknownOpcode { opcode, .. }) => assert_eq!(opcode, 9),
        other => panic!("Expected UnknownOpcode, got {other:?}"),
    }
}

/// **VALUE**: Verifies DATA decoding keeps the block number and rejects oversized payloads.
///
/// **WHY THIS MATTERS**: Write transfers end on the first short block. A payload larger than
/// 512 bytes would break that rule and corrupt the stored file.
///
/// **BUG THIS CATCHES**: Would catch a missing size check or a swapped block-number byte order.
#[test]
fn given_data_packets_when_decoded_then_block_and_size_are_checked() {
    // GIVEN: A valid DATA for block 258 and an oversized one
    let mut valid = vec![0x00, 0x03, 0x01, 0x02];
    valid.extend_from_slice(b"hello");
    let mut oversized = vec![0x00, 0x03, 0x00, 0x01];
    oversized.extend(std::iter::repeat_n(0xAB, BLOCK_SIZE + 1));

    // WHEN/THEN: Valid decodes, oversized fails
    assert_eq!(
        Packet::decode(&valid).unwrap(),
        Packet::Data {
            block: 258,
            payload: b"hello".to_vec()
        }
    );
    assert!(Packet::decode(&oversized).is_err());
}

/// **VALUE**: Verifies ERROR packets decode even when the peer omits the trailing NUL.
///
/// **WHY THIS MATTERS**: Several embedded TFTP stacks send unterminated messages; the server
/// must still recognise the ERROR and abort the transfer.
///
/// **BUG THIS CATCHES**: Would catch a strict decoder that turns peer errors into noise.
#[test]
fn given_unterminated_error_message_when_decoded_then_message_is_kept() {
    // GIVEN: ERROR code 1 "gone" without NUL
    let datagram = b"\x00\x05\x00\x01gone";

    // WHEN: Decoding
    let packet = Packet::decode(datagram).unwrap();

    // THEN: Code and message preserved
    assert_eq!(
        packet,
        Packet::Error {
            code: ErrorCode::FileNotFound,
            message: String::from("gone")
        }
    );
}

/// **VALUE**: Verifies `Opcode::peek` reads only the leading two bytes.
///
/// **WHY THIS MATTERS**: The probe classifies replies by opcode alone and must not care
/// about the rest of the datagram.
///
/// **BUG THIS CATCHES**: Would catch a peek that requires a fully valid packet, or that
/// panics on one-byte datagrams.
#[test]
fn given_short_and_long_datagrams_when_peeked_then_returns_leading_opcode() {
    assert_eq!(Opcode::peek(&[0x00, 0x03, 0xFF]), Some(Opcode::Data as u16));
    assert_eq!(Opcode::peek(&[0x00, 0x05]), Some(5));
    assert_eq!(Opcode::peek(&[0x03]), None);
    assert_eq!(Opcode::peek(&[]), None);
}
