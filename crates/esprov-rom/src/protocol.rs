//! ESP32 ROM loader protocol constants and packet codec
//!
//! The ROM bootloader speaks a half-duplex request/response protocol over
//! SLIP-framed serial. Every packet starts with an 8-byte header:
//! direction, opcode, payload length (u16 LE), checksum-or-value (u32 LE),
//! followed by the payload bytes.

/// Direction byte for host-to-chip packets
pub const REQUEST: u8 = 0x00;
/// Direction byte for chip-to-host packets
pub const RESPONSE: u8 = 0x01;

// Command opcodes
/// Synchronize with the ROM loader
pub const ESP_SYNC: u8 = 0x08;
/// Write a 32-bit register
pub const ESP_WRITE_REG: u8 = 0x09;
/// Read a 32-bit register
pub const ESP_READ_REG: u8 = 0x0a;

/// Chip-detect magic register, readable on all ESP32 variants
pub const CHIP_DETECT_MAGIC_REG_ADDR: u32 = 0x4000_1000;
/// First of the four eFuse words holding the ESP32-S3 factory MAC
pub const ESP32S3_MAC_FUSE_ADDR: u32 = 0x6000_7000 + 0x044;
/// Number of consecutive fuse words read for MAC derivation
pub const MAC_FUSE_WORDS: usize = 4;

/// Payload of the SYNC command: 0x07 0x07 0x12 0x20 followed by 32x 0x55
pub const SYNC_PAYLOAD: [u8; 36] = {
    let mut p = [0x55u8; 36];
    p[0] = 0x07;
    p[1] = 0x07;
    p[2] = 0x12;
    p[3] = 0x20;
    p
};

/// Request header length in bytes
pub const HEADER_LEN: usize = 8;

/// Outcome of one command exchange
///
/// Mismatched or missing responses are data, not errors: the caller owns
/// the retry policy, so the channel reports them as `Invalid` instead of
/// failing the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    /// A response with matching direction and opcode
    Valid {
        /// The 32-bit value field of the response header
        value: u32,
        /// Trailing payload, present when the response size field is non-zero
        payload: Option<Vec<u8>>,
    },
    /// No response arrived, or one arrived with the wrong direction/opcode
    Invalid,
}

impl CommandReply {
    /// Whether this reply carries a usable answer
    pub fn is_valid(&self) -> bool {
        matches!(self, CommandReply::Valid { .. })
    }

    /// The response value, or `None` for an invalid reply
    pub fn value(&self) -> Option<u32> {
        match self {
            CommandReply::Valid { value, .. } => Some(*value),
            CommandReply::Invalid => None,
        }
    }
}

/// ROM loader checksum: XOR fold over the payload, seeded with 0xEF
///
/// XOR is commutative and associative, so the result is insensitive to byte
/// order; that is a property of the protocol's checksum, not a defect here.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0xef, |acc, &b| acc ^ b)
}

/// Assemble an unframed request packet: 8-byte header plus payload
///
/// The checksum field is populated only when `with_checksum` is set; SYNC
/// and READ_REG are sent with it zeroed.
pub fn encode_request(opcode: u8, payload: &[u8], with_checksum: bool) -> Vec<u8> {
    debug_assert!(payload.len() <= u16::MAX as usize);

    let mut packet = Vec::with_capacity(HEADER_LEN + payload.len());
    packet.push(REQUEST);
    packet.push(opcode);
    packet.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    let check = if with_checksum {
        checksum(payload) as u32
    } else {
        0
    };
    packet.extend_from_slice(&check.to_le_bytes());
    packet.extend_from_slice(payload);
    packet
}

/// Parse an unframed response packet against the outstanding request
///
/// A frame is accepted only if its direction byte is `RESPONSE` and its
/// opcode matches `expected_opcode`; anything else is `Invalid`. The ROM
/// loader defines no checksum on responses, so none is validated.
pub fn parse_response(frame: &[u8], expected_opcode: u8) -> CommandReply {
    if frame.len() < HEADER_LEN {
        log::warn!("Short frame ({} bytes), ignoring", frame.len());
        return CommandReply::Invalid;
    }
    if frame[0] != RESPONSE {
        log::warn!("Frame direction 0x{:02X} is not a response", frame[0]);
        return CommandReply::Invalid;
    }
    if frame[1] != expected_opcode {
        log::warn!(
            "Response opcode 0x{:02X} does not match request 0x{:02X}",
            frame[1],
            expected_opcode
        );
        return CommandReply::Invalid;
    }

    let size = u16::from_le_bytes([frame[2], frame[3]]) as usize;
    let value = u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]);
    if frame.len() < HEADER_LEN + size {
        log::warn!(
            "Response claims {} payload bytes but only {} present",
            size,
            frame.len() - HEADER_LEN
        );
        return CommandReply::Invalid;
    }

    let payload = if size > 0 {
        Some(frame[HEADER_LEN..HEADER_LEN + size].to_vec())
    } else {
        None
    };
    CommandReply::Valid { value, payload }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_seed() {
        assert_eq!(checksum(&[]), 0xef);
    }

    #[test]
    fn checksum_pairs_cancel() {
        // 0xEF ^ 0x07 ^ 0x07 == 0xEF
        assert_eq!(checksum(&[0x07, 0x07]), 0xef);
    }

    #[test]
    fn checksum_permutation_invariant() {
        // XOR folding does not depend on byte order
        assert_eq!(checksum(&[0x01, 0x02, 0x03]), checksum(&[0x03, 0x01, 0x02]));
    }

    #[test]
    fn sync_request_bytes() {
        let packet = encode_request(ESP_SYNC, &SYNC_PAYLOAD, false);
        assert_eq!(packet.len(), 44);
        assert_eq!(&packet[..8], &[0x00, 0x08, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(&packet[8..], &SYNC_PAYLOAD[..]);
    }

    #[test]
    fn request_with_checksum() {
        let packet = encode_request(0x03, &[0x10, 0x20], true);
        assert_eq!(packet[2..4], [0x02, 0x00]);
        let expected = 0xefu8 ^ 0x10 ^ 0x20;
        assert_eq!(packet[4..8], [expected, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn parse_valid_response() {
        let mut frame = vec![RESPONSE, ESP_READ_REG, 0x02, 0x00];
        frame.extend_from_slice(&0xdead_beefu32.to_le_bytes());
        frame.extend_from_slice(&[0xaa, 0xbb]);

        let reply = parse_response(&frame, ESP_READ_REG);
        assert_eq!(
            reply,
            CommandReply::Valid {
                value: 0xdead_beef,
                payload: Some(vec![0xaa, 0xbb]),
            }
        );
    }

    #[test]
    fn parse_rejects_wrong_direction() {
        let mut frame = vec![REQUEST, ESP_READ_REG, 0x00, 0x00];
        frame.extend_from_slice(&[0; 4]);
        assert_eq!(parse_response(&frame, ESP_READ_REG), CommandReply::Invalid);
    }

    #[test]
    fn parse_rejects_wrong_opcode() {
        let mut frame = vec![RESPONSE, ESP_SYNC, 0x00, 0x00];
        frame.extend_from_slice(&[0; 4]);
        assert_eq!(parse_response(&frame, ESP_READ_REG), CommandReply::Invalid);
    }

    #[test]
    fn parse_rejects_truncated_payload() {
        let mut frame = vec![RESPONSE, ESP_READ_REG, 0x08, 0x00];
        frame.extend_from_slice(&[0; 4]);
        frame.extend_from_slice(&[0x01, 0x02]);
        assert_eq!(parse_response(&frame, ESP_READ_REG), CommandReply::Invalid);
    }
}
