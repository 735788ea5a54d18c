//! SLIP framing for the ROM loader serial stream
//!
//! Standard SLIP byte stuffing (RFC 1055), with one quirk: the ROM loader
//! expects every frame to open with a delimiter byte as well as close with
//! one, so the encoder emits 0xC0 on both sides of the escaped payload.

/// Frame delimiter
pub const END: u8 = 0xC0;
/// Escape byte
pub const ESC: u8 = 0xDB;
/// Escaped form of END
pub const ESC_END: u8 = 0xDC;
/// Escaped form of ESC
pub const ESC_ESC: u8 = 0xDD;

/// Encode one frame, delimiters included
pub fn encode(frame: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len() + 2);
    out.push(END);
    for &byte in frame {
        match byte {
            END => {
                out.push(ESC);
                out.push(ESC_END);
            }
            ESC => {
                out.push(ESC);
                out.push(ESC_ESC);
            }
            _ => out.push(byte),
        }
    }
    out.push(END);
    out
}

/// Stateful SLIP decoder
///
/// Feed it raw serial chunks as they arrive; it hands back one complete,
/// unescaped frame at a time. Bytes seen outside any frame (reset chatter
/// from the chip, line noise) are discarded, as is a dangling escape byte.
#[derive(Debug, Default)]
pub struct SlipDecoder {
    frame: Vec<u8>,
    in_frame: bool,
    in_escape: bool,
    ready: Vec<Vec<u8>>,
}

impl SlipDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate a chunk of raw serial bytes
    pub fn feed(&mut self, chunk: &[u8]) {
        for &byte in chunk {
            self.push(byte);
        }
    }

    /// Take the oldest fully received frame, if any
    pub fn try_decode(&mut self) -> Option<Vec<u8>> {
        if self.ready.is_empty() {
            None
        } else {
            Some(self.ready.remove(0))
        }
    }

    /// Drop all complete frames and any partially accumulated one
    pub fn clear(&mut self) {
        self.frame.clear();
        self.in_frame = false;
        self.in_escape = false;
        self.ready.clear();
    }

    fn push(&mut self, byte: u8) {
        if !self.in_frame {
            if byte == END {
                self.in_frame = true;
            }
            return;
        }

        if self.in_escape {
            self.in_escape = false;
            match byte {
                ESC_END => self.frame.push(END),
                ESC_ESC => self.frame.push(ESC),
                other => {
                    log::warn!("Invalid SLIP escape 0x{:02X}, dropping byte", other);
                }
            }
            return;
        }

        match byte {
            END => {
                // Back-to-back delimiters produce empty frames; skip them
                // so the leading-delimiter quirk does not surface upstream.
                if !self.frame.is_empty() {
                    self.ready.push(std::mem::take(&mut self.frame));
                }
            }
            ESC => self.in_escape = true,
            other => self.frame.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut dec = SlipDecoder::new();
        dec.feed(bytes);
        let mut frames = Vec::new();
        while let Some(f) = dec.try_decode() {
            frames.push(f);
        }
        frames
    }

    #[test]
    fn encode_plain() {
        assert_eq!(encode(&[0x01, 0x02, 0x03]), vec![END, 0x01, 0x02, 0x03, END]);
    }

    #[test]
    fn encode_escapes_end_and_esc() {
        assert_eq!(encode(&[END]), vec![END, ESC, ESC_END, END]);
        assert_eq!(encode(&[ESC]), vec![END, ESC, ESC_ESC, END]);
    }

    #[test]
    fn round_trip() {
        let frame = vec![0x00, END, ESC, 0xFF, 0x42, END, END, ESC];
        let frames = decode_all(&encode(&frame));
        assert_eq!(frames, vec![frame]);
    }

    #[test]
    fn round_trip_chunked() {
        let frame = vec![0x11, END, 0x22, ESC, 0x33];
        let encoded = encode(&frame);

        let mut dec = SlipDecoder::new();
        for chunk in encoded.chunks(1) {
            dec.feed(chunk);
        }
        assert_eq!(dec.try_decode(), Some(frame));
        assert_eq!(dec.try_decode(), None);
    }

    #[test]
    fn no_partial_delivery() {
        let mut dec = SlipDecoder::new();
        dec.feed(&[END, 0x01, 0x02]);
        assert_eq!(dec.try_decode(), None);
        dec.feed(&[0x03, END]);
        assert_eq!(dec.try_decode(), Some(vec![0x01, 0x02, 0x03]));
    }

    #[test]
    fn leading_noise_discarded() {
        // Boot chatter before the first delimiter never reaches the caller
        let mut bytes = vec![0xDE, 0xAD, 0x0A];
        bytes.extend_from_slice(&encode(&[0x55, 0x66]));
        assert_eq!(decode_all(&bytes), vec![vec![0x55, 0x66]]);
    }

    #[test]
    fn back_to_back_frames() {
        let mut bytes = encode(&[0x01]);
        bytes.extend_from_slice(&encode(&[0x02]));
        assert_eq!(decode_all(&bytes), vec![vec![0x01], vec![0x02]]);
    }

    #[test]
    fn clear_drops_everything() {
        let mut dec = SlipDecoder::new();
        dec.feed(&encode(&[0x01]));
        dec.feed(&[END, 0x02]);
        dec.clear();
        assert_eq!(dec.try_decode(), None);
        dec.feed(&encode(&[0x03]));
        assert_eq!(dec.try_decode(), Some(vec![0x03]));
    }
}
