//! Factory MAC derivation and hostname formatting

use core::fmt;

use crate::protocol::MAC_FUSE_WORDS;

/// The four raw eFuse words read from the MAC fuse block
pub type FuseWords = [u32; MAC_FUSE_WORDS];

/// A 6-byte factory MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Reconstruct the MAC from the fuse words
    ///
    /// Bit layout is specific to the ESP32-S3 eFuse map: the two low words
    /// carry all six bytes, words 2 and 3 are read but unused.
    pub fn from_fuse_words(words: &FuseWords) -> Self {
        let w0 = words[0];
        let w1 = words[1];
        MacAddress([
            (w1 >> 8) as u8,
            w1 as u8,
            (w0 >> 24) as u8,
            (w0 >> 16) as u8,
            (w0 >> 8) as u8,
            w0 as u8,
        ])
    }

    /// Provisioning hostname: prefix plus the three low MAC bytes in hex
    ///
    /// Each byte renders as exactly two lowercase hex digits.
    pub fn hostname(&self, prefix: &str) -> String {
        format!(
            "{}{:02x}{:02x}{:02x}",
            prefix, self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_example() {
        let words: FuseWords = [0xAABB_CCDD, 0x0000_EEFF, 0, 0];
        let mac = MacAddress::from_fuse_words(&words);
        assert_eq!(mac.0, [0xEE, 0xFF, 0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn hostname_from_example() {
        let mac = MacAddress([0xEE, 0xFF, 0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(mac.hostname("esp32host_"), "esp32host_aabbcc");
    }

    #[test]
    fn hostname_zero_pads() {
        let mac = MacAddress([0, 0, 0, 0x01, 0x02, 0x0A]);
        assert_eq!(mac.hostname("dev-"), "dev-01020a");
    }

    #[test]
    fn display_format() {
        let mac = MacAddress([0xEE, 0xFF, 0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(mac.to_string(), "EE:FF:AA:BB:CC:DD");
    }
}
