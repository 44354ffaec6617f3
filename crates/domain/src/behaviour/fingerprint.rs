//! Fletcher-32 checksum, used to fingerprint the behaviour store.

/// Incremental Fletcher-32 over little-endian 16-bit words.
///
/// An odd trailing byte is zero-padded to a full word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fletcher32 {
    low: u32,
    high: u32,
}

impl Default for Fletcher32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Fletcher32 {
    #[must_use]
    pub const fn new() -> Self {
        Self { low: 0, high: 0 }
    }

    pub fn update(&mut self, data: &[u8]) {
        for word in data.chunks(2) {
            let value = match *word {
                [lo, hi] => u16::from_le_bytes([lo, hi]),
                [lo] => u16::from(lo),
                _ => 0,
            };
            self.low = (self.low + u32::from(value)) % 0xffff;
            self.high = (self.high + self.low) % 0xffff;
        }
    }

    #[must_use]
    pub const fn finish(&self) -> u32 {
        (self.high << 16) | self.low
    }
}
