use byteorder::{ByteOrder, LittleEndian};

/// LSB-first bit cursor over a byte buffer padded to a 4-byte multiple.
///
/// Reading past the end is non-fatal: [`Self::next_bit`] returns `-1` and callers are
/// expected to check [`Self::is_eod`].
#[derive(Debug, Clone)]
pub struct BitReader {
    words: Vec<u32>,
    bit_len: usize,
    bit_idx: usize,
    word_idx: usize,
    current: u32,
}

impl BitReader {
    pub fn new(data: &[u8]) -> Self {
        let bit_len = data.len() * 8;
        let pad = (4 - (data.len() & 0x03)) & 0x03;
        let mut padded = Vec::with_capacity(data.len() + pad);
        padded.extend_from_slice(data);
        padded.extend(std::iter::repeat_n(0u8, pad));

        let words: Vec<u32> = padded.chunks_exact(4).map(LittleEndian::read_u32).collect();
        let current = words.first().copied().unwrap_or(0);

        Self {
            words,
            bit_len,
            bit_idx: 0,
            word_idx: 0,
            current,
        }
    }

    pub fn is_eod(&self) -> bool {
        self.bit_idx >= self.bit_len
    }

    /// Read `bits` bits (0..=32) LSB-first, assembling them into an unsigned value.
    pub fn read_bits(&mut self, bits: u32) -> i64 {
        let mut value: i64 = 0;
        for shift in 0..bits {
            let bit = self.next_bit();
            if bit == -1 {
                break;
            }
            value |= (bit as i64) << shift;
        }
        value
    }

    /// Returns the next bit, or `-1` once the stream is exhausted.
    pub fn next_bit(&mut self) -> i32 {
        if self.bit_idx >= self.bit_len {
            return -1;
        }
        let result = (self.current & 1) as i32;
        self.bit_idx += 1;
        if (self.bit_idx & 31) >= 1 {
            self.current >>= 1;
        } else {
            self.word_idx += 1;
            self.current = self.words.get(self.word_idx).copied().unwrap_or(0);
        }
        result
    }

    /// Skip up to 32 bits; returns the new bit offset, or `-1` if `skip` is out of range.
    pub fn skip_bits(&mut self, skip: i32) -> i64 {
        if !(0..=32).contains(&skip) || self.bit_idx + skip as usize > self.bit_len {
            return -1;
        }
        let current_amount = 32 - (self.bit_idx as i32 & 31);
        self.bit_idx += skip as usize;
        if current_amount > skip {
            self.current >>= skip;
        } else {
            self.word_idx += 1;
            self.current = self.words.get(self.word_idx).copied().unwrap_or(0);
            let remaining = skip - current_amount;
            if remaining > 0 {
                self.current >>= remaining;
            }
        }
        self.bit_idx as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_packed_values() {
        // 0b1010_1100 0b0000_0001, LSB-first: first 8 bits = 0xAC, next 8 = 0x01.
        let mut reader = BitReader::new(&[0xAC, 0x01]);
        assert_eq!(reader.read_bits(8), 0xAC);
        assert_eq!(reader.read_bits(8), 0x01);
        assert!(reader.is_eod());
    }

    #[test]
    fn next_bit_returns_minus_one_past_end() {
        let mut reader = BitReader::new(&[0xFF]);
        for _ in 0..8 {
            assert_ne!(reader.next_bit(), -1);
        }
        assert_eq!(reader.next_bit(), -1);
        assert!(reader.is_eod());
    }

    #[test]
    fn skip_bits_advances_cursor() {
        let mut reader = BitReader::new(&[0x0F, 0xF0]);
        assert_eq!(reader.skip_bits(4), 4);
        assert_eq!(reader.read_bits(4), 0x0F);
    }
}
