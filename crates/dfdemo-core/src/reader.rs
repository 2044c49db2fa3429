//! Huffman-coded message reader: the composition of [`crate::bitstream::BitReader`] and
//! [`crate::huffman::decode_symbol`] into the typed primitives the snapshot engine reads
//! fields with (bytes, shorts, longs, truncated floats, strings).

use crate::bitstream::BitReader;
use crate::huffman::decode_symbol;
use crate::protocol::{
    FLOAT_INT_BIAS, FLOAT_INT_BITS, Q3_BIG_INFO_STRING, Q3_DOT_CHAR_BYTE, Q3_HUFFMAN_NYT_SYM,
    Q3_MAX_STRING_CHARS, Q3_PERCENT_CHAR_BYTE,
};
use crate::util::raw_bits_to_float;

/// Bit index of entry `idx` within a 32-bit field-presence mask.
const BIT_POS: [u32; 32] = {
    let mut table = [0u32; 32];
    let mut i = 0;
    while i < 32 {
        table[i] = 1 << i;
        i += 1;
    }
    table
};

pub struct MessageReader {
    stream: BitReader,
}

impl MessageReader {
    pub fn new(data: &[u8]) -> Self {
        Self {
            stream: BitReader::new(data),
        }
    }

    pub fn is_eod(&self) -> bool {
        self.stream.is_eod()
    }

    /// Reads `bits` bits, Huffman-decoding in 8-bit fragments, sign-extending when `bits`
    /// is negative (the reference decoder's convention for "signed field of this width").
    pub fn read_num_bits(&mut self, bits: i32) -> i64 {
        let neg = bits < 0;
        let mut bits = if neg { -bits } else { bits };
        let fragment_bits = bits & 7;
        let mut value: i64 = 0;
        if fragment_bits != 0 {
            value = self.stream.read_bits(fragment_bits as u32);
            bits -= fragment_bits;
        }
        if bits != 0 {
            let mut decoded: i64 = 0;
            let mut offset = 0;
            while offset < bits {
                let sym = decode_symbol(&mut self.stream);
                if sym == Q3_HUFFMAN_NYT_SYM {
                    return -1;
                }
                decoded |= (sym as i64) << offset;
                offset += 8;
            }
            if fragment_bits != 0 {
                decoded <<= fragment_bits;
            }
            value |= decoded;
        }
        if neg && bits > 0 && (value & (1 << (bits - 1))) != 0 {
            value |= -1i64 ^ ((1i64 << bits) - 1);
        }
        value
    }

    pub fn read_number(&mut self, bits: i32) -> i64 {
        if bits == 8 {
            decode_symbol(&mut self.stream) as i64
        } else {
            self.read_num_bits(bits)
        }
    }

    pub fn read_byte(&mut self) -> i64 {
        decode_symbol(&mut self.stream) as i64
    }

    pub fn read_short(&mut self) -> i64 {
        self.read_num_bits(16)
    }

    pub fn read_int(&mut self) -> i64 {
        self.read_num_bits(32)
    }

    pub fn read_long(&mut self) -> i64 {
        self.read_num_bits(32)
    }

    pub fn read_float(&mut self) -> f64 {
        let value = self.read_num_bits(32);
        if self.is_eod() {
            return -1.0;
        }
        raw_bits_to_float(value)
    }

    pub fn read_angle16(&mut self) -> f64 {
        (self.read_num_bits(16) as f64 * 360.0) / 65536.0
    }

    /// Most origin/angle fields are truncated to an integer and bias-packed, only
    /// falling back to a full float when the value didn't round-trip on encode.
    pub fn read_float_integral(&mut self) -> f64 {
        if self.read_num_bits(1) == 0 {
            let mut trunc = self.read_num_bits(FLOAT_INT_BITS);
            trunc -= FLOAT_INT_BIAS as i64;
            trunc as f64
        } else {
            self.read_float()
        }
    }

    pub fn read_data(&mut self, out: &mut [u8]) {
        for byte in out.iter_mut() {
            *byte = self.read_byte() as u8;
        }
    }

    fn read_string_base(&mut self, limit: usize, stop_at_newline: bool) -> String {
        let mut chars = String::new();
        for _ in 0..limit {
            let mut byte = decode_symbol(&mut self.stream);
            if byte <= 0 {
                break;
            }
            if stop_at_newline && byte == 0x0A {
                break;
            }
            if byte > 127 || byte == Q3_PERCENT_CHAR_BYTE {
                byte = Q3_DOT_CHAR_BYTE;
            }
            chars.push(byte as u8 as char);
        }
        chars
    }

    pub fn read_string(&mut self) -> String {
        self.read_string_base(Q3_MAX_STRING_CHARS, false)
    }

    pub fn read_big_string(&mut self) -> String {
        self.read_string_base(Q3_BIG_INFO_STRING, false)
    }

    pub fn read_string_line(&mut self) -> String {
        self.read_string_base(Q3_MAX_STRING_CHARS, true)
    }

    pub fn read_server_command(&mut self) -> (i64, String) {
        (self.read_long(), self.read_string())
    }

    /// Reads a `count`-bit presence mask, then reads a short for every set bit.
    pub fn read_ps_array(&mut self, array: &mut [i64], length: usize) {
        let bits = self.read_num_bits(length as i32);
        for idx in 0..length {
            if bits & BIT_POS[idx] as i64 != 0 {
                array[idx] = self.read_short();
            }
        }
    }

    /// Same as [`Self::read_ps_array`] but with full longs for the set entries
    /// (powerups carry a 32-bit expiry timestamp rather than a 16-bit value).
    pub fn read_ps_long_array(&mut self, array: &mut [i64], length: usize) {
        let bits = self.read_num_bits(length as i32);
        for idx in 0..length {
            if bits & BIT_POS[idx] as i64 != 0 {
                array[idx] = self.read_long();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_num_bits_sign_extends_negative_width() {
        // Encode -1 in a packed 4-bit huffman-free fragment: all bits set, then
        // sign-extend on read since width is negative.
        let mut reader = MessageReader::new(&[0x0F]);
        assert_eq!(reader.read_num_bits(-4), -1);
    }

    #[test]
    fn read_float_integral_recovers_truncated_value() {
        // bit 0 = 0 (truncated path), followed by a 13-bit biased integer for 5.0.
        let mut writer_bits: u32 = 0;
        writer_bits |= 0; // presence bit
        let biased = (5i64 + FLOAT_INT_BIAS as i64) as u32;
        writer_bits |= biased << 1;
        let bytes = writer_bits.to_le_bytes();
        let mut reader = MessageReader::new(&bytes);
        assert_eq!(reader.read_float_integral(), 5.0);
    }
}
