use std::collections::HashMap;

/// Reassembles a raw 32-bit pattern into an IEEE-754 single by hand, matching the
/// reference decoder's manual reconstruction rather than `f32::from_bits` — the demo
/// format's `readFloat` and `readFloatIntegral` both route through this path, and the
/// manual form is what the wire actually encodes (sign/exponent/mantissa split, not a
/// bit-for-bit reinterpret).
pub fn raw_bits_to_float(bits: i64) -> f64 {
    let bits = bits as u32;
    let sign: f64 = if bits & 0x8000_0000 != 0 { -1.0 } else { 1.0 };
    let exponent = ((bits >> 23) & 0xFF) as i32;
    let mantissa = if exponent > 0 {
        ((bits & 0x7F_FFFF) | 0x80_0000) as f64
    } else {
        ((bits & 0x7F_FFFF) << 1) as f64
    };
    sign * mantissa * 2f64.powi(exponent - 150)
}

pub fn angle2short(value: f32) -> u16 {
    ((value * 65536.0 / 360.0) as i64 & 0xFFFF) as u16
}

pub fn short2angle(value: u16) -> f32 {
    value as f32 * (360.0 / 65536.0)
}

/// Splits a `\key\value\key\value` config string into a map, matching ioquake3's
/// `Info_` parsing: a leading backslash is skipped, and pairs with an empty value are
/// dropped.
pub fn split_config(src: &str) -> HashMap<String, String> {
    if src.is_empty() {
        return HashMap::new();
    }
    let begin = if src.starts_with('\\') { 1 } else { 0 };
    let pieces: Vec<&str> = src.split('\\').collect();
    let mut result = HashMap::new();
    let mut index = begin;
    while index + 1 < pieces.len() {
        let key = pieces[index];
        let value = pieces[index + 1];
        if !value.is_empty() {
            result.insert(key.to_string(), value.to_string());
        }
        index += 2;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_bits_to_float_round_trips_known_values() {
        assert_eq!(raw_bits_to_float(0i64), 0.0);
        let bits = 1.5f32.to_bits() as i64;
        assert!((raw_bits_to_float(bits) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn split_config_skips_leading_backslash_and_empty_values() {
        let map = split_config("\\name\\zero\\empty\\");
        assert_eq!(map.get("name").map(String::as_str), Some("zero"));
        assert!(!map.contains_key("empty"));
    }

    #[test]
    fn split_config_handles_empty_input() {
        assert!(split_config("").is_empty());
    }
}
