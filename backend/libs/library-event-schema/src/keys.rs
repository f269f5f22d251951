//! Record key encoding
//!
//! Keys are 32-bit integers encoded big-endian, the same layout Kafka's
//! `IntegerSerializer` produces, so records stay readable by JVM tooling.

pub fn encode_key(key: i32) -> [u8; 4] {
    key.to_be_bytes()
}

/// Decode a record key. Returns `None` unless the key is exactly four bytes.
pub fn decode_key(bytes: &[u8]) -> Option<i32> {
    let raw: [u8; 4] = bytes.try_into().ok()?;
    Some(i32::from_be_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout_is_big_endian() {
        assert_eq!(encode_key(999), [0, 0, 3, 231]);
        assert_eq!(decode_key(&[0, 0, 0, 123]), Some(123));
        assert_eq!(decode_key(&encode_key(-7)), Some(-7));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(decode_key(b""), None);
        assert_eq!(decode_key(b"abc"), None);
        assert_eq!(decode_key(b"12345"), None);
    }
}
