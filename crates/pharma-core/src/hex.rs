//! Lowercase hex encoding shared by identifiers, digests, and signatures.

/// Encode bytes as a lowercase hex string.
pub fn encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string into bytes. Accepts upper or lower case.
pub fn decode(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err("hex string must have even length".to_string());
    }
    if !hex.is_ascii() {
        return Err("hex string must be ASCII".to_string());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| format!("invalid hex at position {i}: {e}"))
        })
        .collect()
}

/// Decode a hex string into a fixed-size array, checking the length.
pub fn decode_array<const N: usize>(hex: &str) -> Result<[u8; N], String> {
    let hex = hex.trim();
    if hex.len() != N * 2 {
        return Err(format!("expected {} hex chars, got {}", N * 2, hex.len()));
    }
    let bytes = decode(hex)?;
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// First four bytes as hex, for `Debug` output.
pub fn prefix(bytes: &[u8]) -> String {
    encode(&bytes[..bytes.len().min(4)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let bytes = [0x00, 0xab, 0xff, 0x10];
        let hex = encode(&bytes);
        assert_eq!(hex, "00abff10");
        assert_eq!(decode(&hex).unwrap(), bytes);
        assert_eq!(decode("00ABFF10").unwrap(), bytes);
    }

    #[test]
    fn test_decode_rejects_odd_length_and_garbage() {
        assert!(decode("abc").is_err());
        assert!(decode("zz").is_err());
        assert!(decode("éé").is_err());
    }

    #[test]
    fn test_decode_array_length_checked() {
        assert!(decode_array::<2>("aabb").is_ok());
        assert!(decode_array::<2>("aabbcc").is_err());
    }
}
