//! Binary embedding encoding.
//!
//! Embeddings are persisted as packed little-endian IEEE-754 f32 values, so a
//! vector of width L occupies exactly 4·L bytes.

use thiserror::Error;

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// A stored embedding buffer that cannot be turned into a vector.
///
/// Decode failures are per-item: the affected movie is treated as having no
/// embedding and the batch carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("embedding buffer is empty")]
    Empty,
    #[error("embedding buffer of {len} bytes is not a multiple of 4")]
    Misaligned { len: usize },
}

/// Decode a raw buffer into an embedding vector.
pub fn decode_embedding(bytes: &[u8]) -> Result<Vec<f32>, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    if bytes.len() % F32_BYTES != 0 {
        return Err(DecodeError::Misaligned { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(F32_BYTES)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Encode an embedding vector for storage.
pub fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * F32_BYTES);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_bytes() {
        // 1.0f32 = 0x3F800000, -2.0f32 = 0xC0000000 (little-endian on disk).
        let bytes = [0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0xC0];
        assert_eq!(decode_embedding(&bytes).unwrap(), vec![1.0, -2.0]);
    }

    #[test]
    fn test_encode_matches_layout() {
        let bytes = encode_embedding(&[1.0, -2.0]);
        assert_eq!(bytes, vec![0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0xC0]);
    }

    #[test]
    fn test_encode_then_decode_preserves_values() {
        let original = vec![0.25f32, -0.5, 3.75, f32::MIN_POSITIVE];
        let decoded = decode_embedding(&encode_embedding(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_seven_bytes_is_misaligned() {
        let err = decode_embedding(&[0u8; 7]).unwrap_err();
        assert_eq!(err, DecodeError::Misaligned { len: 7 });
        assert!(err.to_string().contains("7 bytes"));
    }

    #[test]
    fn test_decode_empty_buffer() {
        assert_eq!(decode_embedding(&[]).unwrap_err(), DecodeError::Empty);
    }

    #[test]
    fn test_zero_vector_decodes_as_present() {
        let decoded = decode_embedding(&[0u8; 12]).unwrap();
        assert_eq!(decoded, vec![0.0, 0.0, 0.0]);
    }
}
