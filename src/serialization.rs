/// Serialization format options for hierarchies and fitting options.
///
/// Each format has both compressed (Lz4) and uncompressed variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SerializationFormat {
    /// Bincode format - compact binary
    Bincode,
    /// Bincode format with LZ4 compression
    #[default]
    BincodeLz4,
}

impl SerializationFormat {
    /// Returns true if this format uses LZ4 compression
    pub fn is_compressed(&self) -> bool {
        matches!(self, SerializationFormat::BincodeLz4)
    }
}

use crate::errors::HFError;
use serde::{de::DeserializeOwned, Serialize};

/// Serialize data to bytes using the specified format.
/// Applies LZ4 compression if the format variant ends with Lz4.
pub fn serialize<T: Serialize>(data: &T, format: SerializationFormat) -> Result<Vec<u8>, HFError> {
    let bytes = bincode::serde::encode_to_vec(data, bincode::config::standard())
        .map_err(|_| HFError::SerializationFailed)?;
    if format.is_compressed() {
        Ok(lz4_flex::compress_prepend_size(&bytes))
    } else {
        Ok(bytes)
    }
}

/// Deserialize data from bytes using the specified format.
/// Applies LZ4 decompression if the format variant ends with Lz4.
pub fn deserialize<T: DeserializeOwned>(data: &[u8], format: SerializationFormat) -> Result<T, HFError> {
    let decode = |bytes: &[u8]| {
        bincode::serde::decode_from_slice::<T, _>(bytes, bincode::config::standard())
            .map(|(value, _)| value)
            .map_err(|_| HFError::DeserializationFailed)
    };
    if format.is_compressed() {
        let decompressed = lz4_flex::decompress_size_prepended(data)
            .map_err(|_| HFError::LZ4DecompressionFailed)?;
        decode(&decompressed)
    } else {
        decode(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FittingOptions;

    #[test]
    fn test_options_roundtrip() {
        let options = FittingOptions::new(0.25, vec![1, 2], 0.5).unwrap();
        let bytes = serialize(&options, SerializationFormat::Bincode).unwrap();
        let result: FittingOptions = deserialize(&bytes, SerializationFormat::Bincode).unwrap();
        assert_eq!(options, result);
    }

    #[test]
    fn test_corrupted_lz4_buffer() {
        let result: Result<FittingOptions, _> = deserialize(&[1, 2, 3], SerializationFormat::BincodeLz4);
        assert_eq!(result, Err(HFError::LZ4DecompressionFailed));
    }
}
