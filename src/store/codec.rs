//! zstd compression of frames
//!
//! Both directions go through the streaming encoder/decoder. Decoding is
//! driven to the end of the stream, so the output size never has to be known
//! or guessed in advance.

use crate::config::StoreConfig;
use std::io::{self, Read, Write};

/// Compress the pieces of a frame as one zstd stream
pub fn compress(parts: &[&[u8]], config: &StoreConfig) -> io::Result<Vec<u8>> {
    let total: usize = parts.iter().map(|p| p.len()).sum();

    let mut encoder = zstd::stream::write::Encoder::new(Vec::new(), config.compression_level)?;
    encoder.include_checksum(config.checksum)?;
    encoder.include_contentsize(true)?;
    encoder.set_pledged_src_size(Some(total as u64))?;

    for part in parts {
        encoder.write_all(part)?;
    }
    encoder.finish()
}

/// Decompress a complete stored object
///
/// Truncated input, trailing garbage and checksum failures all surface as
/// errors from the decoder.
pub fn decompress(compressed: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = zstd::stream::read::Decoder::with_buffer(compressed)?;
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_parts() {
        let config = StoreConfig::default();
        let compressed = compress(&[b"blob 5", b"\0", b"hello"], &config).unwrap();
        assert_eq!(decompress(&compressed).unwrap(), b"blob 5\0hello");
    }

    #[test]
    fn test_truncated_stream_fails() {
        let config = StoreConfig::default();
        let data = vec![7u8; 64 * 1024];
        let compressed = compress(&[&data], &config).unwrap();
        let truncated = &compressed[..compressed.len() / 2];
        assert!(decompress(truncated).is_err());
    }

    #[test]
    fn test_trailing_garbage_fails() {
        let config = StoreConfig::default();
        let mut compressed = compress(&[b"tree 0\0"], &config).unwrap();
        compressed.extend_from_slice(b"garbage!");
        assert!(decompress(&compressed).is_err());
    }

    #[test]
    fn test_level_changes_nothing_observable() {
        let fast = StoreConfig::builder().compression_level(1).build();
        let slow = StoreConfig::builder().compression_level(19).build();
        let data = b"the same bytes either way".repeat(100);
        assert_eq!(
            decompress(&compress(&[&data], &fast).unwrap()).unwrap(),
            decompress(&compress(&[&data], &slow).unwrap()).unwrap()
        );
    }
}
