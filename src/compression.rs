//! Gzip codec for payload bodies.
//!
//! Bodies are compressed once at request-build time and never mutated
//! afterwards; the decompression half exists so callers and tests can verify
//! payload integrity without reaching for the transport layer.

use std::io::{self, Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Compresses a payload body with gzip at the default compression level.
pub fn compress(body: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(body.len()), Compression::default());
    encoder.write_all(body)?;
    encoder.finish()
}

/// Decompresses a gzip payload body produced by [`compress`].
pub fn decompress(body: &[u8]) -> io::Result<Vec<u8>> {
    let mut decompressed = Vec::new();
    MultiGzDecoder::new(body).read_to_end(&mut decompressed)?;
    Ok(decompressed)
}
