//! Content decompression infrastructure.
//!
//! Both the proxy and the website monitor advertise `gzip, deflate, br` and
//! read raw bytes, so the `content-encoding` header stays observable. This
//! module undoes the encoding before bodies are turned into text.

use std::io::Read;

/// A single content-coding.
pub trait Decompressor: Send + Sync {
    /// Whether this decompressor handles the given (lower-cased) token.
    fn handles(&self, coding: &str) -> bool;

    /// Decodes one layer of this coding.
    ///
    /// # Arguments
    ///
    /// * `data` - The encoded bytes
    ///
    /// # Returns
    ///
    /// A `Result` containing the decoded bytes on success, or an error message on failure.

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, String>;
}

#[derive(Default)]
pub struct GzipDecompressor;

impl Decompressor for GzipDecompressor {
    fn handles(&self, coding: &str) -> bool {
        coding == "gzip" || coding == "x-gzip"
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, String> {
        let mut decoder = flate2::read::MultiGzDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| format!("Gzip decompression failed: {}", e))?;
        Ok(decompressed)
    }
}

/// HTTP `deflate` is zlib-wrapped; some servers send a raw stream instead.
#[derive(Default)]
pub struct DeflateDecompressor;

impl Decompressor for DeflateDecompressor {
    fn handles(&self, coding: &str) -> bool {
        coding == "deflate"
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, String> {
        let mut decompressed = Vec::new();
        if flate2::read::ZlibDecoder::new(data)
            .read_to_end(&mut decompressed)
            .is_ok()
        {
            return Ok(decompressed);
        }

        decompressed.clear();
        flate2::read::DeflateDecoder::new(data)
            .read_to_end(&mut decompressed)
            .map_err(|e| format!("Deflate decompression failed: {}", e))?;
        Ok(decompressed)
    }
}

#[derive(Default)]
pub struct BrotliDecompressor;

impl Decompressor for BrotliDecompressor {
    fn handles(&self, coding: &str) -> bool {
        coding == "br"
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, String> {
        let mut decompressed = Vec::new();
        brotli::BrotliDecompress(&mut std::io::Cursor::new(data), &mut decompressed)
            .map_err(|e| format!("Brotli decompression failed: {}", e))?;
        Ok(decompressed)
    }
}

/// Applies every coding listed in a `content-encoding` header.
pub struct MultiDecompressor {
    decoders: Vec<Box<dyn Decompressor>>,
}

impl Default for MultiDecompressor {
    fn default() -> Self {
        Self {
            decoders: vec![
                Box::new(GzipDecompressor),
                Box::new(DeflateDecompressor),
                Box::new(BrotliDecompressor),
            ],
        }
    }
}

impl MultiDecompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `data` according to `encoding`.
    ///
    /// Codings are listed in the order they were applied, so they are undone
    /// right to left. `identity`, missing and unrecognised codings leave the
    /// data as-is.
    ///
    /// # Arguments
    ///
    /// * `data` - The body bytes as received
    /// * `encoding` - The `Content-Encoding` header value, if any
    ///
    /// # Returns
    ///
    /// A `Result` containing the decoded bytes on success, or an error message on failure.
    pub fn decompress(&self, data: &[u8], encoding: Option<&str>) -> Result<Vec<u8>, String> {
        let mut body = data.to_vec();
        let Some(encoding) = encoding else {
            return Ok(body);
        };

        for coding in encoding.rsplit(',') {
            let coding = coding.trim().to_ascii_lowercase();
            if let Some(decoder) = self.decoders.iter().find(|d| d.handles(&coding)) {
                body = decoder.decompress(&body)?;
            }
        }

        Ok(body)
    }
}

/// Convenience function for decompressing body data.
///
/// # Arguments
///
/// * `body` - The body bytes as received
/// * `encoding` - The `Content-Encoding` header value, if any
///
/// # Returns
///
/// A `Result` containing the decoded bytes on success, or an error message on failure.
pub fn decompress_body(body: &[u8], encoding: Option<&str>) -> Result<Vec<u8>, String> {
    MultiDecompressor::new().decompress(body, encoding)
}
