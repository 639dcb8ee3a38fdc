//! Normalization of captured process output to valid UTF-8
//!
//! Console layers may hand back text in a legacy narrow code page instead of
//! UTF-8. [`EncodingNormalizer::normalize`] always yields valid text:
//!
//! 1. bytes that already are valid UTF-8 pass through unchanged;
//! 2. otherwise they are decoded from the native narrow encoding, if any;
//! 3. otherwise ASCII is kept and every other byte becomes `?`.

use encoding_rs::Encoding;

/// Placeholder for bytes that survive neither UTF-8 nor the native encoding
pub const PLACEHOLDER: char = '?';

/// Three-tier output normalizer
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingNormalizer {
    native: Option<&'static Encoding>,
}

impl EncodingNormalizer {
    /// Normalizer with an optional native narrow encoding
    pub fn new(native: Option<&'static Encoding>) -> Self {
        Self { native }
    }

    /// Normalizer for a WHATWG encoding label such as `"windows-1252"`
    pub fn for_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.trim().as_bytes()).map(|encoding| Self::new(Some(encoding)))
    }

    /// The native narrow encoding, if one is configured
    pub fn native(&self) -> Option<&'static Encoding> {
        self.native
    }

    /// Strict UTF-8 validation (rejects overlong forms, surrogates,
    /// invalid lead bytes and truncated sequences)
    pub fn is_valid(bytes: &[u8]) -> bool {
        std::str::from_utf8(bytes).is_ok()
    }

    /// Decode from the native encoding without replacement characters
    pub fn reinterpret(&self, bytes: &[u8]) -> Option<String> {
        let encoding = self.native?;
        if encoding == encoding_rs::UTF_8 {
            return None;
        }
        encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
    }

    /// Lossy fallback: ASCII verbatim, every byte >= 0x80 becomes [`PLACEHOLDER`]
    pub fn sanitize(bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { PLACEHOLDER })
            .collect()
    }

    /// Run the full fallback chain
    pub fn normalize(&self, bytes: &[u8]) -> String {
        if let Ok(text) = std::str::from_utf8(bytes) {
            return text.to_string();
        }
        if let Some(text) = self.reinterpret(bytes) {
            tracing::debug!(
                encoding = self.native.map(|e| e.name()).unwrap_or("none"),
                len = bytes.len(),
                "Reinterpreted output from native encoding"
            );
            return text;
        }
        tracing::debug!(len = bytes.len(), "Sanitized undecodable output");
        Self::sanitize(bytes)
    }

    /// Transcode a UTF-8 payload into the native encoding
    ///
    /// Falls back to the UTF-8 bytes when no native encoding is configured
    /// or the text has characters the encoding cannot represent.
    pub fn to_native(&self, text: &str) -> Vec<u8> {
        match self.native {
            Some(encoding) if encoding != encoding_rs::UTF_8 => {
                let (bytes, _, had_errors) = encoding.encode(text);
                if had_errors {
                    text.as_bytes().to_vec()
                } else {
                    bytes.into_owned()
                }
            }
            _ => text.as_bytes().to_vec(),
        }
    }
}
