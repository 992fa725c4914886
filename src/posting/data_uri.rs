//! `data:` URI decoding and encoding.
//!
//! Format: `data:[<mime>][;param=value]*[;base64],<payload>`. Without the
//! `base64` flag the payload is percent-decoded. A missing MIME type means
//! `text/plain`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

const DEFAULT_MIME: &str = "text/plain";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataUriError {
    #[error("Image must be a data URI")]
    MissingScheme,

    #[error("Data URI has no payload separator")]
    MissingSeparator,

    #[error("Data URI payload is not valid base64")]
    InvalidBase64,

    #[error("Data URI has an invalid MIME type '{0}'")]
    InvalidMime(String),
}

/// A decoded data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn parse(input: &str) -> Result<Self, DataUriError> {
        let input = input.trim();
        let rest = input
            .get(..5)
            .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
            .map(|_| &input[5..])
            .ok_or(DataUriError::MissingScheme)?;
        let (meta, payload) = rest.split_once(',').ok_or(DataUriError::MissingSeparator)?;

        let mut params = meta.split(';');
        let mime = params.next().unwrap_or_default().trim();
        let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

        let bytes = if is_base64 {
            let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            STANDARD
                .decode(compact)
                .map_err(|_| DataUriError::InvalidBase64)?
        } else {
            urlencoding::decode_binary(payload.as_bytes()).into_owned()
        };

        Ok(Self {
            mime: if mime.is_empty() {
                DEFAULT_MIME.to_string()
            } else {
                mime.to_ascii_lowercase()
            },
            bytes,
        })
    }

    /// Encode bytes as a base64 data URI.
    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{mime};base64,{}", STANDARD.encode(bytes))
    }

    /// A file extension matching the MIME type, `bin` when unknown.
    pub fn extension(&self) -> &'static str {
        mime_guess::get_mime_extensions_str(&self.mime)
            .and_then(|exts| {
                exts.iter()
                    .find(|ext| matches!(**ext, "jpg" | "png" | "gif" | "webp" | "mp4"))
                    .or_else(|| exts.first())
            })
            .copied()
            .unwrap_or("bin")
    }
}
