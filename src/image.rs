//! Image payloads and the upload decoder.

use std::fmt;
use std::future::Future;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};

use crate::error::{HeadshotError, Result};

/// A base64 image payload tagged with its media type.
///
/// Both fields are validated on construction and never change afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBytes {
    media_type: String,
    data: String,
}

impl ImageBytes {
    /// Validates an already encoded payload.
    pub fn new(media_type: impl Into<String>, data: impl Into<String>) -> Result<Self> {
        let media_type = media_type.into();
        let data = data.into();

        if !is_image_media_type(&media_type) {
            return Err(HeadshotError::Validation(format!(
                "invalid image media type: {media_type}"
            )));
        }
        if general_purpose::STANDARD.decode(&data).is_err() {
            return Err(HeadshotError::Validation(
                "image data is not valid base64".to_string(),
            ));
        }

        Ok(Self { media_type, data })
    }

    /// Encodes raw bytes.
    pub fn from_bytes(media_type: impl Into<String>, bytes: impl AsRef<[u8]>) -> Result<Self> {
        Self::new(media_type, general_purpose::STANDARD.encode(bytes))
    }

    /// Parses a `data:<type>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let invalid = || HeadshotError::Validation("invalid image data URL".to_string());

        let rest = url.strip_prefix("data:").ok_or_else(invalid)?;
        let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
        let media_type = header.strip_suffix(";base64").ok_or_else(invalid)?;

        Self::new(media_type, payload)
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// The base64 payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }

    /// Decodes the payload back into raw bytes.
    ///
    /// Every constructor validates the base64, so this cannot fail.
    pub fn decode(&self) -> Vec<u8> {
        general_purpose::STANDARD
            .decode(&self.data)
            .unwrap_or_default()
    }
}

// Payloads run to megabytes; keep them out of logs and panics.
impl fmt::Debug for ImageBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBytes")
            .field("media_type", &self.media_type)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// `image/<subtype>` with a non-empty subtype.
fn is_image_media_type(media_type: &str) -> bool {
    media_type
        .strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty() && !subtype.contains(char::is_whitespace))
}

/// Decodes a selected file into an [`ImageBytes`].
///
/// Only the declared type is checked, and it is checked before `read` is
/// polled: a rejected file is never read. The content itself is passed
/// through untouched, so a non-image file declared as `image/*` is left for
/// the generation service to reject.
pub async fn decode<F, B, E>(declared_type: &str, read: F) -> Result<ImageBytes>
where
    F: Future<Output = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    if !declared_type.starts_with("image/") {
        tracing::debug!(declared_type, "rejected non-image upload");
        return Err(HeadshotError::not_an_image());
    }

    let bytes = read.await.map_err(|e| {
        tracing::warn!(error = %e, "failed to read upload");
        HeadshotError::read_failed()
    })?;

    ImageBytes::from_bytes(declared_type, bytes).map_err(|_| HeadshotError::not_an_image())
}

/// Same as [`decode`], reading the file from disk.
pub async fn decode_path(declared_type: &str, path: impl AsRef<Path>) -> Result<ImageBytes> {
    decode(declared_type, tokio::fs::read(path.as_ref())).await
}
