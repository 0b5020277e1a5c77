use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Stable cache key derived from image content: lowercase hex SHA-256.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    const HEX_LEN: usize = 64;

    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Hash the decoded pixels so the key does not depend on the container
    /// format or encoder settings of the upload.
    pub fn of_image(image: &DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        let mut hasher = Sha256::new();
        hasher.update(rgb.width().to_le_bytes());
        hasher.update(rgb.height().to_le_bytes());
        hasher.update(rgb.as_raw());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        let well_formed = value.len() == Self::HEX_LEN
            && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if well_formed {
            Ok(Self(value))
        } else {
            Err(Error::Persistence(format!("malformed fingerprint '{}'", value)))
        }
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(s.to_string())
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decoded input image together with its fingerprint.
/// Clones share the pixel buffer.
#[derive(Clone)]
pub struct PreparedImage {
    image: Arc<DynamicImage>,
    fingerprint: Fingerprint,
}

impl PreparedImage {
    /// Decode raw upload bytes. This is the only failure surfaced to callers
    /// of vehicle recognition.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::ImageProcessing("image is empty".to_string()));
        }

        let image = image::load_from_memory(bytes)
            .map_err(|e| Error::ImageProcessing(format!("Failed to decode image: {}", e)))?;

        Ok(Self::from_image(image))
    }

    pub fn from_image(image: DynamicImage) -> Self {
        let fingerprint = Fingerprint::of_image(&image);
        Self {
            image: Arc::new(image),
            fingerprint,
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let rgb = self.image.to_rgb8();
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, quality)
            .encode_image(&rgb)
            .map_err(|e| Error::ImageProcessing(format!("Failed to encode JPEG: {}", e)))?;
        Ok(buffer)
    }
}

impl fmt::Debug for PreparedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedImage")
            .field("fingerprint", &self.fingerprint)
            .field("dimensions", &self.dimensions())
            .finish()
    }
}
