use crate::domain::{RecognitionResult, RecognitionSource};
use crate::fingerprint::PreparedImage;
use crate::ports::LocalRecognizer;
use async_trait::async_trait;
use tracing::debug;

/// Local recognizer with no on-device vehicle database behind it.
/// Always answers with the zero-confidence "Unknown" placeholder.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaceholderLocalRecognizer;

#[async_trait]
impl LocalRecognizer for PlaceholderLocalRecognizer {
    async fn recognize(&self, image: &PreparedImage) -> RecognitionResult {
        let (width, height) = image.dimensions();
        debug!("Local recognition for {} ({}x{})", image.fingerprint(), width, height);
        RecognitionResult::unknown(RecognitionSource::Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DamageLevel;
    use image::{DynamicImage, RgbImage};

    #[tokio::test]
    async fn test_placeholder_returns_unknown_local_result() {
        let image = PreparedImage::from_image(DynamicImage::ImageRgb8(RgbImage::new(2, 2)));

        let result = PlaceholderLocalRecognizer.recognize(&image).await;

        assert!(result.is_unknown());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.source, RecognitionSource::Local);
        assert_eq!(result.damage, DamageLevel::None);
        assert!(result.metadata.is_empty());
    }
}
