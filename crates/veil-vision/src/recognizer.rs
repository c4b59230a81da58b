//! OCR 미사용 시 대체 인식기.

use image::RgbImage;
use veil_core::error::CoreError;
use veil_core::ports::text_recognizer::TextRecognizer;

/// 항상 빈 문자열을 반환하는 인식기 (`ocr` feature 비활성 시)
pub struct NoOpTextRecognizer;

impl TextRecognizer for NoOpTextRecognizer {
    fn recognize(&self, _crop: &RgbImage) -> Result<String, CoreError> {
        Ok(String::new())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_recognizes_nothing() {
        let text = NoOpTextRecognizer.recognize(&RgbImage::new(8, 8)).unwrap();
        assert!(text.is_empty());
    }
}
