//! 텍스트 인식기(OCR) 포트.
//!
//! 구현: `veil-vision::recognizer` (Tesseract, NoOp)

use image::RgbImage;

use crate::error::CoreError;

/// 잘라낸 이미지 영역에서 텍스트를 인식하는 OCR 엔진
pub trait TextRecognizer: Send + Sync {
    /// 이미지 조각에서 텍스트 인식 (빈 문자열 가능)
    fn recognize(&self, crop: &RgbImage) -> Result<String, CoreError>;

    /// 인식기 이름 (예: "local-tesseract", "noop")
    fn name(&self) -> &str;
}
