//! OCR 텍스트 인식 모듈.
//!
//! `leptess` 기반 Tesseract OCR 래퍼.
//! `ocr` feature flag 활성화 시에만 빌드된다.
//!
//! `LepTess` 인스턴스는 스레드 간 공유하지 않고 호출마다 생성한다.
//! 파이프라인이 이미 blocking 스레드에서 실행되므로 비동기 래퍼는 두지 않는다.

use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use veil_core::config::TextExtractionConfig;
use veil_core::error::CoreError;
use veil_core::ports::text_recognizer::TextRecognizer;

/// OCR 에러 타입
#[derive(Debug, Error)]
pub enum OcrError {
    /// Tesseract 초기화 실패
    #[error("OCR 초기화 실패: {0}")]
    Init(String),

    /// 이미지 설정 실패
    #[error("OCR 이미지 설정 실패: {0}")]
    ImageSetup(String),

    /// 텍스트 추출 실패
    #[error("OCR 텍스트 추출 실패: {0}")]
    Extraction(String),

    /// 빈 이미지 입력
    #[error("빈 이미지: 너비 또는 높이가 0")]
    EmptyImage,
}

impl From<OcrError> for CoreError {
    fn from(e: OcrError) -> Self {
        CoreError::OcrError(e.to_string())
    }
}

/// OCR 텍스트 추출기
pub struct OcrExtractor {
    /// Tesseract 데이터 경로 (None이면 시스템 기본값)
    tessdata_path: Option<PathBuf>,
    /// Tesseract 언어 코드
    language: String,
}

impl OcrExtractor {
    /// 새 OCR 추출기 생성
    pub fn new(tessdata_path: Option<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            tessdata_path,
            language: language.into(),
        }
    }

    /// 크롭 이미지에서 원시 텍스트 추출 (정규화는 호출자 책임)
    pub fn extract(&self, crop: &RgbImage) -> Result<String, OcrError> {
        let (w, h) = crop.dimensions();
        if w == 0 || h == 0 {
            return Err(OcrError::EmptyImage);
        }

        // leptonica는 인코딩된 이미지를 읽으므로 PNG로 메모리 인코딩
        let mut encoded = Cursor::new(Vec::new());
        crop.write_to(&mut encoded, ImageFormat::Png)
            .map_err(|e| OcrError::ImageSetup(format!("{e}")))?;

        let tessdata = self
            .tessdata_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());

        let mut lt = leptess::LepTess::new(tessdata.as_deref(), &self.language)
            .map_err(|e| OcrError::Init(format!("{e}")))?;

        lt.set_image_from_mem(encoded.get_ref())
            .map_err(|e| OcrError::ImageSetup(format!("{e}")))?;

        let text = lt
            .get_utf8_text()
            .map_err(|e| OcrError::Extraction(format!("{e}")))?;

        debug!(width = w, height = h, chars = text.chars().count(), "OCR 완료");
        Ok(text)
    }

    /// tessdata 경로 반환
    pub fn tessdata_path(&self) -> Option<&PathBuf> {
        self.tessdata_path.as_ref()
    }

    /// 언어 코드 반환
    pub fn language(&self) -> &str {
        &self.language
    }
}

/// Tesseract 기반 [`TextRecognizer`] 구현
pub struct TesseractRecognizer {
    extractor: OcrExtractor,
}

impl TesseractRecognizer {
    /// 설정에서 생성
    pub fn from_config(config: &TextExtractionConfig) -> Self {
        Self {
            extractor: OcrExtractor::new(config.tessdata_path.clone(), config.language.clone()),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, crop: &RgbImage) -> Result<String, CoreError> {
        Ok(self.extractor.extract(crop)?)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}
