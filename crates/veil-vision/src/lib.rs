//! # veil-vision
//!
//! 이미지 처리 크레이트.
//! 얼굴 블러, 텍스트 후보 영역 탐색, OCR 텍스트 추출, 그리고 이 단계들을 묶는
//! 파일 단위 파이프라인을 담당한다.

pub mod annotate;
pub mod error;
pub mod face;
#[cfg(feature = "ocr")]
pub mod ocr;
pub mod pipeline;
pub mod recognizer;
pub mod redaction;
pub mod text_extraction;
pub mod text_region;
