//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 얼굴 검출기, OCR 엔진, 텍스트 로그는 교체 가능한 외부 협력자이며
//! `veil-app`에서 `Arc<dyn T>`로 와이어링한다.
//!
//! 파이프라인은 블로킹 워커 스레드에서 실행되므로 모든 포트는 동기 trait이다.

pub mod face_detector;
pub mod text_recognizer;
pub mod text_sink;
