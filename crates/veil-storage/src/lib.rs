//! # veil-storage
//!
//! 로컬 저장소 어댑터.
//! 추출 텍스트를 JSON Lines 파일에 추가 전용으로 기록한다.
//!
//! ## 모듈
//! - `text_log`: 텍스트 로그 (TextRecordSink 구현)

pub mod text_log;
