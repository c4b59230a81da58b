//! # veil-core
//!
//! VEIL 도메인 모델, 포트(trait) 정의, 에러 타입, 설정.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 도메인 데이터 구조체 (사각형 영역, 텍스트 레코드)
//! - [`ports`]: 외부 협력자 포트 인터페이스 (얼굴 검출, OCR, 텍스트 로그)
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 애플리케이션 설정 구조체
//! - [`config_manager`]: 설정 파일 관리 (로드/기본값 생성)

pub mod config;
pub mod config_manager;
pub mod error;
pub mod models;
pub mod ports;
