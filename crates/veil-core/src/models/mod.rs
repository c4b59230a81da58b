//! VEIL 도메인 모델.
//!
//! 파이프라인 단계 사이에서 주고받는 데이터 구조체를 정의한다.
//! 영속화되는 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod region;
pub mod text_record;
