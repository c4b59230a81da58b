//! 텍스트 레코드 싱크 포트.
//!
//! 구현: `veil-storage::text_log::JsonlTextLog`

use crate::error::CoreError;
use crate::models::text_record::TextRecord;

/// 추출 텍스트를 기록하는 추가 전용 저장소
///
/// 여러 워커가 동시에 호출하며, 구현체는 레코드 단위 원자성을 보장해야 한다.
pub trait TextRecordSink: Send + Sync {
    /// 레코드 한 건 추가
    fn append(&self, record: &TextRecord) -> Result<(), CoreError>;
}
