//! 추출 텍스트 레코드 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::region::Rect;

/// 텍스트 로그에 한 줄로 기록되는 추출 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    /// 원본 이미지 파일 이름 (경로 제외)
    pub source_file_name: String,
    /// 정규화된 텍스트 (빈 줄 없음)
    pub text: String,
    /// 텍스트를 읽어낸 영역
    pub region: Rect,
    /// 추출 시각
    pub extracted_at: DateTime<Utc>,
}

impl TextRecord {
    /// 현재 시각으로 레코드 생성
    pub fn new(source_file_name: impl Into<String>, text: impl Into<String>, region: Rect) -> Self {
        Self {
            source_file_name: source_file_name.into(),
            text: text.into(),
            region,
            extracted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_single_line() {
        let record = TextRecord::new("a.jpg", "첫 줄\n둘째 줄", Rect::new(1, 2, 3, 4));
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"source_file_name\":\"a.jpg\""));

        let back: TextRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.text, "첫 줄\n둘째 줄");
        assert_eq!(back.region, Rect::new(1, 2, 3, 4));
    }
}
