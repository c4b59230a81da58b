//! 텍스트 추출 및 로그 기록.
//!
//! 후보 영역마다 블러 이전 프레임에서 크롭해 OCR을 실행하고, 정규화된 텍스트가
//! 최소 길이를 넘으면 [`TextRecord`]로 로그에 추가한다.
//! 영역 단위 실패는 로깅 후 건너뛰며 이미지 처리 결과에 영향을 주지 않는다.

use std::sync::Arc;

use image::{imageops, RgbImage};
use tracing::{debug, error, warn};
use veil_core::models::region::Rect;
use veil_core::models::text_record::TextRecord;
use veil_core::ports::text_recognizer::TextRecognizer;
use veil_core::ports::text_sink::TextRecordSink;

use crate::error::PipelineError;

/// 이미지 한 장의 텍스트 추출 집계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// 후보 영역 수
    pub candidates: usize,
    /// 로그에 기록된 레코드 수
    pub accepted: usize,
    /// 비었거나 너무 짧아 버려진 영역 수
    pub rejected: usize,
    /// OCR 실패 영역 수
    pub recognition_failures: usize,
    /// 로그 기록 실패 수 (텍스트 유실)
    pub append_failures: usize,
}

/// OCR 결과 정규화: 공백 줄 제거, 각 줄 끝 공백 제거, `\n`으로 재결합
pub fn normalize_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// 텍스트 추출기
pub struct TextExtractor {
    recognizer: Arc<dyn TextRecognizer>,
    sink: Arc<dyn TextRecordSink>,
    /// 줄 구분자를 뺀 문자 수가 이 값을 초과해야 기록
    min_text_len: usize,
}

impl TextExtractor {
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        sink: Arc<dyn TextRecordSink>,
        min_text_len: usize,
    ) -> Self {
        Self {
            recognizer,
            sink,
            min_text_len,
        }
    }

    /// 정규화된 텍스트가 기록 대상인지 판정
    ///
    /// 길이는 줄 구분자를 제외한 문자 수.
    pub fn accepts(&self, normalized: &str) -> bool {
        let len = normalized.chars().filter(|&c| c != '\n').count();
        len > self.min_text_len
    }

    /// 후보 영역별로 OCR 후 기록
    ///
    /// `original`은 블러 처리 전 프레임이어야 한다.
    pub fn extract(
        &self,
        original: &RgbImage,
        regions: &[Rect],
        source_file_name: &str,
    ) -> ExtractionSummary {
        let (w, h) = original.dimensions();
        let mut summary = ExtractionSummary {
            candidates: regions.len(),
            ..Default::default()
        };

        for region in regions {
            let Some(r) = region.clip(w, h) else {
                summary.rejected += 1;
                continue;
            };

            let crop =
                imageops::crop_imm(original, r.x as u32, r.y as u32, r.width, r.height).to_image();

            let raw = match self.recognizer.recognize(&crop) {
                Ok(raw) => raw,
                Err(e) => {
                    let err = PipelineError::Recognition(e);
                    warn!(
                        file = source_file_name,
                        region = ?r,
                        kind = err.kind(),
                        "{err}"
                    );
                    summary.recognition_failures += 1;
                    continue;
                }
            };

            let text = normalize_text(&raw);
            if !self.accepts(&text) {
                debug!(file = source_file_name, region = ?r, "짧은 텍스트 무시");
                summary.rejected += 1;
                continue;
            }

            let record = TextRecord::new(source_file_name, text, r);
            match self.sink.append(&record) {
                Ok(()) => summary.accepted += 1,
                Err(e) => {
                    let err = PipelineError::LogAppend(e);
                    error!(file = source_file_name, kind = err.kind(), "{err}");
                    summary.append_failures += 1;
                }
            }
        }

        debug!(
            file = source_file_name,
            recognizer = self.recognizer.name(),
            ?summary,
            "텍스트 추출 완료"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use parking_lot::Mutex;
    use veil_core::error::CoreError;

    /// 영역 폭에 따라 고정 응답을 돌려주는 인식기
    struct ScriptedRecognizer;

    impl TextRecognizer for ScriptedRecognizer {
        fn recognize(&self, crop: &RgbImage) -> Result<String, CoreError> {
            match crop.width() {
                10 => Ok("  \nHello, world!   \n\n  second line \n".to_string()),
                11 => Ok("short".to_string()),
                12 => Err(CoreError::OcrError("엔진 오류".to_string())),
                _ => Ok(String::new()),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct MemorySink {
        records: Mutex<Vec<TextRecord>>,
        fail: bool,
    }

    impl TextRecordSink for MemorySink {
        fn append(&self, record: &TextRecord) -> Result<(), CoreError> {
            if self.fail {
                return Err(CoreError::LogAppend("디스크 가득 참".to_string()));
            }
            self.records.lock().push(record.clone());
            Ok(())
        }
    }

    fn frame() -> RgbImage {
        RgbImage::from_pixel(64, 64, Rgb([255, 255, 255]))
    }

    #[test]
    fn normalize_drops_blank_lines_and_trailing_space() {
        assert_eq!(
            normalize_text("  \nHello, world!   \n\n  second line \n"),
            "Hello, world!\n  second line"
        );
        assert_eq!(normalize_text("\n \n\t\n"), "");
    }

    #[test]
    fn length_threshold_is_strict() {
        let extractor = TextExtractor::new(
            Arc::new(ScriptedRecognizer),
            Arc::new(MemorySink::default()),
            10,
        );
        assert!(!extractor.accepts("0123456789"));
        assert!(extractor.accepts("0123456789a"));
        // 문자 수 기준 (바이트 아님)
        assert!(!extractor.accepts("가나다라마바사아자차"));
        // 줄 구분자는 길이에 포함되지 않음
        assert!(!extractor.accepts("abcde\nfghij"));
        assert!(extractor.accepts("abcde\nfghijk"));
        assert!(!extractor.accepts(""));
    }

    #[test]
    fn accepted_records_are_normalized() {
        let sink = Arc::new(MemorySink::default());
        let extractor = TextExtractor::new(Arc::new(ScriptedRecognizer), sink.clone(), 10);

        let regions = [
            Rect::new(0, 0, 10, 5),
            Rect::new(20, 0, 11, 5),
            Rect::new(40, 0, 12, 5),
            Rect::new(0, 30, 20, 5),
        ];
        let summary = extractor.extract(&frame(), &regions, "photo.jpg");

        assert_eq!(
            summary,
            ExtractionSummary {
                candidates: 4,
                accepted: 1,
                rejected: 2,
                recognition_failures: 1,
                append_failures: 0,
            }
        );

        let records = sink.records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_file_name, "photo.jpg");
        assert_eq!(records[0].text, "Hello, world!\n  second line");
        assert_eq!(records[0].region, Rect::new(0, 0, 10, 5));
        assert!(!records[0].text.lines().any(|l| l.trim().is_empty()));
    }

    #[test]
    fn append_failure_is_counted_not_fatal() {
        let sink = Arc::new(MemorySink {
            fail: true,
            ..Default::default()
        });
        let extractor = TextExtractor::new(Arc::new(ScriptedRecognizer), sink, 10);

        let summary = extractor.extract(&frame(), &[Rect::new(0, 0, 10, 5)], "a.jpg");
        assert_eq!(summary.accepted, 0);
        assert_eq!(summary.append_failures, 1);
    }

    #[test]
    fn region_outside_frame_is_rejected() {
        let extractor = TextExtractor::new(
            Arc::new(ScriptedRecognizer),
            Arc::new(MemorySink::default()),
            10,
        );
        let summary = extractor.extract(&frame(), &[Rect::new(500, 500, 10, 5)], "a.jpg");
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.accepted, 0);
    }
}
