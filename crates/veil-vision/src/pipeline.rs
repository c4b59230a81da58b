//! 이미지 처리 오케스트레이터.
//!
//! 파일 한 장에 대해 다음 단계를 순서대로 실행한다:
//! 1. 디코딩 → RGB 프레임
//! 2. 그레이스케일 변환 + 히스토그램 평활화
//! 3. 블러 이전 사본 확보 → 얼굴 검출 → 얼굴 블러
//! 4. 텍스트 후보 영역 탐색 → OCR → 텍스트 로그 기록
//! 5. (선택) 디버그 외곽선
//! 6. 출력 디렉토리에 임시 파일로 저장 후 rename
//! 7. 원본 삭제
//!
//! 모든 파일 단위 에러는 [`ImagePipeline::run`]에서 분류/로깅되어 [`FileOutcome`]이 된다.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{imageops, ImageFormat, ImageReader, RgbImage};
use imageproc::contrast::equalize_histogram;
use tracing::{debug, error, info, warn};
use veil_core::config::AppConfig;
use veil_core::ports::face_detector::FaceDetector;
use veil_core::ports::text_recognizer::TextRecognizer;
use veil_core::ports::text_sink::TextRecordSink;

use crate::annotate::{self, FACE_COLOR, TEXT_COLOR};
use crate::error::PipelineError;
use crate::redaction::FaceRedactor;
use crate::text_extraction::{ExtractionSummary, TextExtractor};
use crate::text_region::TextRegionLocator;

/// 성공한 처리 한 건의 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    /// 원본 파일 이름
    pub source_file_name: String,
    /// 저장된 출력 이미지 경로
    pub output_path: PathBuf,
    /// 블러 처리된 얼굴 수
    pub faces: usize,
    /// 텍스트 추출 집계
    pub text: ExtractionSummary,
}

/// 파일 한 장의 최종 결과
#[derive(Debug)]
pub enum FileOutcome {
    /// 출력 저장 및 원본 삭제 완료
    Processed(ProcessReport),
    /// 디코딩 실패 파일을 격리 디렉토리로 이동
    Quarantined {
        source: PathBuf,
        destination: PathBuf,
    },
    /// 처리 실패
    Failed(PipelineError),
}

impl FileOutcome {
    /// 정상 처리 여부
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed(_))
    }
}

/// 이미지 처리 파이프라인
///
/// 모든 단계가 동기 함수이므로 blocking 스레드에서 호출해야 한다.
pub struct ImagePipeline {
    detector: Arc<dyn FaceDetector>,
    redactor: FaceRedactor,
    locator: TextRegionLocator,
    extractor: TextExtractor,
    output_dir: PathBuf,
    quarantine_dir: Option<PathBuf>,
    annotate_regions: bool,
}

impl ImagePipeline {
    /// 설정과 협력자로 파이프라인 구성
    pub fn new(
        config: &AppConfig,
        detector: Arc<dyn FaceDetector>,
        recognizer: Arc<dyn TextRecognizer>,
        sink: Arc<dyn TextRecordSink>,
    ) -> Self {
        Self {
            detector,
            redactor: FaceRedactor::from_config(&config.redaction),
            locator: TextRegionLocator::from_config(&config.text_region),
            extractor: TextExtractor::new(recognizer, sink, config.text.min_text_len),
            output_dir: config.paths.output_dir.clone(),
            quarantine_dir: config.paths.quarantine_dir.clone(),
            annotate_regions: config.debug.annotate_regions,
        }
    }

    /// 출력 디렉토리
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 파일 한 장 처리. 에러를 분류/로깅하고 결과로 변환한다.
    pub fn run(&self, source: &Path) -> FileOutcome {
        match self.process(source) {
            Ok(report) => {
                info!(
                    file = %report.source_file_name,
                    faces = report.faces,
                    text_regions = report.text.candidates,
                    text_records = report.text.accepted,
                    "이미지 처리 완료"
                );
                FileOutcome::Processed(report)
            }
            Err(err @ PipelineError::Decode { .. }) => self.handle_decode_failure(source, err),
            Err(err) => {
                error!(file = %source.display(), kind = err.kind(), "{err}");
                FileOutcome::Failed(err)
            }
        }
    }

    /// 파일 한 장 처리
    pub fn process(&self, source: &Path) -> Result<ProcessReport, PipelineError> {
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PipelineError::InvalidPath(source.to_path_buf()))?
            .to_string();
        let output_path = self.output_dir.join(&file_name);
        if same_file(source, &output_path) {
            return Err(PipelineError::OutputIsSource(source.to_path_buf()));
        }

        // 1. 디코딩 (확장자가 아닌 내용으로 포맷 판별)
        let mut frame = ImageReader::open(source)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(image::ImageError::IoError)
            .and_then(|reader| reader.decode())
            .map_err(|e| PipelineError::Decode {
                path: source.to_path_buf(),
                source: e,
            })?
            .to_rgb8();

        // 2. 평활화된 그레이스케일
        let gray = equalize_histogram(&imageops::grayscale(&frame));

        // 3. 얼굴 검출 + 블러 (텍스트 크롭용 원본 보존)
        let faces = match self.detector.detect(&gray) {
            Ok(faces) => faces,
            Err(e) => {
                let err = PipelineError::Detection(e);
                warn!(file = %file_name, kind = err.kind(), "{err}");
                Vec::new()
            }
        };
        let snapshot = (!faces.is_empty()).then(|| frame.clone());
        let redacted = self.redactor.redact(&mut frame, &faces);
        debug!(file = %file_name, detected = faces.len(), redacted, "얼굴 블러 완료");

        // 4. 텍스트 영역 + OCR
        let text_regions = self.locator.locate(&gray);
        let text = self.extractor.extract(
            snapshot.as_ref().unwrap_or(&frame),
            &text_regions,
            &file_name,
        );

        // 5. 디버그 외곽선
        if self.annotate_regions {
            annotate::outline_regions(&mut frame, &faces, FACE_COLOR);
            annotate::outline_regions(&mut frame, &text_regions, TEXT_COLOR);
        }

        // 6. 저장
        self.write_output(&frame, &output_path)?;

        // 7. 원본 삭제
        fs::remove_file(source).map_err(|e| PipelineError::SourceRemove {
            path: source.to_path_buf(),
            source: e,
        })?;

        Ok(ProcessReport {
            source_file_name: file_name,
            output_path,
            faces: redacted,
            text,
        })
    }

    /// 숨김 임시 파일에 기록 후 최종 이름으로 rename (기존 파일 덮어씀)
    fn write_output(&self, frame: &RgbImage, output_path: &Path) -> Result<(), PipelineError> {
        let write_err = |reason: String| PipelineError::OutputWrite {
            path: output_path.to_path_buf(),
            reason,
        };

        let format = ImageFormat::from_path(output_path).map_err(|e| write_err(e.to_string()))?;
        let file_name = output_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| write_err("파일 이름 없음".to_string()))?;
        let temp_path = self.output_dir.join(format!(".{file_name}.veil-tmp"));

        if let Err(e) = frame.save_with_format(&temp_path, format) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_err(e.to_string()));
        }
        if let Err(e) = fs::rename(&temp_path, output_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_err(e.to_string()));
        }

        debug!(output = %output_path.display(), "출력 이미지 저장");
        Ok(())
    }

    /// 디코딩 실패: 격리 디렉토리가 있으면 이동, 없으면 원본 유지
    fn handle_decode_failure(&self, source: &Path, err: PipelineError) -> FileOutcome {
        let Some(quarantine_dir) = &self.quarantine_dir else {
            warn!(file = %source.display(), kind = err.kind(), "{err} (원본 유지)");
            return FileOutcome::Failed(err);
        };

        match quarantine(source, quarantine_dir) {
            Ok(destination) => {
                warn!(
                    file = %source.display(),
                    destination = %destination.display(),
                    kind = err.kind(),
                    "{err} (격리됨)"
                );
                FileOutcome::Quarantined {
                    source: source.to_path_buf(),
                    destination,
                }
            }
            Err(io_err) => {
                let err = PipelineError::Quarantine {
                    path: source.to_path_buf(),
                    source: io_err,
                };
                error!(file = %source.display(), kind = err.kind(), "{err}");
                FileOutcome::Failed(err)
            }
        }
    }
}

/// 두 경로가 같은 파일을 가리키는지 확인 (어느 한쪽이 없으면 `false`)
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// 파일을 격리 디렉토리로 이동 (rename 실패 시 복사 후 삭제)
fn quarantine(source: &Path, quarantine_dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(quarantine_dir)?;
    let name = source
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "파일 이름 없음"))?;
    let destination = quarantine_dir.join(name);

    if fs::rename(source, &destination).is_err() {
        fs::copy(source, &destination)?;
        fs::remove_file(source)?;
    }
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::NoOpFaceDetector;
    use crate::recognizer::NoOpTextRecognizer;
    use image::Rgb;
    use tempfile::TempDir;
    use veil_core::error::CoreError;
    use veil_core::models::region::Rect;
    use veil_core::models::text_record::TextRecord;

    struct NullSink;

    impl TextRecordSink for NullSink {
        fn append(&self, _record: &TextRecord) -> Result<(), CoreError> {
            Ok(())
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(&self, _gray: &image::GrayImage) -> Result<Vec<Rect>, CoreError> {
            Err(CoreError::Detection("모델 손상".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// 검출 도중 원본을 지워 버리는 검출기 (삭제 단계 실패 재현)
    struct VanishingSourceDetector {
        source: PathBuf,
    }

    impl FaceDetector for VanishingSourceDetector {
        fn detect(&self, _gray: &image::GrayImage) -> Result<Vec<Rect>, CoreError> {
            fs::remove_file(&self.source).unwrap();
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "vanishing"
        }
    }

    fn setup(detector: Arc<dyn FaceDetector>) -> (TempDir, AppConfig, ImagePipeline) {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default_config();
        config.paths.watch_dir = dir.path().join("in");
        config.paths.output_dir = dir.path().join("out");
        fs::create_dir_all(&config.paths.watch_dir).unwrap();
        fs::create_dir_all(&config.paths.output_dir).unwrap();

        let pipeline = ImagePipeline::new(
            &config,
            detector,
            Arc::new(NoOpTextRecognizer),
            Arc::new(NullSink),
        );
        (dir, config, pipeline)
    }

    fn write_png(path: &Path) {
        RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 128]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn processed_file_moves_to_output() {
        let (_dir, config, pipeline) = setup(Arc::new(NoOpFaceDetector));
        let source = config.paths.watch_dir.join("a.png");
        write_png(&source);

        let outcome = pipeline.run(&source);
        assert!(outcome.is_processed());
        assert!(!source.exists());
        assert!(config.paths.output_dir.join("a.png").exists());
        // 임시 파일이 남지 않음
        assert_eq!(fs::read_dir(&config.paths.output_dir).unwrap().count(), 1);
    }

    #[test]
    fn existing_output_is_overwritten() {
        let (_dir, config, pipeline) = setup(Arc::new(NoOpFaceDetector));
        let output = config.paths.output_dir.join("a.png");
        fs::write(&output, b"stale").unwrap();

        let source = config.paths.watch_dir.join("a.png");
        write_png(&source);
        assert!(pipeline.run(&source).is_processed());
        assert!(image::open(&output).is_ok());
    }

    #[test]
    fn detection_failure_is_not_fatal() {
        let (_dir, config, pipeline) = setup(Arc::new(FailingDetector));
        let source = config.paths.watch_dir.join("b.png");
        write_png(&source);

        match pipeline.run(&source) {
            FileOutcome::Processed(report) => assert_eq!(report.faces, 0),
            other => panic!("예상치 못한 결과: {other:?}"),
        }
    }

    #[test]
    fn corrupted_file_left_in_place() {
        let (_dir, config, pipeline) = setup(Arc::new(NoOpFaceDetector));
        let source = config.paths.watch_dir.join("broken.jpg");
        fs::write(&source, b"not an image at all").unwrap();

        match pipeline.run(&source) {
            FileOutcome::Failed(err) => assert_eq!(err.kind(), "decode"),
            other => panic!("예상치 못한 결과: {other:?}"),
        }
        assert!(source.exists());
        assert!(!config.paths.output_dir.join("broken.jpg").exists());
    }

    #[test]
    fn corrupted_file_quarantined_when_configured() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default_config();
        config.paths.output_dir = dir.path().join("out");
        config.paths.quarantine_dir = Some(dir.path().join("quarantine"));
        fs::create_dir_all(&config.paths.output_dir).unwrap();

        let pipeline = ImagePipeline::new(
            &config,
            Arc::new(NoOpFaceDetector),
            Arc::new(NoOpTextRecognizer),
            Arc::new(NullSink),
        );

        let source = dir.path().join("broken.jpg");
        fs::write(&source, b"garbage").unwrap();

        match pipeline.run(&source) {
            FileOutcome::Quarantined { destination, .. } => {
                assert!(destination.exists());
                assert!(destination.starts_with(dir.path().join("quarantine")));
            }
            other => panic!("예상치 못한 결과: {other:?}"),
        }
        assert!(!source.exists());
    }

    #[test]
    fn output_write_failure_keeps_source() {
        let (dir, config, _) = setup(Arc::new(NoOpFaceDetector));
        let mut broken = config.clone();
        broken.paths.output_dir = dir.path().join("missing").join("out");

        let pipeline = ImagePipeline::new(
            &broken,
            Arc::new(NoOpFaceDetector),
            Arc::new(NoOpTextRecognizer),
            Arc::new(NullSink),
        );
        let source = config.paths.watch_dir.join("c.png");
        write_png(&source);

        match pipeline.run(&source) {
            FileOutcome::Failed(err) => assert_eq!(err.kind(), "output_write"),
            other => panic!("예상치 못한 결과: {other:?}"),
        }
        assert!(source.exists());
    }

    #[test]
    fn source_remove_failure_keeps_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("d.png");
        let (_env, config, _) = setup(Arc::new(NoOpFaceDetector));
        write_png(&source);

        let pipeline = ImagePipeline::new(
            &config,
            Arc::new(VanishingSourceDetector {
                source: source.clone(),
            }),
            Arc::new(NoOpTextRecognizer),
            Arc::new(NullSink),
        );

        match pipeline.run(&source) {
            FileOutcome::Failed(err) => assert_eq!(err.kind(), "source_remove"),
            other => panic!("예상치 못한 결과: {other:?}"),
        }
        assert!(config.paths.output_dir.join("d.png").exists());
    }

    #[test]
    fn quarantine_failure_keeps_source() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let mut config = AppConfig::default_config();
        config.paths.output_dir = dir.path().join("out");
        config.paths.quarantine_dir = Some(blocker.join("quarantine"));
        fs::create_dir_all(&config.paths.output_dir).unwrap();

        let pipeline = ImagePipeline::new(
            &config,
            Arc::new(NoOpFaceDetector),
            Arc::new(NoOpTextRecognizer),
            Arc::new(NullSink),
        );
        let source = dir.path().join("broken.jpg");
        fs::write(&source, b"garbage").unwrap();

        match pipeline.run(&source) {
            FileOutcome::Failed(err) => assert_eq!(err.kind(), "quarantine"),
            other => panic!("예상치 못한 결과: {other:?}"),
        }
        assert!(source.exists());
    }

    #[test]
    fn source_inside_output_dir_is_not_overwritten() {
        let (_dir, config, pipeline) = setup(Arc::new(NoOpFaceDetector));
        let source = config.paths.output_dir.join("only_copy.png");
        write_png(&source);
        let before = fs::read(&source).unwrap();

        match pipeline.run(&source) {
            FileOutcome::Failed(err) => assert_eq!(err.kind(), "output_is_source"),
            other => panic!("예상치 못한 결과: {other:?}"),
        }
        assert_eq!(fs::read(&source).unwrap(), before);
    }
}
