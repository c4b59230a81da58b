//! 파이프라인 에러 타입.
//!
//! 파일 단위 실패를 분류한다. 모든 변형은 `ImagePipeline::run` 경계에서 로깅되고
//! 워커나 감시자로 전파되지 않는다.

use std::path::PathBuf;
use thiserror::Error;
use veil_core::error::CoreError;

/// 이미지 한 장 처리 중 발생하는 에러
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 파일을 이미지로 읽을 수 없음 (원본 유지 또는 격리)
    #[error("이미지 디코딩 실패: {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// 얼굴 검출기 실패 (해당 단계만 건너뜀)
    #[error("얼굴 검출 실패: {0}")]
    Detection(#[source] CoreError),

    /// OCR 실패 (해당 영역만 건너뜀)
    #[error("텍스트 인식 실패: {0}")]
    Recognition(#[source] CoreError),

    /// 출력 이미지 저장 실패 (원본은 삭제하지 않음)
    #[error("출력 이미지 저장 실패: {path}: {reason}")]
    OutputWrite { path: PathBuf, reason: String },

    /// 텍스트 로그 기록 실패 (해당 레코드 유실)
    #[error("텍스트 로그 기록 실패: {0}")]
    LogAppend(#[source] CoreError),

    /// 출력은 저장됐으나 원본 삭제 실패
    #[error("원본 파일 삭제 실패: {path}: {source}")]
    SourceRemove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 디코딩 실패 파일 격리 실패
    #[error("격리 이동 실패: {path}: {source}")]
    Quarantine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 출력 경로가 원본 파일 자신을 가리킴 (원본 유지)
    #[error("출력 경로가 원본과 같습니다: {0}")]
    OutputIsSource(PathBuf),

    /// 경로에 파일 이름이 없음
    #[error("파일 이름이 없는 경로: {0}")]
    InvalidPath(PathBuf),
}

impl PipelineError {
    /// 에러 종류 이름 (로그 필드용)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Detection(_) => "detection",
            Self::Recognition(_) => "recognition",
            Self::OutputWrite { .. } => "output_write",
            Self::LogAppend(_) => "log_append",
            Self::SourceRemove { .. } => "source_remove",
            Self::Quarantine { .. } => "quarantine",
            Self::OutputIsSource(_) => "output_is_source",
            Self::InvalidPath(_) => "invalid_path",
        }
    }
}
