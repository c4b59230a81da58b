//! 애플리케이션 설정 구조체.
//!
//! 감시/출력 디렉토리, 워커 수, 얼굴 검출 감도, 블러 강도, 텍스트 영역 탐색 파라미터 등
//! 런타임 설정을 정의한다. 모든 값에 컴파일 타임 기본값이 있으며
//! `ConfigManager`를 통해 JSON 파일에서 덮어쓸 수 있다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 경로 설정
    #[serde(default)]
    pub paths: PathsConfig,
    /// 수집(감시 + 워커 풀) 설정
    #[serde(default)]
    pub ingest: IngestConfig,
    /// 얼굴 검출 설정
    #[serde(default)]
    pub face: FaceDetectionConfig,
    /// 얼굴 블러 설정
    #[serde(default)]
    pub redaction: RedactionConfig,
    /// 텍스트 영역 탐색 설정
    #[serde(default)]
    pub text_region: TextRegionConfig,
    /// 텍스트 추출(OCR) 설정
    #[serde(default)]
    pub text: TextExtractionConfig,
    /// 디버그 설정
    #[serde(default)]
    pub debug: DebugConfig,
}

// ============================================================
// 경로 설정
// ============================================================

/// 경로 설정: 감시 디렉토리, 출력 디렉토리, 텍스트 로그
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// 새 이미지를 감시할 디렉토리 (비재귀)
    #[serde(default = "default_watch_dir")]
    pub watch_dir: PathBuf,
    /// 처리된 이미지가 저장될 디렉토리
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// 추출 텍스트 추가 전용 로그 (JSON Lines)
    #[serde(default = "default_text_log")]
    pub text_log: PathBuf,
    /// 디코딩 실패 파일 격리 디렉토리 (None이면 원본 유지)
    #[serde(default)]
    pub quarantine_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            watch_dir: default_watch_dir(),
            output_dir: default_output_dir(),
            text_log: default_text_log(),
            quarantine_dir: None,
        }
    }
}

fn default_watch_dir() -> PathBuf {
    PathBuf::from("./data/images/raw_images")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./data/images/processed_images")
}

fn default_text_log() -> PathBuf {
    PathBuf::from("./data/images/image_text/image_text.jsonl")
}

// ============================================================
// 수집 설정
// ============================================================

/// 수집 설정: 워커 풀 크기, 처리 대상 확장자
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 동시에 실행되는 파이프라인 최대 개수
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// 처리 대상 이미지 확장자 (점 없이, 대소문자 무시)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            extensions: default_extensions(),
        }
    }
}

impl IngestConfig {
    /// 경로의 확장자가 처리 대상인지 확인
    pub fn accepts(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

fn default_worker_count() -> usize {
    3
}

fn default_extensions() -> Vec<String> {
    vec!["jpg".to_string(), "jpeg".to_string()]
}

// ============================================================
// 얼굴 검출 설정
// ============================================================

/// 얼굴 검출 감도: 높은 감도는 검출률과 오탐을 함께 높인다
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDetectionConfig {
    /// 이미지 피라미드 축소 비율 (> 1.0, 작을수록 촘촘하게 탐색)
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    /// 후보 영역이 채택되기 위한 최소 이웃 수
    #[serde(default = "default_min_neighbors")]
    pub min_neighbors: u32,
    /// 최소 얼굴 크기 (픽셀, 정사각형 한 변)
    #[serde(default = "default_min_face_size")]
    pub min_face_size: u32,
    /// Haar cascade 모델 파일 경로 (None이면 얼굴 검출 비활성)
    #[serde(default)]
    pub cascade_path: Option<PathBuf>,
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            scale_factor: default_scale_factor(),
            min_neighbors: default_min_neighbors(),
            min_face_size: default_min_face_size(),
            cascade_path: None,
        }
    }
}

fn default_scale_factor() -> f64 {
    1.1
}

fn default_min_neighbors() -> u32 {
    1
}

fn default_min_face_size() -> u32 {
    40
}

// ============================================================
// 블러 설정
// ============================================================

/// 얼굴 영역 블러 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// 가우시안 커널 크기 (홀수, 클수록 더 넓게 번짐)
    #[serde(default = "default_blur_kernel_size")]
    pub blur_kernel_size: u32,
    /// 가우시안 시그마 (클수록 더 강한 블러)
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: default_blur_kernel_size(),
            blur_sigma: default_blur_sigma(),
        }
    }
}

fn default_blur_kernel_size() -> u32 {
    23
}

fn default_blur_sigma() -> f32 {
    30.0
}

// ============================================================
// 텍스트 영역 탐색 설정
// ============================================================

/// 이진화 임계값 모드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdMode {
    /// Otsu 자동 임계값
    #[default]
    Otsu,
    /// 고정 임계값 (0-255)
    Fixed(u8),
}

/// 팽창 구조 요소 최대 크기. 반경 `kernel_size / 2`가 `u8`에 들어가야 한다.
pub const MAX_DILATION_KERNEL: u32 = 511;

/// 텍스트 영역 탐색 설정: 팽창 커널이 작으면 조각난 영역, 크면 배경까지 병합
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRegionConfig {
    /// 이진화 임계값 모드
    #[serde(default)]
    pub threshold: ThresholdMode,
    /// 사각형 구조 요소 크기 (픽셀)
    #[serde(default = "default_kernel_size")]
    pub kernel_size: u32,
    /// 팽창 반복 횟수
    #[serde(default = "default_dilation_iterations")]
    pub dilation_iterations: u32,
    /// 최소 윤곽선 면적 (이 값 이하는 노이즈로 간주)
    #[serde(default = "default_min_contour_area")]
    pub min_contour_area: f64,
}

impl Default for TextRegionConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdMode::Otsu,
            kernel_size: default_kernel_size(),
            dilation_iterations: default_dilation_iterations(),
            min_contour_area: default_min_contour_area(),
        }
    }
}

fn default_kernel_size() -> u32 {
    60
}

fn default_dilation_iterations() -> u32 {
    3
}

fn default_min_contour_area() -> f64 {
    100.0
}

// ============================================================
// 텍스트 추출 설정
// ============================================================

/// 텍스트 추출(OCR) 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextExtractionConfig {
    /// 정규화된 텍스트가 이 길이를 초과해야 기록됨 (문자 수)
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
    /// Tesseract 데이터 경로 (None이면 시스템 기본값)
    #[serde(default)]
    pub tessdata_path: Option<PathBuf>,
    /// Tesseract 언어 코드
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for TextExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_len: default_min_text_len(),
            tessdata_path: None,
            language: default_language(),
        }
    }
}

fn default_min_text_len() -> usize {
    10
}

fn default_language() -> String {
    "eng".to_string()
}

// ============================================================
// 디버그 설정
// ============================================================

/// 디버그 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugConfig {
    /// 출력 이미지에 얼굴/텍스트 영역 외곽선 표시
    #[serde(default)]
    pub annotate_regions: bool,
}

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ingest.worker_count == 0 {
            return Err(CoreError::validation(
                "ingest.worker_count",
                "1 이상이어야 합니다",
            ));
        }
        if self.ingest.extensions.is_empty() {
            return Err(CoreError::validation(
                "ingest.extensions",
                "최소 1개의 확장자가 필요합니다",
            ));
        }
        if self.face.scale_factor <= 1.0 {
            return Err(CoreError::validation(
                "face.scale_factor",
                "1.0보다 커야 합니다",
            ));
        }
        let k = self.redaction.blur_kernel_size;
        if k == 0 || k % 2 == 0 {
            return Err(CoreError::validation(
                "redaction.blur_kernel_size",
                format!("양의 홀수여야 합니다 (현재 {k})"),
            ));
        }
        if self.redaction.blur_sigma <= 0.0 {
            return Err(CoreError::validation(
                "redaction.blur_sigma",
                "0보다 커야 합니다",
            ));
        }
        let k = self.text_region.kernel_size;
        if k == 0 || k > MAX_DILATION_KERNEL {
            return Err(CoreError::validation(
                "text_region.kernel_size",
                format!("1 이상 {MAX_DILATION_KERNEL} 이하여야 합니다 (현재 {k})"),
            ));
        }
        Ok(())
    }
}
