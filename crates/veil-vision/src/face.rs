//! 얼굴 검출 어댑터.
//!
//! - [`NoOpFaceDetector`]: 항상 빈 목록 반환 (모델 미설정 또는 `haar` feature 비활성)
//! - [`HaarFaceDetector`]: OpenCV Haar cascade 기반 (`haar` feature)

use image::GrayImage;
use veil_core::error::CoreError;
use veil_core::models::region::Rect;
use veil_core::ports::face_detector::FaceDetector;

/// 얼굴을 검출하지 않는 검출기
pub struct NoOpFaceDetector;

impl FaceDetector for NoOpFaceDetector {
    fn detect(&self, _gray: &GrayImage) -> Result<Vec<Rect>, CoreError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[cfg(feature = "haar")]
pub use haar::HaarFaceDetector;

#[cfg(feature = "haar")]
mod haar {
    use super::*;
    use opencv::core::{Mat, Rect as CvRect, Size, Vector};
    use opencv::objdetect::CascadeClassifier;
    use opencv::prelude::*;
    use parking_lot::Mutex;
    use std::path::Path;
    use tracing::{debug, info};
    use veil_core::config::FaceDetectionConfig;

    /// Haar cascade 얼굴 검출기
    ///
    /// `CascadeClassifier`는 검출 시 `&mut`가 필요하므로 뮤텍스로 감싼다.
    /// 워커 간 검출 호출은 직렬화된다.
    pub struct HaarFaceDetector {
        classifier: Mutex<CascadeClassifier>,
        scale_factor: f64,
        min_neighbors: i32,
        min_size: i32,
    }

    impl HaarFaceDetector {
        /// cascade 모델 파일을 로드해 검출기 생성
        pub fn load(model_path: &Path, config: &FaceDetectionConfig) -> Result<Self, CoreError> {
            let path_str = model_path.to_str().ok_or_else(|| {
                CoreError::Detection(format!("잘못된 모델 경로: {}", model_path.display()))
            })?;

            let classifier = CascadeClassifier::new(path_str)
                .map_err(|e| CoreError::Detection(format!("cascade 로드 실패: {e}")))?;
            if classifier
                .empty()
                .map_err(|e| CoreError::Detection(format!("{e}")))?
            {
                return Err(CoreError::Detection(format!(
                    "빈 cascade 모델: {}",
                    model_path.display()
                )));
            }

            info!(
                model = %model_path.display(),
                scale_factor = config.scale_factor,
                min_neighbors = config.min_neighbors,
                min_face_size = config.min_face_size,
                "Haar 얼굴 검출기 로드"
            );

            Ok(Self {
                classifier: Mutex::new(classifier),
                scale_factor: config.scale_factor,
                min_neighbors: config.min_neighbors as i32,
                min_size: config.min_face_size as i32,
            })
        }
    }

    impl FaceDetector for HaarFaceDetector {
        fn detect(&self, gray: &GrayImage) -> Result<Vec<Rect>, CoreError> {
            let (w, h) = gray.dimensions();
            if w == 0 || h == 0 {
                return Ok(Vec::new());
            }

            let mat = Mat::from_slice_rows_cols(gray.as_raw(), h as usize, w as usize)
                .map_err(|e| CoreError::Detection(format!("Mat 변환 실패: {e}")))?;

            let mut found: Vector<CvRect> = Vector::new();
            self.classifier
                .lock()
                .detect_multi_scale(
                    &mat,
                    &mut found,
                    self.scale_factor,
                    self.min_neighbors,
                    0,
                    Size::new(self.min_size, self.min_size),
                    Size::default(),
                )
                .map_err(|e| CoreError::Detection(format!("{e}")))?;

            let faces: Vec<Rect> = found
                .iter()
                .filter(|r| r.width > 0 && r.height > 0)
                .map(|r| Rect::new(r.x, r.y, r.width as u32, r.height as u32))
                .collect();

            debug!(faces = faces.len(), "얼굴 검출 완료");
            Ok(faces)
        }

        fn name(&self) -> &str {
            "haar-cascade"
        }
    }
}
