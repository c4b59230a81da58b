//! 얼굴 검출기 포트.
//!
//! 구현: `veil-vision::face` (OpenCV Haar cascade, NoOp)

use image::GrayImage;

use crate::error::CoreError;
use crate::models::region::Rect;

/// 얼굴 영역 검출기
///
/// 히스토그램 평활화된 그레이스케일 프레임을 받아 얼굴로 추정되는 사각형을 반환한다.
/// 반환된 사각형은 프레임 밖으로 걸칠 수 있으며 호출자가 클리핑한다.
pub trait FaceDetector: Send + Sync {
    /// 그레이스케일 프레임에서 얼굴 영역 검출
    fn detect(&self, gray: &GrayImage) -> Result<Vec<Rect>, CoreError>;

    /// 검출기 이름 (예: "haar-cascade", "noop")
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDetector(Vec<Rect>);

    impl FaceDetector for FixedDetector {
        fn detect(&self, _gray: &GrayImage) -> Result<Vec<Rect>, CoreError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn detector_is_object_safe() {
        let detector: Box<dyn FaceDetector> =
            Box::new(FixedDetector(vec![Rect::new(0, 0, 4, 4)]));
        let faces = detector.detect(&GrayImage::new(8, 8)).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(detector.name(), "fixed");
    }
}
