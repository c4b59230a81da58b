//! 텍스트 후보 영역 탐색.
//!
//! 1. 반전 이진화 (Otsu 자동 임계값 또는 고정값). 밝은 배경 위 어두운 글자가 전경이 된다
//! 2. 사각형 구조 요소로 반복 팽창해 인접 글자를 하나의 덩어리로 병합
//! 3. 최상위 외곽 윤곽선만 추출 (구멍/중첩 윤곽선 무시)
//! 4. 윤곽선 면적이 최소값 이하인 영역 제거
//!
//! 결과 순서는 윤곽선 발견 순서이며 래스터 순서가 보장되지 않는다.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use tracing::{debug, warn};
use veil_core::config::{TextRegionConfig, ThresholdMode};
use veil_core::models::region::Rect;

/// 텍스트 후보 영역 탐색기
#[derive(Debug, Clone)]
pub struct TextRegionLocator {
    threshold: ThresholdMode,
    /// Chebyshev 반경 (구조 요소 한 변 = 2 * radius + 1)
    dilation_radius: u8,
    dilation_iterations: u32,
    min_contour_area: f64,
}

impl TextRegionLocator {
    /// 설정에서 생성
    pub fn from_config(config: &TextRegionConfig) -> Self {
        let dilation_radius = u8::try_from(config.kernel_size / 2).unwrap_or_else(|_| {
            warn!(
                kernel_size = config.kernel_size,
                "팽창 커널이 너무 큼: 반경 {} 로 제한",
                u8::MAX
            );
            u8::MAX
        });
        Self {
            threshold: config.threshold,
            dilation_radius,
            dilation_iterations: config.dilation_iterations,
            min_contour_area: config.min_contour_area,
        }
    }

    /// 그레이스케일 프레임에서 텍스트 후보 사각형 목록 반환
    pub fn locate(&self, gray: &GrayImage) -> Vec<Rect> {
        if gray.width() == 0 || gray.height() == 0 {
            return Vec::new();
        }

        let level = match self.threshold {
            ThresholdMode::Otsu => otsu_level(gray),
            ThresholdMode::Fixed(level) => level,
        };
        let mut mask = binarize_inverted(gray, level);

        if self.dilation_radius > 0 {
            for _ in 0..self.dilation_iterations {
                mask = morphology::dilate(&mask, Norm::LInf, self.dilation_radius);
            }
        }

        let contours = find_contours::<u32>(&mask);
        let total = contours.len();

        let regions: Vec<Rect> = contours
            .iter()
            .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
            .filter(|c| contour_area(c) > self.min_contour_area)
            .filter_map(bounding_rect)
            .collect();

        debug!(
            level,
            contours = total,
            regions = regions.len(),
            "텍스트 후보 영역 탐색 완료"
        );
        regions
    }
}

impl Default for TextRegionLocator {
    fn default() -> Self {
        Self::from_config(&TextRegionConfig::default())
    }
}

/// 반전 이진화: `level` 이하 → 255 (전경), 초과 → 0
pub fn binarize_inverted(gray: &GrayImage, level: u8) -> GrayImage {
    let mut mask = GrayImage::new(gray.width(), gray.height());
    for (src, dst) in gray.pixels().zip(mask.pixels_mut()) {
        *dst = if src[0] <= level { Luma([255]) } else { Luma([0]) };
    }
    mask
}

/// 윤곽선 다각형 면적 (신발끈 공식)
fn contour_area(contour: &Contour<u32>) -> f64 {
    let pts = &contour.points;
    if pts.len() < 3 {
        return 0.0;
    }

    let mut twice_area = 0.0f64;
    for i in 0..pts.len() {
        let a = pts[i];
        let b = pts[(i + 1) % pts.len()];
        twice_area += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    twice_area.abs() / 2.0
}

/// 윤곽선 점 집합의 외접 사각형
fn bounding_rect(contour: &Contour<u32>) -> Option<Rect> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(Rect::new(
        min_x as i32,
        min_y as i32,
        max_x - min_x + 1,
        max_y - min_y + 1,
    ))
}
