//! 얼굴 영역 블러 처리.
//!
//! 검출된 각 사각형을 프레임 경계로 클리핑한 뒤, 같은 영역을 가우시안 블러한
//! 사본으로 덮어쓴다. 겹치는 사각형은 순서대로 각각 블러된다 (나중 것이 우선).

use image::{imageops, RgbImage};
use imageproc::filter::separable_filter_equal;
use tracing::debug;
use veil_core::config::RedactionConfig;
use veil_core::models::region::Rect;

/// 가우시안 블러 기반 얼굴 영역 가리기
#[derive(Debug, Clone)]
pub struct FaceRedactor {
    /// 정규화된 1차원 가우시안 커널 (가로/세로 공용)
    kernel: Vec<f32>,
}

impl FaceRedactor {
    /// 커널 크기와 시그마로 생성. 짝수 크기는 다음 홀수로 올린다.
    pub fn new(kernel_size: u32, sigma: f32) -> Self {
        Self {
            kernel: gaussian_kernel(kernel_size, sigma),
        }
    }

    /// 설정에서 생성
    pub fn from_config(config: &RedactionConfig) -> Self {
        Self::new(config.blur_kernel_size, config.blur_sigma)
    }

    /// 프레임의 각 영역을 제자리에서 블러 처리하고 실제 적용된 영역 수를 반환
    pub fn redact(&self, frame: &mut RgbImage, regions: &[Rect]) -> usize {
        let (w, h) = frame.dimensions();
        let mut applied = 0;

        for region in regions {
            let Some(r) = region.clip(w, h) else {
                debug!(?region, "프레임 밖 영역 무시");
                continue;
            };

            let roi = imageops::crop_imm(&*frame, r.x as u32, r.y as u32, r.width, r.height)
                .to_image();
            let blurred = separable_filter_equal(&roi, &self.kernel);
            imageops::replace(frame, &blurred, r.x as i64, r.y as i64);
            applied += 1;
        }

        applied
    }
}

impl Default for FaceRedactor {
    fn default() -> Self {
        Self::from_config(&RedactionConfig::default())
    }
}

/// 정규화된 1차원 가우시안 커널 생성
fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let size = size.max(1) | 1;
    let sigma = if sigma > 0.0 { sigma } else { 1.0 };
    let center = (size / 2) as f32;
    let denom = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / denom).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}
