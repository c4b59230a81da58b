//! 디버그용 영역 외곽선 표시.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as DrawRect;
use veil_core::models::region::Rect;

/// 얼굴 영역 외곽선 색
pub const FACE_COLOR: Rgb<u8> = Rgb([180, 180, 180]);
/// 텍스트 영역 외곽선 색
pub const TEXT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// 프레임에 사각형 외곽선을 그린다. 프레임 밖 영역은 무시.
pub fn outline_regions(frame: &mut RgbImage, regions: &[Rect], color: Rgb<u8>) {
    let (w, h) = frame.dimensions();
    for r in regions.iter().filter_map(|r| r.clip(w, h)) {
        draw_hollow_rect_mut(frame, DrawRect::at(r.x, r.y).of_size(r.width, r.height), color);
    }
}
