//! 픽셀 좌표 사각형 영역.

use serde::{Deserialize, Serialize};

/// 축 정렬 사각형 (픽셀 좌표)
///
/// 검출기는 프레임 밖으로 걸친 사각형을 반환할 수 있으므로 원점은 부호 있는 정수다.
/// 사용 전 [`Rect::clip`]으로 프레임 경계에 맞춘다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `frame_w` x `frame_h` 프레임 경계로 클리핑.
    ///
    /// 프레임과 겹치지 않으면 `None`.
    pub fn clip(&self, frame_w: u32, frame_h: u32) -> Option<Rect> {
        let left = (self.x as i64).max(0);
        let top = (self.y as i64).max(0);
        let right = (self.x as i64 + self.width as i64).min(frame_w as i64);
        let bottom = (self.y as i64 + self.height as i64).min(frame_h as i64);

        if right <= left || bottom <= top {
            return None;
        }

        Some(Rect {
            x: left as i32,
            y: top as i32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }

    /// 점 (px, py)가 사각형 내부인지 확인
    pub fn contains(&self, px: u32, py: u32) -> bool {
        let (px, py) = (px as i64, py as i64);
        px >= self.x as i64
            && py >= self.y as i64
            && px < self.x as i64 + self.width as i64
            && py < self.y as i64 + self.height as i64
    }
}
