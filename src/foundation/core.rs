use crate::foundation::error::{BlitError, BlitResult};

/// Number of zoom levels a sprite can be encoded at.
pub const ZOOM_LEVEL_COUNT: usize = 6;

/// Discrete sprite scale. `In4x` is the most detailed level, `Out8x` the coarsest.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ZoomLevel {
    In4x,
    In2x,
    Normal,
    Out2x,
    Out4x,
    Out8x,
}

impl ZoomLevel {
    pub const ALL: [ZoomLevel; ZOOM_LEVEL_COUNT] = [
        ZoomLevel::In4x,
        ZoomLevel::In2x,
        ZoomLevel::Normal,
        ZoomLevel::Out2x,
        ZoomLevel::Out4x,
        ZoomLevel::Out8x,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> BlitResult<Self> {
        Self::ALL
            .get(i)
            .copied()
            .ok_or_else(|| BlitError::validation(format!("zoom level index {i} out of range")))
    }
}

/// Axis-aligned rectangle in screen pixels. Signed so scroll maths can go negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(self) -> i32 {
        self.top + self.height
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Checks that the rectangle lies inside a `width` x `height` surface.
    pub fn check_within(self, width: usize, height: usize, what: &str) -> BlitResult<()> {
        let inside = self.left >= 0
            && self.top >= 0
            && self.width >= 0
            && self.height >= 0
            && (self.right() as i64) <= width as i64
            && (self.bottom() as i64) <= height as i64;
        if !inside {
            return Err(BlitError::validation(format!(
                "{what} {self:?} exceeds {width}x{height} surface"
            )));
        }
        Ok(())
    }
}
