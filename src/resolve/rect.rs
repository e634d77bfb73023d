use serde::{Deserialize, Serialize};

/// Detector-space bounding box with format conversion utilities.
///
/// Object detectors report boxes as TLWH (top-left x, top-left y, width,
/// height) floats; trackers report TLBR. Both convert to [`PixelBox`] once a
/// box is attached to a person.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Truncate to integer pixel coordinates.
    pub fn to_pixel_box(&self) -> PixelBox {
        let [x1, y1, x2, y2] = self.to_tlbr();
        PixelBox::from_xyxy(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }
}

/// Integer pixel region in (top, right, bottom, left) order.
///
/// This is the layout face and body boxes are persisted in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl PixelBox {
    /// Create a box from its edges in persisted order.
    #[inline]
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Build from corner form (x1, y1, x2, y2).
    #[inline]
    pub fn from_xyxy(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            top: y1,
            right: x2,
            bottom: y2,
            left: x1,
        }
    }

    /// Corner form (x1, y1, x2, y2).
    #[inline]
    pub fn to_xyxy(&self) -> [i32; 4] {
        [self.left, self.top, self.right, self.bottom]
    }

    /// Horizontal extent, saturating for edges near the `i32` limits.
    #[inline]
    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    /// Vertical extent, saturating for edges near the `i32` limits.
    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Whether the point lies inside this box, edges included.
    #[inline]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.left <= x && x <= self.right && self.top <= y && y <= self.bottom
    }

    /// Whether `inner` lies entirely inside this box.
    ///
    /// Both diagonal corners of `inner` must be contained, which for
    /// axis-aligned boxes covers all four corners.
    pub fn contains(&self, inner: &PixelBox) -> bool {
        self.contains_point(inner.left, inner.top) && self.contains_point(inner.right, inner.bottom)
    }

    /// Clamp every edge into `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: u32, height: u32) -> PixelBox {
        let w = i32::try_from(width).unwrap_or(i32::MAX);
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        PixelBox {
            top: self.top.clamp(0, h),
            right: self.right.clamp(0, w),
            bottom: self.bottom.clamp(0, h),
            left: self.left.clamp(0, w),
        }
    }
}
