//! Frame pixels as handed to every collaborator.

use ndarray::{Array3, ArrayView3, s};

use crate::error::OutputShapeError;
use crate::resolve::PixelBox;

/// A borrowed video frame laid out as height x width x channels.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pixels: ArrayView3<'a, u8>,
}

impl<'a> Frame<'a> {
    /// Wrap an HxWxC pixel view.
    pub fn new(pixels: ArrayView3<'a, u8>) -> Self {
        Self { pixels }
    }

    /// Wrap a packed, row-major pixel buffer.
    pub fn from_raw(
        data: &'a [u8],
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<Self, OutputShapeError> {
        ArrayView3::from_shape((height, width, channels), data)
            .map(Self::new)
            .map_err(|_| OutputShapeError::FrameBuffer {
                len: data.len(),
                width,
                height,
                channels,
            })
    }

    /// Get the pixel view.
    pub fn pixels(&self) -> ArrayView3<'a, u8> {
        self.pixels
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        u32::try_from(self.pixels.dim().1).unwrap_or(u32::MAX)
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        u32::try_from(self.pixels.dim().0).unwrap_or(u32::MAX)
    }

    /// Copy out `region` clamped to the frame.
    ///
    /// Returns `None` when the clamped width or height is `<= min_side`.
    pub fn crop(&self, region: &PixelBox, min_side: u32) -> Option<FaceCrop> {
        let clamped = region.clamp_to(self.width(), self.height());
        let min_side = i64::from(min_side);
        if i64::from(clamped.width()) <= min_side || i64::from(clamped.height()) <= min_side {
            return None;
        }

        let (top, bottom) = (clamped.top as usize, clamped.bottom as usize);
        let (left, right) = (clamped.left as usize, clamped.right as usize);
        let pixels = self.pixels.slice(s![top..bottom, left..right, ..]).to_owned();
        Some(FaceCrop {
            pixels,
            region: clamped,
        })
    }
}

/// Owned face image handed to the attribute estimators.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceCrop {
    pixels: Array3<u8>,
    region: PixelBox,
}

impl FaceCrop {
    /// Get the cropped pixels.
    pub fn pixels(&self) -> &Array3<u8> {
        &self.pixels
    }

    /// Where the crop was taken from, in frame coordinates.
    pub fn region(&self) -> PixelBox {
        self.region
    }

    /// Crop width in pixels.
    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    /// Crop height in pixels.
    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }
}
