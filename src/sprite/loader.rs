use crate::foundation::{
    core::{ZOOM_LEVEL_COUNT, ZoomLevel},
    error::{BlitError, BlitResult},
};

/// Decoded sprite pixel: straight RGBA plus a remap index `m` (0 = literal colour).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourcePixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
    pub m: u8,
}

impl SourcePixel {
    pub const TRANSPARENT: SourcePixel = SourcePixel {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
        m: 0,
    };

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a, m: 0 }
    }

    /// Opaque palette-remapped pixel; `(r, g, b)` only carries its brightness.
    pub const fn remapped(m: u8, r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255, m }
    }
}

/// One zoom level of a decoded sprite, rows top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceSprite {
    pub width: u32,
    pub height: u32,
    pub x_offs: i32,
    pub y_offs: i32,
    pub pixels: Vec<SourcePixel>,
}

impl SourceSprite {
    pub fn new(width: u32, height: u32, pixels: Vec<SourcePixel>) -> BlitResult<Self> {
        let sprite = Self {
            width,
            height,
            x_offs: 0,
            y_offs: 0,
            pixels,
        };
        sprite.validate()?;
        Ok(sprite)
    }

    pub fn filled(width: u32, height: u32, px: SourcePixel) -> Self {
        Self {
            width,
            height,
            x_offs: 0,
            y_offs: 0,
            pixels: vec![px; (width as usize) * (height as usize)],
        }
    }

    pub fn with_offsets(mut self, x_offs: i32, y_offs: i32) -> Self {
        self.x_offs = x_offs;
        self.y_offs = y_offs;
        self
    }

    pub fn validate(&self) -> BlitResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BlitError::validation("sprite dimensions must be > 0"));
        }
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .ok_or_else(|| BlitError::validation("sprite dimensions overflow"))?;
        if self.pixels.len() != expected {
            return Err(BlitError::validation(format!(
                "sprite has {} pixels, expected {}x{} = {expected}",
                self.pixels.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, SourcePixel> {
        self.pixels.chunks_exact(self.width as usize)
    }

    pub fn pixel(&self, x: u32, y: u32) -> SourcePixel {
        self.pixels[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Builds a sprite from an RGBA image. `mask` supplies per-pixel remap indices
    /// (its luma byte), and must match the image dimensions.
    pub fn from_rgba_image(
        img: &image::RgbaImage,
        mask: Option<&image::GrayImage>,
    ) -> BlitResult<Self> {
        let (width, height) = img.dimensions();
        if let Some(mask) = mask
            && mask.dimensions() != (width, height)
        {
            return Err(BlitError::validation(format!(
                "remap mask is {:?}, image is {width}x{height}",
                mask.dimensions()
            )));
        }

        let pixels = img
            .enumerate_pixels()
            .map(|(x, y, px)| {
                let [r, g, b, a] = px.0;
                let m = mask.map(|mask| mask.get_pixel(x, y).0[0]).unwrap_or(0);
                SourcePixel { r, g, b, a, m }
            })
            .collect();
        Self::new(width, height, pixels)
    }
}

/// The decoded zoom levels of one sprite. Present levels must form a contiguous range.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpriteCollection {
    levels: [Option<SourceSprite>; ZOOM_LEVEL_COUNT],
}

impl SpriteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(zoom: ZoomLevel, sprite: SourceSprite) -> Self {
        let mut out = Self::new();
        out.insert(zoom, sprite);
        out
    }

    pub fn insert(&mut self, zoom: ZoomLevel, sprite: SourceSprite) {
        self.levels[zoom.index()] = Some(sprite);
    }

    pub fn get(&self, zoom: ZoomLevel) -> Option<&SourceSprite> {
        self.levels[zoom.index()].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZoomLevel, &SourceSprite)> {
        ZoomLevel::ALL
            .into_iter()
            .zip(&self.levels)
            .filter_map(|(z, s)| s.as_ref().map(|s| (z, s)))
    }

    /// `(zoom_min, zoom_max)` of the present levels.
    pub fn zoom_range(&self) -> BlitResult<(ZoomLevel, ZoomLevel)> {
        let present: Vec<ZoomLevel> = self.iter().map(|(z, _)| z).collect();
        let (Some(&min), Some(&max)) = (present.first(), present.last()) else {
            return Err(BlitError::validation("sprite collection is empty"));
        };
        if present.len() != max.index() - min.index() + 1 {
            return Err(BlitError::validation(format!(
                "zoom levels must be contiguous, got {present:?}"
            )));
        }
        Ok((min, max))
    }
}
