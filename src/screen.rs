use crate::{
    colour::{self, Colour},
    foundation::error::{BlitError, BlitResult},
    palette::Palette,
};

/// Dense row-major grid with a row pitch of at least `width` elements.
///
/// Both screen planes are `Plane`s of identical shape, so an element offset into
/// one is valid for the other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plane<T> {
    width: usize,
    height: usize,
    pitch: usize,
    data: Vec<T>,
}

impl<T: Copy> Plane<T> {
    pub fn new(width: usize, height: usize, pitch: usize, fill: T) -> BlitResult<Self> {
        if pitch < width {
            return Err(BlitError::validation(format!(
                "pitch {pitch} is smaller than width {width}"
            )));
        }
        let len = pitch
            .checked_mul(height)
            .ok_or_else(|| BlitError::validation("plane size overflow"))?;
        Ok(Self {
            width,
            height,
            pitch,
            data: vec![fill; len],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    #[inline]
    pub fn offset(&self, x: usize, y: usize) -> usize {
        debug_assert!(
            x < self.width && y < self.height,
            "({x}, {y}) outside {}x{} plane",
            self.width,
            self.height
        );
        y * self.pitch + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.offset(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        let at = self.offset(x, y);
        self.data[at] = v;
    }

    /// `len` elements of row `y` starting at column `x`.
    #[inline]
    pub fn span(&self, x: usize, y: usize, len: usize) -> &[T] {
        debug_assert!(x + len <= self.width);
        let at = y * self.pitch + x;
        &self.data[at..at + len]
    }

    #[inline]
    pub fn span_mut(&mut self, x: usize, y: usize, len: usize) -> &mut [T] {
        debug_assert!(x + len <= self.width);
        let at = y * self.pitch + x;
        &mut self.data[at..at + len]
    }

    pub fn row(&self, y: usize) -> &[T] {
        self.span(0, y, self.width)
    }

    pub fn fill(&mut self, v: T) {
        self.data.fill(v);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

pub type Framebuffer = Plane<Colour>;
pub type AnimationBuffer = Plane<u8>;

/// The video output: a 32bpp framebuffer and, for animatable surfaces, the
/// palette-index plane that shadows it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    video: Framebuffer,
    anim: Option<AnimationBuffer>,
}

impl Screen {
    /// Animatable screen with `pitch == width`.
    pub fn new(width: usize, height: usize) -> BlitResult<Self> {
        Self::with_pitch(width, height, width)
    }

    pub fn with_pitch(width: usize, height: usize, pitch: usize) -> BlitResult<Self> {
        Ok(Self {
            video: Plane::new(width, height, pitch, Colour::BLACK)?,
            anim: Some(Plane::new(width, height, pitch, 0)?),
        })
    }

    /// Surface without an animation plane (screenshots, offscreen caches).
    pub fn offscreen(width: usize, height: usize) -> BlitResult<Self> {
        Ok(Self {
            video: Plane::new(width, height, width, Colour::BLACK)?,
            anim: None,
        })
    }

    /// Reallocates both planes. Contents are reset.
    pub fn resize(&mut self, width: usize, height: usize) -> BlitResult<()> {
        self.video = Plane::new(width, height, width, Colour::BLACK)?;
        if self.anim.is_some() {
            self.anim = Some(Plane::new(width, height, width, 0)?);
        }
        tracing::debug!(width, height, anim = self.anim.is_some(), "screen resized");
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.video.width()
    }

    pub fn height(&self) -> usize {
        self.video.height()
    }

    pub fn pitch(&self) -> usize {
        self.video.pitch()
    }

    pub fn video(&self) -> &Framebuffer {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut Framebuffer {
        &mut self.video
    }

    pub fn anim_buffer(&self) -> Option<&AnimationBuffer> {
        self.anim.as_ref()
    }

    pub fn anim_buffer_mut(&mut self) -> Option<&mut AnimationBuffer> {
        self.anim.as_mut()
    }

    /// Both planes at once, for blits that write them in lockstep.
    pub fn planes_mut(&mut self) -> (&mut Framebuffer, Option<&mut AnimationBuffer>) {
        (&mut self.video, self.anim.as_mut())
    }

    pub fn clear(&mut self, colour: Colour) {
        self.video.fill(colour);
        if let Some(anim) = &mut self.anim {
            anim.fill(0);
        }
    }

    /// Final colours with animation indices resolved against `palette`, row-major
    /// `width * height`.
    pub fn present(&self, palette: &Palette) -> Vec<Colour> {
        let (w, h) = (self.width(), self.height());
        let mut out = Vec::with_capacity(w * h);
        for y in 0..h {
            let rgb = self.video.row(y);
            match &self.anim {
                Some(anim) => out.extend(
                    rgb.iter()
                        .zip(anim.row(y))
                        .map(|(&c, &m)| realize_blended(palette, m, c)),
                ),
                None => out.extend_from_slice(rgb),
            }
        }
        out
    }

    pub fn to_rgba_image(&self, palette: &Palette) -> BlitResult<image::RgbaImage> {
        let bytes: Vec<u8> = self
            .present(palette)
            .into_iter()
            .flat_map(|c| {
                let [r, g, b, _] = c.to_rgba8();
                [r, g, b, 255]
            })
            .collect();
        image::RgbaImage::from_raw(self.width() as u32, self.height() as u32, bytes)
            .ok_or_else(|| BlitError::validation("screen too large for an image"))
    }
}

/// Display colour of a pixel: the palette colour at the pixel's brightness when an
/// animation index is set, the RGB value otherwise.
#[inline]
pub fn realize_blended(palette: &Palette, anim: u8, c: Colour) -> Colour {
    if anim != 0 {
        colour::adjust_brightness(palette.lookup(anim), colour::brightness(c))
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planes_share_offsets() {
        let s = Screen::with_pitch(3, 2, 5).unwrap();
        assert_eq!(s.video().offset(2, 1), 7);
        assert_eq!(s.anim_buffer().unwrap().offset(2, 1), 7);
        assert_eq!(s.video().as_slice().len(), 10);
    }

    #[test]
    fn pitch_smaller_than_width_is_rejected() {
        assert!(Screen::with_pitch(4, 4, 3).is_err());
    }

    #[test]
    fn resize_keeps_animation_presence() {
        let mut s = Screen::new(2, 2).unwrap();
        s.resize(5, 3).unwrap();
        assert_eq!((s.width(), s.height()), (5, 3));
        assert_eq!(s.anim_buffer().unwrap().width(), 5);

        let mut off = Screen::offscreen(2, 2).unwrap();
        off.resize(4, 4).unwrap();
        assert!(off.anim_buffer().is_none());
    }

    #[test]
    fn present_resolves_animation_index() {
        let palette = Palette::default();
        let mut s = Screen::new(2, 1).unwrap();
        s.video_mut().set(0, 0, Colour::rgb(1, 2, 3));
        s.video_mut().set(1, 0, Colour::BLACK);
        s.anim_buffer_mut().unwrap().set(1, 0, 40);

        let out = s.present(&palette);
        assert_eq!(out[0], Colour::rgb(1, 2, 3));
        // Black carries the default brightness, so the palette colour shows unchanged.
        assert_eq!(out[1], palette.lookup(40));
    }
}
