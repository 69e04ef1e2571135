//! Sprite compositor for a 32bpp framebuffer shadowed by an 8bpp animation plane.
//!
//! Every entry point picks one of two paths once per call: the animated path writes
//! both planes, the RGB path (animation disabled in [`BlitterSettings`], or a screen
//! without an animation plane) resolves palette indices to final colours and never
//! touches a side buffer.

mod draw;
pub mod line;
mod ops;

pub use ops::ColourMapping;

use crate::{
    config::BlitterSettings,
    foundation::{
        core::ZoomLevel,
        error::{BlitError, BlitResult},
    },
    palette::{Palette, RemapTable},
    screen::{AnimationBuffer, Framebuffer, Screen},
    sprite::data::EncodedSprite,
};

/// How sprite pixels combine with what is already on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlitterMode {
    /// Literal colours; remap indices go to the animation plane untranslated.
    Normal,
    /// Remap indices translated through the remap table; 0 results are not drawn.
    ColourRemap,
    /// Darkens the existing pixels (sprite shape only).
    Transparent,
    /// Translates the existing pixels' palette indices through the remap table.
    TransparentRemap,
    /// Like `ColourRemap`, unmapped pixels darkened to grey.
    CrashRemap,
    /// Solid black silhouette.
    BlackRemap,
}

impl BlitterMode {
    pub fn needs_remap(self) -> bool {
        matches!(
            self,
            Self::ColourRemap | Self::TransparentRemap | Self::CrashRemap
        )
    }
}

/// Palette index used by the non-sprite drawing operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelColour(pub u8);

/// One sprite draw: which part of the sprite, and where on screen it lands.
#[derive(Clone, Copy, Debug)]
pub struct BlitterParams<'a> {
    pub sprite: &'a EncodedSprite,
    pub remap: Option<&'a RemapTable>,
    /// Sprite columns clipped off the left edge.
    pub skip_left: usize,
    /// Sprite rows clipped off the top edge.
    pub skip_top: usize,
    /// Visible width in pixels.
    pub width: usize,
    /// Visible height in pixels.
    pub height: usize,
    /// Screen column of the first visible pixel.
    pub left: usize,
    /// Screen row of the first visible pixel.
    pub top: usize,
}

impl<'a> BlitterParams<'a> {
    /// Unclipped draw of the whole `zoom` level with its top-left at `(left, top)`.
    pub fn whole(
        sprite: &'a EncodedSprite,
        zoom: ZoomLevel,
        left: usize,
        top: usize,
    ) -> BlitResult<Self> {
        let level = sprite
            .level(zoom)
            .ok_or_else(|| BlitError::validation(format!("sprite has no {zoom:?} level")))?;
        Ok(Self {
            sprite,
            remap: None,
            skip_left: 0,
            skip_top: 0,
            width: level.width as usize,
            height: level.height as usize,
            left,
            top,
        })
    }

    pub fn with_remap(mut self, remap: &'a RemapTable) -> Self {
        self.remap = Some(remap);
        self
    }

    pub fn with_clip(mut self, skip_left: usize, skip_top: usize, width: usize, height: usize) -> Self {
        self.skip_left = skip_left;
        self.skip_top = skip_top;
        self.width = width;
        self.height = height;
        self
    }
}

/// Mode with its remap table resolved, so the run loops never see a missing table.
#[derive(Clone, Copy)]
pub(crate) enum BlitOp<'r> {
    Normal,
    ColourRemap { remap: &'r RemapTable, crash: bool },
    Transparent,
    TransparentRemap(&'r RemapTable),
    BlackRemap,
}

impl<'r> BlitOp<'r> {
    fn resolve(mode: BlitterMode, remap: Option<&'r RemapTable>) -> BlitResult<Self> {
        let need = || {
            remap.ok_or_else(|| BlitError::validation(format!("{mode:?} requires a remap table")))
        };
        Ok(match mode {
            BlitterMode::Normal => Self::Normal,
            BlitterMode::ColourRemap => Self::ColourRemap {
                remap: need()?,
                crash: false,
            },
            BlitterMode::CrashRemap => Self::ColourRemap {
                remap: need()?,
                crash: true,
            },
            BlitterMode::Transparent => Self::Transparent,
            BlitterMode::TransparentRemap => Self::TransparentRemap(need()?),
            BlitterMode::BlackRemap => Self::BlackRemap,
        })
    }
}

/// Drawing context: the palette and settings for the current frame.
#[derive(Clone, Copy, Debug)]
pub struct Blitter<'a> {
    palette: &'a Palette,
    settings: &'a BlitterSettings,
}

impl<'a> Blitter<'a> {
    pub fn new(palette: &'a Palette, settings: &'a BlitterSettings) -> Self {
        Self { palette, settings }
    }

    pub fn palette(&self) -> &Palette {
        self.palette
    }

    pub fn settings(&self) -> &BlitterSettings {
        self.settings
    }

    /// Bytes needed by [`Blitter::copy_to_buffer`] for a `width` x `height` region.
    pub fn buffer_size(width: usize, height: usize) -> usize {
        (std::mem::size_of::<u32>() + std::mem::size_of::<u8>()) * width * height
    }

    /// Read-only counterpart of [`Blitter::target`].
    fn anim_plane<'s>(&self, screen: &'s Screen) -> Option<&'s AnimationBuffer> {
        if self.settings.disable_anim {
            None
        } else {
            screen.anim_buffer()
        }
    }

    /// Framebuffer plus the animation plane, unless animation is off for this call.
    fn target<'s>(
        &self,
        screen: &'s mut Screen,
    ) -> (&'s mut Framebuffer, Option<&'s mut AnimationBuffer>) {
        let (video, anim) = screen.planes_mut();
        if self.settings.disable_anim {
            (video, None)
        } else {
            (video, anim)
        }
    }
}
