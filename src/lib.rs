//! `animblit` composites run-length encoded sprites onto a 32bpp framebuffer that is
//! shadowed by an 8bpp palette-animation plane.
//!
//! Pixels drawn with a remap index keep that index in the animation plane, so a
//! palette cycle recolours them at presentation time without redrawing. Screens
//! without an animation plane, or [`BlitterSettings::disable_anim`], take an RGB-only
//! path that resolves indices to final colours while drawing.
//!
//! Typical flow:
//! 1. decode source art into a [`SpriteCollection`],
//! 2. [`SpriteEncoder::encode`] it once into an [`EncodedSprite`],
//! 3. [`Blitter::draw`] it onto a [`Screen`] as often as needed,
//! 4. [`Screen::present`] the frame against the current [`Palette`].
#![forbid(unsafe_code)]

pub mod blitter;
pub mod colour;
pub mod config;
pub mod foundation;
pub mod palette;
pub mod screen;
pub mod sprite;

pub use blitter::{Blitter, BlitterMode, BlitterParams, ColourMapping, PixelColour};
pub use colour::{
    Colour, DEFAULT_BRIGHTNESS, adjust_brightness, brightness, compose_rgba, make_dark, make_grey,
    make_transparent,
};
pub use config::BlitterSettings;
pub use foundation::core::{Rect, ZoomLevel};
pub use foundation::error::{BlitError, BlitResult};
pub use palette::{PALETTE_ANIM_SIZE, PALETTE_ANIM_START, Palette, RemapTable};
pub use screen::{AnimationBuffer, Framebuffer, Plane, Screen, realize_blended};
pub use sprite::data::{EncodedSprite, Run, Scanline, SpriteFlags, ZoomStreams};
pub use sprite::encode::SpriteEncoder;
pub use sprite::loader::{SourcePixel, SourceSprite, SpriteCollection};
