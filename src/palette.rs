use std::path::Path;

use anyhow::Context as _;

use crate::{
    colour::Colour,
    foundation::error::{BlitError, BlitResult},
};

/// First palette index whose colour is cycled by palette animation.
pub const PALETTE_ANIM_START: u8 = 227;
/// Number of animated palette entries (`227..=254`).
pub const PALETTE_ANIM_SIZE: u8 = 28;

/// 256-entry colour palette.
///
/// Index 0 is the transparent/"no colour" entry and is never returned by
/// [`Palette::nearest_index`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colours: [Colour; 256],
}

impl Palette {
    pub fn new(colours: [Colour; 256]) -> Self {
        Self { colours }
    }

    /// Builds a palette from `[r, g, b]` triples; fewer than 256 entries are padded with black.
    pub fn from_rgb(entries: &[[u8; 3]]) -> BlitResult<Self> {
        if entries.len() > 256 {
            return Err(BlitError::validation(format!(
                "palette has {} entries, at most 256 allowed",
                entries.len()
            )));
        }
        let mut colours = [Colour::BLACK; 256];
        for (slot, [r, g, b]) in colours.iter_mut().zip(entries) {
            *slot = Colour::rgb(*r, *g, *b);
        }
        Ok(Self { colours })
    }

    pub fn from_json_str(json: &str) -> BlitResult<Self> {
        let entries: Vec<[u8; 3]> = serde_json::from_str(json)
            .map_err(|e| BlitError::decode(format!("palette json: {e}")))?;
        Self::from_rgb(&entries)
    }

    pub fn load_json(path: &Path) -> BlitResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read palette '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn to_rgb(&self) -> Vec<[u8; 3]> {
        self.colours.iter().map(|c| [c.r, c.g, c.b]).collect()
    }

    #[inline]
    pub fn lookup(&self, index: u8) -> Colour {
        self.colours[usize::from(index)]
    }

    pub fn set(&mut self, index: u8, colour: Colour) {
        self.colours[usize::from(index)] = colour;
    }

    /// Rotates the animated range by one entry, the way water and lights cycle.
    pub fn rotate_animated(&mut self) {
        let start = usize::from(PALETTE_ANIM_START);
        let end = start + usize::from(PALETTE_ANIM_SIZE);
        self.colours[start..end].rotate_left(1);
    }

    /// Closest non-animated, non-transparent entry to `colour`.
    pub fn nearest_index(&self, colour: Colour) -> u8 {
        let mut best_index = 1u8;
        let mut best_distance = u32::MAX;
        for index in 1..PALETTE_ANIM_START {
            let distance = colour_distance(self.colours[usize::from(index)], colour);
            if distance < best_distance {
                best_distance = distance;
                best_index = index;
                if distance == 0 {
                    break;
                }
            }
        }
        best_index
    }
}

impl Default for Palette {
    /// Index 0 black, `1..=216` a 6x6x6 colour cube, `217..227` a grey ramp and the
    /// animated range a blue-to-white water cycle.
    fn default() -> Self {
        let mut colours = [Colour::BLACK; 256];
        let levels = [0u8, 51, 102, 153, 204, 255];
        let mut i = 1usize;
        for r in levels {
            for g in levels {
                for b in levels {
                    colours[i] = Colour::rgb(r, g, b);
                    i += 1;
                }
            }
        }
        for (step, slot) in colours[217..usize::from(PALETTE_ANIM_START)]
            .iter_mut()
            .enumerate()
        {
            let v = (step as u8 + 1) * 23;
            *slot = Colour::rgb(v, v, v);
        }
        let start = usize::from(PALETTE_ANIM_START);
        for step in 0..usize::from(PALETTE_ANIM_SIZE) {
            let t = (step * 255 / usize::from(PALETTE_ANIM_SIZE - 1)) as u8;
            colours[start + step] = Colour::rgb(t / 2, t / 2 + 64, 255);
        }
        colours[255] = Colour::rgb(255, 255, 255);
        Self { colours }
    }
}

/// Weighted Euclidean distance for sRGB ("redmean" approximation).
fn colour_distance(a: Colour, b: Colour) -> u32 {
    let rmean = (i32::from(a.r) + i32::from(b.r)) / 2;
    let dr = i32::from(a.r) - i32::from(b.r);
    let dg = i32::from(a.g) - i32::from(b.g);
    let db = i32::from(a.b) - i32::from(b.b);
    ((((512 + rmean) * dr * dr) >> 8) + 4 * dg * dg + (((767 - rmean) * db * db) >> 8)) as u32
}

/// Palette index translation table used by the remap blit modes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemapTable([u8; 256]);

impl RemapTable {
    pub fn identity() -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self(table)
    }

    pub fn new(table: [u8; 256]) -> Self {
        Self(table)
    }

    /// Identity table with `from[i]` mapped to `to[i]`.
    pub fn with_mapping(from: &[u8], to: &[u8]) -> BlitResult<Self> {
        if from.len() != to.len() {
            return Err(BlitError::validation(
                "remap source and target ranges must have equal length",
            ));
        }
        let mut table = Self::identity();
        for (&f, &t) in from.iter().zip(to) {
            table.0[usize::from(f)] = t;
        }
        Ok(table)
    }

    #[inline]
    pub fn get(&self, index: u8) -> u8 {
        self.0[usize::from(index)]
    }

    pub fn set(&mut self, index: u8, value: u8) {
        self.0[usize::from(index)] = value;
    }
}

impl Default for RemapTable {
    fn default() -> Self {
        Self::identity()
    }
}
