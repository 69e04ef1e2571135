use crate::{
    colour::{self, Colour},
    foundation::{
        core::ZOOM_LEVEL_COUNT,
        error::{BlitError, BlitResult},
    },
    palette::PALETTE_ANIM_START,
    sprite::{
        data::{EncodedSprite, SpriteFlags, ZoomStreams},
        loader::{SourcePixel, SourceSprite, SpriteCollection},
    },
};

/// Longest run a single `u16` count can describe.
const MAX_RUN: u32 = u16::MAX as u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AlphaClass {
    Transparent,
    Partial,
    Opaque,
}

impl AlphaClass {
    fn of(a: u8) -> Self {
        match a {
            0 => Self::Transparent,
            255 => Self::Opaque,
            _ => Self::Partial,
        }
    }
}

/// Converts decoded sprites into the two-stream RLE form the blitter draws from.
#[derive(Clone, Copy, Debug)]
pub struct SpriteEncoder {
    max_bytes: u64,
}

impl Default for SpriteEncoder {
    fn default() -> Self {
        Self {
            max_bytes: u64::from(u32::MAX),
        }
    }
}

impl SpriteEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the worst-case encoded size; stream offsets are `u32`, so the cap never
    /// exceeds `u32::MAX`.
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            max_bytes: max_bytes.min(u64::from(u32::MAX)),
        }
    }

    #[tracing::instrument(skip(self, sprites))]
    pub fn encode(&self, sprites: &SpriteCollection) -> BlitResult<EncodedSprite> {
        let (zoom_min, _) = sprites.zoom_range()?;
        let mut worst_case = 0u64;
        for (_, sprite) in sprites.iter() {
            sprite.validate()?;
            worst_case = worst_case.saturating_add(worst_case_bytes(sprite));
        }
        if worst_case > self.max_bytes {
            return Err(BlitError::too_large(worst_case, self.max_bytes));
        }

        let mut flags = SpriteFlags::NO_REMAP | SpriteFlags::NO_ANIM;
        let mut levels = [None; ZOOM_LEVEL_COUNT];
        let mut data = Vec::with_capacity(worst_case as usize);

        for (zoom, sprite) in sprites.iter() {
            let (px, n) = encode_level(sprite, &mut flags);
            let px_offset = data.len() as u32;
            data.extend_from_slice(&px);
            let n_offset = data.len() as u32;
            data.extend_from_slice(&n);
            levels[zoom.index()] = Some(ZoomStreams {
                width: sprite.width,
                height: sprite.height,
                px_offset,
                px_len: px.len() as u32,
                n_offset,
                n_len: n.len() as u32,
            });
        }

        let base = sprites
            .get(zoom_min)
            .ok_or_else(|| BlitError::validation("sprite collection lost its base level"))?;
        tracing::debug!(
            bytes = data.len(),
            width = base.width,
            height = base.height,
            flags = flags.bits(),
            "encoded sprite"
        );

        Ok(EncodedSprite {
            width: base.width,
            height: base.height,
            x_offs: base.x_offs,
            y_offs: base.y_offs,
            flags,
            levels,
            data,
        })
    }
}

/// Every pixel its own run: a colour record plus count and index records, with
/// per-line headers and padding.
fn worst_case_bytes(sprite: &SourceSprite) -> u64 {
    let w = u64::from(sprite.width);
    let h = u64::from(sprite.height);
    let px_line = 4 + 4 * w;
    let n_line = 4 + 4 * w + 2;
    h * (px_line + n_line)
}

fn encode_level(sprite: &SourceSprite, flags: &mut SpriteFlags) -> (Vec<u8>, Vec<u8>) {
    let mut px = Vec::with_capacity(sprite.pixels.len() * 4 + sprite.height as usize * 4);
    let mut n = Vec::with_capacity(sprite.pixels.len() * 4 + sprite.height as usize * 8);
    for row in sprite.rows() {
        encode_line(row, &mut px, &mut n, flags);
    }
    (px, n)
}

fn encode_line(row: &[SourcePixel], px: &mut Vec<u8>, n: &mut Vec<u8>, flags: &mut SpriteFlags) {
    let px_start = px.len();
    let n_start = n.len();
    px.extend_from_slice(&[0; 4]);
    n.extend_from_slice(&[0; 4]);

    let mut len_slot = n.len();
    push_u16(n, 0);

    let mut last: Option<AlphaClass> = None;
    let mut len = 0u32;

    for p in row {
        let class = AlphaClass::of(p.a);
        if last != Some(class) || len == MAX_RUN {
            if last.is_some() {
                write_u16(n, len_slot, len as u16);
                len_slot = n.len();
                push_u16(n, 0);
            }
            len = 0;
        }
        last = Some(class);
        len += 1;

        match class {
            AlphaClass::Transparent => {
                // One placeholder record pair per skipped run.
                if len == 1 {
                    px.extend_from_slice(&Colour::rgba(0, 0, 0, 0).to_le_bytes());
                    push_u16(n, u16::from(p.m));
                }
            }
            AlphaClass::Partial | AlphaClass::Opaque => {
                if class == AlphaClass::Partial {
                    flags.insert(SpriteFlags::TRANSLUCENT);
                }
                let literal = Colour::rgba(p.r, p.g, p.b, p.a);
                let mut record = u16::from(p.m);
                if p.m != 0 {
                    flags.remove(SpriteFlags::NO_REMAP);
                    if p.m >= PALETTE_ANIM_START {
                        flags.remove(SpriteFlags::NO_ANIM);
                    }
                    record |= u16::from(colour::brightness(literal)) << 8;
                }
                px.extend_from_slice(&literal.to_le_bytes());
                push_u16(n, record);
            }
        }
    }

    if last.is_some() {
        write_u16(n, len_slot, len as u16);
    }

    pad_to_4(px);
    pad_to_4(n);
    let px_len = (px.len() - px_start) as u32;
    let n_len = (n.len() - n_start) as u32;
    px[px_start..px_start + 4].copy_from_slice(&px_len.to_le_bytes());
    n[n_start..n_start + 4].copy_from_slice(&n_len.to_le_bytes());
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_u16(out: &mut [u8], at: usize, v: u16) {
    out[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn pad_to_4(out: &mut Vec<u8>) {
    while !out.len().is_multiple_of(4) {
        out.push(0);
    }
}
