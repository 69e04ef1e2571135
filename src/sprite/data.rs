//! Encoded sprite representation and the blob format it is cached in.
//!
//! Each zoom level holds two streams, both framed per scanline by a `u32` LE byte
//! count that includes the count itself and the padding to a 4-byte boundary:
//!
//! - colour stream: 4-byte [`Colour`] records, one per drawable pixel plus one
//!   alpha-0 placeholder per transparent run;
//! - index stream: `u16` LE records. Every run starts with its pixel count,
//!   followed by one record per pixel for drawable runs (low byte remap index,
//!   high byte brightness) or a single record for transparent runs.

use bitflags::bitflags;

use crate::{
    colour::Colour,
    foundation::{
        core::{ZOOM_LEVEL_COUNT, ZoomLevel},
        error::{BlitError, BlitResult},
    },
};

const BLOB_MAGIC: [u8; 4] = *b"ABSP";
const BLOB_VERSION: u8 = 1;

bitflags! {
    /// Summary of the pixel content, stored in the blob header.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SpriteFlags: u8 {
        /// At least one pixel has partial alpha.
        const TRANSLUCENT = 1 << 0;
        /// No pixel carries a remap index.
        const NO_REMAP = 1 << 1;
        /// No pixel uses an animated palette index.
        const NO_ANIM = 1 << 2;
    }
}

/// Location and size of one zoom level inside [`EncodedSprite`] data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoomStreams {
    pub width: u32,
    pub height: u32,
    pub px_offset: u32,
    pub px_len: u32,
    pub n_offset: u32,
    pub n_len: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedSprite {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) x_offs: i32,
    pub(crate) y_offs: i32,
    pub(crate) flags: SpriteFlags,
    pub(crate) levels: [Option<ZoomStreams>; ZOOM_LEVEL_COUNT],
    pub(crate) data: Vec<u8>,
}

impl EncodedSprite {
    /// Width at the most detailed encoded zoom level.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn x_offs(&self) -> i32 {
        self.x_offs
    }

    pub fn y_offs(&self) -> i32 {
        self.y_offs
    }

    pub fn flags(&self) -> SpriteFlags {
        self.flags
    }

    pub fn level(&self, zoom: ZoomLevel) -> Option<&ZoomStreams> {
        self.levels[zoom.index()].as_ref()
    }

    pub fn zoom_levels(&self) -> impl Iterator<Item = ZoomLevel> + '_ {
        ZoomLevel::ALL
            .into_iter()
            .filter(|z| self.levels[z.index()].is_some())
    }

    /// Raw stream bytes of all levels.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Iterates the scanlines of `zoom`; empty when the level is absent.
    pub fn scanlines(&self, zoom: ZoomLevel) -> Scanlines<'_> {
        match self.level(zoom) {
            Some(level) => {
                let px_start = level.px_offset as usize;
                let n_start = level.n_offset as usize;
                Scanlines {
                    px: self
                        .data
                        .get(px_start..px_start + level.px_len as usize)
                        .unwrap_or(&[]),
                    n: self
                        .data
                        .get(n_start..n_start + level.n_len as usize)
                        .unwrap_or(&[]),
                    remaining: level.height as usize,
                }
            }
            None => Scanlines {
                px: &[],
                n: &[],
                remaining: 0,
            },
        }
    }

    /// Checks framing and run sums of every level.
    pub fn validate(&self) -> BlitResult<()> {
        for zoom in self.zoom_levels() {
            let Some(level) = self.level(zoom) else {
                continue;
            };
            let end_px = u64::from(level.px_offset) + u64::from(level.px_len);
            let end_n = u64::from(level.n_offset) + u64::from(level.n_len);
            if end_px > self.data.len() as u64 || end_n > self.data.len() as u64 {
                return Err(BlitError::decode(format!(
                    "zoom {zoom:?} streams exceed sprite data"
                )));
            }

            let mut lines = 0u32;
            for line in self.scanlines(zoom) {
                let sum = line.checked_width()?;
                if sum != u64::from(level.width) {
                    return Err(BlitError::decode(format!(
                        "zoom {zoom:?} line {lines}: runs cover {sum} pixels, width is {}",
                        level.width
                    )));
                }
                lines += 1;
            }
            if lines != level.height {
                return Err(BlitError::decode(format!(
                    "zoom {zoom:?}: found {lines} scanlines, height is {}",
                    level.height
                )));
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + self.data.len());
        out.extend_from_slice(&BLOB_MAGIC);
        out.push(BLOB_VERSION);
        out.push(self.flags.bits());
        let mask = self
            .levels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_some())
            .fold(0u8, |m, (i, _)| m | (1 << i));
        out.push(mask);
        out.push(0);
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.x_offs.to_le_bytes());
        out.extend_from_slice(&self.y_offs.to_le_bytes());
        for level in self.levels.iter().flatten() {
            for v in [
                level.width,
                level.height,
                level.px_offset,
                level.px_len,
                level.n_offset,
                level.n_len,
            ] {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    #[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
    pub fn from_bytes(bytes: &[u8]) -> BlitResult<Self> {
        let mut r = ByteReader { bytes, pos: 0 };
        if r.take(4)? != BLOB_MAGIC {
            return Err(BlitError::decode("not a sprite blob (bad magic)"));
        }
        let version = r.u8()?;
        if version != BLOB_VERSION {
            return Err(BlitError::decode(format!(
                "unsupported sprite blob version {version}"
            )));
        }
        let bits = r.u8()?;
        let flags = SpriteFlags::from_bits(bits)
            .ok_or_else(|| BlitError::decode(format!("unknown sprite flag bits {bits:#04x}")))?;
        let mask = r.u8()?;
        if mask >> ZOOM_LEVEL_COUNT != 0 {
            return Err(BlitError::decode(format!("bad zoom level mask {mask:#04x}")));
        }
        r.u8()?;

        let width = r.u32()?;
        let height = r.u32()?;
        let x_offs = r.u32()? as i32;
        let y_offs = r.u32()? as i32;

        let mut levels = [None; ZOOM_LEVEL_COUNT];
        for (i, slot) in levels.iter_mut().enumerate() {
            if mask & (1 << i) == 0 {
                continue;
            }
            *slot = Some(ZoomStreams {
                width: r.u32()?,
                height: r.u32()?,
                px_offset: r.u32()?,
                px_len: r.u32()?,
                n_offset: r.u32()?,
                n_len: r.u32()?,
            });
        }

        let data_len = r.u32()? as usize;
        let data = r.take(data_len)?.to_vec();
        if r.pos != bytes.len() {
            return Err(BlitError::decode(format!(
                "{} trailing bytes after sprite data",
                bytes.len() - r.pos
            )));
        }

        let sprite = Self {
            width,
            height,
            x_offs,
            y_offs,
            flags,
            levels,
            data,
        };
        sprite.validate()?;
        tracing::debug!(width, height, levels = mask.count_ones(), "decoded sprite blob");
        Ok(sprite)
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn take(&mut self, n: usize) -> BlitResult<&'a [u8]> {
        let out = self
            .bytes
            .get(self.pos..self.pos.saturating_add(n))
            .ok_or_else(|| BlitError::decode("sprite blob truncated"))?;
        self.pos += n;
        Ok(out)
    }

    fn u8(&mut self) -> BlitResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> BlitResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

#[inline]
fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Iterator over the scanlines of one zoom level, following the byte-count headers
/// of both streams in lockstep.
#[derive(Clone, Debug)]
pub struct Scanlines<'a> {
    px: &'a [u8],
    n: &'a [u8],
    remaining: usize,
}

impl<'a> Iterator for Scanlines<'a> {
    type Item = Scanline<'a>;

    fn next(&mut self) -> Option<Scanline<'a>> {
        if self.remaining == 0 {
            return None;
        }
        let px_len = read_u32(self.px, 0)? as usize;
        let n_len = read_u32(self.n, 0)? as usize;
        if px_len < 4 || n_len < 4 || px_len > self.px.len() || n_len > self.n.len() {
            self.remaining = 0;
            return None;
        }
        let line = Scanline {
            px: &self.px[4..px_len],
            n: &self.n[4..n_len],
        };
        self.px = &self.px[px_len..];
        self.n = &self.n[n_len..];
        self.remaining -= 1;
        Some(line)
    }
}

/// One scanline: colour records and index records, headers stripped.
#[derive(Clone, Copy, Debug)]
pub struct Scanline<'a> {
    px: &'a [u8],
    n: &'a [u8],
}

/// A decoded run, as seen by inspection tools and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    pub len: u16,
    /// Alpha of the run's first pixel; 0 marks a skipped run.
    pub alpha: u8,
    /// Remap index of the run's first pixel.
    pub remap: u8,
}

impl<'a> Scanline<'a> {
    pub(crate) fn cursor(self) -> LineCursor<'a> {
        LineCursor {
            px: self.px,
            n: self.n,
            pi: 0,
            ni: 0,
        }
    }

    /// Decodes the run table, or `None` if the records are malformed.
    pub fn runs(self) -> Option<Vec<Run>> {
        let mut out = Vec::new();
        let (mut pi, mut ni) = (0usize, 0usize);
        let u16_at = |i: usize| -> Option<u16> {
            let b = self.n.get(i * 2..i * 2 + 2)?;
            Some(u16::from_le_bytes([b[0], b[1]]))
        };
        // Trailing padding shows up as one zero-length record at most.
        while (ni + 1) * 2 <= self.n.len() {
            let len = u16_at(ni)?;
            if len == 0 {
                break;
            }
            ni += 1;
            let alpha = *self.px.get(pi * 4 + 3)?;
            let remap = u16_at(ni)? as u8;
            out.push(Run { len, alpha, remap });
            let step = if alpha == 0 { 1 } else { usize::from(len) };
            if (ni + step) * 2 > self.n.len() || (pi + step) * 4 > self.px.len() {
                return None;
            }
            pi += step;
            ni += step;
        }
        Some(out)
    }

    /// Number of pixels the scanline's runs cover.
    pub fn width(self) -> u64 {
        self.checked_width().unwrap_or(0)
    }

    fn checked_width(self) -> BlitResult<u64> {
        self.runs()
            .map(|runs| runs.iter().map(|r| u64::from(r.len)).sum())
            .ok_or_else(|| BlitError::decode("malformed run records"))
    }

    /// Colour records of the scanline.
    pub fn colours(self) -> impl Iterator<Item = Colour> + 'a {
        self.px
            .chunks_exact(4)
            .map(|b| Colour::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Read position inside one scanline's two record streams.
///
/// `pi` counts colour records, `ni` counts index records.
pub(crate) struct LineCursor<'a> {
    px: &'a [u8],
    n: &'a [u8],
    pi: usize,
    ni: usize,
}

impl LineCursor<'_> {
    /// Reads a run-length record.
    #[inline]
    pub(crate) fn take_count(&mut self) -> usize {
        let count = self.index_record();
        self.ni += 1;
        usize::from(count)
    }

    #[inline]
    pub(crate) fn colour(&self) -> Colour {
        let at = self.pi * 4;
        Colour::from_le_bytes([
            self.px[at],
            self.px[at + 1],
            self.px[at + 2],
            self.px[at + 3],
        ])
    }

    #[inline]
    pub(crate) fn alpha(&self) -> u8 {
        self.px[self.pi * 4 + 3]
    }

    /// Full index record: remap index in the low byte, brightness in the high byte.
    #[inline]
    pub(crate) fn index_record(&self) -> u16 {
        let at = self.ni * 2;
        u16::from_le_bytes([self.n[at], self.n[at + 1]])
    }

    #[inline]
    pub(crate) fn remap_index(&self) -> u8 {
        self.n[self.ni * 2]
    }

    #[inline]
    pub(crate) fn advance(&mut self, pixels: usize) {
        self.pi += pixels;
        self.ni += pixels;
    }

    /// Steps over the single colour and index record of a transparent run.
    #[inline]
    pub(crate) fn skip_transparent(&mut self) {
        self.pi += 1;
        self.ni += 1;
    }
}
