use crate::{
    blitter::{BlitOp, Blitter, BlitterMode, BlitterParams},
    colour::{self, Colour, compose_pa, compose_rgba, make_dark, make_transparent},
    foundation::{
        core::ZoomLevel,
        error::{BlitError, BlitResult},
    },
    screen::{Screen, realize_blended},
    sprite::data::LineCursor,
};

impl Blitter<'_> {
    /// Draws the clipped part of a sprite. Pixels outside the sprite's drawable runs
    /// are left untouched.
    pub fn draw(
        &self,
        screen: &mut Screen,
        bp: &BlitterParams<'_>,
        mode: BlitterMode,
        zoom: ZoomLevel,
    ) -> BlitResult<()> {
        let op = BlitOp::resolve(mode, bp.remap)?;
        check_params(screen, bp, zoom)?;
        if bp.width == 0 || bp.height == 0 {
            return Ok(());
        }

        let (video, anim) = self.target(screen);
        tracing::trace!(
            ?mode,
            ?zoom,
            left = bp.left,
            top = bp.top,
            width = bp.width,
            height = bp.height,
            animated = anim.is_some(),
            "draw sprite"
        );

        match anim {
            Some(anim) => for_each_visible_run(bp, zoom, |x, y, n, cur| {
                self.run_animated(op, video.span_mut(x, y, n), anim.span_mut(x, y, n), cur);
            }),
            None => for_each_visible_run(bp, zoom, |x, y, n, cur| {
                self.run_rgb(op, video.span_mut(x, y, n), cur);
            }),
        }
        Ok(())
    }

    fn run_animated(
        &self,
        op: BlitOp<'_>,
        dst: &mut [Colour],
        anim: &mut [u8],
        cur: &mut LineCursor<'_>,
    ) {
        let opaque = cur.alpha() == 255;
        let palette = self.palette;

        match op {
            BlitOp::Normal if opaque => {
                for (d, a) in dst.iter_mut().zip(anim.iter_mut()) {
                    *a = cur.remap_index();
                    *d = cur.colour();
                    cur.advance(1);
                }
            }
            BlitOp::Normal => {
                for (d, a) in dst.iter_mut().zip(anim.iter_mut()) {
                    let m = cur.remap_index();
                    let src = cur.colour();
                    let b = realize_blended(palette, *a, *d);
                    *d = if m == 0 {
                        compose_rgba(src.r, src.g, src.b, src.a, b)
                    } else {
                        compose_pa(palette.lookup(m), src.a, b)
                    };
                    // Animated colours cannot be alpha-blended.
                    *a = 0;
                    cur.advance(1);
                }
            }
            BlitOp::ColourRemap { remap, crash } if opaque => {
                for (d, a) in dst.iter_mut().zip(anim.iter_mut()) {
                    let m = cur.remap_index();
                    if m == 0 {
                        let src = cur.colour();
                        *d = if crash { make_dark(src) } else { src };
                        *a = 0;
                    } else {
                        let r = remap.get(m);
                        if r != 0 {
                            *d = cur.colour();
                            *a = r;
                        }
                    }
                    cur.advance(1);
                }
            }
            BlitOp::ColourRemap { remap, crash } => {
                for (d, a) in dst.iter_mut().zip(anim.iter_mut()) {
                    let m = cur.remap_index();
                    let src = cur.colour();
                    if m == 0 {
                        let b = realize_blended(palette, *a, *d);
                        let c = if crash { make_dark(src) } else { src };
                        *d = compose_rgba(c.r, c.g, c.b, src.a, b);
                        *a = 0;
                    } else {
                        let r = remap.get(m);
                        if r != 0 {
                            let b = realize_blended(palette, *a, *d);
                            *d = compose_pa(palette.lookup(r), src.a, b);
                            *a = 0;
                        }
                    }
                    cur.advance(1);
                }
            }
            BlitOp::BlackRemap => {
                dst.fill(Colour::BLACK);
                anim.fill(0);
                cur.advance(dst.len());
            }
            BlitOp::Transparent if opaque => {
                for (d, a) in dst.iter_mut().zip(anim.iter_mut()) {
                    // Presentation only reads the brightness of animated pixels, so
                    // darkening that is enough.
                    let b = if *a != 0 {
                        Colour::rgb(colour::brightness(*d), 0, 0)
                    } else {
                        *d
                    };
                    *d = make_transparent(b, 3, 4);
                }
                cur.advance(dst.len());
            }
            BlitOp::Transparent => {
                for (d, a) in dst.iter_mut().zip(anim.iter_mut()) {
                    let alpha = u32::from(cur.alpha());
                    let b = realize_blended(palette, *a, *d);
                    *d = make_transparent(b, 256 * 4 - alpha, 256 * 4);
                    *a = 0;
                    cur.advance(1);
                }
            }
            BlitOp::TransparentRemap(remap) => {
                for (d, a) in dst.iter_mut().zip(anim.iter_mut()) {
                    if *a != 0 {
                        *a = remap.get(*a);
                    } else {
                        *d = palette.lookup(remap.get(palette.nearest_index(*d)));
                    }
                }
                cur.advance(dst.len());
            }
        }
    }

    /// Index records carry the source brightness in their high byte; this turns
    /// them into the colour the animated path would eventually present.
    #[inline]
    fn resolve_index(&self, index: u8, record: u16) -> Colour {
        colour::adjust_brightness(self.palette.lookup(index), (record >> 8) as u8)
    }

    fn run_rgb(&self, op: BlitOp<'_>, dst: &mut [Colour], cur: &mut LineCursor<'_>) {
        let opaque = cur.alpha() == 255;
        let palette = self.palette;

        match op {
            BlitOp::Normal if opaque => {
                for d in dst.iter_mut() {
                    let record = cur.index_record();
                    *d = if record != 0 {
                        self.resolve_index(record as u8, record)
                    } else {
                        cur.colour()
                    };
                    cur.advance(1);
                }
            }
            BlitOp::Normal => {
                for d in dst.iter_mut() {
                    let record = cur.index_record();
                    let src = cur.colour();
                    *d = if record != 0 {
                        compose_pa(self.resolve_index(record as u8, record), src.a, *d)
                    } else {
                        compose_rgba(src.r, src.g, src.b, src.a, *d)
                    };
                    cur.advance(1);
                }
            }
            BlitOp::ColourRemap { remap, crash } => {
                for d in dst.iter_mut() {
                    let record = cur.index_record();
                    let src = cur.colour();
                    let m = record as u8;
                    if m == 0 {
                        let c = if crash { make_dark(src) } else { src };
                        *d = if opaque {
                            c
                        } else {
                            compose_rgba(c.r, c.g, c.b, src.a, *d)
                        };
                    } else {
                        let r = remap.get(m);
                        if r != 0 {
                            let c = self.resolve_index(r, record);
                            *d = if opaque { c } else { compose_pa(c, src.a, *d) };
                        }
                    }
                    cur.advance(1);
                }
            }
            BlitOp::BlackRemap => {
                dst.fill(Colour::BLACK);
                cur.advance(dst.len());
            }
            BlitOp::Transparent if opaque => {
                for d in dst.iter_mut() {
                    *d = make_transparent(*d, 3, 4);
                }
                cur.advance(dst.len());
            }
            BlitOp::Transparent => {
                for d in dst.iter_mut() {
                    let alpha = u32::from(cur.alpha());
                    *d = make_transparent(*d, 256 * 4 - alpha, 256 * 4);
                    cur.advance(1);
                }
            }
            BlitOp::TransparentRemap(remap) => {
                for d in dst.iter_mut() {
                    *d = palette.lookup(remap.get(palette.nearest_index(*d)));
                }
                cur.advance(dst.len());
            }
        }
    }
}

fn check_params(screen: &Screen, bp: &BlitterParams<'_>, zoom: ZoomLevel) -> BlitResult<()> {
    let level = bp
        .sprite
        .level(zoom)
        .ok_or_else(|| BlitError::validation(format!("sprite has no {zoom:?} level")))?;

    let exceeds = |start: usize, len: usize, limit: usize| {
        start.checked_add(len).is_none_or(|end| end > limit)
    };
    if exceeds(bp.skip_left, bp.width, level.width as usize)
        || exceeds(bp.skip_top, bp.height, level.height as usize)
    {
        return Err(BlitError::validation(format!(
            "clip ({}, {}) {}x{} exceeds {}x{} sprite",
            bp.skip_left, bp.skip_top, bp.width, bp.height, level.width, level.height
        )));
    }
    if exceeds(bp.left, bp.width, screen.width()) || exceeds(bp.top, bp.height, screen.height())
    {
        return Err(BlitError::validation(format!(
            "destination ({}, {}) {}x{} exceeds {}x{} screen",
            bp.left,
            bp.top,
            bp.width,
            bp.height,
            screen.width(),
            screen.height()
        )));
    }
    Ok(())
}

/// Walks the clipped sprite and calls `f(x, y, n, cursor)` for every drawable run
/// segment, with `(x, y)` in screen pixels and `cursor` on the segment's first pixel.
/// `f` must advance the cursor past the `n` pixels it draws.
fn for_each_visible_run(
    bp: &BlitterParams<'_>,
    zoom: ZoomLevel,
    mut f: impl FnMut(usize, usize, usize, &mut LineCursor<'_>),
) {
    let lines = bp
        .sprite
        .scanlines(zoom)
        .skip(bp.skip_top)
        .take(bp.height);

    for (row, line) in lines.enumerate() {
        let y = bp.top + row;
        let mut cur = line.cursor();

        let (mut col, split) = clip_prologue(&mut cur, bp.skip_left, bp.width);
        if let Some(n) = split {
            f(bp.left, y, n, &mut cur);
            col = n;
        }

        while col < bp.width {
            let n = cur.take_count().min(bp.width - col);
            if cur.alpha() == 0 {
                cur.skip_transparent();
            } else {
                f(bp.left + col, y, n, &mut cur);
            }
            col += n;
        }
    }
}

/// Consumes the runs left of the clip edge.
///
/// Returns the visible column the next run starts at (transparent runs may reach
/// past the edge) and, when a drawable run straddles the edge, the length of its
/// visible part; the cursor then points at the first visible pixel of that run.
fn clip_prologue(cur: &mut LineCursor<'_>, skip_left: usize, width: usize) -> (usize, Option<usize>) {
    let mut x = 0;
    while x < skip_left {
        let n = cur.take_count();
        if cur.alpha() == 0 {
            cur.skip_transparent();
            x += n;
        } else if x + n > skip_left {
            let d = skip_left - x;
            cur.advance(d);
            return (0, Some((n - d).min(width)));
        } else {
            cur.advance(n);
            x += n;
        }
    }
    (x - skip_left, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::BlitterSettings,
        palette::Palette,
        sprite::{
            encode::SpriteEncoder,
            loader::{SourcePixel, SourceSprite, SpriteCollection},
        },
    };

    fn encode_row(row: Vec<SourcePixel>) -> crate::sprite::data::EncodedSprite {
        let w = row.len() as u32;
        SpriteEncoder::new()
            .encode(&SpriteCollection::single(
                ZoomLevel::Normal,
                SourceSprite::new(w, 1, row).unwrap(),
            ))
            .unwrap()
    }

    #[test]
    fn prologue_splits_straddling_run() {
        let px = |v| SourcePixel::rgba(v, v, v, 255);
        let sprite = encode_row(vec![px(1), px(2), px(3), px(4), px(5)]);
        let line = sprite.scanlines(ZoomLevel::Normal).next().unwrap();
        let mut cur = line.cursor();

        let (col, split) = clip_prologue(&mut cur, 2, 2);
        assert_eq!((col, split), (0, Some(2)));
        assert_eq!(cur.colour(), Colour::rgb(3, 3, 3));
    }

    #[test]
    fn prologue_transparent_overshoot_shifts_visible_start() {
        let sprite = encode_row(vec![
            SourcePixel::TRANSPARENT,
            SourcePixel::TRANSPARENT,
            SourcePixel::TRANSPARENT,
            SourcePixel::TRANSPARENT,
            SourcePixel::rgba(7, 7, 7, 255),
        ]);
        let line = sprite.scanlines(ZoomLevel::Normal).next().unwrap();
        let mut cur = line.cursor();

        let (col, split) = clip_prologue(&mut cur, 1, 4);
        assert_eq!((col, split), (3, None));
        assert_eq!(cur.take_count(), 1);
        assert_eq!(cur.colour(), Colour::rgb(7, 7, 7));
    }

    #[test]
    fn remap_modes_require_a_table() {
        let sprite = encode_row(vec![SourcePixel::rgba(1, 1, 1, 255)]);
        let palette = Palette::default();
        let settings = BlitterSettings::default();
        let blitter = Blitter::new(&palette, &settings);
        let mut screen = Screen::new(4, 4).unwrap();
        let bp = BlitterParams::whole(&sprite, ZoomLevel::Normal, 0, 0).unwrap();

        for mode in [
            BlitterMode::ColourRemap,
            BlitterMode::CrashRemap,
            BlitterMode::TransparentRemap,
        ] {
            assert!(blitter.draw(&mut screen, &bp, mode, ZoomLevel::Normal).is_err());
        }
        blitter
            .draw(&mut screen, &bp, BlitterMode::Normal, ZoomLevel::Normal)
            .unwrap();
    }

    #[test]
    fn out_of_bounds_params_are_rejected() {
        let sprite = encode_row(vec![SourcePixel::rgba(1, 1, 1, 255); 4]);
        let palette = Palette::default();
        let settings = BlitterSettings::default();
        let blitter = Blitter::new(&palette, &settings);
        let mut screen = Screen::new(4, 4).unwrap();

        let off_screen = BlitterParams::whole(&sprite, ZoomLevel::Normal, 1, 0).unwrap();
        assert!(
            blitter
                .draw(&mut screen, &off_screen, BlitterMode::Normal, ZoomLevel::Normal)
                .is_err()
        );

        let bad_clip = BlitterParams::whole(&sprite, ZoomLevel::Normal, 0, 0)
            .unwrap()
            .with_clip(2, 0, 3, 1);
        assert!(
            blitter
                .draw(&mut screen, &bad_clip, BlitterMode::Normal, ZoomLevel::Normal)
                .is_err()
        );

        let bp = BlitterParams::whole(&sprite, ZoomLevel::Normal, 0, 0).unwrap();
        assert!(
            blitter
                .draw(&mut screen, &bp, BlitterMode::Normal, ZoomLevel::Out2x)
                .is_err()
        );
    }
}
