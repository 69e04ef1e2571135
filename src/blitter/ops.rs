use crate::{
    blitter::{Blitter, PixelColour, line::draw_line_generic},
    colour::{self, Colour, make_grey, make_transparent},
    foundation::{
        core::Rect,
        error::{BlitError, BlitResult},
    },
    palette::RemapTable,
    screen::{Plane, Screen, realize_blended},
};

/// Palette effect applied to an on-screen rectangle.
#[derive(Clone, Copy, Debug)]
pub enum ColourMapping<'a> {
    /// Darken to 154/256.
    Transparent,
    /// Grey out literal colours, translate animated indices.
    Newspaper(&'a RemapTable),
    /// Translate animated indices only.
    Recolour(&'a RemapTable),
}

/// Screen-space region as `(left, top, width, height)` after bounds checking.
fn region(screen: &Screen, rect: Rect, what: &str) -> BlitResult<(usize, usize, usize, usize)> {
    rect.check_within(screen.width(), screen.height(), what)?;
    Ok((
        rect.left as usize,
        rect.top as usize,
        rect.width as usize,
        rect.height as usize,
    ))
}

impl Blitter<'_> {
    pub fn set_pixel(&self, screen: &mut Screen, x: i32, y: i32, colour: PixelColour) -> BlitResult<()> {
        let (x, y, _, _) = region(screen, Rect::new(x, y, 1, 1), "pixel")?;
        let palette = self.palette;
        match self.target(screen) {
            (video, Some(anim)) => {
                video.set(x, y, Colour::BLACK);
                anim.set(x, y, colour.0);
            }
            (video, None) => video.set(x, y, palette.lookup(colour.0)),
        }
        Ok(())
    }

    /// Fills `rect` with a palette index. On the animated path the RGB plane gets
    /// black, whose default brightness presents the palette colour unchanged.
    pub fn draw_rect(&self, screen: &mut Screen, rect: Rect, colour: PixelColour) -> BlitResult<()> {
        let (left, top, w, h) = region(screen, rect, "rect")?;
        let fill = self.palette.lookup(colour.0);
        let (video, anim) = self.target(screen);
        for y in top..top + h {
            match &anim {
                Some(_) => video.span_mut(left, y, w).fill(Colour::BLACK),
                None => video.span_mut(left, y, w).fill(fill),
            }
        }
        if let Some(anim) = anim {
            for y in top..top + h {
                anim.span_mut(left, y, w).fill(colour.0);
            }
        }
        Ok(())
    }

    /// Draws a line between two points given relative to `clip`'s top-left corner.
    /// Pixels outside `clip` are dropped.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_line(
        &self,
        screen: &mut Screen,
        clip: Rect,
        from: (i32, i32),
        to: (i32, i32),
        colour: PixelColour,
        width: i32,
        dash: i32,
    ) -> BlitResult<()> {
        let (left, top, _, _) = region(screen, clip, "line clip")?;
        if width < 1 || dash < 0 {
            return Err(BlitError::validation(format!(
                "line width {width} and dash {dash} must be positive"
            )));
        }
        let fill = self.palette.lookup(colour.0);
        let (video, mut anim) = self.target(screen);

        draw_line_generic(
            from.0,
            from.1,
            to.0,
            to.1,
            clip.width,
            clip.height,
            width,
            dash,
            |x, y| {
                let (x, y) = (left + x as usize, top + y as usize);
                match anim.as_deref_mut() {
                    Some(anim) => {
                        video.set(x, y, Colour::BLACK);
                        anim.set(x, y, colour.0);
                    }
                    None => video.set(x, y, fill),
                }
            },
        );
        Ok(())
    }

    pub fn draw_colour_mapping_rect(
        &self,
        screen: &mut Screen,
        rect: Rect,
        mapping: ColourMapping<'_>,
    ) -> BlitResult<()> {
        let (left, top, w, h) = region(screen, rect, "rect")?;
        let (video, anim) = self.target(screen);

        let Some(anim) = anim else {
            match mapping {
                ColourMapping::Transparent => {
                    for y in top..top + h {
                        for d in video.span_mut(left, y, w) {
                            *d = make_transparent(*d, 154, 256);
                        }
                    }
                }
                ColourMapping::Newspaper(_) => {
                    for y in top..top + h {
                        for d in video.span_mut(left, y, w) {
                            *d = make_grey(*d);
                        }
                    }
                }
                ColourMapping::Recolour(_) => {
                    tracing::debug!(?rect, "recolour mapping needs an animation plane; skipped");
                }
            }
            return Ok(());
        };

        for y in top..top + h {
            let dst = video.span_mut(left, y, w);
            let idx = anim.span_mut(left, y, w);
            match mapping {
                ColourMapping::Transparent => {
                    for (d, &a) in dst.iter_mut().zip(idx.iter()) {
                        // Only the brightness of an animated pixel is presented.
                        let b = if a != 0 {
                            Colour::rgb(colour::brightness(*d), 0, 0)
                        } else {
                            *d
                        };
                        *d = make_transparent(b, 154, 256);
                    }
                }
                ColourMapping::Newspaper(remap) => {
                    for (d, a) in dst.iter_mut().zip(idx.iter_mut()) {
                        if *a == 0 {
                            *d = make_grey(*d);
                        } else {
                            *a = remap.get(*a);
                        }
                    }
                }
                ColourMapping::Recolour(remap) => {
                    for a in idx.iter_mut().filter(|a| **a != 0) {
                        *a = remap.get(*a);
                    }
                }
            }
        }
        Ok(())
    }

    /// Saves `rect` into `dst`: per row, `width` little-endian colours followed by
    /// `width` animation indices. See [`Blitter::buffer_size`].
    pub fn copy_to_buffer(&self, screen: &Screen, rect: Rect, dst: &mut [u8]) -> BlitResult<()> {
        let (left, top, w, h) = region(screen, rect, "copy source")?;
        check_buffer_len(dst.len(), w, h)?;
        let Some(anim) = self.anim_plane(screen) else {
            tracing::debug!(?rect, "copy_to_buffer without animation plane; skipped");
            return Ok(());
        };

        if w == 0 {
            return Ok(());
        }
        for (row, chunk) in dst.chunks_exact_mut(w * 5).take(h).enumerate() {
            let (rgb, idx) = chunk.split_at_mut(w * 4);
            let y = top + row;
            for (out, c) in rgb.chunks_exact_mut(4).zip(screen.video().span(left, y, w)) {
                out.copy_from_slice(&c.to_le_bytes());
            }
            idx.copy_from_slice(anim.span(left, y, w));
        }
        Ok(())
    }

    /// Restores a region saved by [`Blitter::copy_to_buffer`].
    pub fn copy_from_buffer(&self, screen: &mut Screen, rect: Rect, src: &[u8]) -> BlitResult<()> {
        let (left, top, w, h) = region(screen, rect, "copy destination")?;
        check_buffer_len(src.len(), w, h)?;
        let (video, Some(anim)) = self.target(screen) else {
            tracing::debug!(?rect, "copy_from_buffer without animation plane; skipped");
            return Ok(());
        };

        if w == 0 {
            return Ok(());
        }
        for (row, chunk) in src.chunks_exact(w * 5).take(h).enumerate() {
            let (rgb, idx) = chunk.split_at(w * 4);
            let y = top + row;
            for (d, c) in video.span_mut(left, y, w).iter_mut().zip(rgb.chunks_exact(4)) {
                *d = Colour::from_le_bytes([c[0], c[1], c[2], c[3]]);
            }
            anim.span_mut(left, y, w).copy_from_slice(idx);
        }
        Ok(())
    }

    /// Writes the presented colours of `rect` into `dst`, `dst_pitch` colours per row.
    pub fn copy_image_to_buffer(
        &self,
        screen: &Screen,
        rect: Rect,
        dst: &mut [Colour],
        dst_pitch: usize,
    ) -> BlitResult<()> {
        let (left, top, w, h) = region(screen, rect, "image source")?;
        if h == 0 || w == 0 {
            return Ok(());
        }
        if dst_pitch < w {
            return Err(BlitError::validation(format!(
                "destination pitch {dst_pitch} is smaller than width {w}"
            )));
        }
        let need = dst_pitch * (h - 1) + w;
        if dst.len() < need {
            return Err(BlitError::validation(format!(
                "destination holds {} colours, {need} needed",
                dst.len()
            )));
        }

        for row in 0..h {
            let y = top + row;
            let out = &mut dst[row * dst_pitch..row * dst_pitch + w];
            let rgb = screen.video().span(left, y, w);
            match screen.anim_buffer() {
                Some(anim) => {
                    for ((o, &c), &m) in out.iter_mut().zip(rgb).zip(anim.span(left, y, w)) {
                        *o = realize_blended(self.palette, m, c);
                    }
                }
                None => out.copy_from_slice(rgb),
            }
        }
        Ok(())
    }

    /// Moves the contents of `rect` by `(dx, dy)` on both planes and returns the
    /// part of `rect` that received moved pixels. The uncovered strip keeps its old
    /// contents for the caller to redraw. A shift as large as the area moves nothing
    /// and returns an empty rectangle.
    pub fn scroll_buffer(&self, screen: &mut Screen, rect: Rect, dx: i32, dy: i32) -> BlitResult<Rect> {
        let (left, top, w, h) = region(screen, rect, "scroll area")?;
        if dx == 0 && dy == 0 {
            return Ok(rect);
        }

        let (sdx, sdy) = (dx.unsigned_abs() as usize, dy.unsigned_abs() as usize);
        let (kept_w, kept_h) = (w.saturating_sub(sdx), h.saturating_sub(sdy));
        let moved = Rect::new(
            if dx >= 0 { rect.left + (w - kept_w) as i32 } else { rect.left },
            if dy > 0 { rect.top + (h - kept_h) as i32 } else { rect.top },
            kept_w as i32,
            kept_h as i32,
        );
        if kept_w == 0 || kept_h == 0 {
            tracing::debug!(?rect, dx, dy, "scroll moves the whole area out; nothing kept");
            return Ok(moved);
        }

        let (src_x, dst_x) = if dx >= 0 { (left, left + sdx) } else { (left + sdx, left) };
        let (src_y, dst_y) = if dy > 0 { (top, top + sdy) } else { (top + sdy, top) };
        let mv = RowMove {
            src_x,
            src_y,
            dst_x,
            dst_y,
            width: kept_w,
            height: kept_h,
            bottom_up: dy > 0,
        };

        let (video, anim) = self.target(screen);
        mv.apply(video);
        if let Some(anim) = anim {
            mv.apply(anim);
        }
        tracing::trace!(?rect, dx, dy, ?moved, "scrolled");
        Ok(moved)
    }
}

fn check_buffer_len(len: usize, w: usize, h: usize) -> BlitResult<()> {
    let need = Blitter::buffer_size(w, h);
    if len < need {
        return Err(BlitError::validation(format!(
            "buffer holds {len} bytes, {need} needed for {w}x{h}"
        )));
    }
    Ok(())
}

/// One rectangular move inside a plane. Rows are copied one at a time with
/// `copy_within`, in the order that never overwrites unread source rows.
struct RowMove {
    src_x: usize,
    src_y: usize,
    dst_x: usize,
    dst_y: usize,
    width: usize,
    height: usize,
    bottom_up: bool,
}

impl RowMove {
    fn apply<T: Copy>(&self, plane: &mut Plane<T>) {
        if self.width == 0 {
            return;
        }
        let step = |plane: &mut Plane<T>, row: usize| {
            let from = plane.offset(self.src_x, self.src_y + row);
            let to = plane.offset(self.dst_x, self.dst_y + row);
            plane
                .as_mut_slice()
                .copy_within(from..from + self.width, to);
        };
        if self.bottom_up {
            for row in (0..self.height).rev() {
                step(plane, row);
            }
        } else {
            for row in 0..self.height {
                step(plane, row);
            }
        }
    }
}
