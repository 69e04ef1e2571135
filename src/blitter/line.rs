//! Thick, dashed line rasteriser shared by every pixel format.

/// Walks the line from `(x1, y1)` to `(x2, y2)` and calls `set_pixel` for every
/// covered pixel inside `0..screen_width` x `0..screen_height`.
///
/// `width` is the line thickness measured perpendicular to the line. `dash` is the
/// length of the drawn and the skipped segments; 0 draws a solid line.
#[allow(clippy::too_many_arguments)]
pub fn draw_line_generic(
    mut x1: i32,
    mut y1: i32,
    mut x2: i32,
    mut y2: i32,
    screen_width: i32,
    screen_height: i32,
    width: i32,
    dash: i32,
    mut set_pixel: impl FnMut(i32, i32),
) {
    let mut dy = (y2 - y1) * 2;
    let mut stepy = 1;
    if dy < 0 {
        dy = -dy;
        stepy = -1;
    }

    let mut dx = (x2 - x1) * 2;
    let mut stepx = 1;
    if dx < 0 {
        dx = -dx;
        stepx = -1;
    }

    if dx == 0 && dy == 0 {
        // Degenerate line: a single pixel, whatever the width.
        if x1 >= 0 && x1 < screen_width && y1 >= 0 && y1 < screen_height {
            set_pixel(x1, y1);
        }
        return;
    }

    let frac_diff = line_frac_diff(width, dx, dy);

    let gap = dash;
    let dash = if dash == 0 { 1 } else { dash };
    let mut dash_count = 0;

    if dx > dy {
        if stepx < 0 {
            std::mem::swap(&mut x1, &mut x2);
            std::mem::swap(&mut y1, &mut y2);
            stepy = -stepy;
        }
        if x2 < 0 || x1 >= screen_width {
            return;
        }

        let mut y_low = y1;
        let mut y_high = y1;
        let mut frac_low = dy - frac_diff / 2;
        let mut frac_high = dy + frac_diff / 2;

        while frac_low < -(dx / 2) {
            frac_low += dx;
            y_low -= stepy;
        }
        while frac_high >= dx / 2 {
            frac_high -= dx;
            y_high += stepy;
        }

        if x1 < 0 {
            dash_count = (-x1) % (dash + gap);
            frac_low = skip_to_edge(frac_low, dy, dx, x1, stepy, &mut y_low);
            frac_high = skip_to_edge(frac_high, dy, dx, x1, stepy, &mut y_high);
            x1 = 0;
        }
        x2 = (x2 + 1).min(screen_width);

        while x1 != x2 {
            if dash_count < dash {
                let mut y = y_low;
                while y != y_high {
                    if y >= 0 && y < screen_height {
                        set_pixel(x1, y);
                    }
                    y += stepy;
                }
            }
            if frac_low >= 0 {
                y_low += stepy;
                frac_low -= dx;
            }
            if frac_high >= 0 {
                y_high += stepy;
                frac_high -= dx;
            }
            x1 += 1;
            frac_low += dy;
            frac_high += dy;
            dash_count += 1;
            if dash_count >= dash + gap {
                dash_count = 0;
            }
        }
    } else {
        if stepy < 0 {
            std::mem::swap(&mut x1, &mut x2);
            std::mem::swap(&mut y1, &mut y2);
            stepx = -stepx;
        }
        if y2 < 0 || y1 >= screen_height {
            return;
        }

        let mut x_low = x1;
        let mut x_high = x1;
        let mut frac_low = dx - frac_diff / 2;
        let mut frac_high = dx + frac_diff / 2;

        while frac_low < -(dy / 2) {
            frac_low += dy;
            x_low -= stepx;
        }
        while frac_high >= dy / 2 {
            frac_high -= dy;
            x_high += stepx;
        }

        if y1 < 0 {
            dash_count = (-y1) % (dash + gap);
            frac_low = skip_to_edge(frac_low, dx, dy, y1, stepx, &mut x_low);
            frac_high = skip_to_edge(frac_high, dx, dy, y1, stepx, &mut x_high);
            y1 = 0;
        }
        y2 = (y2 + 1).min(screen_height);

        while y1 != y2 {
            if dash_count < dash {
                let mut x = x_low;
                while x != x_high {
                    if x >= 0 && x < screen_width {
                        set_pixel(x, y1);
                    }
                    x += stepx;
                }
            }
            if frac_low >= 0 {
                x_low += stepx;
                frac_low -= dy;
            }
            if frac_high >= 0 {
                x_high += stepx;
                frac_high -= dy;
            }
            y1 += 1;
            frac_low += dx;
            frac_high += dx;
            dash_count += 1;
            if dash_count >= dash + gap {
                dash_count = 0;
            }
        }
    }
}

/// `width * sqrt(dx^2 + dy^2)` by bisection, starting from the bound
/// `max(dx, dy) <= len <= 3/2 * max(dx, dy)`.
fn line_frac_diff(width: i32, dx: i32, dy: i32) -> i32 {
    let mut frac_diff = width * dx.max(dy);
    if width > 1 {
        let w = i64::from(width);
        let frac_sq = w * w * (i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy));
        let mut frac_max = 3 * frac_diff / 2;
        while frac_diff < frac_max {
            let frac_test = (frac_diff + frac_max) / 2;
            if i64::from(frac_test) * i64::from(frac_test) < frac_sq {
                frac_diff = frac_test + 1;
            } else {
                frac_max = frac_test - 1;
            }
        }
    }
    frac_diff
}

/// Advances a line edge's error term from major coordinate `start` (negative) to 0.
fn skip_to_edge(frac: i32, minor: i32, major: i32, start: i32, step: i32, bound: &mut i32) -> i32 {
    let frac = i64::from(frac) - i64::from(minor) * i64::from(start);
    if frac >= 0 {
        let major = i64::from(major);
        let quotient = frac / major;
        let remainder = frac % major;
        *bound += (1 + quotient as i32) * step;
        return (remainder - major) as i32;
    }
    frac as i32
}
