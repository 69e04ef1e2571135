//! 32bpp colour value and the integer blend maths shared by every blit path.
//!
//! All arithmetic is fixed-point and deterministic; the constants are visual tuning
//! values and must not be re-derived.

/// Brightness assumed for pixels whose RGB is pure black (8bpp-era sprites).
pub const DEFAULT_BRIGHTNESS: u8 = 128;

/// Packed colour, `data = a << 24 | r << 16 | g << 8 | b`.
///
/// In memory (and in encoded sprite streams) the four bytes are stored
/// little-endian: `b, g, r, a`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Colour {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Colour {
    pub const BLACK: Colour = Colour::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { b, g, r, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    pub const fn from_data(data: u32) -> Self {
        let [b, g, r, a] = data.to_le_bytes();
        Self { b, g, r, a }
    }

    pub const fn data(self) -> u32 {
        u32::from_le_bytes([self.b, self.g, self.r, self.a])
    }

    pub const fn to_le_bytes(self) -> [u8; 4] {
        [self.b, self.g, self.r, self.a]
    }

    pub const fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self {
            b: bytes[0],
            g: bytes[1],
            r: bytes[2],
            a: bytes[3],
        }
    }

    /// Straight (non-premultiplied) RGBA, the order `image` uses.
    pub const fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Brightest channel, or [`DEFAULT_BRIGHTNESS`] for black.
#[inline]
pub fn brightness(colour: Colour) -> u8 {
    let rgb_max = colour.r.max(colour.g).max(colour.b);
    if rgb_max == 0 {
        DEFAULT_BRIGHTNESS
    } else {
        rgb_max
    }
}

/// Scales `colour` so that a brightness of [`DEFAULT_BRIGHTNESS`] is the identity.
#[inline]
pub fn adjust_brightness(colour: Colour, brightness: u8) -> Colour {
    if brightness == DEFAULT_BRIGHTNESS {
        return colour;
    }
    really_adjust_brightness(colour, brightness)
}

fn really_adjust_brightness(colour: Colour, brightness: u8) -> Colour {
    let scale = |c: u8| (u32::from(c) * u32::from(brightness)) >> 7;
    let (r, g, b) = (scale(colour.r), scale(colour.g), scale(colour.b));

    if r <= 255 && g <= 255 && b <= 255 {
        return Colour::rgba(r as u8, g as u8, b as u8, colour.a);
    }

    // Spread the overbright part over the channels that still have headroom.
    let mut ob = 0u32;
    for c in [r, g, b] {
        if c > 255 {
            ob += c - 255;
        }
    }
    ob /= 2;

    let spread = |c: u32| -> u8 {
        if c >= 255 {
            255
        } else {
            (c + ob * (255 - c) / 256).min(255) as u8
        }
    };
    Colour::rgba(spread(r), spread(g), spread(b), colour.a)
}

#[inline]
fn make_dark_value(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 13063 + u32::from(g) * 25647 + u32::from(b) * 4981) / 65536) as u8
}

/// Grey at roughly two thirds of the luma of `colour`; used for crashed vehicles.
#[inline]
pub fn make_dark(colour: Colour) -> Colour {
    let d = make_dark_value(colour.r, colour.g, colour.b);
    Colour::rgb(d, d, d)
}

/// Luma grey, used by the newspaper colour mapping.
#[inline]
pub fn make_grey(colour: Colour) -> Colour {
    let r = u32::from(colour.r);
    let g = u32::from(colour.g);
    let b = u32::from(colour.b);
    let v = ((r * 19595 + g * 38470 + b * 7471) / 65536) as u8;
    Colour::rgb(v, v, v)
}

/// Scales every channel by `nom / denom`. Output is opaque.
#[inline]
pub fn make_transparent(colour: Colour, nom: u32, denom: u32) -> Colour {
    let scale = |c: u8| (u32::from(c) * nom / denom) as u8;
    Colour::rgb(scale(colour.r), scale(colour.g), scale(colour.b))
}

/// Blends `(r, g, b)` with coverage `a` over `current`.
///
/// Divides by 256 rather than 255, so `a = 255` leaves a 1/256 trace of `current`.
#[inline]
pub fn compose_rgba(r: u8, g: u8, b: u8, a: u8, current: Colour) -> Colour {
    let mix = |src: u8, cur: u8| -> u8 {
        let src = i32::from(src);
        let cur = i32::from(cur);
        (((src - cur) * i32::from(a)) / 256 + cur) as u8
    };
    Colour::rgb(mix(r, current.r), mix(g, current.g), mix(b, current.b))
}

#[inline]
pub fn compose_pa(colour: Colour, a: u8, current: Colour) -> Colour {
    compose_rgba(colour.r, colour.g, colour.b, a, current)
}
