//! Rendered icon artifacts and the tint operations applied to them.

use crate::color::Color;

/// Straight-alpha RGBA8 bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    pub pixels: Vec<u8>,
}

impl IconImage {
    /// Create an image; returns `None` if the buffer length does not match.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// An image where every pixel has the same color.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let pixels = [color.r, color.g, color.b, color.a]
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        Some(Color::rgba(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ))
    }

    /// Apply `color` to every pixel using the given compositing mode.
    pub fn tint(&mut self, color: Color, mode: TintMode) {
        for px in self.pixels.chunks_exact_mut(4) {
            match mode {
                TintMode::SrcIn => {
                    px[0] = color.r;
                    px[1] = color.g;
                    px[2] = color.b;
                    px[3] = mul_u8(px[3], color.a);
                }
                TintMode::SrcAtop => {
                    let inv = 255 - color.a;
                    px[0] = mul_u8(color.r, color.a) + mul_u8(px[0], inv);
                    px[1] = mul_u8(color.g, color.a) + mul_u8(px[1], inv);
                    px[2] = mul_u8(color.b, color.a) + mul_u8(px[2], inv);
                }
            }
        }
    }
}

/// `a * b / 255`, rounded.
fn mul_u8(a: u8, b: u8) -> u8 {
    let v = a as u32 * b as u32 + 128;
    ((v + (v >> 8)) >> 8) as u8
}

/// How a tint color is composited onto an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TintMode {
    /// Replace color, keep the icon's alpha (scaled by the tint alpha).
    SrcIn,
    /// Blend color over the icon, keep the icon's alpha.
    SrcAtop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tint {
    pub color: Color,
    pub mode: TintMode,
}

/// Which icon family an asset comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconSet {
    /// Assets shipped by the host.
    Native,
    /// Replacement assets shipped with tintbar.
    Alternate,
}

/// A rendered icon ready for display, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Cache identity the artifact was produced for.
    pub key: String,
    pub set: IconSet,
    /// Asset id within `set`.
    pub asset: String,
    /// Tint applied, `None` for untouched native assets.
    pub tint: Option<Tint>,
    pub image: IconImage,
}

impl Artifact {
    /// Wrap an untouched asset.
    pub fn plain(
        key: impl Into<String>,
        set: IconSet,
        asset: impl Into<String>,
        image: IconImage,
    ) -> Self {
        Self {
            key: key.into(),
            set,
            asset: asset.into(),
            tint: None,
            image,
        }
    }

    /// Consume the artifact and return it with `tint` applied.
    pub fn tinted(mut self, tint: Tint) -> Self {
        self.image.tint(tint.color, tint.mode);
        self.tint = Some(tint);
        self
    }
}
