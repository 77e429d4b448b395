//! DRCS (downloadable character) definitions carried in data units.

use log::warn;

use super::bits::BitReader;
use crate::error::{Error, Result};

/// Pattern encoding selected by the 4-bit mode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrcsMode {
    /// Two gradations, uncompressed bitmap.
    TwoTone,
    /// Multiple gradations, uncompressed bitmap.
    MultiTone,
    /// Geometric (vector) description; the raw mode value is kept.
    Geometric(u8),
}

impl DrcsMode {
    pub fn from_bits(mode: u8) -> Self {
        match mode & 0x0F {
            0x0 => DrcsMode::TwoTone,
            0x1 => DrcsMode::MultiTone,
            other => DrcsMode::Geometric(other),
        }
    }
}

/// A bitmap glyph. Its identity is the hash of `bits`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrcsGlyph {
    pub width: u8,
    pub height: u8,
    /// Depth field as transmitted: number of gradations minus two.
    pub depth: u8,
    /// Packed pixels, MSB first, `bits_per_pixel` bits each.
    pub bits: Vec<u8>,
}

impl DrcsGlyph {
    /// Build a glyph, rejecting empty boxes and short pixel data.
    pub fn new(width: u8, height: u8, depth: u8, bits: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Glyph(format!(
                "degenerate {}x{} glyph",
                width, height
            )));
        }
        let needed = pattern_len(width, height, depth);
        if bits.len() < needed {
            return Err(Error::truncated(needed, bits.len()));
        }
        Ok(Self {
            width,
            height,
            depth,
            bits,
        })
    }

    pub fn bits_per_pixel(&self) -> u32 {
        bits_per_pixel(self.depth)
    }

    /// Pixel values row by row, one byte per pixel.
    pub fn pixels(&self) -> Vec<Vec<u8>> {
        let bpp = self.bits_per_pixel();
        let mut reader = BitReader::new(&self.bits);
        (0..self.height)
            .map(|_| {
                (0..self.width)
                    .map(|_| reader.read_bits(bpp).unwrap_or(0) as u8)
                    .collect()
            })
            .collect()
    }

    /// Rows packed at one bit per pixel (MSB first); any non-zero
    /// gradation becomes a set bit.
    pub fn packed_rows(&self) -> Vec<Vec<u8>> {
        self.pixels()
            .into_iter()
            .map(|row| {
                let mut packed = vec![0u8; (row.len() + 7) / 8];
                for (x, value) in row.iter().enumerate() {
                    if *value != 0 {
                        packed[x / 8] |= 0x80 >> (x % 8);
                    }
                }
                packed
            })
            .collect()
    }
}

/// Smallest `b` with `b * b >= depth + 2`.
pub fn bits_per_pixel(depth: u8) -> u32 {
    let gradations = depth as u32 + 2;
    (1..).find(|b| b * b >= gradations).unwrap_or(1)
}

/// Byte length of a bitmap pattern.
pub fn pattern_len(width: u8, height: u8, depth: u8) -> usize {
    width as usize * height as usize * bits_per_pixel(depth) as usize / 8
}

/// Geometric data, kept as transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometricPattern {
    pub region_x: u8,
    pub region_y: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrcsPattern {
    Bitmap(DrcsGlyph),
    Geometric(GeometricPattern),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrcsFont {
    pub font_id: u8,
    pub mode: DrcsMode,
    pub pattern: DrcsPattern,
}

/// One character code and its font variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrcsCode {
    pub character_code: u16,
    pub fonts: Vec<DrcsFont>,
}

/// Parse the body of a DRCS data unit.
///
/// Degenerate bitmaps are logged and left out; truncated data is an error.
pub fn parse_drcs_unit(body: &[u8]) -> Result<Vec<DrcsCode>> {
    let mut r = BitReader::new(body);
    let number_of_code = r.read_u8()?;
    let mut codes = Vec::with_capacity(number_of_code as usize);

    for _ in 0..number_of_code {
        let character_code = r.read_u16()?;
        let number_of_font = r.read_u8()?;
        let mut fonts = Vec::with_capacity(number_of_font as usize);

        for _ in 0..number_of_font {
            let font_id = r.read_bits(4)? as u8;
            let mode = DrcsMode::from_bits(r.read_bits(4)? as u8);

            let pattern = match mode {
                DrcsMode::TwoTone | DrcsMode::MultiTone => {
                    let depth = r.read_u8()?;
                    let width = r.read_u8()?;
                    let height = r.read_u8()?;
                    let bits = r.read_bytes(pattern_len(width, height, depth))?;
                    match DrcsGlyph::new(width, height, depth, bits.to_vec()) {
                        Ok(glyph) => DrcsPattern::Bitmap(glyph),
                        Err(e) => {
                            warn!(
                                "[Caption] DRCS 0x{:04X} font {}: {}",
                                character_code, font_id, e
                            );
                            continue;
                        }
                    }
                }
                DrcsMode::Geometric(_) => {
                    let region_x = r.read_u8()?;
                    let region_y = r.read_u8()?;
                    let length = r.read_u16()? as usize;
                    DrcsPattern::Geometric(GeometricPattern {
                        region_x,
                        region_y,
                        data: r.read_bytes(length)?.to_vec(),
                    })
                }
            };
            fonts.push(DrcsFont {
                font_id,
                mode,
                pattern,
            });
        }

        codes.push(DrcsCode {
            character_code,
            fonts,
        });
    }

    Ok(codes)
}
