//! ARIB STD-B24 caption text decoding.
//!
//! A statement body is run through an 8-unit code state machine that
//! tracks graphic set designations, cursor position and character
//! attributes. The result is a list of [`Region`]s, each a run of text
//! sharing one position and style.

mod charset;
mod decoder;

pub use charset::{GraphicSet, CLUT, GETA};
pub use decoder::AribDecoder;

use crate::clock::TICKS_PER_SECOND;
use crate::glyph::GlyphRef;
use crate::region::Region;

/// Output of one decode cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedCaption {
    /// Plain text of all regions, one line per text row.
    pub text: String,
    pub regions: Vec<Region>,
    /// Display time from TIME controls, in tenths of a second.
    pub control_time: u32,
    /// Writing plane size in pixels.
    pub plane: (u32, u32),
}

impl DecodedCaption {
    /// How long the caption stays up, in 90 kHz ticks. Zero means
    /// "until the next caption".
    pub fn display_duration(&self) -> u64 {
        u64::from(self.control_time) * TICKS_PER_SECOND / 10
    }
}

/// Turns a statement body into positioned text.
pub trait CaptionDecoder {
    /// Decode one statement. `glyphs` holds the DRCS characters defined
    /// earlier in the same caption. Decoder state does not carry over
    /// between calls.
    fn decode(&mut self, data: &[u8], glyphs: &[GlyphRef]) -> DecodedCaption;
}
