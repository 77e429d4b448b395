//! DRCS glyph deduplication, conversion and export.

mod conversion;
mod store;

pub use conversion::{ConversionTable, HASH_LEN};
pub use store::{glyph_hash, GlyphExporter, GlyphRef, GlyphStore, NullExporter, MAX_CYCLE_GLYPHS};
