//! Content-addressed DRCS glyph store.

use std::collections::HashSet;

use log::{debug, warn};

use super::conversion::ConversionTable;
use crate::caption::DrcsGlyph;
use crate::error::Result;

/// Most glyph references kept for one caption cycle.
pub const MAX_CYCLE_GLYPHS: usize = 10;

/// Writes glyph bitmaps somewhere persistent.
pub trait GlyphExporter {
    /// Store a 1-bit bitmap under `hash`. `rows` holds `height` rows of
    /// MSB-first packed pixels. Returns false if the glyph was already stored.
    fn write_bitmap(&mut self, hash: &str, width: u32, height: u32, rows: &[Vec<u8>])
        -> Result<bool>;
}

/// Exporter that keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullExporter;

impl GlyphExporter for NullExporter {
    fn write_bitmap(&mut self, _hash: &str, _w: u32, _h: u32, _rows: &[Vec<u8>]) -> Result<bool> {
        Ok(false)
    }
}

/// A glyph defined during the current caption cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphRef {
    pub character_code: u16,
    pub hash: String,
    /// Code point from the conversion table, if the glyph is known.
    pub replacement: Option<char>,
}

/// MD5 of the packed pixel data, as 32 lowercase hex digits.
pub fn glyph_hash(bits: &[u8]) -> String {
    format!("{:x}", md5::compute(bits))
}

/// Deduplicates glyphs by hash and exports unknown ones once per run.
pub struct GlyphStore<E> {
    exporter: E,
    conversion: ConversionTable,
    exported: HashSet<String>,
    cycle: Vec<GlyphRef>,
    export_count: u64,
}

impl<E: GlyphExporter> GlyphStore<E> {
    pub fn new(exporter: E, conversion: ConversionTable) -> Self {
        Self {
            exporter,
            conversion,
            exported: HashSet::new(),
            cycle: Vec::with_capacity(MAX_CYCLE_GLYPHS),
            export_count: 0,
        }
    }

    /// Hash a glyph and export it unless it is already known.
    ///
    /// Returns true only when the bitmap was newly written.
    pub fn save(&mut self, width: u8, height: u8, depth: u8, bits: &[u8]) -> bool {
        let glyph = match DrcsGlyph::new(width, height, depth, bits.to_vec()) {
            Ok(glyph) => glyph,
            Err(e) => {
                warn!("[Glyph] rejected: {}", e);
                return false;
            }
        };
        self.save_glyph(&glyph, &glyph_hash(&glyph.bits))
    }

    /// Save `glyph` and remember it for the current cycle under `character_code`.
    pub fn register(&mut self, character_code: u16, glyph: &DrcsGlyph) -> bool {
        let hash = glyph_hash(&glyph.bits);
        let newly_saved = self.save_glyph(glyph, &hash);

        if self.cycle.len() >= MAX_CYCLE_GLYPHS {
            warn!(
                "[Glyph] more than {} glyphs in one caption, dropping 0x{:04X}",
                MAX_CYCLE_GLYPHS, character_code
            );
        } else {
            let replacement = self.conversion.lookup(&hash);
            self.cycle.push(GlyphRef {
                character_code,
                hash,
                replacement,
            });
        }
        newly_saved
    }

    /// Glyphs registered since the last [`end_cycle`](Self::end_cycle).
    pub fn cycle_glyphs(&self) -> &[GlyphRef] {
        &self.cycle
    }

    /// Forget the per-cycle glyph list.
    pub fn end_cycle(&mut self) {
        self.cycle.clear();
    }

    /// Number of bitmaps written during the run.
    pub fn export_count(&self) -> u64 {
        self.export_count
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    fn save_glyph(&mut self, glyph: &DrcsGlyph, hash: &str) -> bool {
        if let Some(code) = self.conversion.lookup(hash) {
            debug!("[Glyph] {} resolves to U+{:04X}", hash, code as u32);
            return false;
        }
        if self.exported.contains(hash) {
            return false;
        }

        let rows = glyph.packed_rows();
        match self.exporter.write_bitmap(
            hash,
            glyph.width as u32,
            glyph.height as u32,
            &rows,
        ) {
            Ok(written) => {
                self.exported.insert(hash.to_string());
                if written {
                    self.export_count += 1;
                    debug!("[Glyph] exported {} ({}x{})", hash, glyph.width, glyph.height);
                }
                written
            }
            Err(e) => {
                warn!("[Glyph] failed to export {}: {}", hash, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[derive(Default)]
    struct Recorder {
        written: Vec<(String, u32, u32, Vec<Vec<u8>>)>,
        fail: bool,
    }

    impl GlyphExporter for Recorder {
        fn write_bitmap(&mut self, hash: &str, w: u32, h: u32, rows: &[Vec<u8>]) -> Result<bool> {
            if self.fail {
                return Err(Error::Glyph("disk full".into()));
            }
            self.written.push((hash.to_string(), w, h, rows.to_vec()));
            Ok(true)
        }
    }

    fn bits(seed: u8) -> Vec<u8> {
        (0..16).map(|i| seed.wrapping_add(i)).collect()
    }

    #[test]
    fn test_hash_is_content_derived() {
        let a = bits(1);
        let mut b = a.clone();
        assert_eq!(glyph_hash(&a), glyph_hash(&b));
        b[7] ^= 0x01;
        assert_ne!(glyph_hash(&a), glyph_hash(&b));
        assert_eq!(glyph_hash(&a).len(), 32);
        assert!(glyph_hash(&a).bytes().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_known_md5() {
        assert_eq!(glyph_hash(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_save_exports_once() {
        let mut store = GlyphStore::new(Recorder::default(), ConversionTable::new());
        assert!(store.save(8, 8, 2, &bits(0)));
        assert!(!store.save(8, 8, 2, &bits(0)));
        assert!(store.save(8, 8, 2, &bits(1)));
        assert_eq!(store.exporter().written.len(), 2);
        assert_eq!(store.export_count(), 2);

        let (hash, w, h, rows) = &store.exporter().written[0];
        assert_eq!(hash, &glyph_hash(&bits(0)));
        assert_eq!((*w, *h), (8, 8));
        assert_eq!(rows.len(), 8);
    }

    #[test]
    fn test_converted_glyph_is_not_exported() {
        let mut table = ConversionTable::new();
        table.insert(&glyph_hash(&bits(0)), '\u{2661}');
        let mut store = GlyphStore::new(Recorder::default(), table);

        let glyph = DrcsGlyph::new(8, 8, 2, bits(0)).unwrap();
        assert!(!store.register(0x4121, &glyph));
        assert!(store.exporter().written.is_empty());
        assert_eq!(store.cycle_glyphs()[0].replacement, Some('\u{2661}'));
    }

    #[test]
    fn test_degenerate_glyph_is_rejected() {
        let mut store = GlyphStore::new(Recorder::default(), ConversionTable::new());
        assert!(!store.save(0, 8, 2, &[]));
        assert!(store.exporter().written.is_empty());
    }

    #[test]
    fn test_cycle_is_bounded_and_reset() {
        let mut store = GlyphStore::new(Recorder::default(), ConversionTable::new());
        for i in 0..(MAX_CYCLE_GLYPHS as u8 + 3) {
            let glyph = DrcsGlyph::new(8, 8, 2, bits(i)).unwrap();
            store.register(0x4121 + i as u16, &glyph);
        }
        assert_eq!(store.cycle_glyphs().len(), MAX_CYCLE_GLYPHS);
        assert_eq!(store.cycle_glyphs()[0].character_code, 0x4121);

        store.end_cycle();
        assert!(store.cycle_glyphs().is_empty());
        // Exported set survives the cycle.
        let glyph = DrcsGlyph::new(8, 8, 2, bits(0)).unwrap();
        assert!(!store.register(0x4121, &glyph));
    }

    #[test]
    fn test_export_failure_is_retried_later() {
        let mut store = GlyphStore::new(
            Recorder {
                fail: true,
                ..Default::default()
            },
            ConversionTable::new(),
        );
        assert!(!store.save(8, 8, 2, &bits(0)));
        store.exporter.fail = false;
        assert!(store.save(8, 8, 2, &bits(0)));
    }
}
