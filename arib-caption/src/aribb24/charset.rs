//! Graphic sets of the ARIB 8-unit code and their Unicode mapping.

use encoding_rs::EUC_JP;

/// Substitute for characters with no Unicode mapping (geta mark).
pub const GETA: char = '\u{3013}';

/// A graphic set that can be designated to G0..G3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicSet {
    Kanji,
    Alphanumeric,
    Hiragana,
    Katakana,
    Mosaic,
    JisX0201Katakana,
    AdditionalSymbols,
    /// DRCS-0 (two bytes) or DRCS-1..15 (one byte).
    Drcs(u8),
    Macro,
}

impl GraphicSet {
    /// Map the final byte of a 1-byte G set designation.
    pub fn from_single_byte_final(f: u8) -> Option<Self> {
        Some(match f {
            0x4A | 0x36 => GraphicSet::Alphanumeric,
            0x30 | 0x37 => GraphicSet::Hiragana,
            0x31 | 0x38 => GraphicSet::Katakana,
            0x32..=0x35 => GraphicSet::Mosaic,
            0x49 => GraphicSet::JisX0201Katakana,
            _ => return None,
        })
    }

    /// Map the final byte of a 2-byte G set designation.
    pub fn from_double_byte_final(f: u8) -> Option<Self> {
        Some(match f {
            0x42 | 0x39 | 0x3A => GraphicSet::Kanji,
            0x3B => GraphicSet::AdditionalSymbols,
            _ => return None,
        })
    }

    /// Map the final byte of a DRCS designation.
    pub fn from_drcs_final(f: u8) -> Option<Self> {
        Some(match f {
            0x40..=0x4F => GraphicSet::Drcs(f - 0x40),
            0x70 => GraphicSet::Macro,
            _ => return None,
        })
    }
}

/// Characters 0x79..=0x7E shared by the hiragana and katakana sets.
const KANA_TAIL: [char; 6] = [
    '\u{30FC}', '\u{3002}', '\u{300C}', '\u{300D}', '\u{3001}', '\u{30FB}',
];

/// Decode a character of the hiragana set (0x21..=0x7E).
pub fn hiragana(c: u8) -> char {
    match c {
        0x21..=0x73 => char::from_u32(0x3041 + (c - 0x21) as u32).unwrap_or(GETA),
        0x74..=0x76 => '\u{3000}',
        0x77 => '\u{309D}',
        0x78 => '\u{309E}',
        0x79..=0x7E => KANA_TAIL[(c - 0x79) as usize],
        _ => GETA,
    }
}

/// Decode a character of the katakana set (0x21..=0x7E).
pub fn katakana(c: u8) -> char {
    match c {
        0x21..=0x76 => char::from_u32(0x30A1 + (c - 0x21) as u32).unwrap_or(GETA),
        0x77 => '\u{30FD}',
        0x78 => '\u{30FE}',
        0x79..=0x7E => KANA_TAIL[(c - 0x79) as usize],
        _ => GETA,
    }
}

/// Decode a character of the JIS X 0201 katakana set.
pub fn jis_x0201_katakana(c: u8) -> char {
    match c {
        0x21..=0x5F => char::from_u32(0xFF61 + (c - 0x21) as u32).unwrap_or(GETA),
        _ => GETA,
    }
}

/// Decode a character of the alphanumeric set.
pub fn alphanumeric(c: u8) -> char {
    match c {
        0x5C => '\u{00A5}',
        0x7E => '\u{203E}',
        0x21..=0x7D => c as char,
        _ => GETA,
    }
}

/// ARIB additional symbols, row 90 from column 48 (0x7A50..).
const ROW90_SYMBOLS: [char; 37] = [
    '\u{1F14A}', '\u{1F14C}', '\u{1F13F}', '\u{1F146}', '\u{1F14B}', '\u{1F210}', '\u{1F211}',
    '\u{1F212}', '\u{1F213}', '\u{1F142}', '\u{1F214}', '\u{1F215}', '\u{1F216}', '\u{1F14D}',
    '\u{1F131}', '\u{1F13D}', '\u{2B1B}', '\u{2B24}', '\u{1F217}', '\u{1F218}', '\u{1F219}',
    '\u{1F21A}', '\u{1F21B}', '\u{26BF}', '\u{1F21C}', '\u{1F21D}', '\u{1F21E}', '\u{1F21F}',
    '\u{1F220}', '\u{1F221}', '\u{1F222}', '\u{1F223}', '\u{1F224}', '\u{1F225}', '\u{1F14E}',
    '\u{3299}', '\u{1F200}',
];

/// Decode a two-byte Kanji-set character (both bytes in 0x21..=0x7E).
pub fn kanji(c1: u8, c2: u8) -> char {
    if c1 >= 0x7A {
        return additional_symbol(c1, c2);
    }
    let bytes = [c1 | 0x80, c2 | 0x80];
    let (decoded, _, had_errors) = EUC_JP.decode(&bytes);
    if had_errors {
        return GETA;
    }
    decoded.chars().next().unwrap_or(GETA)
}

/// Decode a character of the additional symbol rows (90..94).
pub fn additional_symbol(c1: u8, c2: u8) -> char {
    match (c1, c2) {
        (0x7A, 0x50..=0x74) => ROW90_SYMBOLS[(c2 - 0x50) as usize],
        _ => GETA,
    }
}

/// Default macros 0x60..=0x6F: designation sequences run when a macro
/// character is invoked.
pub const DEFAULT_MACROS: [&[u8]; 16] = [
    b"\x1b\x24\x42\x1b\x29\x4a\x1b\x2a\x30\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x24\x42\x1b\x29\x31\x1b\x2a\x30\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x24\x42\x1b\x29\x20\x41\x1b\x2a\x30\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x28\x32\x1b\x29\x34\x1b\x2a\x35\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x28\x32\x1b\x29\x33\x1b\x2a\x35\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x28\x32\x1b\x29\x20\x41\x1b\x2a\x35\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x28\x20\x41\x1b\x29\x20\x42\x1b\x2a\x20\x43\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x28\x20\x44\x1b\x29\x20\x45\x1b\x2a\x20\x46\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x28\x20\x47\x1b\x29\x20\x48\x1b\x2a\x20\x49\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x28\x20\x4a\x1b\x29\x20\x4b\x1b\x2a\x20\x4c\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x28\x20\x4d\x1b\x29\x20\x4e\x1b\x2a\x20\x4f\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x24\x42\x1b\x29\x20\x42\x1b\x2a\x30\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x24\x42\x1b\x29\x20\x43\x1b\x2a\x30\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x24\x42\x1b\x29\x20\x44\x1b\x2a\x30\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x28\x31\x1b\x29\x30\x1b\x2a\x4a\x1b\x2b\x20\x70\x0f\x1b\x7d",
    b"\x1b\x28\x4a\x1b\x29\x32\x1b\x2a\x20\x41\x1b\x2b\x20\x70\x0f\x1b\x7d",
];

/// Colour lookup table entries 0..15 as 0xRRGGBB.
pub const CLUT: [u32; 16] = [
    0x000000, 0xFF0000, 0x00FF00, 0xFFFF00, 0x0000FF, 0xFF00FF, 0x00FFFF, 0xFFFFFF, //
    0x000000, 0x800000, 0x008000, 0x808000, 0x000080, 0x800080, 0x008080, 0x808080,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kana() {
        assert_eq!(hiragana(0x21), 'ぁ');
        assert_eq!(hiragana(0x22), 'あ');
        assert_eq!(hiragana(0x73), 'ん');
        assert_eq!(hiragana(0x7A), '。');
        assert_eq!(katakana(0x22), 'ア');
        assert_eq!(katakana(0x76), 'ヶ');
        assert_eq!(katakana(0x79), 'ー');
        assert_eq!(jis_x0201_katakana(0x21), '｡');
    }

    #[test]
    fn test_kanji_via_euc_jp() {
        assert_eq!(kanji(0x46, 0x7C), '日');
        assert_eq!(kanji(0x24, 0x22), 'あ');
        assert_eq!(kanji(0x22, 0x76), '♪');
        // row 9 is unassigned in JIS X 0208
        assert_eq!(kanji(0x29, 0x21), GETA);
    }

    #[test]
    fn test_additional_symbols() {
        assert_eq!(kanji(0x7A, 0x50), '\u{1F14A}');
        assert_eq!(kanji(0x7A, 0x74), '\u{1F200}');
        assert_eq!(kanji(0x7E, 0x21), GETA);
    }

    #[test]
    fn test_alphanumeric() {
        assert_eq!(alphanumeric(b'A'), 'A');
        assert_eq!(alphanumeric(0x5C), '¥');
    }

    #[test]
    fn test_set_designations() {
        assert_eq!(GraphicSet::from_single_byte_final(0x4A), Some(GraphicSet::Alphanumeric));
        assert_eq!(GraphicSet::from_double_byte_final(0x42), Some(GraphicSet::Kanji));
        assert_eq!(GraphicSet::from_drcs_final(0x41), Some(GraphicSet::Drcs(1)));
        assert_eq!(GraphicSet::from_drcs_final(0x70), Some(GraphicSet::Macro));
    }
}
