//! Hash to code point table for known DRCS glyphs.
//!
//! File format, one entry per line:
//! ```text
//! ; comment
//! 0123456789abcdef0123456789abcdef=U+2661
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, info};

use crate::error::Result;

/// Length of a hex MD5 digest.
pub const HASH_LEN: usize = 32;

#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    entries: HashMap<String, char>,
}

impl ConversionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from disk. A missing file yields an empty table.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read(path) {
            Ok(raw) => {
                let table = Self::parse(&String::from_utf8_lossy(&raw));
                info!(
                    "[Glyph] loaded {} conversions from {}",
                    table.len(),
                    path.display()
                );
                Ok(table)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("[Glyph] no conversion table at {}", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse table text, skipping comments and malformed lines.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::new();
        for line in text.lines() {
            if line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some((hash, code)) = parse_line(line) {
                table.entries.insert(hash, code);
            }
        }
        table
    }

    pub fn insert(&mut self, hash: &str, code: char) {
        self.entries.insert(hash.to_ascii_lowercase(), code);
    }

    /// Code point for a glyph hash (case-insensitive).
    pub fn lookup(&self, hash: &str) -> Option<char> {
        self.entries.get(&hash.to_ascii_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_line(line: &str) -> Option<(String, char)> {
    let (hash, rest) = line.split_once('=')?;
    if hash.len() != HASH_LEN || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let digits = rest.trim().strip_prefix("U+")?;
    if digits.is_empty() || digits.len() > 6 {
        return None;
    }
    let code = u32::from_str_radix(digits, 16).ok()?;
    if code > 0x10FFFF {
        return None;
    }
    Some((hash.to_ascii_lowercase(), char::from_u32(code)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_parse_entries_and_comments() {
        let text = format!(
            "; header\n# another\n{}=U+2661\r\nFEDCBA9876543210FEDCBA9876543210=U+1F4F1\n",
            HASH
        );
        let table = ConversionTable::parse(&text);
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(HASH), Some('\u{2661}'));
        assert_eq!(
            table.lookup("fedcba9876543210fedcba9876543210"),
            Some('\u{1F4F1}')
        );
    }

    #[test]
    fn test_malformed_lines_are_ignored() {
        let text = format!(
            "{short}=U+3042\n{h}=3042\n{h}=U+ZZZZ\n{h}=U+110000\n{h}=U+D800\n{h}\nxyz{rest}=U+3042\n",
            short = &HASH[..31],
            h = HASH,
            rest = &HASH[3..]
        );
        let table = ConversionTable::parse(&text);
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let table = ConversionTable::load(Path::new("/nonexistent/drcs_conv.ini")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut table = ConversionTable::new();
        table.insert(&HASH.to_ascii_uppercase(), 'X');
        assert_eq!(table.lookup(HASH), Some('X'));
    }
}
