//! Long-form PSI sections: reassembly across packets, header and CRC.

use crate::error::{Error, Result};

/// Bytes before the table body: table_id through last_section_number.
const LONG_HEADER_LEN: usize = 8;
const CRC_LEN: usize = 4;
const CRC_POLY: u32 = 0x04C1_1DB7;

/// Big-endian u16 at `at`.
pub(crate) fn be_u16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

/// 13-bit PID stored in the low bits of a big-endian u16.
pub(crate) fn pid_at(data: &[u8], at: usize) -> u16 {
    be_u16(data, at) & 0x1FFF
}

/// 12-bit length stored in the low bits of a big-endian u16.
pub(crate) fn length_at(data: &[u8], at: usize) -> usize {
    (be_u16(data, at) & 0x0FFF) as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsiHeader {
    pub table_id: u8,
    /// transport_stream_id in a PAT, program_number in a PMT.
    pub id_extension: u16,
    pub version: u8,
    pub current: bool,
}

/// A CRC-checked section. `body` excludes the header and the CRC.
#[derive(Debug, Clone)]
pub struct PsiSection<'a> {
    pub header: PsiHeader,
    pub body: &'a [u8],
}

impl<'a> PsiSection<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < LONG_HEADER_LEN {
            return Err(Error::truncated(LONG_HEADER_LEN, data.len()));
        }
        let table_id = data[0];
        if data[1] & 0x80 == 0 {
            return Err(Error::Section(format!(
                "table 0x{:02X} uses the short section syntax",
                table_id
            )));
        }

        let total = 3 + length_at(data, 1);
        if total < LONG_HEADER_LEN + CRC_LEN + 1 {
            return Err(Error::Section(format!("section of {} bytes is too short", total)));
        }
        let section = data
            .get(..total)
            .ok_or_else(|| Error::truncated(total, data.len()))?;

        let (covered, crc) = section.split_at(total - CRC_LEN);
        let stored = u32::from_be_bytes([crc[0], crc[1], crc[2], crc[3]]);
        let computed = crc32_mpeg2(covered);
        if stored != computed {
            return Err(Error::Section(format!(
                "table 0x{:02X}: CRC {:08X} does not match {:08X}",
                table_id, stored, computed
            )));
        }

        Ok(PsiSection {
            header: PsiHeader {
                table_id,
                id_extension: be_u16(data, 3),
                version: (data[5] >> 1) & 0x1F,
                current: data[5] & 0x01 != 0,
            },
            body: &covered[LONG_HEADER_LEN..],
        })
    }
}

/// Gathers one section that may span several packets of the same PID.
#[derive(Debug, Default)]
pub struct SectionCollector {
    buffer: Vec<u8>,
    /// Known once the first three bytes are in.
    target: Option<usize>,
}

impl SectionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any partial section.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.target = None;
    }

    /// Feed a packet payload. Returns true once a whole section is held.
    ///
    /// A unit start honours the pointer field and discards what came before.
    /// Continuations are ignored until a unit start has been seen.
    pub fn push(&mut self, payload: &[u8], unit_start: bool) -> bool {
        if unit_start {
            self.clear();
            let Some((&pointer, rest)) = payload.split_first() else {
                return false;
            };
            match rest.get(pointer as usize..) {
                Some(section) if !section.is_empty() => self.buffer.extend_from_slice(section),
                _ => return false,
            }
        } else if self.buffer.is_empty() {
            return false;
        } else {
            self.buffer.extend_from_slice(payload);
        }

        if self.target.is_none() && self.buffer.len() >= 3 {
            self.target = Some(3 + length_at(&self.buffer, 1));
        }
        self.section().is_some()
    }

    /// The finished section without trailing stuffing.
    pub fn section(&self) -> Option<&[u8]> {
        match self.target {
            Some(len) if self.buffer.len() >= len => Some(&self.buffer[..len]),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// CRC-32/MPEG-2: MSB first, initial value all ones, no final XOR.
pub fn crc32_mpeg2(data: &[u8]) -> u32 {
    data.iter().fold(u32::MAX, |mut crc, &byte| {
        crc ^= u32::from(byte) << 24;
        for _ in 0..8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ CRC_POLY
            } else {
                crc << 1
            };
        }
        crc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_crc(mut section: Vec<u8>) -> Vec<u8> {
        let crc = crc32_mpeg2(&section);
        section.extend_from_slice(&crc.to_be_bytes());
        section
    }

    /// tsid 0x1234, version 1, program 1 on PMT PID 0x1F0.
    fn pat() -> Vec<u8> {
        with_crc(vec![
            0x00, 0xB0, 0x0D, 0x12, 0x34, 0xC3, 0x00, 0x00, //
            0x00, 0x01, 0xE1, 0xF0,
        ])
    }

    #[test]
    fn test_crc_known_values() {
        assert_eq!(crc32_mpeg2(&[]), 0xFFFF_FFFF);
        assert_eq!(crc32_mpeg2(b"123456789"), 0x0376_E6E7);
        // Running the CRC over a section including its CRC leaves zero.
        assert_eq!(crc32_mpeg2(&pat()), 0);
    }

    #[test]
    fn test_parse_long_section() {
        let raw = pat();
        let section = PsiSection::parse(&raw).unwrap();
        assert_eq!(
            section.header,
            PsiHeader {
                table_id: 0x00,
                id_extension: 0x1234,
                version: 1,
                current: true,
            }
        );
        assert_eq!(section.body, &[0x00, 0x01, 0xE1, 0xF0]);
    }

    #[test]
    fn test_parse_rejects_corruption() {
        let mut raw = pat();
        raw[9] ^= 0xFF;
        assert!(matches!(PsiSection::parse(&raw), Err(Error::Section(_))));

        let raw = pat();
        assert!(matches!(
            PsiSection::parse(&raw[..12]),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_collector_with_pointer_field() {
        let mut payload = vec![0x02, 0xAA, 0xBB];
        payload.extend(pat());
        payload.resize(184, 0xFF);

        let mut collector = SectionCollector::new();
        assert!(collector.push(&payload, true));
        assert_eq!(collector.section(), Some(&pat()[..]));
    }

    #[test]
    fn test_collector_across_packets() {
        let section = pat();
        let mut collector = SectionCollector::new();

        let mut first = vec![0x00];
        first.extend_from_slice(&section[..5]);
        assert!(!collector.push(&first, true));
        assert!(collector.section().is_none());
        assert!(collector.push(&section[5..], false));
        assert_eq!(collector.section(), Some(&section[..]));
    }

    #[test]
    fn test_collector_waits_for_unit_start() {
        let mut collector = SectionCollector::new();
        assert!(!collector.push(&[0x00, 0x01, 0x02], false));
        assert!(collector.is_empty());
        // Pointer past the end of the payload.
        assert!(!collector.push(&[0x05, 0x00], true));
        assert!(collector.is_empty());
    }
}
