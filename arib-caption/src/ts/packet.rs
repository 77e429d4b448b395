//! 188-byte transport packets, borrowed from the read buffer.

use crate::error::{Error, Result};

pub const TS_PACKET_SIZE: usize = 188;
pub const SYNC_BYTE: u8 = 0x47;

const HEADER_LEN: usize = 4;

/// The four header bytes after the sync byte check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TsHeader {
    pub pid: u16,
    pub continuity_counter: u8,
    pub payload_unit_start: bool,
    pub transport_error: bool,
    /// `transport_scrambling_control`, 0 when clear.
    pub scrambling: u8,
    /// `adaptation_field_control`: bit 1 = field present, bit 0 = payload present.
    pub field_control: u8,
}

impl TsHeader {
    fn from_bytes(b: [u8; HEADER_LEN]) -> Self {
        let word = u32::from_be_bytes(b);
        Self {
            transport_error: word & 0x0080_0000 != 0,
            payload_unit_start: word & 0x0040_0000 != 0,
            pid: ((word >> 8) & 0x1FFF) as u16,
            scrambling: ((word >> 6) & 0b11) as u8,
            field_control: ((word >> 4) & 0b11) as u8,
            continuity_counter: (word & 0x0F) as u8,
        }
    }

    pub fn has_adaptation_field(&self) -> bool {
        self.field_control & 0b10 != 0
    }

    pub fn has_payload(&self) -> bool {
        self.field_control & 0b01 != 0
    }

    pub fn is_scrambled(&self) -> bool {
        self.scrambling != 0
    }
}

/// Adaptation field flags that matter for caption timing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdaptationField {
    pub discontinuity: bool,
    /// PCR base (33 bits, 90 kHz). The 27 MHz extension is dropped.
    pub clock_reference: Option<u64>,
}

impl AdaptationField {
    /// `field` is the adaptation field body, after its length byte.
    fn parse(field: &[u8]) -> Self {
        let Some((&flags, rest)) = field.split_first() else {
            return Self::default();
        };
        let clock_reference = if flags & 0x10 != 0 && rest.len() >= 6 {
            Some(pcr_base(&rest[..5]))
        } else {
            None
        };
        Self {
            discontinuity: flags & 0x80 != 0,
            clock_reference,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TsPacket<'a> {
    pub header: TsHeader,
    pub adaptation_field: Option<AdaptationField>,
    /// Empty when the packet carries no payload or the adaptation field
    /// fills the packet.
    pub payload: &'a [u8],
}

impl<'a> TsPacket<'a> {
    /// Parse the first 188 bytes of `data`.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let Some(data) = data.get(..TS_PACKET_SIZE) else {
            return Err(Error::truncated(TS_PACKET_SIZE, data.len()));
        };
        if data[0] != SYNC_BYTE {
            return Err(Error::InvalidMarker {
                what: "sync byte",
                expected: SYNC_BYTE,
                found: data[0],
            });
        }
        let header = TsHeader::from_bytes([data[0], data[1], data[2], data[3]]);

        let mut body = &data[HEADER_LEN..];
        let mut adaptation_field = None;
        if header.has_adaptation_field() {
            let declared = body[0] as usize;
            let end = (1 + declared).min(body.len());
            adaptation_field = Some(AdaptationField::parse(&body[1..end]));
            body = &body[end..];
        }
        let payload = if header.has_payload() { body } else { &[] };

        Ok(TsPacket {
            header,
            adaptation_field,
            payload,
        })
    }

    pub fn discontinuity(&self) -> bool {
        self.adaptation_field.is_some_and(|af| af.discontinuity)
    }

    pub fn clock_reference(&self) -> Option<u64> {
        self.adaptation_field.and_then(|af| af.clock_reference)
    }
}

/// 33-bit base from the first five PCR bytes.
fn pcr_base(b: &[u8]) -> u64 {
    b[..4]
        .iter()
        .fold(0u64, |acc, &byte| acc << 8 | u64::from(byte))
        << 1
        | u64::from(b[4] >> 7)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(pid: u16, control: u8) -> [u8; 188] {
        let mut p = [0u8; 188];
        p[0] = SYNC_BYTE;
        p[1] = (pid >> 8) as u8;
        p[2] = pid as u8;
        p[3] = control;
        p
    }

    #[test]
    fn test_payload_only_packet() {
        let mut raw = blank(0x1FFF, 0x1A);
        raw[1] |= 0x40;
        let packet = TsPacket::parse(&raw).unwrap();

        assert_eq!(packet.header.pid, 0x1FFF);
        assert_eq!(packet.header.continuity_counter, 0x0A);
        assert!(packet.header.payload_unit_start);
        assert!(!packet.header.transport_error);
        assert!(packet.adaptation_field.is_none());
        assert_eq!(packet.payload.len(), 184);
        assert_eq!(packet.clock_reference(), None);
    }

    #[test]
    fn test_clock_reference() {
        let mut raw = blank(0x100, 0x25);
        raw[4] = 7;
        raw[5] = 0x10;
        // base = 2^32 + 1
        raw[6..12].copy_from_slice(&[0x80, 0x00, 0x00, 0x00, 0x80, 0x00]);

        let packet = TsPacket::parse(&raw).unwrap();
        assert_eq!(packet.header.continuity_counter, 5);
        assert_eq!(packet.clock_reference(), Some(0x1_0000_0001));
        assert!(!packet.discontinuity());
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn test_short_field_has_no_clock() {
        let mut raw = blank(0, 0x30);
        raw[4] = 3;
        raw[5] = 0x90;

        let packet = TsPacket::parse(&raw).unwrap();
        assert_eq!(packet.clock_reference(), None);
        assert!(packet.discontinuity());
        assert_eq!(packet.payload.len(), 180);
    }

    #[test]
    fn test_field_longer_than_packet() {
        let mut raw = blank(0, 0x30);
        raw[4] = 200;
        assert!(TsPacket::parse(&raw).unwrap().payload.is_empty());
    }

    #[test]
    fn test_scrambled_and_errored_flags() {
        let mut raw = blank(0x200, 0xD0);
        raw[1] |= 0x80;
        let header = TsPacket::parse(&raw).unwrap().header;
        assert!(header.is_scrambled());
        assert!(header.transport_error);
        assert!(header.has_payload());
        assert!(!header.has_adaptation_field());
    }

    #[test]
    fn test_rejects_bad_sync_and_short_input() {
        assert!(matches!(
            TsPacket::parse(&[0u8; 188]),
            Err(Error::InvalidMarker { found: 0x00, .. })
        ));
        assert!(matches!(
            TsPacket::parse(&[SYNC_BYTE; 100]),
            Err(Error::Truncated { .. })
        ));
    }
}
