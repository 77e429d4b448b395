//! PES reassembly for the tracked caption stream.

use bytes::{BufMut, Bytes, BytesMut};
use log::{debug, warn};

use crate::clock::ClockTracker;
use crate::error::{Error, Result};

/// Length of the fixed PES prefix (start code, stream id, packet length).
const PES_PREFIX_LEN: usize = 6;

/// Decoded PES header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PesHeader {
    pub stream_id: u8,
    /// Declared PES_packet_length (0 = unbounded).
    pub packet_length: u16,
    /// Raw 33-bit PTS.
    pub pts: Option<u64>,
    /// Raw 33-bit DTS.
    pub dts: Option<u64>,
    /// Offset of the first payload byte.
    pub header_length: usize,
}

impl PesHeader {
    /// Parse a PES header from the start of a unit.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < PES_PREFIX_LEN {
            return Err(Error::truncated(PES_PREFIX_LEN, data.len()));
        }
        if data[0] != 0x00 || data[1] != 0x00 || data[2] != 0x01 {
            return Err(Error::InvalidStartCode);
        }

        let mut header = PesHeader {
            stream_id: data[3],
            packet_length: u16::from_be_bytes([data[4], data[5]]),
            pts: None,
            dts: None,
            header_length: PES_PREFIX_LEN,
        };

        // Streams without the optional header (private_stream_2, padding...)
        // carry payload right after the prefix.
        if data.len() < 9 || data[6] & 0xC0 != 0x80 {
            return Ok(header);
        }

        let flags = data[7];
        let header_length = 9 + data[8] as usize;
        if header_length > data.len() {
            return Err(Error::truncated(header_length, data.len()));
        }
        header.header_length = header_length;

        if flags & 0x80 != 0 && header_length >= 14 {
            header.pts = Some(read_timestamp(&data[9..14]));
            if flags & 0x40 != 0 && header_length >= 19 {
                header.dts = Some(read_timestamp(&data[14..19]));
            }
        }
        Ok(header)
    }

    /// Total unit length including the prefix, 0 when unbounded.
    pub fn total_length(&self) -> usize {
        match self.packet_length {
            0 => 0,
            n => n as usize + PES_PREFIX_LEN,
        }
    }
}

/// Read a 33-bit timestamp from its 5-byte marker-bit encoding.
fn read_timestamp(b: &[u8]) -> u64 {
    ((b[0] as u64 & 0x0E) << 29)
        | ((b[1] as u64) << 22)
        | ((b[2] as u64 & 0xFE) << 14)
        | ((b[3] as u64) << 7)
        | ((b[4] as u64) >> 1)
}

/// A completed PES unit ready for caption framing.
#[derive(Debug, Clone)]
pub struct PesUnit {
    pub pid: u16,
    /// PTS in ticks since the clock epoch. `None` if the unit had no PTS or
    /// no clock sample had been seen yet.
    pub pts: Option<u64>,
    /// Raw 33-bit PTS as carried in the header.
    pub raw_pts: Option<u64>,
    /// Payload after the PES header, followed by one NUL terminator.
    pub data: Bytes,
    /// PES bytes (header included) counted towards the declared length.
    pub gathered: usize,
    /// A continuity gap hit this unit.
    pub corrupted: bool,
}

/// Accumulates one PES unit at a time for a single PID.
#[derive(Debug)]
pub struct PesReassembler {
    pid: u16,
    buffer: BytesMut,
    declared_length: usize,
    gathered: usize,
    pts: Option<u64>,
    raw_pts: Option<u64>,
    corrupted: bool,
    active: bool,
}

impl PesReassembler {
    pub fn new(pid: u16) -> Self {
        Self {
            pid,
            buffer: BytesMut::new(),
            declared_length: 0,
            gathered: 0,
            pts: None,
            raw_pts: None,
            corrupted: false,
            active: false,
        }
    }

    /// Feed one packet payload. Completed units are appended to `out`.
    ///
    /// `gap` reports a continuity error on the packet carrying `payload`.
    pub fn push(
        &mut self,
        payload: &[u8],
        payload_unit_start: bool,
        gap: bool,
        clock: &ClockTracker,
        out: &mut Vec<PesUnit>,
    ) {
        if payload_unit_start {
            if gap && self.active {
                self.corrupted = true;
            }
            if let Some(unit) = self.flush() {
                out.push(unit);
            }
            self.reset();
            if payload.is_empty() {
                return;
            }
            if let Err(e) = self.start_unit(payload, clock) {
                warn!("[PES] PID 0x{:04X}: dropping unit: {}", self.pid, e);
                self.reset();
                return;
            }
        } else {
            if !self.active || payload.is_empty() {
                return;
            }
            if gap {
                self.corrupted = true;
            }
            self.append(payload, 0);
        }

        if self.declared_length > 0 && self.gathered >= self.declared_length {
            out.push(self.complete());
        }
    }

    /// Hand off a pending unbounded unit. Bounded units that never reached
    /// their declared length are dropped.
    pub fn flush(&mut self) -> Option<PesUnit> {
        if !self.active {
            return None;
        }
        if self.declared_length == 0 {
            return Some(self.complete());
        }
        debug!(
            "[PES] PID 0x{:04X}: discarding truncated unit ({}/{} bytes)",
            self.pid, self.gathered, self.declared_length
        );
        self.reset();
        None
    }

    fn start_unit(&mut self, payload: &[u8], clock: &ClockTracker) -> Result<()> {
        let header = PesHeader::parse(payload)?;
        self.active = true;
        self.declared_length = header.total_length();
        self.raw_pts = header.pts;
        self.pts = header.pts.and_then(|pts| clock.relative_pts(pts));
        if header.pts.is_some() && self.pts.is_none() {
            debug!("[PES] PID 0x{:04X}: PTS before first clock sample", self.pid);
        }
        self.append(payload, header.header_length);
        Ok(())
    }

    /// Count `payload` towards the declared length and keep the bytes from
    /// `skip` on. Bytes past the declared end are stuffing and dropped.
    fn append(&mut self, payload: &[u8], skip: usize) {
        let take = if self.declared_length > 0 {
            payload
                .len()
                .min(self.declared_length.saturating_sub(self.gathered))
        } else {
            payload.len()
        };
        self.gathered += take;
        if skip < take {
            self.buffer.reserve(take - skip + 1);
            self.buffer.put_slice(&payload[skip..take]);
        }
    }

    fn complete(&mut self) -> PesUnit {
        self.buffer.put_u8(0);
        let unit = PesUnit {
            pid: self.pid,
            pts: self.pts,
            raw_pts: self.raw_pts,
            data: self.buffer.split().freeze(),
            gathered: self.gathered,
            corrupted: self.corrupted,
        };
        self.reset();
        unit
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.declared_length = 0;
        self.gathered = 0;
        self.pts = None;
        self.raw_pts = None;
        self.corrupted = false;
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_timestamp(marker: u8, ts: u64) -> [u8; 5] {
        [
            marker | (((ts >> 30) as u8 & 0x07) << 1) | 1,
            (ts >> 22) as u8,
            (((ts >> 15) as u8) << 1) | 1,
            (ts >> 7) as u8,
            ((ts as u8) << 1) | 1,
        ]
    }

    fn pes(packet_length: u16, pts: Option<u64>, body: &[u8]) -> Vec<u8> {
        let mut v = vec![0x00, 0x00, 0x01, 0xBD];
        v.extend_from_slice(&packet_length.to_be_bytes());
        match pts {
            Some(pts) => {
                v.extend_from_slice(&[0x80, 0x80, 0x05]);
                v.extend_from_slice(&encode_timestamp(0x20, pts));
            }
            None => v.extend_from_slice(&[0x80, 0x00, 0x00]),
        }
        v.extend_from_slice(body);
        v
    }

    fn clock_at(raw: u64) -> ClockTracker {
        let mut clock = ClockTracker::new();
        clock.observe(raw);
        clock
    }

    #[test]
    fn test_parse_header_with_pts_and_dts() {
        let mut data = vec![0x00, 0x00, 0x01, 0xE0, 0x00, 0x00, 0x80, 0xC0, 0x0A];
        data.extend_from_slice(&encode_timestamp(0x30, 0x1_2345_6789));
        data.extend_from_slice(&encode_timestamp(0x10, 0x0_0000_1234));
        let header = PesHeader::parse(&data).unwrap();

        assert_eq!(header.stream_id, 0xE0);
        assert_eq!(header.pts, Some(0x1_2345_6789));
        assert_eq!(header.dts, Some(0x1234));
        assert_eq!(header.header_length, 19);
        assert_eq!(header.total_length(), 0);
    }

    #[test]
    fn test_parse_header_bad_start_code() {
        let data = [0x00, 0x00, 0x02, 0xBD, 0x00, 0x10, 0x80, 0x00, 0x00];
        assert!(matches!(
            PesHeader::parse(&data),
            Err(Error::InvalidStartCode)
        ));
    }

    #[test]
    fn test_parse_header_length_overrun() {
        let data = [0x00, 0x00, 0x01, 0xBD, 0x00, 0x10, 0x80, 0x80, 0x40];
        assert!(matches!(
            PesHeader::parse(&data),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_single_packet_unit() {
        let clock = clock_at(90_000);
        let body = b"caption";
        // optional header (3) + PTS (5) + body
        let unit = pes(8 + body.len() as u16, Some(180_000), body);
        let mut r = PesReassembler::new(0x200);
        let mut out = Vec::new();

        let mut payload = unit.clone();
        payload.resize(184, 0xFF);
        r.push(&payload, true, false, &clock, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].pts, Some(90_000));
        assert_eq!(out[0].raw_pts, Some(180_000));
        assert_eq!(out[0].gathered, unit.len());
        assert_eq!(&out[0].data[..], b"caption\0");
        assert!(!out[0].corrupted);
    }

    #[test]
    fn test_unit_spanning_packets() {
        let clock = clock_at(0);
        let body: Vec<u8> = (0..300u16).map(|i| i as u8).collect();
        let unit = pes(8 + body.len() as u16, Some(9000), &body);
        let mut r = PesReassembler::new(0x200);
        let mut out = Vec::new();

        r.push(&unit[..184], true, false, &clock, &mut out);
        assert!(out.is_empty());
        let mut tail = unit[184..].to_vec();
        tail.resize(184, 0xFF);
        r.push(&tail, false, false, &clock, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].gathered, unit.len());
        assert_eq!(out[0].data.len(), body.len() + 1);
        assert_eq!(&out[0].data[..body.len()], &body[..]);
        assert_eq!(out[0].data[body.len()], 0);
    }

    #[test]
    fn test_unbounded_unit_flushes_at_next_start() {
        let clock = clock_at(0);
        let mut r = PesReassembler::new(0x200);
        let mut out = Vec::new();

        r.push(&pes(0, Some(9000), b"abc"), true, false, &clock, &mut out);
        r.push(b"def", false, false, &clock, &mut out);
        assert!(out.is_empty());

        r.push(&pes(0, Some(18000), b"xyz"), true, false, &clock, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(&out[0].data[..], b"abcdef\0");
        assert_eq!(out[0].pts, Some(9000));

        assert_eq!(&r.flush().unwrap().data[..], b"xyz\0");
        assert!(r.flush().is_none());
    }

    #[test]
    fn test_truncated_bounded_unit_is_dropped() {
        let clock = clock_at(0);
        let mut r = PesReassembler::new(0x200);
        let mut out = Vec::new();

        r.push(&pes(500, Some(0), b"short"), true, false, &clock, &mut out);
        r.push(&pes(0, Some(0), b"next"), true, false, &clock, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_gap_marks_unit_corrupted() {
        let clock = clock_at(0);
        let body = [0x11u8; 200];
        let unit = pes(8 + body.len() as u16, Some(0), &body);
        let mut r = PesReassembler::new(0x200);
        let mut out = Vec::new();

        r.push(&unit[..184], true, false, &clock, &mut out);
        r.push(&unit[184..], false, true, &clock, &mut out);
        assert_eq!(out.len(), 1);
        assert!(out[0].corrupted);
    }

    #[test]
    fn test_continuation_without_start_is_ignored() {
        let clock = clock_at(0);
        let mut r = PesReassembler::new(0x200);
        let mut out = Vec::new();
        r.push(b"orphan", false, false, &clock, &mut out);
        assert!(out.is_empty());
        assert!(r.flush().is_none());
    }

    #[test]
    fn test_no_clock_leaves_pts_unset() {
        let clock = ClockTracker::new();
        let mut r = PesReassembler::new(0x200);
        let mut out = Vec::new();
        r.push(&pes(9, Some(1234), b"x"), true, false, &clock, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].pts, None);
        assert_eq!(out[0].raw_pts, Some(1234));
    }
}
