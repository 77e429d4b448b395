//! Resynchronizing packet reader over a byte source.

use std::io::{ErrorKind, Read};

use log::debug;

use super::packet::{SYNC_BYTE, TS_PACKET_SIZE};
use crate::error::Result;

/// Size of the refill chunk. Independent of the packet size.
pub const READ_CHUNK_SIZE: usize = 8192;

/// Pulls 188-byte packets out of a raw byte source.
///
/// Leading garbage and corrupted packets are skipped by scanning for the next
/// sync byte instead of failing.
pub struct PacketReader<R> {
    source: R,
    window: Vec<u8>,
    start: usize,
    end: usize,
    eof: bool,
    skipped: u64,
}

impl<R: Read> PacketReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            window: vec![0u8; READ_CHUNK_SIZE],
            start: 0,
            end: 0,
            eof: false,
            skipped: 0,
        }
    }

    /// Number of bytes discarded while hunting for sync.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped
    }

    /// Read the next packet, or `None` once no further full packet can be
    /// assembled.
    pub fn read_packet(&mut self) -> Result<Option<[u8; TS_PACKET_SIZE]>> {
        loop {
            if self.end - self.start < TS_PACKET_SIZE {
                if self.eof {
                    self.skipped += (self.end - self.start) as u64;
                    self.start = self.end;
                    return Ok(None);
                }
                self.refill()?;
                continue;
            }

            let unread = &self.window[self.start..self.end];
            match unread.iter().position(|&b| b == SYNC_BYTE) {
                Some(pos) => {
                    if pos > 0 {
                        debug!("[Reader] skipped {} bytes before sync", pos);
                        self.skipped += pos as u64;
                        self.start += pos;
                    }
                    if self.end - self.start >= TS_PACKET_SIZE {
                        let mut packet = [0u8; TS_PACKET_SIZE];
                        packet.copy_from_slice(
                            &self.window[self.start..self.start + TS_PACKET_SIZE],
                        );
                        self.start += TS_PACKET_SIZE;
                        return Ok(Some(packet));
                    }
                    // Sync found but the packet is cut; the loop refills.
                }
                None => {
                    self.skipped += (self.end - self.start) as u64;
                    self.start = self.end;
                }
            }
        }
    }

    /// Compact unread bytes to the front and top the window up from the source.
    fn refill(&mut self) -> Result<()> {
        self.window.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;

        while self.end < self.window.len() {
            match self.source.read(&mut self.window[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => {
                    self.end += n;
                    if self.end >= TS_PACKET_SIZE {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

impl<R: Read> Iterator for PacketReader<R> {
    type Item = Result<[u8; TS_PACKET_SIZE]>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_packet().transpose()
    }
}
