//! PID routing, continuity checking and dispatch.

use std::collections::HashMap;

use log::{debug, info, warn};

use super::packet::TsPacket;
use super::pid;
use super::resolver::{ProgramTargets, TableResolver};
use crate::clock::ClockTracker;
use crate::error::Result;
use crate::pes::{PesReassembler, PesUnit};

/// Outcome of the continuity check for one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuity {
    /// First packet on the PID.
    First,
    /// Counter advanced by one.
    InOrder,
    /// Counter unchanged: duplicate or payload-less packet.
    Repeated,
    /// Signalled discontinuity; counter resynchronized.
    Discontinuity,
    /// Unexpected jump; counter resynchronized.
    Gap,
}

/// Per-PID bookkeeping.
#[derive(Debug, Default)]
pub struct PidState {
    last_cc: Option<u8>,
    is_clock_reference: bool,
    reassembler: Option<PesReassembler>,
}

impl PidState {
    /// Validate `cc` against the last counter seen and update it.
    pub fn check_continuity(&mut self, cc: u8, has_payload: bool, discontinuity: bool) -> Continuity {
        let cc = cc & 0x0F;
        let Some(last) = self.last_cc else {
            self.last_cc = Some(cc);
            return Continuity::First;
        };

        let diff = cc.wrapping_sub(last) & 0x0F;
        if has_payload && diff == 1 {
            self.last_cc = Some(cc);
            Continuity::InOrder
        } else if diff == 0 {
            Continuity::Repeated
        } else if discontinuity {
            self.last_cc = Some(cc);
            Continuity::Discontinuity
        } else {
            self.last_cc = Some(cc);
            Continuity::Gap
        }
    }
}

/// Running counters, reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemuxStats {
    pub packets: u64,
    pub gaps: u64,
    pub repeated: u64,
    pub discontinuities: u64,
    pub transport_errors: u64,
    pub scrambled: u64,
    pub clock_samples: u64,
}

/// Routes packets to the table resolver, the clock and the caption reassembler.
pub struct Demultiplexer<T> {
    resolver: T,
    pids: HashMap<u16, PidState>,
    clock: ClockTracker,
    caption_pid: Option<u16>,
    stats: DemuxStats,
}

impl<T: TableResolver> Demultiplexer<T> {
    pub fn new(resolver: T) -> Self {
        Self {
            resolver,
            pids: HashMap::new(),
            clock: ClockTracker::new(),
            caption_pid: None,
            stats: DemuxStats::default(),
        }
    }

    pub fn clock(&self) -> &ClockTracker {
        &self.clock
    }

    pub fn stats(&self) -> DemuxStats {
        self.stats
    }

    pub fn caption_pid(&self) -> Option<u16> {
        self.caption_pid
    }

    /// Process one 188-byte packet. Completed caption PES units go to `out`.
    pub fn push(&mut self, raw: &[u8], out: &mut Vec<PesUnit>) -> Result<()> {
        let packet = TsPacket::parse(raw)?;
        let header = packet.header;
        self.stats.packets += 1;

        if header.pid == pid::NULL {
            return Ok(());
        }
        if header.transport_error {
            self.stats.transport_errors += 1;
            debug!("[Demux] PID 0x{:04X}: transport error indicator set", header.pid);
            return Ok(());
        }

        let state = self.pids.entry(header.pid).or_default();
        let continuity = state.check_continuity(
            header.continuity_counter,
            header.has_payload(),
            packet.discontinuity(),
        );
        let gap = continuity == Continuity::Gap;
        match continuity {
            Continuity::Gap => {
                self.stats.gaps += 1;
                warn!(
                    "[Demux] PID 0x{:04X}: continuity gap (cc {})",
                    header.pid, header.continuity_counter
                );
                if self.resolver.is_control_pid(header.pid) {
                    self.resolver.reset_pid(header.pid);
                }
            }
            Continuity::Repeated => self.stats.repeated += 1,
            Continuity::Discontinuity => {
                self.stats.discontinuities += 1;
                debug!("[Demux] PID 0x{:04X}: signalled discontinuity", header.pid);
            }
            Continuity::First | Continuity::InOrder => {}
        }

        if let Some(sample) = packet.clock_reference() {
            if state.is_clock_reference {
                self.clock.observe(sample);
                self.stats.clock_samples += 1;
            }
        }

        // A repeated counter with payload is a duplicate packet.
        if continuity == Continuity::Repeated || packet.payload.is_empty() {
            return Ok(());
        }
        if header.is_scrambled() {
            self.stats.scrambled += 1;
            return Ok(());
        }

        if self.resolver.is_control_pid(header.pid) {
            if let Some(targets) =
                self.resolver
                    .push(header.pid, packet.payload, header.payload_unit_start)
            {
                self.apply_targets(targets, out);
            }
            return Ok(());
        }

        if let Some(reassembler) = self
            .pids
            .get_mut(&header.pid)
            .and_then(|state| state.reassembler.as_mut())
        {
            reassembler.push(
                packet.payload,
                header.payload_unit_start,
                gap,
                &self.clock,
                out,
            );
        }
        Ok(())
    }

    /// Hand off whatever unbounded unit is still pending at end of stream.
    pub fn finish(&mut self, out: &mut Vec<PesUnit>) {
        for state in self.pids.values_mut() {
            if let Some(unit) = state.reassembler.as_mut().and_then(|r| r.flush()) {
                out.push(unit);
            }
        }
    }

    fn apply_targets(&mut self, targets: ProgramTargets, out: &mut Vec<PesUnit>) {
        if self.clock.set_reference_pid(targets.pcr_pid) {
            self.pids.entry(targets.pcr_pid).or_default().is_clock_reference = true;
        }

        if self.caption_pid == targets.caption_pid {
            return;
        }
        if let Some(old) = self.caption_pid.take() {
            if let Some(mut reassembler) = self
                .pids
                .get_mut(&old)
                .and_then(|state| state.reassembler.take())
            {
                out.extend(reassembler.flush());
            }
        }
        if let Some(caption) = targets.caption_pid {
            info!("[Demux] tracking caption PID 0x{:04X}", caption);
            self.pids.entry(caption).or_default().reassembler = Some(PesReassembler::new(caption));
        }
        self.caption_pid = targets.caption_pid;
    }
}
