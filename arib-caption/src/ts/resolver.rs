//! Program table resolution: which PID carries captions, which carries the clock.

use log::{debug, info, warn};

use super::pat::PatTable;
use super::pid;
use super::pmt::PmtTable;
use super::psi::{PsiSection, SectionCollector};

/// What the demultiplexer needs to know about the followed program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramTargets {
    pub program_number: u16,
    pub pmt_pid: u16,
    /// PID whose adaptation fields carry the clock reference.
    pub pcr_pid: u16,
    /// PID of the caption elementary stream, if the program has one.
    pub caption_pid: Option<u16>,
}

/// Turns control-PID payload into program targets.
pub trait TableResolver {
    /// Whether packets on `pid` should be pushed to this resolver.
    fn is_control_pid(&self, pid: u16) -> bool;

    /// Push one packet payload. Returns new targets when they change.
    fn push(&mut self, pid: u16, payload: &[u8], payload_unit_start: bool)
        -> Option<ProgramTargets>;

    /// Drop partially collected data for `pid` after a continuity gap.
    fn reset_pid(&mut self, pid: u16);
}

/// Resolver reading the PAT and the PMT of the first listed program.
#[derive(Debug, Default)]
pub struct PsiTableResolver {
    pat: SectionCollector,
    pmt: SectionCollector,
    program: Option<(u16, u16)>,
    targets: Option<ProgramTargets>,
}

impl PsiTableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> Option<ProgramTargets> {
        self.targets
    }

    fn handle_pat(&mut self) {
        let Some(raw) = self.pat.section() else {
            return;
        };
        let table = match PsiSection::parse(raw).and_then(|s| PatTable::parse(&s)) {
            Ok(table) => table,
            Err(e) => {
                warn!("[Resolver] dropping PAT section: {}", e);
                return;
            }
        };
        let Some(entry) = table.first_program() else {
            debug!("[Resolver] PAT lists no programs");
            return;
        };
        if self.program != Some((entry.program_number, entry.pmt_pid)) {
            info!(
                "[Resolver] following program {} (PMT PID 0x{:04X})",
                entry.program_number, entry.pmt_pid
            );
            self.program = Some((entry.program_number, entry.pmt_pid));
            self.pmt.clear();
        }
    }

    fn handle_pmt(&mut self, pmt_pid: u16) -> Option<ProgramTargets> {
        let raw = self.pmt.section()?;
        let table = match PsiSection::parse(raw).and_then(|s| PmtTable::parse(&s)) {
            Ok(table) => table,
            Err(e) => {
                warn!("[Resolver] dropping PMT section: {}", e);
                return None;
            }
        };
        let (program_number, _) = self.program?;
        if table.program_number != program_number {
            return None;
        }

        let targets = ProgramTargets {
            program_number,
            pmt_pid,
            pcr_pid: table.pcr_pid,
            caption_pid: table.caption_pid(),
        };
        if self.targets == Some(targets) {
            return None;
        }
        match targets.caption_pid {
            Some(caption) => info!(
                "[Resolver] caption PID 0x{:04X}, PCR PID 0x{:04X}",
                caption, targets.pcr_pid
            ),
            None => warn!("[Resolver] program {} has no caption stream", program_number),
        }
        self.targets = Some(targets);
        Some(targets)
    }
}

impl TableResolver for PsiTableResolver {
    fn is_control_pid(&self, pid: u16) -> bool {
        pid == pid::PAT || self.program.map(|(_, pmt)| pmt == pid).unwrap_or(false)
    }

    fn push(
        &mut self,
        pid: u16,
        payload: &[u8],
        payload_unit_start: bool,
    ) -> Option<ProgramTargets> {
        if pid == pid::PAT {
            if self.pat.push(payload, payload_unit_start) {
                self.handle_pat();
                self.pat.clear();
            }
            return None;
        }

        let is_pmt = self.program.map(|(_, pmt)| pmt) == Some(pid);
        if is_pmt && self.pmt.push(payload, payload_unit_start) {
            let targets = self.handle_pmt(pid);
            self.pmt.clear();
            return targets;
        }
        None
    }

    fn reset_pid(&mut self, pid: u16) {
        if pid == pid::PAT {
            self.pat.clear();
        } else if self.program.map(|(_, pmt)| pmt) == Some(pid) {
            self.pmt.clear();
        }
    }
}
