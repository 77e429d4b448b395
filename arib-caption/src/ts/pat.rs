//! Program association table.

use super::psi::{be_u16, pid_at, PsiSection};
use super::table_id;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatEntry {
    pub program_number: u16,
    pub pmt_pid: u16,
}

#[derive(Debug, Clone, Default)]
pub struct PatTable {
    pub transport_stream_id: u16,
    pub version: u8,
    /// Listed programs, without the network PID entry (program 0).
    pub programs: Vec<PatEntry>,
}

impl PatTable {
    pub fn parse(section: &PsiSection) -> Result<Self> {
        if section.header.table_id != table_id::PAT {
            return Err(Error::Section(format!(
                "expected a PAT, got table 0x{:02X}",
                section.header.table_id
            )));
        }
        let body = section.body;
        if body.len() % 4 != 0 {
            return Err(Error::Section(format!(
                "{} trailing bytes in the PAT program loop",
                body.len() % 4
            )));
        }

        let mut programs = Vec::with_capacity(body.len() / 4);
        for entry in body.chunks_exact(4) {
            let program_number = be_u16(entry, 0);
            if program_number != 0 {
                programs.push(PatEntry {
                    program_number,
                    pmt_pid: pid_at(entry, 2),
                });
            }
        }

        Ok(PatTable {
            transport_stream_id: section.header.id_extension,
            version: section.header.version,
            programs,
        })
    }

    /// The single program followed for the whole run.
    pub fn first_program(&self) -> Option<PatEntry> {
        self.programs.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::psi::PsiHeader;

    fn pat(body: &[u8]) -> PsiSection<'_> {
        PsiSection {
            header: PsiHeader {
                table_id: table_id::PAT,
                id_extension: 0x7FE0,
                version: 3,
                current: true,
            },
            body,
        }
    }

    #[test]
    fn test_network_entry_is_skipped() {
        let body = [
            0x00, 0x00, 0xE0, 0x10, //
            0x04, 0x08, 0xE1, 0xF0, //
            0x04, 0x09, 0xE1, 0xF1,
        ];
        let table = PatTable::parse(&pat(&body)).unwrap();

        assert_eq!((table.transport_stream_id, table.version), (0x7FE0, 3));
        assert_eq!(table.programs.len(), 2);
        assert_eq!(
            table.first_program(),
            Some(PatEntry {
                program_number: 0x0408,
                pmt_pid: 0x01F0
            })
        );
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert!(PatTable::parse(&pat(&[0x00, 0x01, 0xE1])).is_err());

        let body = [0x00, 0x01, 0xE1, 0xF0];
        let mut section = pat(&body);
        section.header.table_id = table_id::PMT;
        assert!(PatTable::parse(&section).is_err());
    }

    #[test]
    fn test_empty_pat_has_no_program() {
        let table = PatTable::parse(&pat(&[0x00, 0x00, 0xE0, 0x10])).unwrap();
        assert_eq!(table.first_program(), None);
    }
}
