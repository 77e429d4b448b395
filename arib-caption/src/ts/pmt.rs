//! Program map table, reduced to the clock PID and the caption stream.

use super::psi::{length_at, pid_at, PsiSection};
use super::{descriptor_tag, table_id};
use crate::error::{Error, Result};

pub mod stream_type {
    /// PES private data. ARIB captions and superimposed text both use it.
    pub const PES_PRIVATE_DATA: u8 = 0x06;
}

/// Component tags of caption streams, profiles A to H.
pub const CAPTION_COMPONENT_TAGS: std::ops::RangeInclusive<u8> = 0x30..=0x37;

/// Bytes in an elementary stream entry before its descriptors.
const ES_ENTRY_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmtStream {
    pub stream_type: u8,
    pub elementary_pid: u16,
    /// From the stream identifier descriptor, when present.
    pub component_tag: Option<u8>,
}

impl PmtStream {
    pub fn is_private_data(&self) -> bool {
        self.stream_type == stream_type::PES_PRIVATE_DATA
    }

    pub fn is_caption(&self) -> bool {
        self.is_private_data()
            && self
                .component_tag
                .is_some_and(|tag| CAPTION_COMPONENT_TAGS.contains(&tag))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PmtTable {
    pub program_number: u16,
    pub version: u8,
    pub pcr_pid: u16,
    pub streams: Vec<PmtStream>,
}

impl PmtTable {
    pub fn parse(section: &PsiSection) -> Result<Self> {
        if section.header.table_id != table_id::PMT {
            return Err(Error::Section(format!(
                "expected a PMT, got table 0x{:02X}",
                section.header.table_id
            )));
        }

        let body = section.body;
        if body.len() < 4 {
            return Err(Error::truncated(4, body.len()));
        }
        let pcr_pid = pid_at(body, 0);
        let mut rest = body
            .get(4 + length_at(body, 2)..)
            .ok_or_else(|| Error::truncated(4 + length_at(body, 2), body.len()))?;

        let mut streams = Vec::new();
        while rest.len() >= ES_ENTRY_LEN {
            let info_end = ES_ENTRY_LEN + length_at(rest, 3);
            let descriptors = rest
                .get(ES_ENTRY_LEN..info_end)
                .ok_or_else(|| Error::truncated(info_end, rest.len()))?;
            streams.push(PmtStream {
                stream_type: rest[0],
                elementary_pid: pid_at(rest, 1),
                component_tag: component_tag(descriptors),
            });
            rest = &rest[info_end..];
        }

        Ok(PmtTable {
            program_number: section.header.id_extension,
            version: section.header.version,
            pcr_pid,
            streams,
        })
    }

    /// A tagged caption stream if there is one, else the first untagged
    /// private-data stream.
    pub fn caption_pid(&self) -> Option<u16> {
        let tagged = self.streams.iter().find(|s| s.is_caption());
        tagged
            .or_else(|| {
                self.streams
                    .iter()
                    .find(|s| s.is_private_data() && s.component_tag.is_none())
            })
            .map(|s| s.elementary_pid)
    }
}

fn component_tag(mut descriptors: &[u8]) -> Option<u8> {
    while let [tag, length, tail @ ..] = descriptors {
        let body = tail.get(..*length as usize)?;
        if *tag == descriptor_tag::STREAM_IDENTIFIER {
            if let Some(&component) = body.first() {
                return Some(component);
            }
        }
        descriptors = &tail[body.len()..];
    }
    None
}
