//! MPEG-TS layer: packet reader, PSI tables and demultiplexer.
//!
//! # Usage
//! ```ignore
//! use arib_caption::ts::{Demultiplexer, PacketReader, PsiTableResolver};
//!
//! let mut reader = PacketReader::new(std::fs::File::open("rec.ts")?);
//! let mut demux = Demultiplexer::new(PsiTableResolver::new());
//! let mut units = Vec::new();
//! while let Some(packet) = reader.read_packet()? {
//!     demux.push(&packet, &mut units)?;
//! }
//! ```

mod demux;
mod packet;
mod pat;
mod pmt;
mod psi;
mod reader;
mod resolver;

pub use demux::{Continuity, DemuxStats, Demultiplexer, PidState};
pub use packet::{AdaptationField, TsHeader, TsPacket, SYNC_BYTE, TS_PACKET_SIZE};
pub use pat::{PatEntry, PatTable};
pub use pmt::{PmtStream, PmtTable, CAPTION_COMPONENT_TAGS};
pub use psi::{crc32_mpeg2, PsiHeader, PsiSection, SectionCollector};
pub use reader::{PacketReader, READ_CHUNK_SIZE};
pub use resolver::{ProgramTargets, PsiTableResolver, TableResolver};

/// Fixed PIDs.
pub mod pid {
    pub const PAT: u16 = 0x0000;
    /// Stuffing packets, dropped unseen.
    pub const NULL: u16 = 0x1FFF;
}

pub mod table_id {
    pub const PAT: u8 = 0x00;
    pub const PMT: u8 = 0x02;
}

/// Descriptor tags used in PSI tables.
pub mod descriptor_tag {
    /// Stream identifier descriptor (carries the component tag).
    pub const STREAM_IDENTIFIER: u8 = 0x52;
}
