//! Data group / data unit framing of the caption PES payload.

use log::{debug, warn};

use super::bits::BitReader;
use super::drcs::{parse_drcs_unit, DrcsCode};
use crate::error::{Error, Result};

/// Data identifier of synchronized PES captions.
pub const DATA_ID_SYNCHRONIZED: u8 = 0x80;
/// Data identifier of asynchronous PES captions.
pub const DATA_ID_ASYNCHRONOUS: u8 = 0x81;
/// Private stream id that must follow the data identifier.
pub const PRIVATE_STREAM_ID: u8 = 0xFF;
/// Separator opening each data unit.
pub const UNIT_SEPARATOR: u8 = 0x1F;

/// Data unit parameters.
pub mod unit_parameter {
    /// Statement body (8-unit code text).
    pub const STATEMENT_BODY: u8 = 0x20;
    /// 1-byte DRCS definitions.
    pub const DRCS_1BYTE: u8 = 0x30;
    /// 2-byte DRCS definitions.
    pub const DRCS_2BYTE: u8 = 0x31;
}

/// Which PES flavour carried the caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionProfile {
    Synchronized,
    Asynchronous,
}

/// Language entry of a caption management group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageInfo {
    pub language_tag: u8,
    pub display_mode: u8,
    pub iso_639: String,
    pub format: u8,
    pub tcs: u8,
    pub rollup_mode: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupBody {
    /// Caption management data (group id 0x00 / 0x20).
    Management {
        time_control_mode: u8,
        languages: Vec<LanguageInfo>,
    },
    /// Caption statement data for one language.
    Statement { language: u8, time_control_mode: u8 },
}

/// Data group header and the record kind it selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataGroup {
    pub profile: CaptionProfile,
    pub group_id: u8,
    pub version: u8,
    pub link_number: u8,
    pub last_link_number: u8,
    pub body: GroupBody,
}

impl DataGroup {
    pub fn is_management(&self) -> bool {
        matches!(self.body, GroupBody::Management { .. })
    }
}

/// One data unit, handed to the caller as soon as it is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataUnit<'a> {
    StatementBody(&'a [u8]),
    Drcs { two_byte: bool, codes: Vec<DrcsCode> },
    Other { parameter: u8, data: &'a [u8] },
}

/// Splits a caption PES payload into data units and collects statement text.
#[derive(Debug, Default)]
pub struct CaptionFramer {
    statement: Vec<u8>,
}

impl CaptionFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statement bytes gathered by the last `frame` call.
    pub fn statement(&self) -> &[u8] {
        &self.statement
    }

    /// Parse one PES payload. Each data unit goes to `on_unit`; statement
    /// bodies are also appended to [`statement`](Self::statement).
    ///
    /// Header errors fail the whole call. A broken unit framing stops the
    /// loop; units already delivered stay delivered. A DRCS unit whose
    /// body does not parse is passed on as [`DataUnit::Other`].
    pub fn frame<F>(&mut self, data: &[u8], mut on_unit: F) -> Result<DataGroup>
    where
        F: FnMut(&DataUnit<'_>),
    {
        self.statement.clear();
        let mut r = BitReader::new(data);

        let profile = match r.read_u8()? {
            DATA_ID_SYNCHRONIZED => CaptionProfile::Synchronized,
            DATA_ID_ASYNCHRONOUS => CaptionProfile::Asynchronous,
            found => {
                return Err(Error::InvalidMarker {
                    what: "data identifier",
                    expected: DATA_ID_SYNCHRONIZED,
                    found,
                })
            }
        };
        let private_stream_id = r.read_u8()?;
        if private_stream_id != PRIVATE_STREAM_ID {
            return Err(Error::InvalidMarker {
                what: "private stream id",
                expected: PRIVATE_STREAM_ID,
                found: private_stream_id,
            });
        }
        r.skip_bits(4)?;
        let header_length = r.read_bits(4)? as usize;
        r.skip_bytes(header_length)?;

        let group_id = r.read_bits(6)? as u8;
        let version = r.read_bits(2)? as u8;
        let link_number = r.read_u8()?;
        let last_link_number = r.read_u8()?;
        let group_size = r.read_u16()? as usize;
        let mut g = BitReader::new(r.read_bytes(group_size)?);

        let body = if group_id & 0x1F == 0 {
            parse_management(&mut g)?
        } else {
            parse_statement(&mut g, group_id & 0x0F)?
        };
        let group = DataGroup {
            profile,
            group_id,
            version,
            link_number,
            last_link_number,
            body,
        };

        let loop_length = g.read_u24()? as usize;
        let units = g.read_bytes(loop_length)?;
        if let Err(e) = self.walk_units(units, &mut on_unit) {
            warn!("[Caption] group 0x{:02X}: data unit loop aborted: {}", group_id, e);
        }
        Ok(group)
    }

    fn walk_units<F>(&mut self, units: &[u8], on_unit: &mut F) -> Result<()>
    where
        F: FnMut(&DataUnit<'_>),
    {
        let mut r = BitReader::new(units);
        while r.remaining_bytes() > 0 {
            let separator = r.read_u8()?;
            if separator != UNIT_SEPARATOR {
                return Err(Error::InvalidMarker {
                    what: "unit separator",
                    expected: UNIT_SEPARATOR,
                    found: separator,
                });
            }
            let parameter = r.read_u8()?;
            let size = r.read_u24()? as usize;
            let body = r.read_bytes(size)?;

            let unit = match parameter {
                unit_parameter::STATEMENT_BODY => {
                    self.statement.extend_from_slice(body);
                    DataUnit::StatementBody(body)
                }
                unit_parameter::DRCS_1BYTE | unit_parameter::DRCS_2BYTE => {
                    match parse_drcs_unit(body) {
                        Ok(codes) => DataUnit::Drcs {
                            two_byte: parameter == unit_parameter::DRCS_2BYTE,
                            codes,
                        },
                        Err(e) => {
                            warn!("[Caption] dropping DRCS unit 0x{:02X}: {}", parameter, e);
                            DataUnit::Other {
                                parameter,
                                data: body,
                            }
                        }
                    }
                }
                _ => {
                    debug!("[Caption] skipping data unit 0x{:02X} ({} bytes)", parameter, size);
                    DataUnit::Other {
                        parameter,
                        data: body,
                    }
                }
            };
            on_unit(&unit);
        }
        Ok(())
    }
}

fn parse_management(r: &mut BitReader<'_>) -> Result<GroupBody> {
    let time_control_mode = r.read_bits(2)? as u8;
    r.skip_bits(6)?;
    if time_control_mode == 0b10 {
        // OTM (36 bits) + reserved (4 bits)
        r.skip_bytes(5)?;
    }

    let count = r.read_u8()?;
    let mut languages = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let language_tag = r.read_bits(3)? as u8;
        r.skip_bits(1)?;
        let display_mode = r.read_bits(4)? as u8;
        if (0b1100..=0b1110).contains(&display_mode) {
            // display condition
            r.skip_bytes(1)?;
        }
        let iso = r.read_bytes(3)?;
        let format = r.read_bits(4)? as u8;
        let tcs = r.read_bits(2)? as u8;
        let rollup_mode = r.read_bits(2)? as u8;
        languages.push(LanguageInfo {
            language_tag,
            display_mode,
            iso_639: String::from_utf8_lossy(iso).into_owned(),
            format,
            tcs,
            rollup_mode,
        });
    }

    Ok(GroupBody::Management {
        time_control_mode,
        languages,
    })
}

fn parse_statement(r: &mut BitReader<'_>, language: u8) -> Result<GroupBody> {
    let time_control_mode = r.read_bits(2)? as u8;
    r.skip_bits(6)?;
    if time_control_mode == 0b01 || time_control_mode == 0b10 {
        // STM (36 bits) + reserved (4 bits)
        r.skip_bytes(5)?;
    }
    Ok(GroupBody::Statement {
        language,
        time_control_mode,
    })
}
