//! ARIB STD-B24 caption PES framing: data groups, data units and DRCS.

mod bits;
mod drcs;
mod framer;

pub use bits::BitReader;
pub use drcs::{
    bits_per_pixel, parse_drcs_unit, pattern_len, DrcsCode, DrcsFont, DrcsGlyph, DrcsMode,
    DrcsPattern, GeometricPattern,
};
pub use framer::{
    unit_parameter, CaptionFramer, CaptionProfile, DataGroup, DataUnit, GroupBody, LanguageInfo,
    DATA_ID_ASYNCHRONOUS, DATA_ID_SYNCHRONIZED, PRIVATE_STREAM_ID, UNIT_SEPARATOR,
};
