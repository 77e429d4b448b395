//! Settings for one conversion run.

use std::path::PathBuf;

use crate::ass::BLINK_INTERVAL;

/// Default script header override, looked up in the working directory.
pub const DEFAULT_HEADER_FILE: &str = "assheader.ini";
/// Default glyph export directory.
pub const DEFAULT_DATA_DIR: &str = "data";
/// Default DRCS conversion table.
pub const DEFAULT_CONVERSION_TABLE: &str = "drcs_conv.ini";

/// Built once from the command line and config file, then passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Script header used instead of the built-in one, if the file exists.
    pub header_file: PathBuf,
    /// Where unknown DRCS glyphs are exported.
    pub data_dir: PathBuf,
    /// Hash to code point table for known glyphs.
    pub conversion_table: PathBuf,
    /// Flash period in 90 kHz ticks.
    pub blink_interval: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            header_file: PathBuf::from(DEFAULT_HEADER_FILE),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            conversion_table: PathBuf::from(DEFAULT_CONVERSION_TABLE),
            blink_interval: BLINK_INTERVAL,
        }
    }
}
