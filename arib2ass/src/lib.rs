//! arib2ass: extract ARIB captions from an ISDB transport stream into an
//! Advanced SubStation Alpha script.
//!
//! The stream work lives in `arib_caption`; this crate adds the command
//! line, configuration, logging, PNG glyph export and the debug log.

pub mod config;
pub mod context;
pub mod debug_log;
pub mod error;
pub mod logging;
pub mod png;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use arib_caption::{AribDecoder, CaptionExtractor, RunSummary};
use log::{info, warn};

pub use config::Settings;
pub use error::{AppError, Result};

use debug_log::DebugLog;
use png::PngExporter;

/// Convert `settings.input`, writing the script to `settings.output`.
///
/// An output file that cannot be created falls back to stdout, and a debug
/// log that cannot be created is skipped. An unreadable input is fatal.
pub fn run(settings: &Settings) -> Result<RunSummary> {
    let input = File::open(&settings.input).map_err(|e| {
        AppError::io(format!("Failed to open {}", settings.input.display()), e)
    })?;
    info!("Reading {}", settings.input.display());

    let output: Box<dyn Write> = match File::create(&settings.output) {
        Ok(file) => {
            info!("Writing {}", settings.output.display());
            Box::new(BufWriter::new(file))
        }
        Err(e) => {
            warn!(
                "Cannot create {}: {}, writing to stdout",
                settings.output.display(),
                e
            );
            Box::new(BufWriter::new(io::stdout()))
        }
    };

    let mut extractor = CaptionExtractor::new(
        BufReader::new(input),
        AribDecoder::new(),
        PngExporter::new(&settings.run.data_dir),
        output,
        &settings.run,
    )?;

    if let Some(path) = &settings.debug_log {
        match DebugLog::create(path) {
            Ok(log) => {
                info!("Debug log {}", path.display());
                extractor = extractor.with_observer(Box::new(log));
            }
            Err(e) => warn!("Cannot create debug log {}: {}", path.display(), e),
        }
    }

    let summary = extractor.run()?;
    info!(
        "{} captions, {} events, {} glyphs exported",
        summary.captions, summary.events, summary.glyphs_exported
    );
    Ok(summary)
}
