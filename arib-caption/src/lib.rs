//! ARIB STD-B24 caption extraction from ISDB transport streams.
//!
//! The crate turns a recorded MPEG-2 transport stream into an Advanced
//! SubStation Alpha script:
//!
//! ```text
//! PacketReader -> Demultiplexer -> PesReassembler -> CaptionFramer
//!                      |                                 |
//!                 ClockTracker                       GlyphStore
//!                                                        |
//!                        EventEmitter <- AribDecoder <---+
//! ```
//!
//! # Example
//!
//! ```no_run
//! use arib_caption::{AribDecoder, CaptionExtractor, NullExporter, RunConfig};
//!
//! let input = std::fs::File::open("rec.ts")?;
//! let output = std::fs::File::create("rec.ass")?;
//! let mut extractor = CaptionExtractor::new(
//!     input,
//!     AribDecoder::new(),
//!     NullExporter,
//!     output,
//!     &RunConfig::default(),
//! )?;
//! let summary = extractor.run()?;
//! println!("{} events", summary.events);
//! # Ok::<(), arib_caption::Error>(())
//! ```

pub mod aribb24;
pub mod ass;
pub mod caption;
pub mod clock;
pub mod config;
pub mod error;
pub mod glyph;
pub mod pes;
pub mod pipeline;
pub mod region;
pub mod ts;

pub use aribb24::{AribDecoder, CaptionDecoder, DecodedCaption};
pub use ass::{EventEmitter, FontClass, ScriptHeader, SubtitleEvent};
pub use clock::{ClockTracker, TICKS_PER_SECOND};
pub use config::RunConfig;
pub use error::{Error, Result};
pub use glyph::{ConversionTable, GlyphExporter, GlyphRef, GlyphStore, NullExporter};
pub use pes::{PesReassembler, PesUnit};
pub use pipeline::{CaptionExtractor, CycleObserver, CycleRecord, RunSummary};
pub use region::{BlinkPhase, Region};
