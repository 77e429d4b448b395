//! Advanced SubStation Alpha script output.

mod emitter;
mod header;
mod style;

pub use emitter::{
    blink_windows, format_timestamp, Cue, EventEmitter, PendingBatch, SubtitleEvent,
    BLINK_INTERVAL,
};
pub use header::{builtin_header, ScriptHeader, PLAY_RES};
pub use style::FontClass;
