use std::fmt;
use std::io::{self, Write};

use log::debug;

use super::header::{ScriptHeader, PLAY_RES};
use super::style::FontClass;
use crate::aribb24::DecodedCaption;
use crate::clock::TICKS_PER_SECOND;
use crate::region::{BlinkPhase, Region};

/// Flash period: 1.5 seconds.
pub const BLINK_INTERVAL: u64 = TICKS_PER_SECOND * 3 / 2;

/// Format 90 kHz ticks as `HH:MM:SS.cc`.
pub fn format_timestamp(ticks: u64) -> String {
    let centis = ticks / (TICKS_PER_SECOND / 100);
    let seconds = centis / 100;
    format!(
        "{:02}:{:02}:{:02}.{:02}",
        seconds / 3600,
        seconds / 60 % 60,
        seconds % 60,
        centis % 100
    )
}

/// Lit windows of a flashing region between `start` and `stop`.
///
/// Each window lasts half an interval. Normal phase lights at `start`,
/// reverse phase half an interval later. No window reaches past `stop`,
/// so a reverse run whose last interval ends within its dark half gets one
/// window fewer than a normal run of the same length.
pub fn blink_windows(start: u64, stop: u64, interval: u64, phase: BlinkPhase) -> Vec<(u64, u64)> {
    if interval == 0 {
        return vec![(start, stop)];
    }
    let on_time = interval / 2;
    let mut t = match phase {
        BlinkPhase::Normal => start,
        BlinkPhase::Reverse => start + on_time,
    };
    let mut windows = Vec::new();
    while t < stop {
        windows.push((t, (t + on_time).min(stop)));
        t += interval;
    }
    windows
}

/// One Dialogue line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEvent {
    pub start: u64,
    pub end: u64,
    pub style: FontClass,
    /// Override tags followed by the text.
    pub body: String,
}

impl fmt::Display for SubtitleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dialogue: 0,{},{},{},,0000,0000,0000,,{}",
            format_timestamp(self.start),
            format_timestamp(self.end),
            self.style,
            self.body
        )
    }
}

/// A region ready to be timed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub style: FontClass,
    pub body: String,
    pub blink: Option<BlinkPhase>,
}

impl Cue {
    /// Build a cue from a region laid out on a `plane`-sized page.
    pub fn from_region(region: &Region, plane: (u32, u32)) -> Self {
        let plane = if plane.0 == 0 || plane.1 == 0 {
            PLAY_RES
        } else {
            plane
        };
        let sx = |v: i64| v * PLAY_RES.0 as i64 / plane.0 as i64;
        let sy = |v: i64| v * PLAY_RES.1 as i64 / plane.1 as i64;

        let (left, top) = region.top_left();
        let font_width = sx(region.font_width as i64) as u32;
        let font_height = sy(region.font_height as i64) as u32;

        let mut body = format!("{{\\pos({},{})", sx(left as i64), sy(top as i64));
        if region.foreground != 0xFFFFFF {
            body.push_str(&colour_tag(region.foreground));
        }
        body.push('}');
        body.push_str(&region.text);

        Self {
            style: FontClass::classify(font_width, font_height, region.highlight),
            body,
            blink: region.blink,
        }
    }
}

/// `\c` override for a 0xRRGGBB colour.
fn colour_tag(rgb: u32) -> String {
    let bgr = (rgb & 0xFF) << 16 | (rgb & 0xFF00) | (rgb >> 16) & 0xFF;
    format!("\\c&H{:06X}&", bgr)
}

/// Cues whose end is the start of the next caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBatch {
    pub start: u64,
    pub cues: Vec<Cue>,
}

/// Writes the script header and timed Dialogue lines.
pub struct EventEmitter<W: Write> {
    out: W,
    blink_interval: u64,
    pending: Option<PendingBatch>,
    events_written: u64,
}

impl<W: Write> EventEmitter<W> {
    /// Write `header` and return an emitter positioned after it.
    pub fn new(mut out: W, header: &ScriptHeader) -> io::Result<Self> {
        header.write_to(&mut out)?;
        Ok(Self {
            out,
            blink_interval: BLINK_INTERVAL,
            pending: None,
            events_written: 0,
        })
    }

    pub fn with_blink_interval(mut self, ticks: u64) -> Self {
        self.blink_interval = ticks;
        self
    }

    /// Emit one decode cycle. `start == stop` means the caption stays
    /// until the next cycle begins.
    pub fn emit(&mut self, start: u64, stop: u64, caption: &DecodedCaption) -> io::Result<()> {
        if let Some(batch) = self.pending.take() {
            let end = start.max(batch.start);
            self.write_batch(batch, end)?;
        }

        let cues: Vec<Cue> = caption
            .regions
            .iter()
            .filter(|r| !r.is_blank())
            .map(|r| Cue::from_region(r, caption.plane))
            .collect();
        if cues.is_empty() {
            return Ok(());
        }

        if start == stop {
            self.pending = Some(PendingBatch { start, cues });
        } else {
            for cue in &cues {
                self.write_cue(start, stop.max(start), cue)?;
            }
        }
        Ok(())
    }

    /// Close any deferred batch at `end` (or at its own start) and flush.
    pub fn finish(&mut self, end: Option<u64>) -> io::Result<()> {
        if let Some(batch) = self.pending.take() {
            let end = end.unwrap_or(batch.start).max(batch.start);
            self.write_batch(batch, end)?;
        }
        self.out.flush()
    }

    pub fn pending(&self) -> Option<&PendingBatch> {
        self.pending.as_ref()
    }

    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_batch(&mut self, batch: PendingBatch, end: u64) -> io::Result<()> {
        for cue in &batch.cues {
            self.write_cue(batch.start, end, cue)?;
        }
        Ok(())
    }

    fn write_cue(&mut self, start: u64, stop: u64, cue: &Cue) -> io::Result<()> {
        let windows = match cue.blink {
            Some(phase) => blink_windows(start, stop, self.blink_interval, phase),
            None => vec![(start, stop)],
        };
        for (start, end) in windows {
            self.write_event(&SubtitleEvent {
                start,
                end,
                style: cue.style,
                body: cue.body.clone(),
            })?;
        }
        Ok(())
    }

    fn write_event(&mut self, event: &SubtitleEvent) -> io::Result<()> {
        debug!("[ASS] {}", event);
        write!(self.out, "{}\r\n", event)?;
        self.events_written += 1;
        Ok(())
    }
}
