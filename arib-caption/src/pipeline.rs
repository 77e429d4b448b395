//! Drives a whole stream from packets to subtitle events.

use std::io::{Read, Write};

use log::{debug, info, warn};

use crate::aribb24::{CaptionDecoder, DecodedCaption};
use crate::ass::{EventEmitter, ScriptHeader};
use crate::caption::{CaptionFramer, DataUnit, DrcsPattern, GroupBody};
use crate::config::RunConfig;
use crate::error::Result;
use crate::glyph::{ConversionTable, GlyphExporter, GlyphStore};
use crate::pes::PesUnit;
use crate::ts::{Demultiplexer, PacketReader, PsiTableResolver};

/// One decoded caption, offered to a [`CycleObserver`].
#[derive(Debug)]
pub struct CycleRecord<'a> {
    /// Start time in ticks since the clock epoch.
    pub start: u64,
    /// Raw statement bytes handed to the decoder.
    pub statement: &'a [u8],
    pub caption: &'a DecodedCaption,
}

/// Receives every decode cycle, e.g. for a debug log.
pub trait CycleObserver {
    fn on_cycle(&mut self, record: &CycleRecord<'_>) -> std::io::Result<()>;
}

/// Counters reported when a run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub packets: u64,
    pub gaps: u64,
    pub captions: u64,
    pub events: u64,
    pub glyphs_exported: u64,
}

/// Reads a transport stream and writes an ASS script.
pub struct CaptionExtractor<R: Read, D, E, W: Write> {
    reader: PacketReader<R>,
    demux: Demultiplexer<PsiTableResolver>,
    framer: CaptionFramer,
    decoder: D,
    glyphs: GlyphStore<E>,
    emitter: EventEmitter<W>,
    observer: Option<Box<dyn CycleObserver>>,
    captions: u64,
    framing_errors: u64,
}

impl<R, D, E, W> CaptionExtractor<R, D, E, W>
where
    R: Read,
    D: CaptionDecoder,
    E: GlyphExporter,
    W: Write,
{
    /// Set up a run. The script header is written to `output` immediately.
    pub fn new(source: R, decoder: D, exporter: E, output: W, config: &RunConfig) -> Result<Self> {
        let header = ScriptHeader::load_or_builtin(&config.header_file);
        let conversion = ConversionTable::load(&config.conversion_table)?;
        let emitter =
            EventEmitter::new(output, &header)?.with_blink_interval(config.blink_interval);

        Ok(Self {
            reader: PacketReader::new(source),
            demux: Demultiplexer::new(PsiTableResolver::new()),
            framer: CaptionFramer::new(),
            decoder,
            glyphs: GlyphStore::new(exporter, conversion),
            emitter,
            observer: None,
            captions: 0,
            framing_errors: 0,
        })
    }

    pub fn with_observer(mut self, observer: Box<dyn CycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Process the whole input and flush everything still pending.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut units = Vec::new();

        while let Some(packet) = self.reader.read_packet()? {
            if let Err(e) = self.demux.push(&packet, &mut units) {
                warn!("[Demux] dropping packet: {}", e);
                continue;
            }
            for unit in units.drain(..) {
                self.handle_unit(unit)?;
            }
        }

        self.demux.finish(&mut units);
        for unit in units.drain(..) {
            self.handle_unit(unit)?;
        }

        let clock = self.demux.clock();
        let end = clock.now().map(|_| clock.elapsed());
        self.emitter.finish(end)?;

        let stats = self.demux.stats();
        if self.demux.caption_pid().is_none() {
            warn!("[Caption] no caption stream found");
        }
        info!(
            "[Demux] {} packets, {} gaps, {} repeated, {} discontinuities, {} transport errors, {} scrambled, {} bytes skipped",
            stats.packets,
            stats.gaps,
            stats.repeated,
            stats.discontinuities,
            stats.transport_errors,
            stats.scrambled,
            self.reader.skipped_bytes()
        );
        if self.framing_errors > 0 {
            info!("[Caption] {} units failed to frame", self.framing_errors);
        }

        Ok(RunSummary {
            packets: stats.packets,
            gaps: stats.gaps,
            captions: self.captions,
            events: self.emitter.events_written(),
            glyphs_exported: self.glyphs.export_count(),
        })
    }

    pub fn glyphs(&self) -> &GlyphStore<E> {
        &self.glyphs
    }

    pub fn emitter(&self) -> &EventEmitter<W> {
        &self.emitter
    }

    pub fn into_output(self) -> W {
        self.emitter.into_inner()
    }

    fn handle_unit(&mut self, unit: PesUnit) -> Result<()> {
        if unit.corrupted {
            debug!("[PES] PID 0x{:04X}: unit hit a continuity gap", unit.pid);
        }
        let start = match unit.pts {
            Some(pts) => pts,
            None if unit.raw_pts.is_some() => {
                warn!("[Caption] caption before the first clock sample, timing it at 0");
                0
            }
            None => {
                warn!("[Caption] caption without PTS, timing it at 0");
                0
            }
        };

        let glyphs = &mut self.glyphs;
        let framed = self.framer.frame(&unit.data, |data_unit| {
            if let DataUnit::Drcs { codes, .. } = data_unit {
                for code in codes {
                    for font in &code.fonts {
                        if let DrcsPattern::Bitmap(glyph) = &font.pattern {
                            glyphs.register(code.character_code, glyph);
                        }
                    }
                }
            }
        });

        let group = match framed {
            Ok(group) => group,
            Err(e) => {
                self.framing_errors += 1;
                warn!("[Caption] PID 0x{:04X}: {}", unit.pid, e);
                self.glyphs.end_cycle();
                return Ok(());
            }
        };
        if let GroupBody::Management { languages, .. } = &group.body {
            for language in languages {
                debug!(
                    "[Caption] language {} ({})",
                    language.language_tag, language.iso_639
                );
            }
        }

        let statement = self.framer.statement();
        if !statement.is_empty() {
            let caption = self.decoder.decode(statement, self.glyphs.cycle_glyphs());
            let stop = start + caption.display_duration();
            debug!("[Caption] {} {:?}", start, caption.text);

            self.emitter.emit(start, stop, &caption)?;
            self.captions += 1;

            if let Some(observer) = self.observer.as_mut() {
                let record = CycleRecord {
                    start,
                    statement,
                    caption: &caption,
                };
                if let Err(e) = observer.on_cycle(&record) {
                    warn!("[Caption] debug log write failed: {}", e);
                }
            }
        }
        self.glyphs.end_cycle();
        Ok(())
    }
}
