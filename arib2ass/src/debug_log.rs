//! Per-caption debug log (`<input>.asslog`).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use arib_caption::ass::format_timestamp;
use arib_caption::{CycleObserver, CycleRecord};

const BYTES_PER_LINE: usize = 16;

/// Records the decoded text and raw statement of every caption.
pub struct DebugLog<W: Write> {
    out: W,
}

impl DebugLog<BufWriter<File>> {
    pub fn create(path: &Path) -> io::Result<Self> {
        Self::new(BufWriter::new(File::create(path)?), path)
    }
}

impl<W: Write> DebugLog<W> {
    /// Start a log, writing the header block.
    pub fn new(mut out: W, source: &Path) -> io::Result<Self> {
        writeln!(out, "========================================")?;
        writeln!(
            out,
            "arib2ass debug log started {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
        )?;
        writeln!(out, "Log file: {}", source.display())?;
        writeln!(out, "========================================")?;
        Ok(Self { out })
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CycleObserver for DebugLog<W> {
    fn on_cycle(&mut self, record: &CycleRecord<'_>) -> io::Result<()> {
        writeln!(
            self.out,
            "[{}] duration={} text={}",
            format_timestamp(record.start),
            record.caption.control_time,
            record.caption.text.replace('\n', "\\n")
        )?;
        for chunk in record.statement.chunks(BYTES_PER_LINE) {
            let line: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
            writeln!(self.out, "{}", line.join(" "))?;
        }
        self.out.flush()
    }
}
