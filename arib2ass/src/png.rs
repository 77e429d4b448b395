//! DRCS glyph export as PNG files named by content hash.

use std::fs;
use std::path::{Path, PathBuf};

use arib_caption::GlyphExporter;
use image::{ImageFormat, Rgba, RgbaImage};
use log::{debug, warn};

use crate::error::{AppError, Result};

const BACKGROUND: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0x00]);
const FOREGROUND: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xFF]);

/// Writes `<data_dir>/<hash>.png`, creating the directory on first use.
pub struct PngExporter {
    data_dir: PathBuf,
    dir_ready: bool,
}

impl PngExporter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            dir_ready: false,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, hash: &str) -> PathBuf {
        self.data_dir.join(format!("{}.png", hash))
    }

    /// Encode one glyph. Returns false if the file already exists.
    pub fn save(&mut self, hash: &str, width: u32, height: u32, rows: &[Vec<u8>]) -> Result<bool> {
        let path = self.path_for(hash);
        if path.exists() {
            debug!("[Glyph] {} already on disk", path.display());
            return Ok(false);
        }
        if !self.dir_ready {
            fs::create_dir_all(&self.data_dir).map_err(|e| {
                AppError::io(format!("Failed to create {}", self.data_dir.display()), e)
            })?;
            self.dir_ready = true;
        }

        render(width, height, rows).save_with_format(&path, ImageFormat::Png)?;
        debug!("[Glyph] wrote {}", path.display());
        Ok(true)
    }
}

/// Expand 1-bit MSB-first rows into an RGBA image.
pub fn render(width: u32, height: u32, rows: &[Vec<u8>]) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let lit = rows
            .get(y as usize)
            .and_then(|row| row.get((x / 8) as usize))
            .map(|byte| byte & (0x80 >> (x % 8)) != 0)
            .unwrap_or(false);
        if lit {
            FOREGROUND
        } else {
            BACKGROUND
        }
    })
}

impl GlyphExporter for PngExporter {
    fn write_bitmap(
        &mut self,
        hash: &str,
        width: u32,
        height: u32,
        rows: &[Vec<u8>],
    ) -> arib_caption::Result<bool> {
        self.save(hash, width, height, rows).map_err(|e| {
            warn!("[Glyph] {}", e);
            match e {
                AppError::Io { source, .. } => arib_caption::Error::Io(source),
                other => arib_caption::Error::Glyph(other.to_string()),
            }
        })
    }
}
