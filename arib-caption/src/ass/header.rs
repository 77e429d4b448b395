use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::{info, warn};

/// Script resolution the built-in header declares.
pub const PLAY_RES: (u32, u32) = (960, 540);

const FONT_NAME: &str = "ＭＳ　ゴシック";

/// Everything written before the first Dialogue line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptHeader {
    Builtin,
    /// Bytes copied as-is from a user-supplied file.
    Verbatim(Vec<u8>),
}

impl Default for ScriptHeader {
    fn default() -> Self {
        ScriptHeader::Builtin
    }
}

impl ScriptHeader {
    /// Use the file at `path` if it can be read, the built-in header otherwise.
    pub fn load_or_builtin(path: &Path) -> Self {
        if !path.exists() {
            return ScriptHeader::Builtin;
        }
        match fs::read(path) {
            Ok(bytes) => {
                info!("[ASS] using script header from {}", path.display());
                ScriptHeader::Verbatim(bytes)
            }
            Err(e) => {
                warn!("[ASS] cannot read {}: {}, using built-in header", path.display(), e);
                ScriptHeader::Builtin
            }
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self {
            ScriptHeader::Builtin => out.write_all(builtin_header().as_bytes()),
            ScriptHeader::Verbatim(bytes) => out.write_all(bytes),
        }
    }
}

/// The `[Script Info]`, `[V4+ Styles]` and `[Events]` preamble.
pub fn builtin_header() -> String {
    let mut s = String::new();
    let mut line = |l: &str| {
        s.push_str(l);
        s.push_str("\r\n");
    };

    line("[Script Info]");
    line("; Script generated by arib2ass");
    line("ScriptType: v4.00+");
    line("WrapStyle: 0");
    line(&format!("PlayResX: {}", PLAY_RES.0));
    line(&format!("PlayResY: {}", PLAY_RES.1));
    line("ScaledBorderAndShadow: yes");
    line("Video Aspect Ratio: 0");
    line("Video Zoom: 6");
    line("Video Position: 0");
    line("");
    line("[V4+ Styles]");
    line(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding",
    );
    for (name, size, colours, scale_x, spacing, border) in [
        ("Default", 36, "&H00FFFFFF,&H000000FF,&H00000000,&H00000000", 100, 4, 1),
        ("Half", 36, "&H00FFFFFF,&H000000FF,&H00000000,&H00000000", 50, 4, 1),
        ("Rubi", 18, "&H00FFFFFF,&H000000FF,&H00000000,&H00000000", 100, 2, 1),
        ("Highlight", 36, "&H00000000,&H000000FF,&H00FFFFFF,&H00FFFFFF", 100, 4, 3),
    ] {
        line(&format!(
            "Style: {},{},{},{},0,0,0,0,{},100,{},0,{},2,2,7,0,0,0,0",
            name, FONT_NAME, size, colours, scale_x, spacing, border
        ));
    }
    line("");
    line("[Events]");
    line("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text");
    s
}
