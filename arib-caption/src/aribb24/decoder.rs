//! 8-unit code state machine.

use log::trace;

use super::charset::{self, GraphicSet, CLUT, DEFAULT_MACROS, GETA};
use super::{CaptionDecoder, DecodedCaption};
use crate::glyph::GlyphRef;
use crate::region::{BlinkPhase, Region};

type Input<'a> = std::iter::Copied<std::slice::Iter<'a, u8>>;

/// Macros may invoke macros; stop at this depth.
const MAX_MACRO_DEPTH: u8 = 2;

const DEFAULT_PLANE: (u32, u32) = (960, 540);
const DEFAULT_FONT_SIZE: u32 = 36;
const DEFAULT_HORIZONTAL_SPACING: u32 = 4;
const DEFAULT_VERTICAL_SPACING: u32 = 24;
/// Upper bound on CSI numeric parameters; larger values are clamped.
const MAX_CSI_PARAM: u32 = 0xFFFF;

mod c0 {
    pub const NUL: u8 = 0x00;
    pub const BEL: u8 = 0x07;
    pub const APB: u8 = 0x08;
    pub const APF: u8 = 0x09;
    pub const APD: u8 = 0x0A;
    pub const APU: u8 = 0x0B;
    pub const CS: u8 = 0x0C;
    pub const APR: u8 = 0x0D;
    pub const LS1: u8 = 0x0E;
    pub const LS0: u8 = 0x0F;
    pub const PAPF: u8 = 0x16;
    pub const CAN: u8 = 0x18;
    pub const SS2: u8 = 0x19;
    pub const ESC: u8 = 0x1B;
    pub const APS: u8 = 0x1C;
    pub const SS3: u8 = 0x1D;
}

mod c1 {
    pub const SSZ: u8 = 0x88;
    pub const MSZ: u8 = 0x89;
    pub const NSZ: u8 = 0x8A;
    pub const SZX: u8 = 0x8B;
    pub const COL: u8 = 0x90;
    pub const FLC: u8 = 0x91;
    pub const CDC: u8 = 0x92;
    pub const POL: u8 = 0x93;
    pub const WMM: u8 = 0x94;
    pub const MACRO: u8 = 0x95;
    pub const HLC: u8 = 0x97;
    pub const RPC: u8 = 0x98;
    pub const SPL: u8 = 0x99;
    pub const STL: u8 = 0x9A;
    pub const CSI: u8 = 0x9B;
    pub const TIME: u8 = 0x9D;
}

mod csi {
    pub const SWF: u8 = 0x53;
    pub const SDF: u8 = 0x56;
    pub const SSM: u8 = 0x57;
    pub const SHS: u8 = 0x58;
    pub const SVS: u8 = 0x59;
    pub const SDP: u8 = 0x5F;
    pub const ACPS: u8 = 0x61;
}

/// Character size selected by SSZ/MSZ/NSZ/SZX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharSize {
    Small,
    Middle,
    Normal,
    DoubleHeight,
    DoubleWidth,
    DoubleSize,
}

impl CharSize {
    /// (width numerator, width denominator, height numerator, height denominator)
    fn scale(self) -> (u32, u32, u32, u32) {
        match self {
            CharSize::Small => (1, 2, 1, 2),
            CharSize::Middle => (1, 2, 1, 1),
            CharSize::Normal => (1, 1, 1, 1),
            CharSize::DoubleHeight => (1, 1, 2, 1),
            CharSize::DoubleWidth => (2, 1, 1, 1),
            CharSize::DoubleSize => (2, 1, 2, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Area {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

/// Decoder for ARIB STD-B24 caption statements.
#[derive(Debug, Clone)]
pub struct AribDecoder {
    g: [GraphicSet; 4],
    gl: usize,
    gr: usize,
    single_shift: Option<usize>,

    plane: (u32, u32),
    area: Area,
    font_width: u32,
    font_height: u32,
    horizontal_spacing: u32,
    vertical_spacing: u32,
    size: CharSize,
    x: i32,
    y: i32,

    foreground: u32,
    blink: Option<BlinkPhase>,
    highlight: bool,
    repeat: Option<u32>,
    control_time: u32,

    regions: Vec<Region>,
    current: Option<Region>,
    /// Where the next character must land to extend `current`.
    next_x: i32,
}

impl Default for AribDecoder {
    fn default() -> Self {
        let mut decoder = Self {
            g: [
                GraphicSet::Kanji,
                GraphicSet::Alphanumeric,
                GraphicSet::Hiragana,
                GraphicSet::Macro,
            ],
            gl: 0,
            gr: 2,
            single_shift: None,
            plane: DEFAULT_PLANE,
            area: Area {
                x: 0,
                y: 0,
                width: DEFAULT_PLANE.0 as i32,
                height: DEFAULT_PLANE.1 as i32,
            },
            font_width: DEFAULT_FONT_SIZE,
            font_height: DEFAULT_FONT_SIZE,
            horizontal_spacing: DEFAULT_HORIZONTAL_SPACING,
            vertical_spacing: DEFAULT_VERTICAL_SPACING,
            size: CharSize::Normal,
            x: 0,
            y: 0,
            foreground: CLUT[7],
            blink: None,
            highlight: false,
            repeat: None,
            control_time: 0,
            regions: Vec::new(),
            current: None,
            next_x: 0,
        };
        decoder.home();
        decoder
    }
}

impl AribDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn run(&mut self, data: &[u8], glyphs: &[GlyphRef], depth: u8) {
        let mut input = data.iter().copied();
        while let Some(b) = input.next() {
            match b {
                0x00..=0x1F => self.control(b, &mut input),
                0x20 | 0x7F | 0xA0 | 0xFF => self.space(),
                0x21..=0x7E => {
                    let index = self.single_shift.take().unwrap_or(self.gl);
                    self.graphic(self.g[index], b, &mut input, glyphs, depth);
                }
                0x80..=0x9F => self.extended_control(b, &mut input),
                _ => self.graphic(self.g[self.gr], b & 0x7F, &mut input, glyphs, depth),
            }
        }
    }

    // ---- geometry ----

    fn scaled_metrics(&self) -> (u32, u32, u32, u32) {
        let (wn, wd, hn, hd) = self.size.scale();
        (
            self.font_width * wn / wd,
            self.font_height * hn / hd,
            self.horizontal_spacing * wn / wd,
            self.vertical_spacing * hn / hd,
        )
    }

    fn cell_size(&self) -> (i32, i32) {
        let (fw, fh, hs, vs) = self.scaled_metrics();
        (
            to_i32(fw.saturating_add(hs)).max(1),
            to_i32(fh.saturating_add(vs)).max(1),
        )
    }

    fn area_right(&self) -> i32 {
        self.area.x.saturating_add(self.area.width)
    }

    /// First cell of the display area.
    fn home(&mut self) {
        let (_, cell_h) = self.cell_size();
        self.x = self.area.x;
        self.y = self.area.y.saturating_add(cell_h);
    }

    fn set_position(&mut self, row: u8, column: u8) {
        let (cell_w, cell_h) = self.cell_size();
        self.x = self
            .area
            .x
            .saturating_add(i32::from(column).saturating_mul(cell_w));
        self.y = self
            .area
            .y
            .saturating_add((i32::from(row) + 1).saturating_mul(cell_h));
    }

    fn advance(&mut self) {
        let (cell_w, cell_h) = self.cell_size();
        self.x = self.x.saturating_add(cell_w);
        if self.x.saturating_add(cell_w) > self.area_right() {
            self.x = self.area.x;
            self.y = self.y.saturating_add(cell_h);
        }
    }

    fn backspace(&mut self) {
        let (cell_w, cell_h) = self.cell_size();
        self.x = self.x.saturating_sub(cell_w);
        if self.x < self.area.x {
            let columns = (self.area.width / cell_w).max(1);
            self.x = self.area.x.saturating_add((columns - 1).saturating_mul(cell_w));
            self.y = self.y.saturating_sub(cell_h);
        }
    }

    fn new_line(&mut self) {
        let (_, cell_h) = self.cell_size();
        self.x = self.area.x;
        self.y = self.y.saturating_add(cell_h);
    }

    // ---- output ----

    fn space(&mut self) {
        if self.size == CharSize::Normal {
            self.put_char('\u{3000}');
        } else {
            self.put_char(' ');
        }
    }

    fn put_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.put(c.encode_utf8(&mut buf));
    }

    /// Write one cell of text at the cursor, honouring a pending RPC.
    fn put(&mut self, text: &str) {
        let count = match self.repeat.take() {
            None => 1,
            Some(0) => {
                let (cell_w, _) = self.cell_size();
                (self.area_right().saturating_sub(self.x) / cell_w).max(1) as u32
            }
            Some(n) => n,
        };
        for _ in 0..count {
            self.put_cell(text);
        }
    }

    fn put_cell(&mut self, text: &str) {
        let (cell_w, cell_h) = self.cell_size();
        if self.x.saturating_add(cell_w) > self.area_right() && self.x > self.area.x {
            self.x = self.area.x;
            self.y = self.y.saturating_add(cell_h);
        }

        let template = self.region_template();
        let extends = match &self.current {
            Some(current) => self.next_x == self.x && same_style(current, &template),
            None => false,
        };
        if !extends {
            self.flush_region();
            self.current = Some(template);
        }
        if let Some(current) = self.current.as_mut() {
            current.text.push_str(text);
        }
        self.next_x = self.x.saturating_add(cell_w);
        self.advance();
    }

    /// Occupy a cell without writing anything.
    fn skip_cell(&mut self) {
        self.repeat = None;
        self.advance();
    }

    fn region_template(&self) -> Region {
        let (fw, fh, hs, vs) = self.scaled_metrics();
        Region {
            text: String::new(),
            x: self.x,
            y: self.y,
            font_width: fw,
            font_height: fh,
            horizontal_spacing: hs,
            vertical_spacing: vs,
            foreground: self.foreground,
            blink: self.blink,
            highlight: self.highlight,
        }
    }

    fn flush_region(&mut self) {
        if let Some(region) = self.current.take() {
            if !region.is_blank() {
                self.regions.push(region);
            }
        }
    }

    // ---- graphic sets ----

    fn graphic(
        &mut self,
        set: GraphicSet,
        c: u8,
        input: &mut Input<'_>,
        glyphs: &[GlyphRef],
        depth: u8,
    ) {
        match set {
            GraphicSet::Kanji | GraphicSet::AdditionalSymbols => {
                let Some(c2) = input.next() else { return };
                self.put_char(charset::kanji(c, c2 & 0x7F));
            }
            GraphicSet::Alphanumeric => self.put_char(charset::alphanumeric(c)),
            GraphicSet::Hiragana => self.put_char(charset::hiragana(c)),
            GraphicSet::Katakana => self.put_char(charset::katakana(c)),
            GraphicSet::JisX0201Katakana => self.put_char(charset::jis_x0201_katakana(c)),
            GraphicSet::Mosaic => self.skip_cell(),
            GraphicSet::Drcs(0) => {
                let Some(c2) = input.next() else { return };
                let c2 = c2 & 0x7F;
                self.put_drcs(u16::from(c) << 8 | u16::from(c2), c2, glyphs);
            }
            GraphicSet::Drcs(n) => {
                self.put_drcs(u16::from(0x40 + n) << 8 | u16::from(c), c, glyphs);
            }
            GraphicSet::Macro => {
                if !(0x60..=0x6F).contains(&c) {
                    trace!("[Caption] undefined macro 0x{:02X}", c);
                } else if depth < MAX_MACRO_DEPTH {
                    self.run(DEFAULT_MACROS[(c - 0x60) as usize], glyphs, depth + 1);
                }
            }
        }
    }

    fn put_drcs(&mut self, code: u16, low: u8, glyphs: &[GlyphRef]) {
        let glyph = glyphs
            .iter()
            .find(|g| g.character_code == code)
            .or_else(|| low.checked_sub(0x21).and_then(|i| glyphs.get(i as usize)));

        match glyph {
            Some(GlyphRef {
                replacement: Some(c),
                ..
            }) => self.put_char(*c),
            Some(glyph) => {
                let text = format!("{{drcs:{}}}{}", glyph.hash, GETA);
                self.put(&text);
            }
            None => {
                trace!("[Caption] no glyph for DRCS 0x{:04X}", code);
                self.put_char(GETA);
            }
        }
    }

    // ---- control functions ----

    fn control(&mut self, b: u8, input: &mut Input<'_>) {
        match b {
            c0::NUL | c0::BEL | c0::CAN => {}
            c0::APB => self.backspace(),
            c0::APF => self.advance(),
            c0::APD => self.y += self.cell_size().1,
            c0::APU => self.y -= self.cell_size().1,
            c0::CS => {
                self.current = None;
                self.regions.clear();
                self.home();
            }
            c0::APR => self.new_line(),
            c0::LS1 => self.gl = 1,
            c0::LS0 => self.gl = 0,
            c0::PAPF => {
                if let Some(p1) = input.next() {
                    for _ in 0..p1.saturating_sub(0x40) {
                        self.advance();
                    }
                }
            }
            c0::SS2 => self.single_shift = Some(2),
            c0::SS3 => self.single_shift = Some(3),
            c0::ESC => self.escape(input),
            c0::APS => {
                if let (Some(p1), Some(p2)) = (input.next(), input.next()) {
                    self.set_position(p1.saturating_sub(0x40), p2.saturating_sub(0x40));
                }
            }
            other => trace!("[Caption] ignoring C0 0x{:02X}", other),
        }
    }

    fn escape(&mut self, input: &mut Input<'_>) {
        let Some(b) = input.next() else { return };
        match b {
            0x6E => self.gl = 2,
            0x6F => self.gl = 3,
            0x7E => self.gr = 1,
            0x7D => self.gr = 2,
            0x7C => self.gr = 3,
            0x28..=0x2B => {
                let index = (b - 0x28) as usize;
                match input.next() {
                    Some(0x20) => self.designate(index, input.next(), GraphicSet::from_drcs_final),
                    f => self.designate(index, f, GraphicSet::from_single_byte_final),
                }
            }
            0x24 => match input.next() {
                Some(i @ 0x28..=0x2B) => {
                    let index = (i - 0x28) as usize;
                    match input.next() {
                        Some(0x20) => {
                            self.designate(index, input.next(), GraphicSet::from_drcs_final)
                        }
                        f => self.designate(index, f, GraphicSet::from_double_byte_final),
                    }
                }
                f => self.designate(0, f, GraphicSet::from_double_byte_final),
            },
            other => trace!("[Caption] ignoring ESC 0x{:02X}", other),
        }
    }

    fn designate(&mut self, index: usize, f: Option<u8>, map: fn(u8) -> Option<GraphicSet>) {
        match f.and_then(map) {
            Some(set) => self.g[index] = set,
            None => trace!("[Caption] unknown designation {:?} for G{}", f, index),
        }
    }

    fn extended_control(&mut self, b: u8, input: &mut Input<'_>) {
        match b {
            0x80..=0x87 => self.foreground = CLUT[(b - 0x80) as usize],
            c1::SSZ => self.size = CharSize::Small,
            c1::MSZ => self.size = CharSize::Middle,
            c1::NSZ => self.size = CharSize::Normal,
            c1::SZX => match input.next() {
                Some(0x60) => self.size = CharSize::Small,
                Some(0x41) => self.size = CharSize::DoubleHeight,
                Some(0x44) => self.size = CharSize::DoubleWidth,
                Some(0x45) => self.size = CharSize::DoubleSize,
                other => trace!("[Caption] SZX {:?}", other),
            },
            c1::COL => match input.next() {
                Some(0x20) => {
                    input.next();
                }
                Some(p1 @ 0x40..=0x4F) => self.foreground = CLUT[(p1 & 0x0F) as usize],
                _ => {}
            },
            c1::FLC => match input.next() {
                Some(0x40) => self.blink = Some(BlinkPhase::Normal),
                Some(0x47) => self.blink = Some(BlinkPhase::Reverse),
                Some(0x4F) => self.blink = None,
                _ => {}
            },
            c1::CDC => {
                if input.next() == Some(0x20) {
                    input.next();
                }
            }
            c1::POL | c1::WMM => {
                input.next();
            }
            c1::MACRO => {
                // Macro definitions run until MACRO 0x4F.
                if input.next() != Some(0x4F) {
                    let mut prev = 0u8;
                    for b in input.by_ref() {
                        if prev == c1::MACRO && b == 0x4F {
                            break;
                        }
                        prev = b;
                    }
                }
            }
            c1::HLC => {
                if let Some(p1) = input.next() {
                    self.highlight = p1 & 0x0F != 0;
                }
            }
            c1::RPC => {
                if let Some(p1) = input.next() {
                    self.repeat = Some(u32::from(p1.saturating_sub(0x40)));
                }
            }
            c1::SPL | c1::STL => {}
            c1::CSI => self.control_sequence(input),
            c1::TIME => match input.next() {
                Some(0x20) => {
                    if let Some(p2) = input.next() {
                        self.control_time = self
                            .control_time
                            .saturating_add(u32::from(p2.saturating_sub(0x40)));
                    }
                }
                Some(0x28) => {
                    input.next();
                }
                Some(0x29) => {
                    for b in input.by_ref() {
                        if (0x40..=0x43).contains(&b) {
                            break;
                        }
                    }
                }
                _ => {}
            },
            other => trace!("[Caption] ignoring C1 0x{:02X}", other),
        }
    }

    fn control_sequence(&mut self, input: &mut Input<'_>) {
        let mut params: Vec<u32> = Vec::new();
        let mut value: Option<u32> = None;

        let final_byte = loop {
            let Some(b) = input.next() else { return };
            match b {
                b'0'..=b'9' => {
                    let digit = u32::from(b - b'0');
                    value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit));
                }
                b';' => params.push(value.take().unwrap_or(0)),
                0x20 => {
                    params.extend(value.take());
                    match input.next() {
                        Some(f) => break f,
                        None => return,
                    }
                }
                other => {
                    params.extend(value.take());
                    break other;
                }
            }
        };
        for param in params.iter_mut() {
            *param = (*param).min(MAX_CSI_PARAM);
        }

        match (final_byte, params.as_slice()) {
            (csi::SWF, [format, ..]) => {
                let plane = match format {
                    5 => Some((1920, 1080)),
                    7 => Some((960, 540)),
                    9 => Some((720, 480)),
                    _ => None,
                };
                if let Some((w, h)) = plane {
                    self.plane = (w, h);
                    self.area = Area {
                        x: 0,
                        y: 0,
                        width: w as i32,
                        height: h as i32,
                    };
                    self.home();
                }
            }
            (csi::SDF, [w, h, ..]) => {
                self.area.width = *w as i32;
                self.area.height = *h as i32;
                self.home();
            }
            (csi::SDP, [x, y, ..]) => {
                self.area.x = *x as i32;
                self.area.y = *y as i32;
                self.home();
            }
            (csi::SSM, [w, h, ..]) => {
                self.font_width = *w;
                self.font_height = *h;
            }
            (csi::SHS, [s, ..]) => self.horizontal_spacing = *s,
            (csi::SVS, [s, ..]) => self.vertical_spacing = *s,
            (csi::ACPS, [x, y, ..]) => {
                self.x = *x as i32;
                self.y = *y as i32;
            }
            (f, p) => trace!("[Caption] ignoring CSI 0x{:02X} {:?}", f, p),
        }
    }
}

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

fn same_style(a: &Region, b: &Region) -> bool {
    a.y == b.y
        && a.font_width == b.font_width
        && a.font_height == b.font_height
        && a.horizontal_spacing == b.horizontal_spacing
        && a.vertical_spacing == b.vertical_spacing
        && a.foreground == b.foreground
        && a.blink == b.blink
        && a.highlight == b.highlight
}

/// Region texts joined with a line break wherever the row changes.
fn join_text(regions: &[Region]) -> String {
    let mut text = String::new();
    let mut last_y = None;
    for region in regions {
        if last_y.is_some_and(|y| y != region.y) {
            text.push('\n');
        }
        text.push_str(&region.text);
        last_y = Some(region.y);
    }
    text
}

impl CaptionDecoder for AribDecoder {
    fn decode(&mut self, data: &[u8], glyphs: &[GlyphRef]) -> DecodedCaption {
        self.reset();
        self.run(data, glyphs, 0);
        self.flush_region();

        let regions = std::mem::take(&mut self.regions);
        DecodedCaption {
            text: join_text(&regions),
            regions,
            control_time: self.control_time,
            plane: self.plane,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(data: &[u8]) -> DecodedCaption {
        AribDecoder::new().decode(data, &[])
    }

    #[test]
    fn test_alphanumeric_after_locking_shift() {
        let caption = decode(b"\x0eTEST");
        assert_eq!(caption.text, "TEST");
        assert_eq!(caption.regions.len(), 1);
        let region = &caption.regions[0];
        assert_eq!((region.x, region.y), (0, 60));
        assert_eq!((region.font_width, region.font_height), (36, 36));
        assert_eq!(region.foreground, 0xFFFFFF);
    }

    #[test]
    fn test_default_sets() {
        // G0 kanji in GL, G2 hiragana in GR
        assert_eq!(decode(&[0x46, 0x7C]).text, "日");
        assert_eq!(decode(&[0xA2, 0xA4]).text, "あい");
    }

    #[test]
    fn test_active_position_set() {
        let caption = decode(&[0x1C, 0x41, 0x42, 0x0E, b'A']);
        let region = &caption.regions[0];
        assert_eq!((region.x, region.y), (80, 120));
    }

    #[test]
    fn test_colour_change_splits_region() {
        let caption = decode(b"\x0eAB\x81CD");
        assert_eq!(caption.regions.len(), 2);
        assert_eq!(caption.regions[0].text, "AB");
        assert_eq!(caption.regions[1].text, "CD");
        assert_eq!(caption.regions[1].foreground, 0xFF0000);
        assert_eq!(caption.regions[1].x, 80);
        assert_eq!(caption.text, "ABCD");
    }

    #[test]
    fn test_carriage_return_starts_new_row() {
        let caption = decode(b"\x0eAB\x0dCD");
        assert_eq!(caption.regions.len(), 2);
        assert_eq!(caption.regions[1].y, 120);
        assert_eq!(caption.text, "AB\nCD");
    }

    #[test]
    fn test_csi_font_size_and_absolute_position() {
        let mut data = vec![0x9B];
        data.extend_from_slice(b"24;24 W");
        data.push(0x9B);
        data.extend_from_slice(b"100;200 a");
        data.extend_from_slice(b"\x0eX");
        let caption = decode(&data);
        let region = &caption.regions[0];
        assert_eq!((region.x, region.y), (100, 200));
        assert_eq!((region.font_width, region.font_height), (24, 24));
    }

    #[test]
    fn test_writing_format() {
        let mut data = vec![0x9B];
        data.extend_from_slice(b"5 S");
        assert_eq!(decode(&data).plane, (1920, 1080));
        assert_eq!(decode(b"").plane, (960, 540));
    }

    #[test]
    fn test_time_control() {
        let caption = decode(&[0x9D, 0x20, 0x4A, 0x0E, b'A']);
        assert_eq!(caption.control_time, 10);
        assert_eq!(caption.display_duration(), 90_000);
        assert_eq!(caption.text, "A");
    }

    #[test]
    fn test_drcs_lookup() {
        let glyphs = vec![
            GlyphRef {
                character_code: 0x4121,
                hash: "0123456789abcdef0123456789abcdef".into(),
                replacement: Some('\u{2661}'),
            },
            GlyphRef {
                character_code: 0x4122,
                hash: "fedcba9876543210fedcba9876543210".into(),
                replacement: None,
            },
        ];
        // G0 <- DRCS-1
        let data = [0x1B, 0x28, 0x20, 0x41, 0x21, 0x22, 0x25];
        let caption = AribDecoder::new().decode(&data, &glyphs);
        assert_eq!(
            caption.text,
            "\u{2661}{drcs:fedcba9876543210fedcba9876543210}\u{3013}\u{3013}"
        );
    }

    #[test]
    fn test_default_macro_restores_designations() {
        // G1 <- katakana, then macro 0x60 via SS3 puts alphanumerics back
        let caption = decode(&[0x1B, 0x29, 0x31, 0x1D, 0x60, 0x0E, b'A']);
        assert_eq!(caption.text, "A");

        let caption = decode(&[0x1B, 0x29, 0x31, 0x0E, b'A']);
        assert_eq!(caption.text, "チ");
    }

    #[test]
    fn test_flashing_and_highlight() {
        let caption = decode(&[0x91, 0x40, 0x0E, b'A', 0x91, 0x4F, 0x97, 0x4F, b'B']);
        assert_eq!(caption.regions.len(), 2);
        assert_eq!(caption.regions[0].blink, Some(BlinkPhase::Normal));
        assert!(!caption.regions[0].highlight);
        assert_eq!(caption.regions[1].blink, None);
        assert!(caption.regions[1].highlight);
    }

    #[test]
    fn test_spaces_only_produce_no_region() {
        assert!(decode(&[0x20, 0x20]).regions.is_empty());
        assert!(decode(&[0x89, 0x20]).regions.is_empty());
    }

    #[test]
    fn test_repeat_character() {
        assert_eq!(decode(&[0x98, 0x43, 0x0E, b'A']).text, "AAA");
    }

    #[test]
    fn test_middle_size_halves_width() {
        let caption = decode(&[0x89, 0x0E, b'A', b'B']);
        let region = &caption.regions[0];
        assert_eq!(region.text, "AB");
        assert_eq!((region.font_width, region.font_height), (18, 36));
        assert_eq!(region.horizontal_spacing, 2);
    }

    #[test]
    fn test_state_does_not_leak_between_statements() {
        let mut decoder = AribDecoder::new();
        decoder.decode(&[0x81, 0x9D, 0x20, 0x45, 0x0E, b'A'], &[]);
        let caption = decoder.decode(&[0x0E, b'B'], &[]);
        assert_eq!(caption.regions[0].foreground, 0xFFFFFF);
        assert_eq!(caption.control_time, 0);
    }

    #[test]
    fn test_clear_screen_discards_earlier_text() {
        assert_eq!(decode(b"\x0eAB\x0cCD").text, "CD");
    }

    #[test]
    fn test_truncated_input_is_tolerated() {
        assert_eq!(decode(&[0x46]).text, "");
        assert_eq!(decode(&[0x1B]).text, "");
        assert_eq!(decode(&[0x9B, b'1']).text, "");
        assert_eq!(decode(&[0x95, 0x40, 0x0E]).text, "");
    }

    #[test]
    fn test_oversized_csi_parameters_are_clamped() {
        let caption = decode(b"\x9b4294967295;36 W\x0eA");
        assert_eq!(caption.text, "A");
        let region = &caption.regions[0];
        assert_eq!((region.font_width, region.font_height), (MAX_CSI_PARAM, 36));

        let caption = decode(b"\x9b2147483647;100 a\x0eAB");
        assert_eq!(caption.text.replace('\n', ""), "AB");

        let mut data = b"\x9b4294967295;4294967295 V".to_vec();
        data.extend_from_slice(b"\x9b4294967295;4294967295 _");
        data.extend_from_slice(b"\x0eAB\x08\x08C");
        let caption = decode(&data);
        assert!(caption.text.contains('C'));
    }
}
