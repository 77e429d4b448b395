//! Positioned caption text produced by one decode cycle.

/// Flashing phase set by FLC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    /// Starts lit.
    Normal,
    /// Starts dark.
    Reverse,
}

/// One run of characters sharing position and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub text: String,
    /// Left edge of the first character cell, in plane pixels.
    pub x: i32,
    /// Bottom edge of the character row, in plane pixels.
    pub y: i32,
    pub font_width: u32,
    pub font_height: u32,
    pub horizontal_spacing: u32,
    pub vertical_spacing: u32,
    /// Foreground colour as 0xRRGGBB.
    pub foreground: u32,
    pub blink: Option<BlinkPhase>,
    pub highlight: bool,
}

impl Region {
    /// True when there is nothing visible to show.
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    /// Top-left corner of the first character cell.
    pub fn top_left(&self) -> (i32, i32) {
        let cell_h = self.font_height.saturating_add(self.vertical_spacing);
        let cell_h = i32::try_from(cell_h).unwrap_or(i32::MAX);
        (self.x, self.y.saturating_sub(cell_h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(text: &str) -> Region {
        Region {
            text: text.to_string(),
            x: 100,
            y: 120,
            font_width: 36,
            font_height: 36,
            horizontal_spacing: 4,
            vertical_spacing: 24,
            foreground: 0xFFFFFF,
            blink: None,
            highlight: false,
        }
    }

    #[test]
    fn test_blank_regions() {
        assert!(region("").is_blank());
        assert!(region("   ").is_blank());
        assert!(region("\u{3000}").is_blank());
        assert!(!region(" a ").is_blank());
    }

    #[test]
    fn test_top_left() {
        assert_eq!(region("x").top_left(), (100, 60));

        let mut tall = region("x");
        tall.font_height = u32::MAX;
        tall.vertical_spacing = 24;
        assert_eq!(tall.top_left(), (100, 120 - i32::MAX));
    }
}
