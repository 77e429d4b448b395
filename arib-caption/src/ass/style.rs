use std::fmt;

/// Font size the Default style is drawn at.
const REFERENCE_FONT_SIZE: u32 = 36;

/// Style a region is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontClass {
    Default,
    Half,
    Rubi,
    Highlight,
}

impl FontClass {
    /// Pick a style from the glyph box, given in script coordinates.
    pub fn classify(font_width: u32, font_height: u32, highlight: bool) -> Self {
        if highlight {
            FontClass::Highlight
        } else if font_height.saturating_mul(2) <= REFERENCE_FONT_SIZE {
            FontClass::Rubi
        } else if font_width.saturating_mul(2) <= font_height {
            FontClass::Half
        } else {
            FontClass::Default
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FontClass::Default => "Default",
            FontClass::Half => "Half",
            FontClass::Rubi => "Rubi",
            FontClass::Highlight => "Highlight",
        }
    }
}

impl fmt::Display for FontClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(FontClass::classify(36, 36, false), FontClass::Default);
        assert_eq!(FontClass::classify(18, 36, false), FontClass::Half);
        assert_eq!(FontClass::classify(18, 18, false), FontClass::Rubi);
        assert_eq!(FontClass::classify(9, 18, false), FontClass::Rubi);
        assert_eq!(FontClass::classify(18, 18, true), FontClass::Highlight);
        assert_eq!(FontClass::classify(72, 72, false), FontClass::Default);
        assert_eq!(FontClass::classify(u32::MAX, u32::MAX, false), FontClass::Default);
    }

    #[test]
    fn test_display() {
        assert_eq!(FontClass::Half.to_string(), "Half");
    }
}
