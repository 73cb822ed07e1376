use super::measure::TextMetrics;

/// Every character advances by the same number of pixels.
pub(crate) struct FixedAdvance {
    advance: u32,
    line_height: u32,
}

impl FixedAdvance {
    pub(crate) fn new(advance: u32, line_height: u32) -> Self {
        Self {
            advance,
            line_height,
        }
    }
}

impl TextMetrics for FixedAdvance {
    fn text_width(&self, text: &str) -> u32 {
        (text.chars().count() as u32).saturating_mul(self.advance)
    }

    fn line_height(&self) -> u32 {
        self.line_height
    }
}
