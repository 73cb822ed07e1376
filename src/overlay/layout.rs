use serde::Serialize;

use super::measure::TextMetrics;
use super::style::{Position, StyleConfig};
use super::wrap::wrap_text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayLine {
    pub text: String,
    pub width: u32,
}

/// Bounding box of all display lines including inter-line spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextBlock {
    pub width: u32,
    pub height: u32,
    pub line_height: u32,
    pub line_spacing: u32,
}

impl TextBlock {
    /// Distance between the tops of two consecutive lines.
    pub fn line_advance(&self) -> u32 {
        self.line_height.saturating_add(self.line_spacing)
    }
}

/// Top-left corner of the text block. Never negative; may lie past the image edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Origin {
    pub x: u32,
    pub y: u32,
}

/// Everything needed to draw a poem, computed before any pixel is touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutPlan {
    pub lines: Vec<DisplayLine>,
    pub block: TextBlock,
    pub origin: Origin,
}

pub fn measure_block<M: TextMetrics + ?Sized>(
    lines: &[String],
    metrics: &M,
    line_spacing: u32,
) -> (Vec<DisplayLine>, TextBlock) {
    let display = lines
        .iter()
        .map(|text| DisplayLine {
            width: metrics.text_width(text),
            text: text.clone(),
        })
        .collect::<Vec<_>>();
    let line_height = metrics.line_height();
    let count = display.len() as u32;
    let width = display.iter().map(|line| line.width).max().unwrap_or(0);
    // Saturates instead of wrapping on huge font sizes or spacing.
    let height = if count == 0 {
        0
    } else {
        count
            .saturating_mul(line_height)
            .saturating_add((count - 1).saturating_mul(line_spacing))
    };
    let block = TextBlock {
        width,
        height,
        line_height,
        line_spacing,
    };
    (display, block)
}

/// Anchors a `block_width` x `block_height` box on a `width` x `height` image.
pub fn place_block(
    width: u32,
    height: u32,
    block_width: u32,
    block_height: u32,
    position: Position,
    margin: u32,
) -> Origin {
    let (w, h) = (width as i64, height as i64);
    let (bw, bh) = (block_width as i64, block_height as i64);
    let m = margin as i64;
    let centered_x = (w - bw).div_euclid(2);
    let centered_y = (h - bh).div_euclid(2);

    let (x, y) = match position {
        Position::Center => (centered_x, centered_y),
        Position::Top => (centered_x, m),
        Position::Bottom => (centered_x, h - bh - m),
        Position::Left => (m, centered_y),
        Position::Right => (w - bw - m, centered_y),
    };
    Origin {
        x: x.max(0) as u32,
        y: y.max(0) as u32,
    }
}

/// Wraps `text` and places the resulting block on a `width` x `height` image.
pub fn plan_layout<M: TextMetrics + ?Sized>(
    width: u32,
    height: u32,
    text: &str,
    style: &StyleConfig,
    metrics: &M,
) -> LayoutPlan {
    let wrapped = wrap_text(text, style.max_line_width(width), metrics);
    let (lines, block) = measure_block(&wrapped, metrics, style.effective_line_spacing());
    let origin = place_block(
        width,
        height,
        block.width,
        block.height,
        style.position,
        style.effective_margin(),
    );
    LayoutPlan {
        lines,
        block,
        origin,
    }
}
