use super::font::{BUILTIN_FONT, FontHandle, ScalableFont};

/// Probe covering both ascender and descender extents, so every line gets the same height
/// regardless of which characters it holds.
pub const LINE_HEIGHT_PROBE: &str = "Ag";

/// Pixel geometry of text runs under one font.
///
/// The wrapper, the positioner and the renderer all measure through the same instance so
/// that wrapping decisions and final drawing agree on line geometry.
pub trait TextMetrics {
    fn text_width(&self, text: &str) -> u32;
    fn line_height(&self) -> u32;
}

impl TextMetrics for FontHandle {
    fn text_width(&self, text: &str) -> u32 {
        match self {
            FontHandle::Scalable(font) => scalable_text_width(font, text),
            FontHandle::Builtin => builtin_text_width(text),
        }
    }

    fn line_height(&self) -> u32 {
        match self {
            FontHandle::Scalable(font) => scalable_line_height(font),
            FontHandle::Builtin => BUILTIN_FONT.character_size.height,
        }
    }
}

/// Horizontal advance of each character in design units; no kerning.
pub(crate) fn glyph_advances(font: &ScalableFont, text: &str) -> Vec<(char, u32)> {
    let Some(face) = font.face() else {
        return Vec::new();
    };
    let space = font.space_advance() as u32;
    text.chars()
        .filter(|ch| *ch != '\n' && *ch != '\r')
        .map(|ch| {
            if ch == ' ' {
                return (ch, space);
            }
            let advance = face
                .glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .map(u32::from)
                .unwrap_or(space);
            (ch, advance)
        })
        .collect()
}

fn scalable_text_width(font: &ScalableFont, text: &str) -> u32 {
    let units: u32 = glyph_advances(font, text)
        .iter()
        .fold(0u32, |total, (_, advance)| total.saturating_add(*advance));
    (units as f32 * font.scale()).ceil() as u32
}

fn scalable_line_height(font: &ScalableFont) -> u32 {
    let fallback = (font.ascender_px() - font.descender_px()).ceil().max(1.0) as u32;
    let Some(face) = font.face() else {
        return fallback;
    };
    let mut top = i32::MIN;
    let mut bottom = i32::MAX;
    for ch in LINE_HEIGHT_PROBE.chars() {
        let Some(rect) = face
            .glyph_index(ch)
            .and_then(|glyph| face.glyph_bounding_box(glyph))
        else {
            continue;
        };
        top = top.max(rect.y_max as i32);
        bottom = bottom.min(rect.y_min as i32);
    }
    if top <= bottom {
        return fallback;
    }
    ((top - bottom) as f32 * font.scale()).ceil().max(1.0) as u32
}

fn builtin_text_width(text: &str) -> u32 {
    let count = text.chars().filter(|ch| *ch != '\n' && *ch != '\r').count() as u32;
    if count == 0 {
        return 0;
    }
    let advance = BUILTIN_FONT.character_size.width + BUILTIN_FONT.character_spacing;
    count
        .saturating_mul(advance)
        .saturating_sub(BUILTIN_FONT.character_spacing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_metrics_are_fixed() {
        let font = FontHandle::Builtin;
        assert_eq!(font.text_width(""), 0);
        assert_eq!(font.text_width("abc"), 18);
        assert_eq!(font.text_width("é ü"), 18);
        assert_eq!(font.line_height(), 10);
    }

    #[test]
    fn measurement_is_deterministic() {
        let font = FontHandle::Builtin;
        let text = "Shall I compare thee to a summer's day?";
        assert_eq!(font.text_width(text), font.text_width(text));
        assert_eq!(font.text_width(text), text.chars().count() as u32 * 6);
    }
}
