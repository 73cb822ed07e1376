use std::convert::Infallible;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Point, Size};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::text::{Baseline, Text};
use embedded_graphics::{Drawable, Pixel};
use image::{Rgba, RgbaImage};
use tiny_skia::{FillRule, Mask, PathBuilder, Transform};

use super::composite::blend_over;
use super::error::{OverlayError, OverlayResult};
use super::font::{BUILTIN_FONT, FontHandle, ScalableFont};
use super::layout::LayoutPlan;
use super::measure::glyph_advances;
use super::style::{Alignment, Rgb};

/// Left edge of a line `line_width` pixels wide inside a block starting at `origin_x`.
pub fn line_x(origin_x: u32, block_width: u32, line_width: u32, alignment: Alignment) -> u32 {
    let slack = block_width.saturating_sub(line_width);
    match alignment {
        Alignment::Left => origin_x,
        Alignment::Center => origin_x.saturating_add(slack / 2),
        Alignment::Right => origin_x.saturating_add(slack),
    }
}

/// Draws every planned line onto `image` in `color`.
pub fn draw_lines(
    image: &mut RgbaImage,
    plan: &LayoutPlan,
    font: &FontHandle,
    color: Rgb,
    alignment: Alignment,
) -> OverlayResult<()> {
    match font {
        FontHandle::Scalable(font) => draw_scalable(image, plan, font, color, alignment),
        FontHandle::Builtin => {
            draw_builtin(image, plan, color, alignment);
            Ok(())
        }
    }
}

/// `(line index, x, y)` of the top-left corner of every planned line.
fn line_positions(
    plan: &LayoutPlan,
    alignment: Alignment,
) -> impl Iterator<Item = (usize, u32, u32)> + '_ {
    let advance = plan.block.line_advance();
    plan.lines.iter().enumerate().map(move |(index, line)| {
        let x = line_x(plan.origin.x, plan.block.width, line.width, alignment);
        let y = plan.origin.y.saturating_add((index as u32).saturating_mul(advance));
        (index, x, y)
    })
}

fn draw_scalable(
    image: &mut RgbaImage,
    plan: &LayoutPlan,
    font: &ScalableFont,
    color: Rgb,
    alignment: Alignment,
) -> OverlayResult<()> {
    let (width, height) = image.dimensions();
    let mut mask = Mask::new(width, height).ok_or(OverlayError::Mask { width, height })?;
    let Some(face) = font.face() else {
        return Err(OverlayError::FontParse {
            path: font.source().to_path_buf(),
        });
    };
    let scale = font.scale();
    let ascender = font.ascender_px();

    for (index, x, y) in line_positions(plan, alignment) {
        let text = &plan.lines[index].text;
        if text.is_empty() || x >= width || y >= height {
            continue;
        }
        let baseline = y as f32 + ascender;
        let mut pen = x as f32;
        for (ch, advance) in glyph_advances(font, text) {
            if let Some(glyph) = face.glyph_index(ch) {
                let mut builder = GlyphPathBuilder::new();
                if face.outline_glyph(glyph, &mut builder).is_some() {
                    if let Some(path) = builder.finish() {
                        let transform = Transform::from_row(scale, 0.0, 0.0, -scale, pen, baseline);
                        mask.fill_path(&path, FillRule::Winding, true, transform);
                    }
                }
            }
            pen += advance as f32 * scale;
        }
    }

    apply_coverage(image, &mask, color);
    Ok(())
}

/// Blends `color` into `image` wherever the mask has coverage.
fn apply_coverage(image: &mut RgbaImage, mask: &Mask, color: Rgb) {
    let width = mask.width() as usize;
    for (index, coverage) in mask.data().iter().enumerate() {
        if *coverage == 0 {
            continue;
        }
        let x = (index % width) as u32;
        let y = (index / width) as u32;
        let pixel = image.get_pixel_mut(x, y);
        *pixel = blend_over(*pixel, color, *coverage as f32 / 255.0);
    }
}

fn draw_builtin(image: &mut RgbaImage, plan: &LayoutPlan, color: Rgb, alignment: Alignment) {
    let Rgb(r, g, b) = color;
    let style = MonoTextStyle::new(BUILTIN_FONT, Rgb888::new(r, g, b));
    let mut target = ImageTarget { image };
    for (index, x, y) in line_positions(plan, alignment) {
        let text = &plan.lines[index].text;
        if text.is_empty() {
            continue;
        }
        let origin = Point::new(to_i32(x), to_i32(y));
        let _ = Text::with_baseline(text, origin, style, Baseline::Top).draw(&mut target);
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Lets embedded-graphics draw straight into an RGBA buffer.
struct ImageTarget<'a> {
    image: &'a mut RgbaImage,
}

impl OriginDimensions for ImageTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

impl DrawTarget for ImageTarget<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.image.dimensions();
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            if x >= width || y >= height {
                continue;
            }
            self.image
                .put_pixel(x, y, Rgba([color.r(), color.g(), color.b(), 255]));
        }
        Ok(())
    }
}

/// Collects a glyph outline in font design units (y-up).
struct GlyphPathBuilder {
    builder: PathBuilder,
}

impl GlyphPathBuilder {
    fn new() -> Self {
        Self {
            builder: PathBuilder::new(),
        }
    }

    fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl ttf_parser::OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::layout::{DisplayLine, Origin, TextBlock};

    #[test]
    fn right_alignment_uses_block_slack() {
        assert_eq!(line_x(50, 200, 120, Alignment::Right), 130);
        assert_eq!(line_x(50, 200, 120, Alignment::Center), 90);
        assert_eq!(line_x(50, 200, 120, Alignment::Left), 50);
        assert_eq!(line_x(50, 200, 200, Alignment::Right), 50);
    }

    fn plan(lines: &[&str]) -> LayoutPlan {
        let lines = lines
            .iter()
            .map(|text| DisplayLine {
                text: text.to_string(),
                width: text.chars().count() as u32 * 6,
            })
            .collect::<Vec<_>>();
        let width = lines.iter().map(|line| line.width).max().unwrap_or(0);
        LayoutPlan {
            block: TextBlock {
                width,
                height: lines.len() as u32 * 10,
                line_height: 10,
                line_spacing: 0,
            },
            lines,
            origin: Origin { x: 2, y: 2 },
        }
    }

    #[test]
    fn builtin_glyphs_stay_inside_their_line_boxes() {
        let mut image = RgbaImage::from_pixel(40, 30, Rgba([0, 0, 0, 255]));
        let plan = plan(&["HI", "", "MM"]);
        draw_lines(&mut image, &plan, &FontHandle::Builtin, Rgb::WHITE, Alignment::Left)
            .expect("draw");

        let lit = |x0: u32, y0: u32, x1: u32, y1: u32| {
            (y0..y1).any(|y| (x0..x1).any(|x| image.get_pixel(x, y)[0] == 255))
        };
        assert!(lit(2, 2, 14, 12));
        assert!(!lit(0, 12, 40, 22));
        assert!(lit(2, 22, 14, 30));
        assert!(!lit(14, 0, 40, 30));
    }

    #[test]
    fn builtin_font_draws_accented_letters() {
        let render = |text: &str| {
            let mut image = RgbaImage::from_pixel(20, 14, Rgba([0, 0, 0, 255]));
            let plan = plan(&[text]);
            draw_lines(&mut image, &plan, &FontHandle::Builtin, Rgb::WHITE, Alignment::Left)
                .expect("draw");
            image
        };
        let replacement = render("?");
        for accented in ["é", "ü", "ß", "ç"] {
            assert_ne!(render(accented), replacement, "{} drawn as a replacement glyph", accented);
        }
        assert_ne!(render("é"), render("e"));
    }

    #[test]
    fn builtin_text_clips_at_image_edge() {
        let mut image = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        let plan = plan(&["overflowing line"]);
        draw_lines(&mut image, &plan, &FontHandle::Builtin, Rgb::WHITE, Alignment::Right)
            .expect("draw");
        assert_eq!(image.dimensions(), (8, 8));
    }
}
