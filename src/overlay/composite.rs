use image::{ColorType, DynamicImage, Rgba, RgbaImage};

use super::layout::{Origin, TextBlock};
use super::style::Rgb;

/// Inclusive pixel bounds of the backing plate, already clipped to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

/// Block bounds inflated by `padding` on every side and clipped to the image.
///
/// Returns `None` when nothing of the plate lands on the image.
pub fn plate_rect(
    width: u32,
    height: u32,
    origin: Origin,
    block: &TextBlock,
    padding: u32,
) -> Option<PlateRect> {
    if width == 0 || height == 0 {
        return None;
    }
    let left = origin.x.saturating_sub(padding);
    let top = origin.y.saturating_sub(padding);
    let right = origin
        .x
        .saturating_add(block.width)
        .saturating_add(padding)
        .min(width - 1);
    let bottom = origin
        .y
        .saturating_add(block.height)
        .saturating_add(padding)
        .min(height - 1);
    if left > right || top > bottom {
        return None;
    }
    Some(PlateRect {
        left,
        top,
        right,
        bottom,
    })
}

/// Blends an opaque `color` at `opacity` over every pixel inside `rect`.
pub fn draw_plate(image: &mut RgbaImage, rect: PlateRect, color: Rgb, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }
    for y in rect.top..=rect.bottom {
        for x in rect.left..=rect.right {
            let pixel = image.get_pixel_mut(x, y);
            *pixel = blend_over(*pixel, color, opacity);
        }
    }
}

/// `color` at `alpha` over `dst`: channels blend linearly, alpha composites "over".
pub(crate) fn blend_over(dst: Rgba<u8>, color: Rgb, alpha: f32) -> Rgba<u8> {
    let Rgba([r, g, b, a]) = dst;
    let Rgb(cr, cg, cb) = color;
    Rgba([
        mix(cr, r, alpha),
        mix(cg, g, alpha),
        mix(cb, b, alpha),
        mix(255, a, alpha),
    ])
}

fn mix(src: u8, dst: u8, alpha: f32) -> u8 {
    (src as f32 * alpha + dst as f32 * (1.0 - alpha))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// RGBA copy of `image` that the pipeline draws on.
pub(crate) fn working_copy(image: &DynamicImage) -> RgbaImage {
    image.to_rgba8()
}

/// Converts the working copy back to the color type of the input image.
pub(crate) fn flatten(working: RgbaImage, color: ColorType) -> DynamicImage {
    let rgba = DynamicImage::ImageRgba8(working);
    match color {
        ColorType::Rgb8 => DynamicImage::ImageRgb8(rgba.to_rgb8()),
        ColorType::L8 => DynamicImage::ImageLuma8(rgba.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(rgba.to_luma_alpha8()),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(rgba.to_rgb16()),
        ColorType::Rgba16 => DynamicImage::ImageRgba16(rgba.to_rgba16()),
        ColorType::Rgb32F => DynamicImage::ImageRgb32F(rgba.to_rgb32f()),
        ColorType::Rgba32F => DynamicImage::ImageRgba32F(rgba.to_rgba32f()),
        _ => rgba,
    }
}
