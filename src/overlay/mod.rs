mod composite;
mod error;
mod font;
mod layout;
mod measure;
mod render;
mod style;
mod wrap;

#[cfg(test)]
mod test_util;

use std::panic::{self, AssertUnwindSafe};

use image::{DynamicImage, GenericImageView};
use tracing::{debug, error};

pub use composite::{PlateRect, draw_plate, plate_rect};
pub use error::{OverlayError, OverlayResult};
pub use font::{FontHandle, FontResolver, ScalableFont, default_font_dirs};
pub use layout::{
    DisplayLine, LayoutPlan, Origin, TextBlock, measure_block, place_block, plan_layout,
};
pub use measure::{LINE_HEIGHT_PROBE, TextMetrics};
pub use render::{draw_lines, line_x};
pub use style::{
    Alignment, DEFAULT_BACKGROUND_OPACITY, DEFAULT_FONT_SIZE, DEFAULT_LINE_SPACING, DEFAULT_MARGIN,
    DEFAULT_MAX_WIDTH_RATIO, FontStyle, PoemStyle, Position, Rgb, StyleConfig,
};
pub use wrap::wrap_text;

/// Burns `text` onto a copy of `image` using fonts from the platform font directories.
///
/// Never fails: if anything goes wrong the failure is logged and an unmodified copy of
/// `image` is returned. Applying the overlay to its own output draws the text a second
/// time, so callers should always start from the untouched base image.
pub fn overlay(image: &DynamicImage, text: &str, style: &StyleConfig) -> DynamicImage {
    overlay_with(image, text, style, &FontResolver::default())
}

/// [`overlay`] with an explicit font resolver.
pub fn overlay_with(
    image: &DynamicImage,
    text: &str,
    style: &StyleConfig,
    resolver: &FontResolver,
) -> DynamicImage {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        try_overlay(image, text, style, resolver)
    }));
    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            error!(error = %err, "text overlay failed, returning the original image");
            image.clone()
        }
        Err(_) => {
            error!("text overlay panicked, returning the original image");
            image.clone()
        }
    }
}

/// The overlay pipeline without the fallback boundary.
pub fn try_overlay(
    image: &DynamicImage,
    text: &str,
    style: &StyleConfig,
    resolver: &FontResolver,
) -> OverlayResult<DynamicImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(OverlayError::EmptyImage { width, height });
    }

    let font = resolver.resolve(style.effective_font_size(), style.font_style);
    let plan = plan_layout(width, height, text, style, &font);
    debug!(
        font = %font.describe(),
        lines = plan.lines.len(),
        block_width = plan.block.width,
        block_height = plan.block.height,
        x = plan.origin.x,
        y = plan.origin.y,
        "planned text block"
    );

    let mut working = composite::working_copy(image);
    let opacity = style.effective_opacity();
    if opacity > 0.0 {
        let padding = style.effective_margin() / 2;
        if let Some(rect) = plate_rect(width, height, plan.origin, &plan.block, padding) {
            draw_plate(&mut working, rect, style.background_color, opacity);
        }
    }
    draw_lines(
        &mut working,
        &plan,
        &font,
        style.font_color,
        style.text_alignment,
    )?;

    Ok(composite::flatten(working, image.color()))
}

/// Editor shortcut: overlays a poem with the default margin, spacing and width ratio.
pub fn add_poem_to_image(image: &DynamicImage, poem: &str, style: &PoemStyle) -> DynamicImage {
    overlay(image, poem, &StyleConfig::from(style))
}
