use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};

pub mod logging;
pub mod overlay;
pub mod settings;

pub use overlay::{
    Alignment, FontResolver, FontStyle, LayoutPlan, OverlayError, PoemStyle, Position, Rgb,
    StyleConfig, add_poem_to_image, overlay, overlay_with, plan_layout, try_overlay,
};

/// Style values given on the command line; `None` keeps the settings value.
#[derive(Debug, Clone, Default)]
pub struct StyleOverrides {
    pub font_size: Option<i32>,
    pub font_color: Option<String>,
    pub position: Option<String>,
    pub text_alignment: Option<String>,
    pub font_style: Option<String>,
    pub background_opacity: Option<f32>,
    pub background_color: Option<String>,
    pub margin: Option<i32>,
    pub line_spacing: Option<i32>,
    pub max_width_ratio: Option<f32>,
}

impl StyleOverrides {
    pub fn apply(&self, style: &mut StyleConfig) -> Result<()> {
        if let Some(size) = self.font_size {
            style.font_size = size;
        }
        if let Some(color) = self.font_color.as_deref() {
            style.font_color = settings::parse_color(color)?;
        }
        if let Some(position) = self.position.as_deref() {
            style.position = Position::parse(position);
        }
        if let Some(alignment) = self.text_alignment.as_deref() {
            style.text_alignment = Alignment::parse(alignment);
        }
        if let Some(font_style) = self.font_style.as_deref() {
            style.font_style = FontStyle::parse(font_style);
        }
        if let Some(opacity) = self.background_opacity {
            style.background_opacity = opacity;
        }
        if let Some(color) = self.background_color.as_deref() {
            style.background_color = settings::parse_color(color)?;
        }
        if let Some(margin) = self.margin {
            style.margin = margin;
        }
        if let Some(spacing) = self.line_spacing {
            style.line_spacing = spacing;
        }
        if let Some(ratio) = self.max_width_ratio {
            style.max_width_ratio = ratio;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub image: PathBuf,
    pub output: PathBuf,
    pub settings_path: Option<String>,
    pub font_dirs: Vec<PathBuf>,
    pub dump_layout: Option<PathBuf>,
    pub overrides: StyleOverrides,
}

/// Overlays `poem` onto the configured image and writes the result.
///
/// Returns the path of the written image.
pub fn run(config: Config, poem: &str) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let mut style = settings.style.clone();
    config.overrides.apply(&mut style)?;

    let poem = strip_final_newline(poem);
    if poem.trim().is_empty() {
        return Err(anyhow!("poem is empty"));
    }

    let font_dirs = if config.font_dirs.is_empty() {
        settings.font_dirs.clone()
    } else {
        config.font_dirs.clone()
    };
    let resolver = FontResolver::new(font_dirs);

    let image = image::open(&config.image)
        .with_context(|| format!("failed to decode image: {}", config.image.display()))?;

    if let Some(path) = config.dump_layout.as_deref() {
        let font = resolver.resolve(style.effective_font_size(), style.font_style);
        let plan = plan_layout(image.width(), image.height(), poem, &style, &font);
        write_layout(path, &plan)?;
    }

    let result = overlay_with(&image, poem, &style, &resolver);
    save_image(result, &config.output)?;
    Ok(config.output.display().to_string())
}

/// Drops the newline that terminates a poem file; earlier blank lines are part of the poem.
fn strip_final_newline(poem: &str) -> &str {
    poem.strip_suffix("\r\n")
        .or_else(|| poem.strip_suffix('\n'))
        .unwrap_or(poem)
}

fn write_layout(path: &Path, plan: &LayoutPlan) -> Result<()> {
    let json = serde_json::to_vec_pretty(plan)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write layout: {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote layout plan");
    Ok(())
}

fn save_image(image: DynamicImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
    // JPEG has no alpha channel.
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };
    image
        .save_with_format(path, format)
        .with_context(|| format!("failed to write image: {}", path.display()))
}
