use serde::Serialize;

pub const DEFAULT_FONT_SIZE: i32 = 24;
pub const DEFAULT_BACKGROUND_OPACITY: f32 = 0.7;
pub const DEFAULT_MARGIN: i32 = 50;
pub const DEFAULT_LINE_SPACING: i32 = 10;
pub const DEFAULT_MAX_WIDTH_RATIO: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const LIGHT_GRAY: Rgb = Rgb(200, 200, 200);
    pub const DARK_GRAY: Rgb = Rgb(80, 80, 80);

    /// Color choices offered by the editor, matched case-insensitively.
    pub fn preset(name: &str) -> Option<Rgb> {
        match name.trim().to_ascii_lowercase().as_str() {
            "white" => Some(Rgb::WHITE),
            "black" => Some(Rgb::BLACK),
            "light gray" | "light-gray" | "lightgray" => Some(Rgb::LIGHT_GRAY),
            "dark gray" | "dark-gray" | "darkgray" => Some(Rgb::DARK_GRAY),
            _ => None,
        }
    }

    /// Accepts either a preset name or a `#rrggbb` hex string.
    pub fn parse(value: &str) -> Option<Rgb> {
        if let Some(color) = Rgb::preset(value) {
            return Some(color);
        }
        let hex = value.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Where the text block is anchored on the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

impl Position {
    /// Unknown keywords fall back to [`Position::Center`].
    pub fn parse(value: &str) -> Position {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => Position::Top,
            "bottom" => Position::Bottom,
            "left" => Position::Left,
            "right" => Position::Right,
            _ => Position::Center,
        }
    }
}

/// Horizontal alignment of each line inside the text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    /// Unknown keywords fall back to [`Alignment::Center`].
    pub fn parse(value: &str) -> Alignment {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Alignment::Left,
            "right" => Alignment::Right,
            _ => Alignment::Center,
        }
    }
}

/// Font family alias mapped to candidate font files by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    #[default]
    Serif,
    SansSerif,
    Arial,
    Times,
    Helvetica,
    /// No preference: go straight to whatever font is available.
    Default,
}

impl FontStyle {
    pub fn parse(value: &str) -> FontStyle {
        match value.trim().to_ascii_lowercase().as_str() {
            "serif" => FontStyle::Serif,
            "sans-serif" | "sans" => FontStyle::SansSerif,
            "arial" => FontStyle::Arial,
            "times" => FontStyle::Times,
            "helvetica" => FontStyle::Helvetica,
            _ => FontStyle::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FontStyle::Serif => "serif",
            FontStyle::SansSerif => "sans-serif",
            FontStyle::Arial => "arial",
            FontStyle::Times => "times",
            FontStyle::Helvetica => "helvetica",
            FontStyle::Default => "default",
        }
    }
}

/// Styling for one overlay call.
///
/// Values are taken as given; the pipeline clamps out-of-range numbers instead of
/// rejecting them (see the `effective_*` accessors).
#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfig {
    pub font_size: i32,
    pub font_color: Rgb,
    pub position: Position,
    pub background_opacity: f32,
    pub background_color: Rgb,
    pub margin: i32,
    pub line_spacing: i32,
    pub text_alignment: Alignment,
    pub max_width_ratio: f32,
    pub font_style: FontStyle,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            font_color: Rgb::WHITE,
            position: Position::Center,
            background_opacity: DEFAULT_BACKGROUND_OPACITY,
            background_color: Rgb::BLACK,
            margin: DEFAULT_MARGIN,
            line_spacing: DEFAULT_LINE_SPACING,
            text_alignment: Alignment::Center,
            max_width_ratio: DEFAULT_MAX_WIDTH_RATIO,
            font_style: FontStyle::Serif,
        }
    }
}

impl StyleConfig {
    pub(crate) fn effective_font_size(&self) -> u32 {
        self.font_size.max(1) as u32
    }

    pub(crate) fn effective_opacity(&self) -> f32 {
        if self.background_opacity.is_finite() {
            self.background_opacity.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub(crate) fn effective_margin(&self) -> u32 {
        self.margin.max(0) as u32
    }

    pub(crate) fn effective_line_spacing(&self) -> u32 {
        self.line_spacing.max(0) as u32
    }

    pub(crate) fn effective_max_width_ratio(&self) -> f32 {
        let ratio = self.max_width_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            DEFAULT_MAX_WIDTH_RATIO
        } else {
            ratio.min(1.0)
        }
    }

    /// Maximum pixel width of a wrapped line on an image `image_width` pixels wide.
    pub(crate) fn max_line_width(&self, image_width: u32) -> u32 {
        (image_width as f32 * self.effective_max_width_ratio()).floor() as u32
    }
}

/// The subset of [`StyleConfig`] the editor exposes; the rest keeps its defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct PoemStyle {
    pub font_size: i32,
    pub font_color: Rgb,
    pub position: Position,
    pub background_opacity: f32,
    pub background_color: Rgb,
    pub font_style: FontStyle,
    pub text_alignment: Alignment,
}

impl Default for PoemStyle {
    fn default() -> Self {
        let base = StyleConfig::default();
        Self {
            font_size: base.font_size,
            font_color: base.font_color,
            position: base.position,
            background_opacity: base.background_opacity,
            background_color: base.background_color,
            font_style: base.font_style,
            text_alignment: base.text_alignment,
        }
    }
}

impl From<&PoemStyle> for StyleConfig {
    fn from(style: &PoemStyle) -> Self {
        StyleConfig {
            font_size: style.font_size,
            font_color: style.font_color,
            position: style.position,
            background_opacity: style.background_opacity,
            background_color: style.background_color,
            text_alignment: style.text_alignment,
            font_style: style.font_style,
            ..StyleConfig::default()
        }
    }
}
