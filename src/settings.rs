use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::overlay::{Alignment, FontStyle, Position, Rgb, StyleConfig, default_font_dirs};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub style: StyleConfig,
    pub font_dirs: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            style: StyleConfig::default(),
            font_dirs: default_font_dirs(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    overlay: Option<OverlaySettings>,
    fonts: Option<FontSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct OverlaySettings {
    font_size: Option<i32>,
    font_color: Option<String>,
    position: Option<String>,
    background_opacity: Option<f32>,
    background_color: Option<String>,
    margin: Option<i32>,
    line_spacing: Option<i32>,
    text_alignment: Option<String>,
    max_width_ratio: Option<f32>,
    font_style: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    search_dirs: Option<Vec<String>>,
}

/// Loads the built-in defaults, then every settings file that exists, later files winning.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    settings.merge_str(DEFAULT_SETTINGS_TOML, Path::new("<built-in settings.toml>"))?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings.merge_str(&content, &path)?;
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge_str(&mut self, content: &str, origin: &Path) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)
            .with_context(|| format!("failed to parse settings: {}", origin.display()))?;
        self.merge(parsed)
            .with_context(|| format!("invalid settings: {}", origin.display()))
    }

    fn merge(&mut self, incoming: SettingsFile) -> Result<()> {
        if let Some(overlay) = incoming.overlay {
            let style = &mut self.style;
            if let Some(size) = overlay.font_size {
                style.font_size = size;
            }
            if let Some(color) = non_empty(overlay.font_color) {
                style.font_color = parse_color(&color)?;
            }
            if let Some(position) = non_empty(overlay.position) {
                style.position = Position::parse(&position);
            }
            if let Some(opacity) = overlay.background_opacity {
                style.background_opacity = opacity;
            }
            if let Some(color) = non_empty(overlay.background_color) {
                style.background_color = parse_color(&color)?;
            }
            if let Some(margin) = overlay.margin {
                style.margin = margin;
            }
            if let Some(spacing) = overlay.line_spacing {
                style.line_spacing = spacing;
            }
            if let Some(alignment) = non_empty(overlay.text_alignment) {
                style.text_alignment = Alignment::parse(&alignment);
            }
            if let Some(ratio) = overlay.max_width_ratio {
                style.max_width_ratio = ratio;
            }
            if let Some(font_style) = non_empty(overlay.font_style) {
                style.font_style = FontStyle::parse(&font_style);
            }
        }
        if let Some(fonts) = incoming.fonts {
            if let Some(dirs) = fonts.search_dirs {
                let dirs = dirs
                    .iter()
                    .filter_map(|dir| non_empty(Some(dir.clone())))
                    .map(|dir| PathBuf::from(expand_tilde(&dir)))
                    .collect::<Vec<_>>();
                if !dirs.is_empty() {
                    self.font_dirs = dirs;
                }
            }
        }
        Ok(())
    }
}

pub fn parse_color(value: &str) -> Result<Rgb> {
    Rgb::parse(value).ok_or_else(|| {
        anyhow!(
            "invalid color '{}' (expected white, black, light gray, dark gray or #rrggbb)",
            value
        )
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".verse-overlay"))
        }
    })
}

fn expand_tilde(value: &str) -> String {
    if value == "~" || value.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            let home = home.trim();
            if !home.is_empty() {
                return format!("{}{}", home, &value[1..]);
            }
        }
    }
    value.to_string()
}
