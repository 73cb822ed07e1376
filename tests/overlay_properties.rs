use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, Rgb as RgbPixel, RgbImage};
use tempfile::{TempDir, tempdir};
use usvg::fontdb;
use verse_overlay::overlay::{
    FontHandle, FontResolver, TextMetrics, line_x, place_block, wrap_text,
};
use verse_overlay::{
    Alignment, FontStyle, PoemStyle, Position, Rgb, StyleConfig, add_poem_to_image, overlay_with,
    plan_layout, try_overlay,
};

const POEM: &str = "I wandered lonely as a cloud\nThat floats on high o'er vales and hills,\n\nWhen all at once I saw a crowd,\nA host, of golden daffodils;";

fn backdrop(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        RgbPixel([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 140])
    }))
}

fn bitmap_only() -> FontResolver {
    FontResolver::new(Vec::new())
}

/// A Latin text face from the host, preferring families with conventional metrics.
fn host_text_font() -> Option<PathBuf> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    let mut candidates = db
        .faces()
        .filter_map(|face| {
            let fontdb::Source::File(path) = &face.source else {
                return None;
            };
            let is_ttf = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf"));
            let family = face.families.first().map(|(name, _)| name.as_str())?;
            let known = matches!(
                family,
                "DejaVu Sans" | "DejaVu Serif" | "Liberation Sans" | "Liberation Serif"
            );
            let regular = face.style == fontdb::Style::Normal
                && face.weight == fontdb::Weight::NORMAL
                && face.stretch == fontdb::Stretch::Normal;
            (is_ttf && known && regular).then(|| path.clone())
        })
        .collect::<Vec<_>>();
    candidates.sort();
    candidates.into_iter().next()
}

/// Resolver whose only font is a copy of `font`, so resolution does not depend on the host.
fn single_font_resolver(font: &Path) -> Option<(TempDir, FontResolver)> {
    let dir = tempdir().ok()?;
    std::fs::copy(font, dir.path().join("verse.ttf")).ok()?;
    let resolver = FontResolver::new(vec![dir.path().to_path_buf()]);
    Some((dir, resolver))
}

#[test]
fn bottom_anchor_scenario() {
    let origin = place_block(400, 300, 100, 20, Position::Bottom, 10);
    assert_eq!((origin.x, origin.y), (150, 270));
}

#[test]
fn right_alignment_scenario() {
    assert_eq!(line_x(50, 200, 120, Alignment::Right), 130);
}

#[test]
fn blank_lines_survive_wrapping() {
    assert_eq!(
        wrap_text("A\n\nB", 500, &FontHandle::Builtin),
        vec!["A".to_string(), String::new(), "B".to_string()]
    );
}

#[test]
fn wrapped_lines_fit_unless_single_word() {
    let font = FontHandle::Builtin;
    for max_width in [40, 90, 150, 400] {
        for line in wrap_text(POEM, max_width, &font) {
            if line.split_whitespace().count() > 1 {
                assert!(font.text_width(&line) <= max_width, "{:?} > {}", line, max_width);
            }
        }
    }
}

#[test]
fn dimensions_and_source_are_preserved() {
    let image = backdrop(300, 220);
    let before = image.clone();
    for position in ["center", "top", "bottom", "left", "right", "nowhere"] {
        for alignment in ["left", "center", "right"] {
            let style = StyleConfig {
                position: Position::parse(position),
                text_alignment: Alignment::parse(alignment),
                ..StyleConfig::default()
            };
            let out = overlay_with(&image, POEM, &style, &bitmap_only());
            assert_eq!(out.dimensions(), image.dimensions());
        }
    }
    assert_eq!(image, before);
}

#[test]
fn zero_opacity_draws_no_plate() {
    let image = backdrop(260, 160);
    let style = StyleConfig {
        background_opacity: 0.0,
        font_color: Rgb(255, 255, 0),
        ..StyleConfig::default()
    };
    let out = overlay_with(&image, POEM, &style, &bitmap_only()).to_rgb8();
    let src = image.to_rgb8();
    for (x, y, pixel) in out.enumerate_pixels() {
        let original = src.get_pixel(x, y);
        assert!(pixel == original || pixel.0 == [255, 255, 0], "plate pixel at {},{}", x, y);
    }
}

#[test]
fn bitmap_fallback_ignores_font_size() {
    let image = backdrop(200, 150);
    let small = StyleConfig {
        font_size: 12,
        ..StyleConfig::default()
    };
    let large = StyleConfig {
        font_size: 48,
        ..StyleConfig::default()
    };
    let resolver = bitmap_only();
    assert_eq!(
        overlay_with(&image, "morning", &small, &resolver),
        overlay_with(&image, "morning", &large, &resolver)
    );
}

#[test]
fn overlay_is_not_idempotent() {
    let image = backdrop(200, 150);
    let resolver = bitmap_only();
    let style = StyleConfig::default();
    let once = overlay_with(&image, POEM, &style, &resolver);
    let twice = overlay_with(&once, POEM, &style, &resolver);
    assert_ne!(once, twice);
}

#[test]
fn malformed_styles_never_fail() {
    let image = backdrop(80, 60);
    let styles = [
        StyleConfig {
            background_opacity: 5.0,
            ..StyleConfig::default()
        },
        StyleConfig {
            font_size: -24,
            margin: -100,
            line_spacing: -7,
            ..StyleConfig::default()
        },
        StyleConfig {
            background_opacity: f32::INFINITY,
            max_width_ratio: -1.0,
            ..StyleConfig::default()
        },
    ];
    for style in &styles {
        let out = overlay_with(&image, POEM, style, &bitmap_only());
        assert_eq!(out.dimensions(), (80, 60));
    }
}

#[test]
fn poem_shortcut_returns_same_size() {
    let image = backdrop(320, 240);
    let style = PoemStyle {
        font_color: Rgb::LIGHT_GRAY,
        position: Position::Top,
        font_style: FontStyle::SansSerif,
        ..PoemStyle::default()
    };
    let out = add_poem_to_image(&image, POEM, &style);
    assert_eq!(out.dimensions(), (320, 240));
}

#[test]
fn scalable_font_honors_size() {
    let Some(font) = host_text_font() else {
        eprintln!("no DejaVu or Liberation font on this host, skipping");
        return;
    };
    let Some((_dir, resolver)) = single_font_resolver(&font) else {
        return;
    };
    let small = resolver.resolve(12, FontStyle::Default);
    let large = resolver.resolve(48, FontStyle::Default);
    assert!(small.is_scalable(), "{} did not load", font.display());
    assert!(large.line_height() > small.line_height());
    assert!(large.text_width("verse") > small.text_width("verse"));

    let max_width = 160;
    for line in wrap_text(POEM, max_width, &large) {
        if line.split_whitespace().count() > 1 {
            assert!(large.text_width(&line) <= max_width);
        }
    }
}

#[test]
fn scalable_glyphs_land_inside_their_line_boxes() {
    let Some(font) = host_text_font() else {
        eprintln!("no DejaVu or Liberation font on this host, skipping");
        return;
    };
    let Some((_dir, resolver)) = single_font_resolver(&font) else {
        return;
    };
    let text = "Daffodils\n\nby the lake";
    let style = StyleConfig {
        font_size: 24,
        font_color: Rgb(255, 255, 0),
        background_opacity: 0.0,
        line_spacing: 16,
        text_alignment: Alignment::Left,
        font_style: FontStyle::Default,
        ..StyleConfig::default()
    };
    let image = backdrop(320, 240);
    let handle = resolver.resolve(24, FontStyle::Default);
    assert!(handle.is_scalable());
    let plan = plan_layout(320, 240, text, &style, &handle);
    assert_eq!(plan.lines.len(), 3);

    let out = overlay_with(&image, text, &style, &resolver).to_rgb8();
    let src = image.to_rgb8();
    assert_ne!(out, src);

    let line_height = plan.block.line_height;
    let advance = plan.block.line_advance();
    // Glyphs hang from the ascender, so ink can reach a little below the "Ag" box.
    let overhang = line_height / 2;
    let slack = 3;
    let mut inked_lines = [false; 3];
    for (x, y, pixel) in out.enumerate_pixels() {
        let original = src.get_pixel(x, y);
        if pixel == original {
            continue;
        }
        // Coverage only ever moves a pixel toward the text color.
        assert!(pixel[0] >= original[0] && pixel[1] >= original[1], "({}, {})", x, y);
        assert!(pixel[2] <= original[2], "({}, {})", x, y);

        assert!(y >= plan.origin.y, "ink above the block at ({}, {})", x, y);
        let offset = y - plan.origin.y;
        let line = (offset / advance) as usize;
        assert!(
            offset % advance < line_height + overhang,
            "ink between lines at ({}, {})",
            x,
            y
        );
        assert!(line < plan.lines.len(), "ink below the block at ({}, {})", x, y);
        assert!(!plan.lines[line].text.is_empty(), "ink on the blank line at ({}, {})", x, y);
        let right = plan.origin.x + plan.lines[line].width + slack;
        assert!(
            x + slack >= plan.origin.x && x <= right,
            "ink outside line {} at ({}, {})",
            line,
            x,
            y
        );
        inked_lines[line] = true;
    }
    assert_eq!(inked_lines, [true, false, true]);
}

#[test]
fn huge_font_size_degrades_without_failing() {
    let Some(font) = host_text_font() else {
        eprintln!("no DejaVu or Liberation font on this host, skipping");
        return;
    };
    let Some((_dir, resolver)) = single_font_resolver(&font) else {
        return;
    };
    let image = backdrop(120, 90);
    let style = StyleConfig {
        font_size: i32::MAX,
        line_spacing: i32::MAX,
        font_style: FontStyle::Default,
        ..StyleConfig::default()
    };
    let out = try_overlay(&image, "one\ntwo\nthree", &style, &resolver).expect("overlay");
    assert_eq!(out.dimensions(), (120, 90));
    // The plate still covers the image even though no glyph fits.
    assert_ne!(out, image);
}
