use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "verse-overlay",
    version,
    about = "Burn styled poem text onto an image"
)]
struct Cli {
    /// Background image to draw on
    #[arg(short = 'i', long = "image")]
    image: PathBuf,

    /// Poem text file (reads stdin when omitted)
    #[arg(short = 'p', long = "poem")]
    poem: Option<PathBuf>,

    /// Where to write the result; the format follows the extension (PNG by default)
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Font size in pixels
    #[arg(long = "font-size", allow_hyphen_values = true)]
    font_size: Option<i32>,

    /// Text color: white, black, light gray, dark gray or #rrggbb
    #[arg(long = "font-color")]
    font_color: Option<String>,

    /// Block position: center, top, bottom, left, right
    #[arg(long = "position")]
    position: Option<String>,

    /// Line alignment inside the block: left, center, right
    #[arg(long = "align")]
    align: Option<String>,

    /// Font style: serif, sans-serif, arial, times, helvetica
    #[arg(long = "font-style")]
    font_style: Option<String>,

    /// Backing plate opacity (0.0 disables the plate)
    #[arg(long = "background-opacity")]
    background_opacity: Option<f32>,

    /// Backing plate color: white, black, light gray, dark gray or #rrggbb
    #[arg(long = "background-color")]
    background_color: Option<String>,

    /// Distance from the image edge in pixels
    #[arg(long = "margin", allow_hyphen_values = true)]
    margin: Option<i32>,

    /// Extra pixels between lines
    #[arg(long = "line-spacing", allow_hyphen_values = true)]
    line_spacing: Option<i32>,

    /// Maximum line width as a fraction of the image width
    #[arg(long = "max-width-ratio")]
    max_width_ratio: Option<f32>,

    /// Font directory to search (repeatable, replaces the configured directories)
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,

    /// Write the computed layout as JSON
    #[arg(long = "dump-layout")]
    dump_layout: Option<PathBuf>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    verse_overlay::logging::init(cli.verbose)?;

    let poem = match cli.poem.as_ref() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read poem: {}", path.display()))?,
        None => {
            if io::stdin().is_terminal() {
                return Err(anyhow!("no poem given (use --poem or pipe it on stdin)"));
            }
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            String::from_utf8(buffer).map_err(|_| anyhow!("stdin must be UTF-8 text"))?
        }
    };

    let output = verse_overlay::run(
        verse_overlay::Config {
            image: cli.image,
            output: cli.output,
            settings_path: cli.read_settings,
            font_dirs: cli.font_dirs,
            dump_layout: cli.dump_layout,
            overrides: verse_overlay::StyleOverrides {
                font_size: cli.font_size,
                font_color: cli.font_color,
                position: cli.position,
                text_alignment: cli.align,
                font_style: cli.font_style,
                background_opacity: cli.background_opacity,
                background_color: cli.background_color,
                margin: cli.margin,
                line_spacing: cli.line_spacing,
                max_width_ratio: cli.max_width_ratio,
            },
        },
        &poem,
    )?;

    println!("{}", output);
    Ok(())
}
