use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::iso_8859_1::FONT_6X10;
use tracing::{debug, info, warn};
use ttf_parser::{Face, name_id};
use usvg::fontdb;

use super::error::{OverlayError, OverlayResult};
use super::style::FontStyle;

/// Bitmap glyph set used when no scalable font can be loaded. Covers Latin-1.
pub(crate) const BUILTIN_FONT: &MonoFont<'static> = &FONT_6X10;

/// Candidate file names per style keyword, tried in order.
const STYLE_CANDIDATES: &[(FontStyle, &[&str])] = &[
    (FontStyle::Arial, &["arial.ttf", "Arial.ttf"]),
    (
        FontStyle::Times,
        &["times.ttf", "Times.ttc", "times new roman.ttf"],
    ),
    (FontStyle::Helvetica, &["helvetica.ttf", "Helvetica.ttc"]),
    (
        FontStyle::Serif,
        &["times.ttf", "liberation-serif.ttf", "DejaVuSerif.ttf"],
    ),
    (
        FontStyle::SansSerif,
        &["arial.ttf", "liberation-sans.ttf", "DejaVuSans.ttf"],
    ),
];

/// Fonts probed relative to each search directory when the resolver is built.
const WELL_KNOWN_FONTS: &[&str] = &[
    "arial.ttf",
    "times.ttf",
    "calibri.ttf",
    "Arial.ttf",
    "Times.ttc",
    "Helvetica.ttc",
    "dejavu/DejaVuSans.ttf",
    "liberation/LiberationSerif-Regular.ttf",
];

#[cfg(target_os = "macos")]
pub fn default_font_dirs() -> Vec<PathBuf> {
    ["/System/Library/Fonts/", "/Library/Fonts/"]
        .iter()
        .map(PathBuf::from)
        .collect()
}

#[cfg(target_os = "windows")]
pub fn default_font_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("C:/Windows/Fonts/")]
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub fn default_font_dirs() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/",
        "/usr/share/fonts/truetype/dejavu/",
        "/usr/share/fonts/truetype/liberation/",
        "/usr/local/share/fonts/",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

/// A parsed TrueType/OpenType face bound to a pixel size.
#[derive(Clone)]
pub struct ScalableFont {
    data: Arc<Vec<u8>>,
    face_index: u32,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    space_advance: u16,
    size_px: f32,
    family: Option<String>,
    source: PathBuf,
}

impl std::fmt::Debug for ScalableFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalableFont")
            .field("family", &self.family)
            .field("source", &self.source)
            .field("face_index", &self.face_index)
            .field("size_px", &self.size_px)
            .finish()
    }
}

impl ScalableFont {
    pub fn load(path: &Path, size_px: u32) -> OverlayResult<ScalableFont> {
        let data = std::fs::read(path).map_err(|source| OverlayError::FontRead {
            path: path.to_path_buf(),
            source,
        })?;
        ScalableFont::from_data(&data, size_px, path.to_path_buf())
    }

    /// Picks the first face of `data` (a single font or a collection) that parses.
    pub fn from_data(data: &[u8], size_px: u32, source: PathBuf) -> OverlayResult<ScalableFont> {
        let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
        for index in 0..count {
            if let Some(font) = ScalableFont::from_face(data, index, size_px, &source) {
                return Ok(font);
            }
        }
        Err(OverlayError::FontParse { path: source })
    }

    /// Loads face `index` of a font file or collection.
    pub fn load_face(path: &Path, index: u32, size_px: u32) -> OverlayResult<ScalableFont> {
        let data = std::fs::read(path).map_err(|source| OverlayError::FontRead {
            path: path.to_path_buf(),
            source,
        })?;
        ScalableFont::from_face(&data, index, size_px, path).ok_or_else(|| {
            OverlayError::FontParse {
                path: path.to_path_buf(),
            }
        })
    }

    fn from_face(data: &[u8], index: u32, size_px: u32, source: &Path) -> Option<ScalableFont> {
        let face = Face::parse(data, index).ok()?;
        let units_per_em = face.units_per_em().max(1);
        let space_advance = face
            .glyph_index(' ')
            .and_then(|id| face.glyph_hor_advance(id))
            .unwrap_or(units_per_em / 2);
        Some(ScalableFont {
            data: Arc::new(data.to_vec()),
            face_index: index,
            units_per_em,
            ascender: face.ascender(),
            descender: face.descender(),
            space_advance,
            size_px: size_px.max(1) as f32,
            family: extract_family_name(&face),
            source: source.to_path_buf(),
        })
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    pub(crate) fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.face_index).ok()
    }

    /// Design units to pixels.
    pub(crate) fn scale(&self) -> f32 {
        self.size_px / self.units_per_em as f32
    }

    pub(crate) fn ascender_px(&self) -> f32 {
        self.ascender as f32 * self.scale()
    }

    pub(crate) fn descender_px(&self) -> f32 {
        self.descender as f32 * self.scale()
    }

    pub(crate) fn space_advance(&self) -> u16 {
        self.space_advance
    }
}

/// Font used for one overlay call.
#[derive(Debug, Clone)]
pub enum FontHandle {
    Scalable(ScalableFont),
    /// Fixed-size bitmap glyphs; the requested font size is not honored.
    Builtin,
}

impl FontHandle {
    pub fn is_scalable(&self) -> bool {
        matches!(self, FontHandle::Scalable(_))
    }

    pub fn describe(&self) -> String {
        match self {
            FontHandle::Scalable(font) => format!(
                "{} ({}, {}px)",
                font.family().unwrap_or("unnamed"),
                font.source().display(),
                font.size_px()
            ),
            FontHandle::Builtin => format!(
                "built-in {}x{} bitmap",
                BUILTIN_FONT.character_size.width, BUILTIN_FONT.character_size.height
            ),
        }
    }
}

/// A face found by scanning the search directories.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScannedFace {
    post_script_name: String,
    path: PathBuf,
    index: u32,
}

/// Maps style keywords to loadable fonts, searching a configurable list of directories.
///
/// The resolver is immutable once built and can be shared between threads. The directory
/// scan behind the last scalable fallback runs at most once per resolver.
#[derive(Debug, Clone)]
pub struct FontResolver {
    search_dirs: Vec<PathBuf>,
    available: Vec<PathBuf>,
    scanned: OnceLock<Vec<ScannedFace>>,
}

impl Default for FontResolver {
    fn default() -> Self {
        FontResolver::new(default_font_dirs())
    }
}

impl FontResolver {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        let available = probe_well_known_fonts(&search_dirs);
        debug!(
            dirs = search_dirs.len(),
            available = available.len(),
            "font resolver ready"
        );
        Self {
            search_dirs,
            available,
            scanned: OnceLock::new(),
        }
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Well-known font files found under the search directories at construction time.
    pub fn available_fonts(&self) -> &[PathBuf] {
        &self.available
    }

    /// Never fails: the last resort is [`FontHandle::Builtin`].
    pub fn resolve(&self, size_px: u32, style: FontStyle) -> FontHandle {
        for name in style_candidates(style) {
            for dir in &self.search_dirs {
                let path = dir.join(name);
                if let Some(font) = try_load(&path, size_px) {
                    info!(style = style.as_str(), font = %path.display(), "resolved font");
                    return FontHandle::Scalable(font);
                }
            }
        }

        for path in &self.available {
            if let Some(font) = try_load(path, size_px) {
                info!(style = style.as_str(), font = %path.display(), "resolved fallback font");
                return FontHandle::Scalable(font);
            }
        }

        for face in self.scanned_faces() {
            match ScalableFont::load_face(&face.path, face.index, size_px) {
                Ok(font) => {
                    info!(style = style.as_str(), font = %face.path.display(), "resolved scanned font");
                    return FontHandle::Scalable(font);
                }
                Err(err) => debug!(error = %err, "skipping scanned face"),
            }
        }

        warn!(
            requested_size = size_px,
            "no scalable font available, using the built-in bitmap font at its fixed size"
        );
        FontHandle::Builtin
    }

    fn scanned_faces(&self) -> &[ScannedFace] {
        self.scanned.get_or_init(|| scan_font_dirs(&self.search_dirs))
    }
}

/// Search directories with nested duplicates removed; fontdb already recurses.
fn scan_roots(search_dirs: &[PathBuf]) -> Vec<&PathBuf> {
    search_dirs
        .iter()
        .enumerate()
        .filter(|(index, dir)| {
            !search_dirs.iter().enumerate().any(|(other_index, other)| {
                let nested = dir.starts_with(other) && *dir != other;
                let repeated = *dir == other && other_index < *index;
                nested || repeated
            })
        })
        .map(|(_, dir)| dir)
        .collect()
}

fn scan_font_dirs(search_dirs: &[PathBuf]) -> Vec<ScannedFace> {
    let mut db = fontdb::Database::new();
    for dir in scan_roots(search_dirs) {
        if dir.is_dir() {
            db.load_fonts_dir(dir);
        }
    }
    let mut faces = db
        .faces()
        .filter_map(|face| match &face.source {
            fontdb::Source::File(path) => Some(ScannedFace {
                post_script_name: face.post_script_name.clone(),
                path: path.clone(),
                index: face.index,
            }),
            _ => None,
        })
        .collect::<Vec<_>>();
    faces.sort_by(|a, b| {
        a.post_script_name
            .cmp(&b.post_script_name)
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.index.cmp(&b.index))
    });
    faces.dedup_by(|a, b| a.path == b.path && a.index == b.index);
    debug!(faces = faces.len(), "scanned font directories");
    faces
}

fn style_candidates(style: FontStyle) -> &'static [&'static str] {
    STYLE_CANDIDATES
        .iter()
        .find(|(candidate, _)| *candidate == style)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}

fn probe_well_known_fonts(search_dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for name in WELL_KNOWN_FONTS {
        for dir in search_dirs {
            let path = dir.join(name);
            if path.is_file() && !found.contains(&path) {
                found.push(path);
            }
        }
    }
    found
}

fn try_load(path: &Path, size_px: u32) -> Option<ScalableFont> {
    if !path.is_file() {
        return None;
    }
    match ScalableFont::load(path, size_px) {
        Ok(font) => Some(font),
        Err(err) => {
            debug!(error = %err, "font candidate rejected");
            None
        }
    }
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}
