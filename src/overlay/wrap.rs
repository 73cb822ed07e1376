use super::measure::TextMetrics;

/// Character budget of the cheap first pass; pixel measurement has the final say.
const COARSE_WRAP_CHARS: usize = 50;

/// Splits `text` into display lines no wider than `max_width` pixels.
///
/// Explicit newlines separate paragraphs and an empty paragraph becomes a blank line.
/// A single word wider than `max_width` is kept whole on its own line and may overflow.
pub fn wrap_text<M: TextMetrics + ?Sized>(text: &str, max_width: u32, metrics: &M) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        for line in coarse_wrap(paragraph, COARSE_WRAP_CHARS) {
            if metrics.text_width(&line) <= max_width {
                lines.push(line);
            } else {
                lines.extend(split_by_width(&line, max_width, metrics));
            }
        }
    }
    lines
}

/// Tab stops used when expanding tabs before the character pass.
const TAB_WIDTH: usize = 8;

/// Greedy wrap by character count. Words are never broken.
///
/// Runs of spaces inside a line are kept; whitespace is only dropped where a line breaks.
/// Leading whitespace of the paragraph stays on the first line.
fn coarse_wrap(paragraph: &str, width: usize) -> Vec<String> {
    let normalized = normalize_whitespace(paragraph);
    let chunks = chunk_whitespace(&normalized);
    let mut chunks = chunks.iter().peekable();
    let mut lines: Vec<String> = Vec::new();

    while chunks.peek().is_some() {
        if !lines.is_empty() && chunks.next_if(|chunk| is_space(chunk)).is_some() {
            continue;
        }
        let mut line = String::new();
        let mut line_chars = 0usize;
        while let Some(chunk) = chunks.peek() {
            let chunk_chars = chunk.chars().count();
            if line_chars > 0 && line_chars + chunk_chars > width {
                break;
            }
            line.push_str(chunk);
            line_chars += chunk_chars;
            chunks.next();
        }
        let line = line.trim_end_matches(' ');
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    lines
}

/// Expands tabs to the next tab stop and turns every other whitespace character into a space.
fn normalize_whitespace(paragraph: &str) -> String {
    let mut out = String::with_capacity(paragraph.len());
    let mut column = 0usize;
    for ch in paragraph.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            out.push(if ch.is_whitespace() { ' ' } else { ch });
            column += 1;
        }
    }
    out
}

/// Alternating runs of spaces and non-space characters.
fn chunk_whitespace(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (offset, ch) in text.char_indices() {
        let space = ch == ' ';
        if in_space.is_some_and(|previous| previous != space) {
            chunks.push(&text[start..offset]);
            start = offset;
        }
        in_space = Some(space);
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

fn is_space(chunk: &str) -> bool {
    chunk.starts_with(' ')
}

fn split_by_width<M: TextMetrics + ?Sized>(line: &str, max_width: u32, metrics: &M) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if metrics.text_width(&candidate) <= max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}
