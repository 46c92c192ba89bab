//! Helvetica advance widths and greedy word wrapping.
//!
//! Widths are the standard Adobe AFM values in 1/1000 em for the WinAnsi
//! printable range. Anything outside the table is measured as a digit.

/// Millimetres per PostScript point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

const FALLBACK_WIDTH: u16 = 556;

/// Helvetica advance widths for `' '..='~'`.
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Advance width of one character in 1/1000 em.
pub fn char_width(c: char) -> u16 {
    match c {
        ' '..='~' => ASCII_WIDTHS[c as usize - 0x20],
        '•' => 350,
        '\u{a0}' => 278,
        '–' => 556,
        '—' => 1000,
        '‘' | '’' => 222,
        '“' | '”' => 333,
        '…' => 1000,
        '°' => 400,
        'é' | 'è' | 'ê' | 'ë' | 'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ó' | 'ò' | 'ô' | 'ö' | 'õ'
        | 'ú' | 'ù' | 'û' | 'ü' | 'ñ' => 556,
        'í' | 'ì' | 'î' | 'ï' => 278,
        _ => FALLBACK_WIDTH,
    }
}

/// Width of `text` in millimetres at `size_pt`.
pub fn text_width(text: &str, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c))).sum();
    units as f32 / 1000.0 * size_pt * MM_PER_PT
}

/// Greedy word wrap of one line to `max_width` millimetres.
///
/// Words are separated by single spaces in the output; leading spaces are
/// kept on the first sub-line so indented text stays indented. A word wider
/// than the line is split between characters. Returns no lines for blank
/// input.
pub fn wrap(text: &str, max_width: f32, size_pt: f32) -> Vec<String> {
    let text = text.trim_end();
    let body = text.trim_start_matches(' ');
    if body.is_empty() {
        return Vec::new();
    }
    let indent = &text[..text.len() - body.len()];

    let fits = |s: &str| text_width(s, size_pt) <= max_width;
    let mut lines = Vec::new();
    let mut current = String::from(indent);

    for word in body.split(' ').filter(|w| !w.is_empty()) {
        let candidate = if current.trim_start().is_empty() {
            format!("{current}{word}")
        } else {
            format!("{current} {word}")
        };
        if fits(&candidate) {
            current = candidate;
            continue;
        }
        if !current.trim_start().is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if fits(word) {
            current = word.to_string();
        } else {
            let mut pieces = split_word(word, max_width, size_pt);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
    }
    if !current.trim_start().is_empty() {
        lines.push(current);
    }
    lines
}

/// Split an over-long word into chunks that each fit, at least one
/// character per chunk.
fn split_word(word: &str, max_width: f32, size_pt: f32) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    for c in word.chars() {
        chunk.push(c);
        if text_width(&chunk, size_pt) > max_width && chunk.chars().count() > 1 {
            chunk.pop();
            chunks.push(std::mem::take(&mut chunk));
            chunk.push(c);
        }
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}
