//! Block-glyph bars at 1/8 cell resolution.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::workers::SpectralFrame;

/// Left-to-right partial blocks, index = eighths filled.
const HORIZONTAL: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];
/// Bottom-up partial blocks.
const RISING: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A bar exactly `width` cells wide, filled to `fraction` (clamped to 0..=1).
pub fn horizontal_bar(fraction: f64, width: usize) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let eighths = (fraction * (width * 8) as f64).floor() as usize;
    let full = eighths / 8;
    let partial = eighths % 8;

    let mut out = String::with_capacity(width * 3);
    out.extend(std::iter::repeat_n(HORIZONTAL[8], full));
    if full < width {
        out.push(HORIZONTAL[partial]);
        out.extend(std::iter::repeat_n(' ', width - full - 1));
    }
    out
}

/// `m:ss`, or `h:mm:ss` past an hour. Negative or unknown times read `-:--`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "-:--".to_string();
    }
    let total = seconds.floor() as u64;
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Cut `text` to `width` display cells, ending in `…` when shortened.
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// Drop at least `cells` display cells from the start of `text`, whole
/// characters only. Returns the rest and the number of cells dropped.
pub fn skip_cells(text: &str, cells: usize) -> (&str, usize) {
    let mut dropped = 0;
    for (i, c) in text.char_indices() {
        if dropped >= cells {
            return (&text[i..], dropped);
        }
        dropped += c.width().unwrap_or(0);
    }
    ("", dropped)
}

/// Mirrored spectrum: the left channel rises from the middle, the right
/// channel hangs below it. One column per cell; bands are resampled to fit.
pub fn spectrum_rows(frame: &SpectralFrame, width: usize, rows: usize) -> Vec<String> {
    let upper = rows.div_ceil(2);
    let lower = rows - upper;
    let left = resample(&frame.left, width);
    let right = resample(if frame.right.is_empty() { &frame.left } else { &frame.right }, width);

    let mut out = Vec::with_capacity(rows);
    for r in 0..upper {
        // Distance from the centre line, counted in cells.
        let depth = upper - 1 - r;
        out.push(left.iter().map(|v| rising_cell(*v, upper, depth)).collect());
    }
    for depth in 0..lower {
        out.push(right.iter().map(|v| hanging_cell(*v, lower, depth)).collect());
    }
    out
}

fn resample(bands: &[f32], width: usize) -> Vec<f32> {
    if bands.is_empty() {
        return vec![0.0; width];
    }
    (0..width)
        .map(|c| bands[(c * bands.len() / width.max(1)).min(bands.len() - 1)])
        .collect()
}

fn eighths_in_cell(value: f32, cells: usize, depth: usize) -> usize {
    let total = (value.clamp(0.0, 1.0) * (cells * 8) as f32).round() as usize;
    total.saturating_sub(depth * 8).min(8)
}

fn rising_cell(value: f32, cells: usize, depth: usize) -> char {
    RISING[eighths_in_cell(value, cells, depth)]
}

fn hanging_cell(value: f32, cells: usize, depth: usize) -> char {
    match eighths_in_cell(value, cells, depth) {
        8 => '█',
        4..=7 => '▀',
        1..=3 => '▔',
        _ => ' ',
    }
}
