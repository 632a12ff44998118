//! Hard wrapping by terminal display width, shared by the log and chat panels.

use unicode_width::UnicodeWidthChar;

/// Hard-wraps `text` into rows of at most `width` terminal columns.
///
/// Embedded newlines start new rows and blank lines are preserved. A glyph
/// wider than `width` gets a row to itself; zero-width marks stay attached to
/// the preceding glyph. Widths below 1 are treated as 1.
pub fn wrap_plain(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for segment in text.split('\n') {
        let mut row = String::new();
        let mut used = 0;
        for c in segment.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            row.push(c);
            used += w;
        }
        rows.push(row);
    }
    rows
}
