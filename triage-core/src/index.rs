//! Chunk-to-line normalization for build logs.
//!
//! Pure functions only: the same chunk list always yields the same lines, so
//! callers may recompute freely instead of caching.

use std::iter::Peekable;
use std::str::Chars;

use unicode_width::UnicodeWidthChar;

use crate::types::{LogChunk, LogLine};

/// Line number used when a chunk has no usable `startLine`.
pub const DEFAULT_START_LINE: u64 = 1;

/// Tab stops fall every this many display columns.
pub const TAB_WIDTH: usize = 8;

/// Flattens ordered chunks into ordered, numbered log lines.
///
/// Each chunk's `content` is split on `'\n'` (an empty chunk still produces one
/// empty line) and numbered sequentially from the chunk's `start_line`. Chunks
/// are never reordered or deduplicated. A single trailing `'\r'` is stripped
/// from each line so CRLF logs display cleanly, and every line goes through
/// [`normalize_line`] so search and prompts see the text a terminal would show.
pub fn index_chunks(chunks: &[LogChunk]) -> Vec<LogLine> {
    let mut lines = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let (start, defaulted) = resolve_start_line(chunk);
        for (offset, raw) in chunk.content.split('\n').enumerate() {
            let content = raw.strip_suffix('\r').unwrap_or(raw);
            lines.push(LogLine {
                chunk_id: chunk.id,
                step_name: chunk.step_name.clone(),
                line_number: start + offset as u64,
                content: normalize_line(content),
                is_error: chunk.has_errors,
                number_defaulted: defaulted,
            });
        }
    }
    lines
}

/// Removes ANSI escape sequences and expands tabs to the next tab stop.
///
/// CI runners colour their output with SGR codes; left in place they would
/// print as `[31m` noise and break substring search. CSI (`ESC [ .. final`),
/// OSC (`ESC ] .. BEL` or `ESC ] .. ESC \`) and two-byte escapes are
/// dropped. All other characters are kept verbatim.
pub fn normalize_line(raw: &str) -> String {
    if !raw.contains(['\x1b', '\t']) {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut column = 0;
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => skip_escape(&mut chars),
            '\t' => {
                let pad = TAB_WIDTH - column % TAB_WIDTH;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            c => {
                out.push(c);
                column += c.width().unwrap_or(0);
            }
        }
    }
    out
}

/// Consumes the rest of an escape sequence whose `ESC` was already read.
fn skip_escape(chars: &mut Peekable<Chars<'_>>) {
    match chars.next() {
        // Parameter and intermediate bytes, then one final byte in `@..=~`.
        Some('[') => {
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        }
        Some(']') => {
            while let Some(c) = chars.next() {
                if c == '\x07' {
                    break;
                }
                if c == '\x1b' {
                    if chars.peek() == Some(&'\\') {
                        chars.next();
                    }
                    break;
                }
            }
        }
        _ => {}
    }
}

/// Number of chunks whose `startLine` was absent or non-positive.
pub fn defaulted_chunk_count(chunks: &[LogChunk]) -> usize {
    chunks.iter().filter(|c| resolve_start_line(c).1).count()
}

/// Returns the starting line number and whether it was defaulted.
fn resolve_start_line(chunk: &LogChunk) -> (u64, bool) {
    match chunk.start_line {
        Some(n) if n > 0 => (n as u64, false),
        _ => (DEFAULT_START_LINE, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(id: i64, start_line: Option<i64>, content: &str) -> LogChunk {
        LogChunk {
            id,
            index: id,
            step_name: format!("step-{id}"),
            content: content.to_owned(),
            has_errors: false,
            start_line,
        }
    }

    fn numbers_and_text(lines: &[LogLine]) -> Vec<(u64, &str)> {
        lines.iter().map(|l| (l.line_number, l.content.as_str())).collect()
    }

    #[test]
    fn numbers_from_start_line() {
        let lines = index_chunks(&[chunk(1, Some(10), "a\nb\nc")]);
        assert_eq!(numbers_and_text(&lines), vec![(10, "a"), (11, "b"), (12, "c")]);
        assert!(lines.iter().all(|l| !l.number_defaulted));
    }

    #[test]
    fn missing_or_zero_start_line_falls_back_to_one() {
        for start in [None, Some(0), Some(-4)] {
            let lines = index_chunks(&[chunk(1, start, "x\ny")]);
            assert_eq!(numbers_and_text(&lines), vec![(1, "x"), (2, "y")]);
            assert!(lines.iter().all(|l| l.number_defaulted));
        }
    }

    #[test]
    fn empty_chunk_yields_one_blank_line() {
        let lines = index_chunks(&[chunk(1, Some(5), "")]);
        assert_eq!(numbers_and_text(&lines), vec![(5, "")]);
    }

    #[test]
    fn trailing_newline_keeps_trailing_blank_line() {
        let lines = index_chunks(&[chunk(1, Some(1), "a\r\nb\n")]);
        assert_eq!(numbers_and_text(&lines), vec![(1, "a"), (2, "b"), (3, "")]);
    }

    #[test]
    fn preserves_chunk_order_and_inherits_error_flag() {
        let mut failing = chunk(2, Some(3), "boom");
        failing.has_errors = true;
        let chunks = vec![chunk(1, Some(1), "one\ntwo"), failing];

        let lines = index_chunks(&chunks);
        assert_eq!(numbers_and_text(&lines), vec![(1, "one"), (2, "two"), (3, "boom")]);
        assert_eq!(lines.iter().map(|l| l.is_error).collect::<Vec<_>>(), vec![false, false, true]);
        assert_eq!(lines[2].chunk_id, 2);
        assert_eq!(lines[2].step_name, "step-2");
    }

    #[test]
    fn indexing_is_idempotent() {
        let chunks = vec![chunk(1, None, "a\nb"), chunk(2, Some(40), "c")];
        assert_eq!(index_chunks(&chunks), index_chunks(&chunks));
    }

    #[test]
    fn strips_colour_codes_and_expands_tabs() {
        let lines = index_chunks(&[chunk(1, Some(1), "\x1b[31mERROR\x1b[0m\tboom\n\x1b[1;32m✓\x1b[m ok")]);
        assert_eq!(numbers_and_text(&lines), vec![(1, "ERROR   boom"), (2, "✓ ok")]);
    }

    #[test]
    fn normalize_line_handles_osc_and_tab_stops() {
        assert_eq!(normalize_line("\x1b]0;title\x07done"), "done");
        assert_eq!(normalize_line("\x1b]8;;http://x\x1b\\link"), "link");
        assert_eq!(normalize_line("a\tb"), "a       b");
        assert_eq!(normalize_line("12345678\tx"), "12345678        x");
        assert_eq!(normalize_line("literal [31m stays"), "literal [31m stays");
    }

    #[test]
    fn search_sees_normalized_text() {
        let lines = index_chunks(&[chunk(1, Some(1), "\x1b[31mnpm ERR!\x1b[0m code 1")]);
        assert_eq!(crate::search::filter_lines(&lines, "err! code").len(), 1);
    }

    #[test]
    fn counts_defaulted_chunks() {
        let chunks = vec![chunk(1, None, "a"), chunk(2, Some(2), "b"), chunk(3, Some(0), "c")];
        assert_eq!(defaulted_chunk_count(&chunks), 2);
    }
}
