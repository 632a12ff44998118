//! Case-insensitive substring search over indexed log lines.

use crate::types::LogLine;

/// A search backend over log lines.
///
/// Implementations return positions of matching lines in ascending order and
/// treat an empty or whitespace-only query as "match everything".
pub trait LineSearch {
    fn filter_indices(&self, lines: &[LogLine], query: &str) -> Vec<usize>;

    /// The matching lines themselves, as an order-preserving subsequence.
    fn filter<'a>(&self, lines: &'a [LogLine], query: &str) -> Vec<&'a LogLine> {
        self.filter_indices(lines, query).into_iter().map(|i| &lines[i]).collect()
    }
}

/// Linear scan; adequate for logs of tens of thousands of lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringSearch;

impl LineSearch for SubstringSearch {
    fn filter_indices(&self, lines: &[LogLine], query: &str) -> Vec<usize> {
        if is_blank(query) {
            return (0..lines.len()).collect();
        }
        let needle = query.to_lowercase();
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.content.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Filters `lines` with the default [`SubstringSearch`] backend.
pub fn filter_lines<'a>(lines: &'a [LogLine], query: &str) -> Vec<&'a LogLine> {
    SubstringSearch.filter(lines, query)
}

/// True when the query would not narrow the line set.
pub fn is_blank(query: &str) -> bool {
    query.trim().is_empty()
}
