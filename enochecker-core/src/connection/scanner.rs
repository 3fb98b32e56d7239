//! Resumable multi-byte delimiter search

/// Finds a delimiter in a growing buffer without rescanning bytes that were
/// already ruled out.
///
/// The buffer may only grow between calls to [`scan`](Self::scan). After a
/// miss, the next search restarts `delimiter.len() - 1` bytes before the old
/// end so a delimiter split across two refills is still found.
#[derive(Debug)]
pub struct DelimiterScanner<'d> {
    delimiter: &'d [u8],
    scanned: usize,
}

impl<'d> DelimiterScanner<'d> {
    /// `delimiter` must not be empty
    pub fn new(delimiter: &'d [u8]) -> Self {
        debug_assert!(!delimiter.is_empty());
        Self {
            delimiter,
            scanned: 0,
        }
    }

    /// Returns the end offset (exclusive) of the first delimiter occurrence
    pub fn scan(&mut self, haystack: &[u8]) -> Option<usize> {
        let len = self.delimiter.len();
        let start = self
            .scanned
            .saturating_sub(len.saturating_sub(1))
            .min(haystack.len());

        match haystack[start..]
            .windows(len)
            .position(|window| window == self.delimiter)
        {
            Some(offset) => Some(start + offset + len),
            None => {
                self.scanned = haystack.len();
                None
            }
        }
    }

    /// Number of bytes ruled out so far
    pub fn scanned(&self) -> usize {
        self.scanned
    }
}
