use std::iter::FusedIterator;

use memchr::{memchr, memchr_iter};

/// Advance `cursor` over `data` and return the next line without its `\n`.
///
/// A non-empty tail with no terminating newline is returned once as the
/// last line. When nothing remains the cursor is retired (`None`).
#[inline]
pub(crate) fn next_line<'a>(data: &'a [u8], cursor: &mut Option<usize>) -> Option<&'a [u8]> {
    let start = (*cursor)?;
    if start >= data.len() {
        *cursor = None;
        return None;
    }
    let rest = &data[start..];
    match memchr(b'\n', rest) {
        Some(i) => {
            *cursor = Some(start + i + 1);
            Some(&rest[..i])
        }
        None => {
            *cursor = Some(data.len());
            Some(rest)
        }
    }
}

/// Number of lines `next_line` would yield over `data`: every newline plus
/// one for an unterminated tail.
#[inline]
pub(crate) fn count_lines(data: &[u8]) -> u64 {
    match data.last() {
        None => 0,
        Some(&last) => memchr_iter(b'\n', data).count() as u64 + (last != b'\n') as u64,
    }
}

/// Forward, zero-copy scanner over one byte range.
///
/// Each scanner owns its cursor; several scanners may walk disjoint (or
/// overlapping) ranges of the same mapping concurrently.
#[derive(Debug, Clone)]
pub struct LineScanner<'a> {
    data: &'a [u8],
    cursor: Option<usize>,
}

impl<'a> LineScanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let cursor = if data.is_empty() { None } else { Some(0) };
        LineScanner { data, cursor }
    }

    /// Pick up a scan of `data` at a cursor saved from an earlier scan.
    pub(crate) fn resume(data: &'a [u8], cursor: Option<usize>) -> Self {
        LineScanner { data, cursor }
    }

    /// True once the cursor has been retired.
    #[inline]
    pub fn eof(&self) -> bool {
        self.cursor.is_none()
    }

    /// Offset of the next unread byte, or `None` once at eof.
    #[inline]
    pub fn position(&self) -> Option<usize> {
        self.cursor
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        match self.cursor {
            Some(pos) => &self.data[pos..],
            None => &[],
        }
    }

    /// Next line with the trailing newline excluded, or `None` at end of range.
    #[inline]
    pub fn getline(&mut self) -> Option<&'a [u8]> {
        next_line(self.data, &mut self.cursor)
    }

    /// Call `on_line` for every remaining line in order and return how many
    /// were processed. An error from `on_line` stops the scan right away;
    /// the cursor is left just past the failing line.
    pub fn for_each_line<E, F>(&mut self, mut on_line: F) -> Result<u64, E>
    where
        F: FnMut(&'a [u8]) -> Result<(), E>,
    {
        let mut count = 0u64;
        while let Some(line) = self.getline() {
            on_line(line)?;
            count += 1;
        }
        Ok(count)
    }
}

impl<'a> Iterator for LineScanner<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<&'a [u8]> {
        self.getline()
    }
}

impl FusedIterator for LineScanner<'_> {}
