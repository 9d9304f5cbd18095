use std::path::Path;

use tracing::debug;

use crate::scan::{self, LineScanner};
use crate::source::{MapError, MappedSource};
use crate::split::{self, SplitOptions};

/// Line reader over a read-only memory-mapped file.
///
/// `getline` hands out views into the mapping, never copies. The mapping is
/// released as soon as the sequential scan reports end of file, or when the
/// reader is dropped.
///
/// ```no_run
/// use flines::Reader;
///
/// let mut reader = Reader::open("access.log")?;
/// while let Some(line) = reader.getline() {
///     // `line` borrows the mapping and excludes the trailing '\n'
///     let _ = line;
/// }
/// assert!(reader.eof() && !reader.is_mapped());
/// # Ok::<(), flines::MapError>(())
/// ```
#[derive(Debug)]
pub struct Reader {
    source: MappedSource,
    cursor: Option<usize>,
}

impl Reader {
    /// Map `path` read-only. Fails if the file is missing, unreadable, not a
    /// regular file, or cannot be mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let source = MappedSource::open(path)?;
        let cursor = if source.is_empty() { None } else { Some(0) };
        Ok(Reader { source, cursor })
    }

    #[inline]
    pub fn is_mapped(&self) -> bool {
        self.source.is_mapped()
    }

    /// True once the sequential scan has reached end of file (immediately
    /// for an empty file).
    #[inline]
    pub fn eof(&self) -> bool {
        self.cursor.is_none()
    }

    /// Size of the mapped range in bytes; zero once unmapped.
    #[inline]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn path(&self) -> &Path {
        self.source.path()
    }

    /// The whole mapped range.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.source.as_slice()
    }

    /// Release the mapping now. Also ends the sequential scan.
    pub fn unmap(&mut self) {
        self.cursor = None;
        self.source.unmap();
    }

    /// End of file reached: retire the cursor and drop the mapping.
    fn release(&mut self) {
        if self.source.is_mapped() {
            debug!(path = %self.source.path().display(), "end of file, releasing mapping");
        }
        self.unmap();
    }

    /// Next line with its `\n` stripped, or `None` at end of file.
    ///
    /// The call that returns `None` also releases the mapping.
    pub fn getline(&mut self) -> Option<&[u8]> {
        let at_end = match self.cursor {
            Some(pos) => pos >= self.source.len(),
            None => true,
        };
        if at_end {
            self.release();
            return None;
        }
        scan::next_line(self.source.as_slice(), &mut self.cursor)
    }

    /// Feed every remaining line to `on_line` in file order and return the
    /// number of lines processed. Stops at the first error from `on_line`.
    /// Reaching the end of file releases the mapping, as with `getline`.
    pub fn for_each_line<E, F>(&mut self, on_line: F) -> Result<u64, E>
    where
        F: FnMut(&[u8]) -> Result<(), E>,
    {
        let mut scanner = LineScanner::resume(self.source.as_slice(), self.cursor);
        let result = scanner.for_each_line(on_line);
        self.cursor = scanner.position();
        if self.cursor.is_none() {
            self.release();
        }
        result
    }

    /// Independent scanner over the whole mapping. Does not move this
    /// reader's cursor.
    pub fn scanner(&self) -> LineScanner<'_> {
        LineScanner::new(self.source.as_slice())
    }

    /// Split the whole mapping across worker threads; see
    /// [`split::split_parallel`]. Ignores the sequential cursor.
    pub fn split_parallel<E, F>(&self, opts: &SplitOptions, on_line: F) -> Result<u64, E>
    where
        F: Fn(&[u8]) -> Result<(), E> + Sync,
        E: Send,
    {
        split::split_parallel(self.source.as_slice(), opts, on_line)
    }

    /// [`Reader::split_parallel`] with the segment index passed to the callback.
    pub fn split_parallel_indexed<E, F>(&self, opts: &SplitOptions, on_line: F) -> Result<u64, E>
    where
        F: Fn(usize, &[u8]) -> Result<(), E> + Sync,
        E: Send,
    {
        split::split_parallel_indexed(self.source.as_slice(), opts, on_line)
    }

    /// Count the lines of the whole mapping without a callback.
    pub fn count_lines(&self, opts: &SplitOptions) -> u64 {
        split::count_lines(self.source.as_slice(), opts)
    }
}
