use thiserror::Error;

/// Smallest worker count accepted by [`SplitOptions`].
pub const MIN_THREADS: usize = 2;
/// Largest worker count accepted by [`SplitOptions`].
pub const MAX_THREADS: usize = 8;
/// Default worker count.
pub const DEFAULT_THREADS: usize = 2;
/// Inputs smaller than this are scanned sequentially (1MB).
pub const DEFAULT_MIN_FILE_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "invalid number of threads: {requested} (expected {}..={})",
        MIN_THREADS,
        MAX_THREADS
    )]
    ThreadsOutOfRange { requested: usize },
}

/// Settings for a parallel split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOptions {
    num_threads: usize,
    min_file_size: usize,
}

impl Default for SplitOptions {
    fn default() -> Self {
        SplitOptions {
            num_threads: DEFAULT_THREADS,
            min_file_size: DEFAULT_MIN_FILE_SIZE,
        }
    }
}

impl SplitOptions {
    pub fn new(num_threads: usize, min_file_size: usize) -> Result<Self, ConfigError> {
        SplitOptions::default()
            .with_num_threads(num_threads)
            .map(|o| o.with_min_file_size(min_file_size))
    }

    /// Set the worker count; must be within `MIN_THREADS..=MAX_THREADS`.
    pub fn with_num_threads(mut self, num_threads: usize) -> Result<Self, ConfigError> {
        if !(MIN_THREADS..=MAX_THREADS).contains(&num_threads) {
            return Err(ConfigError::ThreadsOutOfRange {
                requested: num_threads,
            });
        }
        self.num_threads = num_threads;
        Ok(self)
    }

    /// Set the size threshold below which splitting falls back to one
    /// sequential scan. Zero means always split.
    pub fn with_min_file_size(mut self, min_file_size: usize) -> Self {
        self.min_file_size = min_file_size;
        self
    }

    #[inline]
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    #[inline]
    pub fn min_file_size(&self) -> usize {
        self.min_file_size
    }

    /// True when `len` bytes are below the threshold and should be scanned
    /// sequentially.
    #[inline]
    pub fn is_sequential(&self, len: usize) -> bool {
        len < self.min_file_size
    }
}
