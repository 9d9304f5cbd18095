use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use thiserror::Error;
use tracing::{debug, trace};

use crate::common::io::{map_readonly, open_for_mapping};
use crate::common::io_error_msg;

/// Failure to bring a file into memory. Raised only at open time.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("{}: {}", path.display(), io_error_msg(source))]
    NotFound { path: PathBuf, source: io::Error },

    #[error("{}: {}", path.display(), io_error_msg(source))]
    PermissionDenied { path: PathBuf, source: io::Error },

    #[error("{}: {}", path.display(), io_error_msg(source))]
    Open { path: PathBuf, source: io::Error },

    #[error("{}: not a regular file", path.display())]
    NotRegularFile { path: PathBuf },

    #[error("{}: cannot map file: {}", path.display(), io_error_msg(source))]
    Map { path: PathBuf, source: io::Error },
}

impl MapError {
    fn from_open(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => MapError::NotFound { path, source },
            io::ErrorKind::PermissionDenied => MapError::PermissionDenied { path, source },
            _ => MapError::Open { path, source },
        }
    }

    /// The path that failed to open or map.
    pub fn path(&self) -> &Path {
        match self {
            MapError::NotFound { path, .. }
            | MapError::PermissionDenied { path, .. }
            | MapError::Open { path, .. }
            | MapError::NotRegularFile { path }
            | MapError::Map { path, .. } => path,
        }
    }

    /// The I/O error kind behind this failure.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            MapError::NotFound { .. } => io::ErrorKind::NotFound,
            MapError::PermissionDenied { .. } => io::ErrorKind::PermissionDenied,
            MapError::Open { source, .. } | MapError::Map { source, .. } => source.kind(),
            MapError::NotRegularFile { .. } => io::ErrorKind::InvalidInput,
        }
    }
}

impl From<MapError> for io::Error {
    fn from(e: MapError) -> Self {
        io::Error::new(e.kind(), e)
    }
}

/// Read-only mapping of one regular file.
///
/// Zero-length files are never mapped: `is_mapped()` is false from the
/// start and `as_slice()` is empty.
#[derive(Debug)]
pub struct MappedSource {
    map: Option<Mmap>,
    path: PathBuf,
}

impl MappedSource {
    /// Open `path` and map its contents read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let path = path.as_ref();
        let file = open_for_mapping(path).map_err(|e| MapError::from_open(path, e))?;
        let metadata = file.metadata().map_err(|e| MapError::from_open(path, e))?;
        if !metadata.file_type().is_file() {
            return Err(MapError::NotRegularFile {
                path: path.to_path_buf(),
            });
        }

        let len = metadata.len();
        let map = if len == 0 {
            None
        } else {
            let mmap = map_readonly(&file, len).map_err(|source| MapError::Map {
                path: path.to_path_buf(),
                source,
            })?;
            Some(mmap)
        };
        debug!(path = %path.display(), len, "mapped file");

        Ok(MappedSource {
            map,
            path: path.to_path_buf(),
        })
    }

    /// The mapped bytes, or an empty slice once unmapped.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match &self.map {
            Some(m) => m,
            None => &[],
        }
    }

    /// Raw `[begin, end)` address range of the mapping.
    #[inline]
    pub fn as_ptr_range(&self) -> Range<*const u8> {
        self.as_slice().as_ptr_range()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_mapped(&self) -> bool {
        self.map.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the mapping. Calling it again is a no-op.
    pub fn unmap(&mut self) {
        if self.map.take().is_some() {
            trace!(path = %self.path.display(), "unmapped file");
        }
    }
}
