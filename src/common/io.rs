use std::fs::File;
use std::io;
use std::path::Path;

#[cfg(target_os = "linux")]
use std::sync::atomic::{AtomicBool, Ordering};

use memmap2::{Mmap, MmapOptions};

/// Files at or above this size get MADV_HUGEPAGE before any page is touched.
#[cfg(target_os = "linux")]
const HUGEPAGE_THRESHOLD: u64 = 2 * 1024 * 1024;

/// Cleared after the first EPERM so later opens skip straight to a plain open.
#[cfg(target_os = "linux")]
static NOATIME_ALLOWED: AtomicBool = AtomicBool::new(true);

/// Open `path` read-only for mapping.
///
/// On Linux the first attempt uses O_NOATIME so scanning a file does not
/// dirty its inode. O_NOATIME needs file ownership or CAP_FOWNER; once it is
/// refused it is never tried again in this process.
pub fn open_for_mapping(path: &Path) -> io::Result<File> {
    #[cfg(target_os = "linux")]
    {
        if NOATIME_ALLOWED.load(Ordering::Relaxed) {
            match open_noatime(path) {
                Err(e) if e.raw_os_error() == Some(libc::EPERM) => {
                    NOATIME_ALLOWED.store(false, Ordering::Relaxed);
                }
                other => return other,
            }
        }
    }
    File::open(path)
}

#[cfg(target_os = "linux")]
fn open_noatime(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NOATIME)
        .open(path)
}

/// Convert a file size from metadata into a mapping length, refusing sizes
/// the address space cannot hold instead of truncating them.
pub fn mapping_len(len: u64) -> io::Result<usize> {
    usize::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::FileTooLarge,
            format!("file of {} bytes does not fit in the address space", len),
        )
    })
}

/// Map an already-open file read-only and advise the kernel for a forward scan.
///
/// No MAP_POPULATE: it synchronously faults all pages with 4KB before
/// MADV_HUGEPAGE can take effect. HUGEPAGE is set first, then WILLNEED
/// triggers async readahead.
///
/// `len` must be non-zero; zero-length files are never mapped.
pub fn map_readonly(file: &File, len: u64) -> io::Result<Mmap> {
    let map_len = mapping_len(len)?;
    // SAFETY: read-only mapping. The file may be truncated by another process
    // while mapped; that is outside what this crate guards against.
    let mmap = unsafe { MmapOptions::new().len(map_len).map(file)? };

    #[cfg(target_os = "linux")]
    {
        if len >= HUGEPAGE_THRESHOLD {
            let _ = mmap.advise(memmap2::Advice::HugePage);
        }
        let _ = mmap.advise(memmap2::Advice::Sequential);
        let _ = mmap.advise(memmap2::Advice::WillNeed);
    }
    Ok(mmap)
}
