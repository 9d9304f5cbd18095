//! Fast line reading over read-only memory-mapped files.
//!
//! [`Reader`] walks a mapped file line by line without copying, and splits
//! large files into newline-aligned segments scanned on parallel workers.

pub mod common;
pub mod reader;
pub mod scan;
pub mod source;
pub mod split;

pub use reader::Reader;
pub use scan::LineScanner;
pub use source::{MapError, MappedSource};
pub use split::{ConfigError, Segment, SplitOptions};
