mod core;


pub(crate) use self::core::{count_lines, next_line};
pub use self::core::LineScanner;
