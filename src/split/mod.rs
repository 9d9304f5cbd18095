mod config;
mod core;
pub mod plan;

#[cfg(test)]
mod tests;

pub use self::config::{
    ConfigError, DEFAULT_MIN_FILE_SIZE, DEFAULT_THREADS, MAX_THREADS, MIN_THREADS, SplitOptions,
};
pub use self::core::{count_lines, split_parallel, split_parallel_indexed};
pub use self::plan::{Segment, plan_segments};
