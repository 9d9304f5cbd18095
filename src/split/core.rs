use std::panic;
use std::thread;

use rayon::prelude::*;
use tracing::debug;

use super::config::SplitOptions;
use super::plan::{Segment, plan_segments};
use crate::scan::{self, LineScanner};

/// Run `on_line` over every line of `data`, one worker thread per segment.
///
/// Below `opts.min_file_size()` this is a single sequential scan. Otherwise
/// lines within a segment arrive in file order, but segments run concurrently
/// and their callbacks interleave. Returns the total line count, identical to
/// a sequential scan.
///
/// Every worker runs to completion. If any callback fails, the error of the
/// lowest-indexed failing segment is returned once all workers are joined;
/// lines already delivered by other segments are not undone. A panicking
/// callback is re-raised on the caller after the join when built with
/// unwinding; under `panic = "abort"` it ends the process immediately.
pub fn split_parallel<E, F>(data: &[u8], opts: &SplitOptions, on_line: F) -> Result<u64, E>
where
    F: Fn(&[u8]) -> Result<(), E> + Sync,
    E: Send,
{
    split_parallel_indexed(data, opts, |_, line| on_line(line))
}

/// Like [`split_parallel`], but the callback also receives the index of the
/// segment the line came from. Segment indices ascend with file offset, so
/// buffering lines per index and concatenating restores file order.
/// The sequential fallback reports everything as segment 0.
pub fn split_parallel_indexed<E, F>(data: &[u8], opts: &SplitOptions, on_line: F) -> Result<u64, E>
where
    F: Fn(usize, &[u8]) -> Result<(), E> + Sync,
    E: Send,
{
    if opts.is_sequential(data.len()) {
        debug!(
            len = data.len(),
            min_file_size = opts.min_file_size(),
            "below split threshold, scanning sequentially"
        );
        return LineScanner::new(data).for_each_line(|line| on_line(0, line));
    }

    let segments = plan_segments(data, opts.num_threads());
    debug!(
        len = data.len(),
        workers = segments.len(),
        "dispatching segment scans"
    );

    let mut total = 0u64;
    for result in scan_segments(data, &segments, &on_line) {
        total += result?;
    }
    Ok(total)
}

/// Scan each segment on its own scoped thread and collect the per-segment
/// outcome in segment order. All threads are joined before a worker panic
/// is resumed on the caller. This only applies with `panic = "unwind"`;
/// the release profile aborts the process at the panic site instead.
fn scan_segments<E, F>(data: &[u8], segments: &[Segment], on_line: &F) -> Vec<Result<u64, E>>
where
    F: Fn(usize, &[u8]) -> Result<(), E> + Sync,
    E: Send,
{
    thread::scope(|s| {
        let handles: Vec<_> = segments
            .iter()
            .enumerate()
            .map(|(idx, seg)| {
                let chunk = seg.slice(data);
                s.spawn(move || LineScanner::new(chunk).for_each_line(|line| on_line(idx, line)))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        let mut panicked = None;
        for handle in handles {
            match handle.join() {
                Ok(result) => results.push(result),
                Err(payload) => {
                    panicked.get_or_insert(payload);
                }
            }
        }
        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }
        results
    })
}

/// Count lines of `data` with the scanner's definition of a line (every
/// newline, plus an unterminated tail). Large inputs are counted per segment
/// on the rayon pool.
pub fn count_lines(data: &[u8], opts: &SplitOptions) -> u64 {
    if opts.is_sequential(data.len()) {
        return scan::count_lines(data);
    }
    plan_segments(data, opts.num_threads())
        .par_iter()
        .map(|seg| scan::count_lines(seg.slice(data)))
        .sum()
}
