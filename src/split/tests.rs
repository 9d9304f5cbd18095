use super::*;
use std::convert::Infallible;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::scan::LineScanner;

/// Always split, regardless of input size.
fn eager(k: usize) -> SplitOptions {
    SplitOptions::new(k, 0).unwrap()
}

fn generate_lines(n: usize) -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..n {
        // Varying widths so division points land mid-line.
        data.extend_from_slice(format!("line-{}-{}", i, "x".repeat(i % 17)).as_bytes());
        data.push(b'\n');
    }
    data
}

fn sequential(data: &[u8]) -> Vec<Vec<u8>> {
    LineScanner::new(data).map(|l| l.to_vec()).collect()
}

/// Run an indexed split and reassemble lines in segment order.
fn reassembled(data: &[u8], opts: &SplitOptions) -> (u64, Vec<Vec<u8>>) {
    let buckets: Mutex<Vec<Vec<Vec<u8>>>> = Mutex::new(vec![Vec::new(); MAX_THREADS]);
    let total = split_parallel_indexed(data, opts, |idx, line| {
        buckets.lock().unwrap()[idx].push(line.to_vec());
        Ok::<_, Infallible>(())
    })
    .unwrap();
    (total, buckets.into_inner().unwrap().concat())
}

fn assert_well_formed(data: &[u8], segments: &[Segment]) {
    let mut expected_start = 0;
    for seg in segments {
        assert_eq!(seg.start, expected_start, "segments must be contiguous");
        assert!(!seg.is_empty());
        if seg.start > 0 {
            assert_eq!(data[seg.start - 1], b'\n');
        }
        if seg.end < data.len() {
            assert_eq!(data[seg.end - 1], b'\n');
        }
        expected_start = seg.end;
    }
    assert_eq!(expected_start, data.len(), "segments must cover the input");
}

// ──────────────────────────────────────────────────
// SplitOptions
// ──────────────────────────────────────────────────

#[test]
fn test_options_defaults() {
    let opts = SplitOptions::default();
    assert_eq!(opts.num_threads(), 2);
    assert_eq!(opts.min_file_size(), 1024 * 1024);
}

#[test]
fn test_options_reject_out_of_range_threads() {
    for bad in [0, 1, 9, 64] {
        assert_eq!(
            SplitOptions::new(bad, 0).unwrap_err(),
            ConfigError::ThreadsOutOfRange { requested: bad }
        );
    }
    for good in MIN_THREADS..=MAX_THREADS {
        assert_eq!(SplitOptions::new(good, 10).unwrap().num_threads(), good);
    }
}

#[test]
fn test_options_error_message() {
    let msg = SplitOptions::default()
        .with_num_threads(1)
        .unwrap_err()
        .to_string();
    assert_eq!(msg, "invalid number of threads: 1 (expected 2..=8)");
}

#[test]
fn test_is_sequential_threshold() {
    let opts = SplitOptions::default().with_min_file_size(100);
    assert!(opts.is_sequential(99));
    assert!(!opts.is_sequential(100));
}

// ──────────────────────────────────────────────────
// plan_segments
// ──────────────────────────────────────────────────

#[test]
fn test_plan_empty() {
    assert!(plan_segments(b"", 4).is_empty());
}

#[test]
fn test_plan_is_well_formed_for_every_k() {
    let data = generate_lines(500);
    for k in MIN_THREADS..=MAX_THREADS {
        let segments = plan_segments(&data, k);
        assert!(segments.len() <= k);
        assert_well_formed(&data, &segments);
    }
}

#[test]
fn test_plan_division_point_on_newline() {
    // len 8, k 2: division point 4 is a newline, so the boundary is right after it.
    let segments = plan_segments(b"abcd\nab\n", 2);
    assert_eq!(
        segments,
        vec![Segment { start: 0, end: 5 }, Segment { start: 5, end: 8 }]
    );
}

#[test]
fn test_plan_moves_boundary_backward() {
    // Division point 6 is inside "defgh"; nearest preceding newline is at 3.
    let data = b"abc\ndefgh\nij";
    let segments = plan_segments(data, 2);
    assert_eq!(segments[0], Segment { start: 0, end: 4 });
    assert_eq!(segments[1], Segment { start: 4, end: data.len() });
}

#[test]
fn test_plan_single_long_line_degenerates() {
    let data = vec![b'z'; 1000];
    let segments = plan_segments(&data, 4);
    assert_eq!(segments, vec![Segment { start: 0, end: 1000 }]);
}

#[test]
fn test_plan_long_line_spanning_divisions() {
    // One 600-byte line in the middle covers several division points.
    let mut data = b"head\n".to_vec();
    data.extend(std::iter::repeat_n(b'q', 600));
    data.extend_from_slice(b"\ntail\n");
    for k in MIN_THREADS..=MAX_THREADS {
        let segments = plan_segments(&data, k);
        assert_well_formed(&data, &segments);
        let holders = segments
            .iter()
            .filter(|s| s.range().contains(&5) || s.range().contains(&604))
            .count();
        assert_eq!(holders, 1, "k={k}: long line must sit in one segment");
    }
}

#[test]
fn test_plan_input_smaller_than_k() {
    let segments = plan_segments(b"\n\n", 8);
    assert_well_formed(b"\n\n", &segments);
}

#[test]
fn test_plan_straddling_line_stays_whole() {
    // 10MB of data with one long line across the K=2 midpoint.
    let len = 10_000_000;
    let mut data = vec![b'a'; len];
    for pos in (99..len).step_by(100) {
        data[pos] = b'\n';
    }
    for b in &mut data[4_999_000..5_001_000] {
        *b = b'L';
    }
    data[4_998_999] = b'\n';
    data[5_001_000] = b'\n';

    let segments = plan_segments(&data, 2);
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].end, 4_999_000);
    assert_well_formed(&data, &segments);
}

// ──────────────────────────────────────────────────
// split_parallel
// ──────────────────────────────────────────────────

#[test]
fn test_split_total_matches_sequential() {
    let data = generate_lines(2000);
    let expected = sequential(&data).len() as u64;
    for k in MIN_THREADS..=MAX_THREADS {
        let seen = AtomicU64::new(0);
        let total = split_parallel(&data, &eager(k), |_| {
            seen.fetch_add(1, Ordering::Relaxed);
            Ok::<_, Infallible>(())
        })
        .unwrap();
        assert_eq!(total, expected, "k={k}");
        assert_eq!(seen.load(Ordering::Relaxed), expected);
    }
}

#[test]
fn test_split_reassembly_matches_sequential() {
    let mut data = generate_lines(1500);
    data.extend_from_slice(b"no newline at end");
    let expected = sequential(&data);
    for k in MIN_THREADS..=MAX_THREADS {
        let (total, lines) = reassembled(&data, &eager(k));
        assert_eq!(total, expected.len() as u64);
        assert_eq!(lines, expected, "k={k}");
    }
}

#[test]
fn test_split_below_threshold_is_sequential() {
    let data = generate_lines(10);
    let opts = SplitOptions::default();
    let indices = Mutex::new(Vec::new());
    let total = split_parallel_indexed(&data, &opts, |idx, _| {
        indices.lock().unwrap().push(idx);
        Ok::<_, Infallible>(())
    })
    .unwrap();
    assert_eq!(total, 10);
    assert!(indices.into_inner().unwrap().iter().all(|&i| i == 0));
}

#[test]
fn test_split_empty_input() {
    for k in MIN_THREADS..=MAX_THREADS {
        let total = split_parallel(b"", &eager(k), |_| Ok::<_, Infallible>(())).unwrap();
        assert_eq!(total, 0);
    }
}

#[test]
fn test_split_error_from_lowest_failing_segment() {
    let data = generate_lines(4000);
    let opts = eager(4);
    let segments = plan_segments(&data, 4);
    assert_eq!(segments.len(), 4);

    let delivered = AtomicU64::new(0);
    let err = split_parallel_indexed(&data, &opts, |idx, _| {
        delivered.fetch_add(1, Ordering::Relaxed);
        if idx == 1 || idx == 3 {
            Err(format!("segment {idx} failed"))
        } else {
            Ok(())
        }
    })
    .unwrap_err();
    assert_eq!(err, "segment 1 failed");

    // Segments 0 and 2 ran to completion; 1 and 3 stopped at their first line.
    let full = LineScanner::new(segments[0].slice(&data)).count()
        + LineScanner::new(segments[2].slice(&data)).count();
    assert_eq!(delivered.load(Ordering::Relaxed), full as u64 + 2);
}

#[test]
#[should_panic(expected = "callback panic")]
fn test_split_worker_panic_is_resumed() {
    let data = generate_lines(1000);
    let _ = split_parallel(&data, &eager(3), |line| {
        if line.starts_with(b"line-999-") {
            panic!("callback panic");
        }
        Ok::<_, Infallible>(())
    });
}

// ──────────────────────────────────────────────────
// count_lines
// ──────────────────────────────────────────────────

#[test]
fn test_count_lines_parallel_matches_sequential() {
    let mut data = generate_lines(3000);
    data.extend_from_slice(b"tail");
    let expected = sequential(&data).len() as u64;
    for k in MIN_THREADS..=MAX_THREADS {
        assert_eq!(count_lines(&data, &eager(k)), expected, "k={k}");
    }
    assert_eq!(count_lines(&data, &SplitOptions::default()), expected);
}

#[test]
fn test_count_lines_empty_and_single_newline() {
    assert_eq!(count_lines(b"", &eager(2)), 0);
    assert_eq!(count_lines(b"\n", &eager(2)), 1);
}
