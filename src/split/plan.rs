use std::ops::Range;

use memchr::memrchr;
use tracing::debug;

/// Newline-aligned half-open byte range `[start, end)` handed to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    #[inline]
    pub fn slice<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.range()]
    }
}

/// Divide `data` into at most `k` newline-aligned segments.
///
/// Division points fall every `len / k` bytes. Each internal point is moved
/// backward to just after the nearest `\n` at or before it, never crossing
/// the previous boundary. A point with no newline in its window is dropped,
/// so one long line makes its segment larger instead of being cut. The last
/// segment always runs to `data.len()`.
pub fn plan_segments(data: &[u8], k: usize) -> Vec<Segment> {
    let len = data.len();
    if len == 0 {
        return Vec::new();
    }
    let k = k.max(1);
    let step = len / k;
    let mut segments = Vec::with_capacity(k);
    let mut start = 0;

    for i in 1..k {
        let target = i * step;
        if target < start {
            continue;
        }
        // Window includes the byte at the division point itself, so a
        // division point that sits on a newline is the boundary.
        let window_end = (target + 1).min(len);
        let Some(p) = memrchr(b'\n', &data[start..window_end]) else {
            continue;
        };
        let end = start + p + 1;
        segments.push(Segment { start, end });
        start = end;
        if start == len {
            break;
        }
    }

    if start < len {
        segments.push(Segment { start, end: len });
    }

    debug!(len, k, segments = segments.len(), "planned segments");
    segments
}
