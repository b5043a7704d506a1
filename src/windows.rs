// windows.rs

use std::ops::Range;

/// One sliding window, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub index: usize,
    pub start: u64,
    pub stop: u64,
}

impl Window {
    pub fn midpoint(&self) -> f64 {
        (self.start as f64 + self.stop as f64) / 2.0
    }
}

/// `floor((last - first - window_size) / step_size)`, or 0 when the span does
/// not exceed one window.
pub fn window_count(first_position: u64, last_position: u64, window_size: u64, step_size: u64) -> usize {
    let span = last_position.saturating_sub(first_position);
    if span <= window_size || step_size == 0 {
        return 0;
    }
    usize::try_from((span - window_size) / step_size).unwrap_or(usize::MAX)
}

pub fn plan_windows(
    first_position: u64,
    last_position: u64,
    window_size: u64,
    step_size: u64,
) -> Vec<Window> {
    let n_windows = window_count(first_position, last_position, window_size, step_size);
    (0..n_windows)
        .map(|index| {
            let start = first_position + index as u64 * step_size;
            Window {
                index,
                start,
                stop: start + window_size,
            }
        })
        .collect()
}

/// Indices of the variants with `start <= position <= stop`.
/// `positions` must be sorted.
pub fn select_variants(positions: &[u64], window: &Window) -> Range<usize> {
    let lower = positions.partition_point(|&pos| pos < window.start);
    let upper = positions.partition_point(|&pos| pos <= window.stop);
    lower..upper.max(lower)
}
