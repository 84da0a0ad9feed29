//! Page flip controller: spread index, turn transitions, and virtualization.
//!
//! Pages are shown as left/right spreads, so the current index is always the
//! even index of the left page. A flip enters a turning state at click time
//! and only moves the index once the turn has lasted `duration`; clicks during
//! a turn are dropped. [`FlipBook::go_to_page`] is the one place the index is
//! written, and it keeps it in range and even.

#[cfg(test)]
#[path = "flip_test.rs"]
mod flip_test;

use std::ops::Range;
use std::time::{Duration, Instant};

use crate::geom::Corner;

/// Direction of a page turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Forward,
    Backward,
}

/// Which page of the visible spread a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadSide {
    Left,
    Right,
}

/// Map a corner click to a flip. Outer corners turn pages; inner corners do nothing.
#[must_use]
pub fn corner_direction(side: SpreadSide, corner: Corner) -> Option<FlipDirection> {
    match (side, corner) {
        (SpreadSide::Right, Corner::TopRight | Corner::BottomRight) => Some(FlipDirection::Forward),
        (SpreadSide::Left, Corner::TopLeft | Corner::BottomLeft) => Some(FlipDirection::Backward),
        _ => None,
    }
}

/// A turn in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    pub direction: FlipDirection,
    /// Index requested at click time; clamped when the turn completes.
    pub target: usize,
    pub started_at: Instant,
}

/// What the caller must do for a turn that was just started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlipPlan {
    /// The target spread does not exist yet; append one page before the turn completes.
    pub append_page: bool,
    /// A turn was started. `false` when the appended page fills the right side of the current spread.
    pub turns: bool,
}

#[derive(Debug, Clone)]
pub struct FlipBook {
    current: usize,
    turning: Option<Turn>,
    duration: Duration,
}

impl FlipBook {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self { current: 0, turning: None, duration }
    }

    /// Index of the left page of the visible spread. Always even.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn turning(&self) -> Option<&Turn> {
        self.turning.as_ref()
    }

    #[must_use]
    pub fn is_turning(&self) -> bool {
        self.turning.is_some()
    }

    /// Start a forward turn. Returns `None` while another turn is running.
    ///
    /// On a half spread (no right page) there is nothing to turn to: the plan
    /// asks for one page to fill the right side and no turn starts.
    pub fn begin_forward(&mut self, total: usize, now: Instant) -> Option<FlipPlan> {
        if self.turning.is_some() {
            return None;
        }
        if self.current + 1 >= total {
            return Some(FlipPlan { append_page: true, turns: false });
        }
        let target = self.current + 2;
        self.turning = Some(Turn { direction: FlipDirection::Forward, target, started_at: now });
        Some(FlipPlan { append_page: target >= total, turns: true })
    }

    /// Start a backward turn. A no-op on the first spread or while another turn is running.
    pub fn begin_backward(&mut self, now: Instant) -> Option<FlipPlan> {
        if self.turning.is_some() || self.current == 0 {
            return None;
        }
        let target = self.current.saturating_sub(2);
        self.turning = Some(Turn { direction: FlipDirection::Backward, target, started_at: now });
        Some(FlipPlan { append_page: false, turns: true })
    }

    /// Complete the running turn once it has lasted the configured duration.
    ///
    /// Returns `true` when a turn completed on this tick.
    pub fn tick(&mut self, total: usize, now: Instant) -> bool {
        let Some(turn) = self.turning else {
            return false;
        };
        if now.saturating_duration_since(turn.started_at) < self.duration {
            return false;
        }
        self.turning = None;
        self.go_to_page(turn.target, total);
        true
    }

    /// Jump to the spread containing `index`, clamped to the last page.
    pub fn go_to_page(&mut self, index: usize, total: usize) -> usize {
        let clamped = index.min(total.saturating_sub(1));
        self.current = clamped - clamped % 2;
        self.current
    }

    /// Page indices currently rendered.
    #[must_use]
    pub fn visible(&self, total: usize) -> Range<usize> {
        let start = self.current.min(total);
        start..(self.current + 2).min(total)
    }

    /// Which side of the visible spread `index` sits on, if it is visible.
    #[must_use]
    pub fn side_of(&self, index: usize) -> Option<SpreadSide> {
        if index == self.current {
            Some(SpreadSide::Left)
        } else if index == self.current + 1 {
            Some(SpreadSide::Right)
        } else {
            None
        }
    }
}
