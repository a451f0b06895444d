use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

/// Closed interval `[start, end]`, both expressed as offsets from the planning horizon origin.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: SignedDuration,
    end: SignedDuration,
}

impl TimeWindow {
    pub const UNBOUNDED: TimeWindow = TimeWindow {
        start: SignedDuration::ZERO,
        end: SignedDuration::MAX,
    };

    pub fn new(start: SignedDuration, end: SignedDuration) -> Self {
        TimeWindow { start, end }
    }

    pub fn from_secs(start: i64, end: i64) -> Self {
        TimeWindow {
            start: SignedDuration::from_secs(start),
            end: SignedDuration::from_secs(end),
        }
    }

    pub fn start(&self) -> SignedDuration {
        self.start
    }

    pub fn end(&self) -> SignedDuration {
        self.end
    }

    pub fn is_unbounded(&self) -> bool {
        self.start <= SignedDuration::ZERO && self.end == SignedDuration::MAX
    }

    pub fn is_well_formed(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, time: SignedDuration) -> bool {
        self.start <= time && time <= self.end
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Ordered, non-overlapping list of windows. Service happens within exactly one of them.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TimeWindows(Vec<TimeWindow>);

impl TimeWindows {
    pub fn unbounded() -> Self {
        TimeWindows(vec![TimeWindow::UNBOUNDED])
    }

    /// An empty list falls back to the unbounded window. Windows are sorted by start.
    pub fn new(mut windows: Vec<TimeWindow>) -> Self {
        if windows.is_empty() {
            return Self::unbounded();
        }

        windows.sort_by_key(|window| (window.start, window.end));
        TimeWindows(windows)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeWindow> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[TimeWindow] {
        &self.0
    }

    pub fn is_unbounded(&self) -> bool {
        self.0.iter().any(TimeWindow::is_unbounded)
    }

    pub fn latest_end(&self) -> SignedDuration {
        self.0
            .iter()
            .map(TimeWindow::end)
            .max()
            .unwrap_or(SignedDuration::MAX)
    }

    /// Earliest time service can start when arriving at `arrival`: the start of the first
    /// window still open at `arrival`, or `arrival` itself inside a window.
    /// `None` when every window has already closed.
    #[inline]
    pub fn service_start(&self, arrival: SignedDuration) -> Option<SignedDuration> {
        self.0
            .iter()
            .find(|window| window.end >= arrival)
            .map(|window| arrival.max(window.start))
    }
}

impl Default for TimeWindows {
    fn default() -> Self {
        Self::unbounded()
    }
}
