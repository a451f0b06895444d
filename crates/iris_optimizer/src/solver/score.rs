use std::{cmp::Ordering, fmt};

use serde::Serialize;

/// Moves must improve the cost by more than this to be applied.
pub const IMPROVEMENT_EPSILON: f64 = 1e-6;

/// Solutions are compared on the number of unassigned jobs first, then on the total cost.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Score {
    pub unassigned: usize,
    pub cost: f64,
}

impl Score {
    pub const MAX: Score = Score {
        unassigned: usize::MAX,
        cost: f64::MAX,
    };

    pub fn new(unassigned: usize, cost: f64) -> Self {
        Score { unassigned, cost }
    }

    /// Strictly better, costs closer than [`IMPROVEMENT_EPSILON`] are considered equal.
    pub fn is_better_than(&self, other: &Score) -> bool {
        match self.unassigned.cmp(&other.unassigned) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => self.cost < other.cost - IMPROVEMENT_EPSILON,
        }
    }

    pub fn is_equivalent_to(&self, other: &Score) -> bool {
        !self.is_better_than(other) && !other.is_better_than(self)
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.unassigned
            .cmp(&other.unassigned)
            .then_with(|| self.cost.total_cmp(&other.cost))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}unassigned/{:.2}cost", self.unassigned, self.cost)
    }
}
