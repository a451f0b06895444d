/// Job used to open each empty route before the greedy insertion starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStrategy {
    None,
    /// Largest total demand.
    HigherAmount,
    /// Cheapest to reach from the vehicle start.
    Nearest,
    /// Most expensive to reach from the vehicle start.
    Furthest,
    /// Earliest end of the last time window.
    EarliestDeadline,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstructionParams {
    /// Weight of the regret, the gap between the best insertion and the best insertion
    /// in another vehicle. Zero means cheapest insertion.
    pub regret_coefficient: f64,
    pub init: InitStrategy,

    /// Replaces the job identifier tie-break by a random rank when set.
    pub seed: Option<u64>,
}

impl Default for ConstructionParams {
    fn default() -> Self {
        ConstructionParams {
            regret_coefficient: 0.0,
            init: InitStrategy::None,
            seed: None,
        }
    }
}

/// Heuristic parameter sets cycled through by the exploration trajectories.
pub const HEURISTIC_TABLE: [(InitStrategy, f64); 8] = [
    (InitStrategy::None, 0.3),
    (InitStrategy::HigherAmount, 0.3),
    (InitStrategy::Nearest, 0.3),
    (InitStrategy::Furthest, 0.3),
    (InitStrategy::EarliestDeadline, 0.3),
    (InitStrategy::None, 0.1),
    (InitStrategy::HigherAmount, 1.0),
    (InitStrategy::Furthest, 0.0),
];

impl ConstructionParams {
    pub fn from_table(index: usize, seed: Option<u64>) -> Self {
        let (init, regret_coefficient) = HEURISTIC_TABLE[index % HEURISTIC_TABLE.len()];

        ConstructionParams {
            regret_coefficient,
            init,
            seed,
        }
    }
}
