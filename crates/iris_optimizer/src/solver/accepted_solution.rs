use super::{score::Score, solution::working_solution::WorkingSolution};

/// Final solution of a trajectory.
#[derive(Clone)]
pub struct AcceptedSolution {
    pub solution: WorkingSolution,
    pub score: Score,

    /// Index of the trajectory that produced the solution.
    pub trajectory: usize,
}

impl AcceptedSolution {
    pub fn is_complete(&self) -> bool {
        self.score.unassigned == 0
    }
}
