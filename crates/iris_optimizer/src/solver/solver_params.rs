use jiff::SignedDuration;

use crate::solver::trajectory::MAX_EXPLORATION_LEVEL;

#[derive(Clone, Debug, Default)]
pub struct SolverParamsDebugOptions {
    /// Checks every applied move against a full evaluation of the solution, panicking on
    /// any mismatch.
    pub run_assertions: bool,
}

#[derive(Clone, Debug)]
pub struct SolverParams {
    /// Clamped to [`MAX_EXPLORATION_LEVEL`].
    pub exploration_level: usize,
    pub threads: Threads,

    /// Base of the seeds given to the randomized trajectories.
    pub seed: u64,

    /// Budget of every trajectory, checked between local search rounds.
    pub terminations: Vec<Termination>,
    pub debug_options: SolverParamsDebugOptions,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Termination {
    Duration(SignedDuration),
    Rounds(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Threads {
    Single,
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => (*num).max(1),
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            exploration_level: 1,
            threads: Threads::Multi(4),
            seed: 0,
            terminations: vec![],
            debug_options: SolverParamsDebugOptions::default(),
        }
    }
}

impl SolverParams {
    pub fn exploration_level(&self) -> usize {
        self.exploration_level.min(MAX_EXPLORATION_LEVEL)
    }

    /// Tightest wall-clock budget of the terminations.
    pub fn max_duration(&self) -> Option<SignedDuration> {
        self.terminations
            .iter()
            .filter_map(|termination| match termination {
                Termination::Duration(duration) => Some(*duration),
                Termination::Rounds(_) => None,
            })
            .min()
    }

    /// Tightest round budget of the terminations.
    pub fn max_rounds(&self) -> Option<usize> {
        self.terminations
            .iter()
            .filter_map(|termination| match termination {
                Termination::Rounds(rounds) => Some(*rounds),
                Termination::Duration(_) => None,
            })
            .min()
    }
}
