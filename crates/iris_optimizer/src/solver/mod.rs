pub mod accepted_solution;
pub mod construction;
pub mod error;
pub mod evaluator;
pub mod insertion;
pub mod insertion_cache;
pub mod ls;
pub mod score;
pub mod solution;
pub mod solver;
pub mod solver_params;
pub mod trajectory;
