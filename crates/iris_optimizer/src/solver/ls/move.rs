use std::ops::ControlFlow;

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::{
        ls::{
            inter_or_opt::InterOrOptOperator, inter_relocate::InterRelocateOperator,
            inter_swap::InterSwapOperator, neighborhood::Neighborhood, or_opt::OrOptOperator,
            relocate::RelocateOperator, swap::SwapOperator, two_opt::TwoOptOperator,
        },
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

pub trait LocalSearchOperator: Sized {
    /// Feeds every candidate move of the route pair to `consumer`, until it breaks.
    fn generate_moves<C>(
        problem: &VehicleRoutingProblem,
        solution: &WorkingSolution,
        neighborhood: &Neighborhood,
        pair: (RouteIdx, RouteIdx),
        consumer: C,
    ) -> ControlFlow<()>
    where
        C: FnMut(Self) -> ControlFlow<()>;

    /// Cost change of the move, from the modified edges only.
    fn delta(&self, solution: &WorkingSolution) -> f64;
    fn is_valid(&self, solution: &WorkingSolution) -> bool;
    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut WorkingSolution);
    fn updated_routes(&self) -> Vec<RouteIdx>;
}

#[derive(Debug)]
pub enum LocalSearchMove {
    /// Moves a job to another position of the same route.
    Relocate(RelocateOperator),
    /// Moves a job to another route.
    InterRelocate(InterRelocateOperator),
    /// Exchanges two jobs of the same route.
    Swap(SwapOperator),
    /// Exchanges two jobs between two routes.
    InterSwap(InterSwapOperator),
    /// Reverses a segment of a route.
    TwoOpt(TwoOptOperator),
    /// Moves a chain of consecutive jobs to another position of the same route.
    OrOpt(OrOptOperator),
    /// Moves a chain of consecutive jobs to another route.
    InterOrOpt(InterOrOptOperator),
}

impl LocalSearchMove {
    pub fn operator_name(&self) -> &'static str {
        match self {
            LocalSearchMove::Relocate { .. } => "Relocate",
            LocalSearchMove::InterRelocate { .. } => "Inter-Relocate",
            LocalSearchMove::Swap { .. } => "Swap",
            LocalSearchMove::InterSwap { .. } => "Inter-Swap",
            LocalSearchMove::TwoOpt { .. } => "Two-Opt",
            LocalSearchMove::OrOpt { .. } => "Or-Opt",
            LocalSearchMove::InterOrOpt { .. } => "Inter Or-Opt",
        }
    }

    pub fn delta(&self, solution: &WorkingSolution) -> f64 {
        match self {
            LocalSearchMove::Relocate(op) => op.delta(solution),
            LocalSearchMove::InterRelocate(op) => op.delta(solution),
            LocalSearchMove::Swap(op) => op.delta(solution),
            LocalSearchMove::InterSwap(op) => op.delta(solution),
            LocalSearchMove::TwoOpt(op) => op.delta(solution),
            LocalSearchMove::OrOpt(op) => op.delta(solution),
            LocalSearchMove::InterOrOpt(op) => op.delta(solution),
        }
    }

    pub fn is_valid(&self, solution: &WorkingSolution) -> bool {
        match self {
            LocalSearchMove::Relocate(op) => op.is_valid(solution),
            LocalSearchMove::InterRelocate(op) => op.is_valid(solution),
            LocalSearchMove::Swap(op) => op.is_valid(solution),
            LocalSearchMove::InterSwap(op) => op.is_valid(solution),
            LocalSearchMove::TwoOpt(op) => op.is_valid(solution),
            LocalSearchMove::OrOpt(op) => op.is_valid(solution),
            LocalSearchMove::InterOrOpt(op) => op.is_valid(solution),
        }
    }

    pub fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut WorkingSolution) {
        match self {
            LocalSearchMove::Relocate(op) => op.apply(problem, solution),
            LocalSearchMove::InterRelocate(op) => op.apply(problem, solution),
            LocalSearchMove::Swap(op) => op.apply(problem, solution),
            LocalSearchMove::InterSwap(op) => op.apply(problem, solution),
            LocalSearchMove::TwoOpt(op) => op.apply(problem, solution),
            LocalSearchMove::OrOpt(op) => op.apply(problem, solution),
            LocalSearchMove::InterOrOpt(op) => op.apply(problem, solution),
        }
    }

    pub fn updated_routes(&self) -> Vec<RouteIdx> {
        match self {
            LocalSearchMove::Relocate(op) => op.updated_routes(),
            LocalSearchMove::InterRelocate(op) => op.updated_routes(),
            LocalSearchMove::Swap(op) => op.updated_routes(),
            LocalSearchMove::InterSwap(op) => op.updated_routes(),
            LocalSearchMove::TwoOpt(op) => op.updated_routes(),
            LocalSearchMove::OrOpt(op) => op.updated_routes(),
            LocalSearchMove::InterOrOpt(op) => op.updated_routes(),
        }
    }
}
