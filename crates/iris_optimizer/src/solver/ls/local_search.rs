use std::ops::ControlFlow;

use tracing::{debug, instrument};

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::{
        evaluator::evaluate_solution,
        insertion::find_best_insertion,
        ls::{
            inter_or_opt::InterOrOptOperator,
            inter_relocate::InterRelocateOperator,
            inter_swap::InterSwapOperator,
            r#move::{LocalSearchMove, LocalSearchOperator},
            neighborhood::{Neighborhood, NeighborhoodParams},
            or_opt::OrOptOperator,
            relocate::RelocateOperator,
            swap::SwapOperator,
            two_opt::TwoOptOperator,
        },
        score::IMPROVEMENT_EPSILON,
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
    utils::time::Deadline,
};

type RoutePair = (RouteIdx, RouteIdx);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperatorKind {
    Relocate,
    InterRelocate,
    Swap,
    InterSwap,
    TwoOpt,
    OrOpt,
    InterOrOpt,
}

const SCAN_ORDER: [OperatorKind; 7] = [
    OperatorKind::Relocate,
    OperatorKind::InterRelocate,
    OperatorKind::Swap,
    OperatorKind::InterSwap,
    OperatorKind::TwoOpt,
    OperatorKind::OrOpt,
    OperatorKind::InterOrOpt,
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LocalSearchStats {
    pub rounds: usize,
    pub applied_moves: usize,
    pub inserted_jobs: usize,
}

/// First-improvement local search over the granular neighborhood of a solution.
pub struct LocalSearch {
    neighborhood: Neighborhood,
    pairs: Vec<RoutePair>,
    max_rounds: usize,
    debug_assertions: bool,
}

impl LocalSearch {
    pub fn new(
        problem: &VehicleRoutingProblem,
        params: &NeighborhoodParams,
        debug_assertions: bool,
    ) -> Self {
        let count = problem.vehicles().len();

        let pairs = (0..count)
            .flat_map(|r1| (0..count).map(move |r2| (RouteIdx::new(r1), RouteIdx::new(r2))))
            .collect();

        LocalSearch {
            neighborhood: Neighborhood::new(problem, params),
            pairs,
            max_rounds: params.max_rounds,
            debug_assertions,
        }
    }

    /// Improves the solution until no operator finds an improving move and no unassigned
    /// job can be inserted, or until the round budget or the deadline is exhausted.
    #[instrument(skip_all, level = "debug")]
    pub fn run(&mut self, solution: &mut WorkingSolution, deadline: &Deadline) -> LocalSearchStats {
        let problem = solution.problem_arc().clone();
        let mut stats = LocalSearchStats::default();

        while stats.rounds < self.max_rounds && !deadline.is_reached() {
            stats.rounds += 1;

            let applied = self.run_round(&problem, solution);
            stats.applied_moves += applied;

            if applied > 0 {
                continue;
            }

            let inserted = self.insert_unassigned_jobs(solution);
            if inserted == 0 {
                break;
            }

            stats.inserted_jobs += inserted;
        }

        debug!(
            rounds = stats.rounds,
            applied_moves = stats.applied_moves,
            inserted_jobs = stats.inserted_jobs,
            score = %solution.score(),
            "Local search finished"
        );

        stats
    }

    /// Scans every operator over every route pair, applying the first improving move of
    /// each pair. Returns the number of applied moves.
    fn run_round(&self, problem: &VehicleRoutingProblem, solution: &mut WorkingSolution) -> usize {
        let mut applied = 0;

        for kind in SCAN_ORDER {
            for &pair in &self.pairs {
                // Every operator moves jobs out of the first route
                if solution.route(pair.0).is_empty() {
                    continue;
                }

                if let Some((delta, op)) = self.find_improving_move(kind, problem, solution, pair)
                {
                    self.apply(problem, solution, op, delta);
                    applied += 1;
                }
            }
        }

        applied
    }

    fn find_improving_move(
        &self,
        kind: OperatorKind,
        problem: &VehicleRoutingProblem,
        solution: &WorkingSolution,
        pair: RoutePair,
    ) -> Option<(f64, LocalSearchMove)> {
        match kind {
            OperatorKind::Relocate => self.first_improving::<RelocateOperator>(
                problem,
                solution,
                pair,
                LocalSearchMove::Relocate,
            ),
            OperatorKind::InterRelocate => self.first_improving::<InterRelocateOperator>(
                problem,
                solution,
                pair,
                LocalSearchMove::InterRelocate,
            ),
            OperatorKind::Swap => {
                self.first_improving::<SwapOperator>(problem, solution, pair, LocalSearchMove::Swap)
            }
            OperatorKind::InterSwap => self.first_improving::<InterSwapOperator>(
                problem,
                solution,
                pair,
                LocalSearchMove::InterSwap,
            ),
            OperatorKind::TwoOpt => self.first_improving::<TwoOptOperator>(
                problem,
                solution,
                pair,
                LocalSearchMove::TwoOpt,
            ),
            OperatorKind::OrOpt => self.first_improving::<OrOptOperator>(
                problem,
                solution,
                pair,
                LocalSearchMove::OrOpt,
            ),
            OperatorKind::InterOrOpt => self.first_improving::<InterOrOptOperator>(
                problem,
                solution,
                pair,
                LocalSearchMove::InterOrOpt,
            ),
        }
    }

    fn first_improving<O: LocalSearchOperator>(
        &self,
        problem: &VehicleRoutingProblem,
        solution: &WorkingSolution,
        pair: RoutePair,
        wrap: fn(O) -> LocalSearchMove,
    ) -> Option<(f64, LocalSearchMove)> {
        let mut found = None;

        let _ = O::generate_moves(problem, solution, &self.neighborhood, pair, |op| {
            let delta = op.delta(solution);

            if delta < -IMPROVEMENT_EPSILON && op.is_valid(solution) {
                found = Some((delta, wrap(op)));
                return ControlFlow::Break(());
            }

            ControlFlow::Continue(())
        });

        found
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        solution: &mut WorkingSolution,
        op: LocalSearchMove,
        delta: f64,
    ) {
        debug!(
            "Apply {} (d={}) {:?}",
            op.operator_name(),
            delta,
            op.updated_routes()
        );

        if !self.debug_assertions {
            op.apply(problem, solution);
            return;
        }

        let cost_before = solution.total_cost();
        let unassigned_before = solution.unassigned_jobs().len();

        op.apply(problem, solution);

        let evaluation = evaluate_solution(solution);

        assert!(
            (cost_before + delta - evaluation.cost).abs() < 1e-6,
            "Cost deviation detected for operator {}, delta {} does not match the cost after apply ({} -> {})",
            op.operator_name(),
            delta,
            cost_before,
            evaluation.cost
        );

        assert!(
            evaluation.is_feasible(),
            "Operator {} broke constraints {:?}",
            op.operator_name(),
            evaluation
                .routes
                .iter()
                .flat_map(|route| route.violations.iter())
                .collect::<Vec<_>>()
        );

        assert_eq!(
            unassigned_before,
            evaluation.unassigned.len(),
            "Operator {} changed the unassigned jobs",
            op.operator_name()
        );
    }

    /// Inserts every unassigned job that has a feasible position, cheapest first for each
    /// job in index order. Returns the number of inserted jobs.
    fn insert_unassigned_jobs(&self, solution: &mut WorkingSolution) -> usize {
        let mut inserted = 0;

        for job_id in solution.sorted_unassigned_jobs() {
            if let Ok((delta, insertion)) = find_best_insertion(solution, job_id) {
                debug!(job_id = job_id.get(), delta, "Insert unassigned job");
                solution.insert(&insertion);
                inserted += 1;
            }
        }

        inserted
    }
}
