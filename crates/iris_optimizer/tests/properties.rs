mod setup;

use std::sync::Arc;

use iris_optimizer::{
    solver::{
        construction::{
            construct_solution::construct_solution, construction_params::ConstructionParams,
        },
        evaluator::{ViolatedConstraint, evaluate_solution},
        ls::{local_search::LocalSearch, neighborhood::NeighborhoodParams},
        solver::Solver,
        solver_params::{SolverParams, Threads},
    },
    utils::time::Deadline,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Every job ends up in exactly one route or unassigned, and every route is feasible.
    #[test]
    fn solution_is_a_feasible_partition(
        seed in any::<u64>(),
        job_count in 1_usize..20,
        vehicle_count in 1_usize..4,
        exploration_level in 0_usize..3,
    ) {
        let problem = setup::create_random_problem(seed, job_count, vehicle_count);

        let solution = Solver::new(
            Arc::clone(&problem),
            SolverParams {
                exploration_level,
                threads: Threads::Multi(2),
                seed,
                ..SolverParams::default()
            },
        )
        .solve()
        .unwrap();

        let evaluation = evaluate_solution(&solution.solution);

        prop_assert!(evaluation.is_partition);
        prop_assert!(evaluation.routes.iter().all(|route| route.feasible));
        prop_assert!(evaluation
            .routes
            .iter()
            .all(|route| !route.violations.contains(&ViolatedConstraint::Skills)));
        prop_assert_eq!(evaluation.unassigned.len(), solution.score.unassigned);
    }

    /// Local search never makes the construction worse.
    #[test]
    fn local_search_never_degrades_score(
        seed in any::<u64>(),
        job_count in 1_usize..25,
        vehicle_count in 1_usize..4,
        regret_index in 0_usize..8,
    ) {
        let problem = setup::create_random_problem(seed, job_count, vehicle_count);
        let params = ConstructionParams::from_table(regret_index, Some(seed));

        let mut solution = construct_solution(&problem, &params);
        let initial = solution.score();

        let mut local_search = LocalSearch::new(&problem, &NeighborhoodParams::default(), true);
        local_search.run(&mut solution, &Deadline::none());

        let improved = solution.score();
        prop_assert!(!initial.is_better_than(&improved), "{} -> {}", initial, improved);
    }

    /// Same input, seed, level and threads give the same routes.
    #[test]
    fn solve_is_deterministic(seed in any::<u64>(), job_count in 2_usize..15) {
        let problem = setup::create_random_problem(seed, job_count, 2);
        let params = SolverParams {
            exploration_level: 1,
            threads: Threads::Multi(3),
            seed,
            ..SolverParams::default()
        };

        let first = Solver::new(Arc::clone(&problem), params.clone()).solve().unwrap();
        let second = Solver::new(Arc::clone(&problem), params).solve().unwrap();

        prop_assert_eq!(first.score, second.score);
        prop_assert_eq!(
            setup::route_external_ids(&first),
            setup::route_external_ids(&second)
        );
    }
}
