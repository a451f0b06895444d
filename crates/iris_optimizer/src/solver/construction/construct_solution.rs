use std::{cmp::Ordering, sync::Arc};

use rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom};
use tracing::{Level, debug, instrument};

use crate::{
    problem::{
        job::{Job, JobIdx},
        vehicle::Vehicle,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        construction::construction_params::{ConstructionParams, InitStrategy},
        insertion::{Insertion, find_best_insertion},
        insertion_cache::{InsertionCache, InsertionCacheEntry},
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
    utils::enumerate_idx::EnumerateIdx,
};

/// Insertion picked by the greedy loop, compared on `value` then on the ranks.
#[derive(Debug, Clone)]
struct Candidate {
    value: f64,
    job_rank: usize,
    vehicle_rank: usize,
    insertion: Insertion,
}

impl Candidate {
    fn cmp(&self, other: &Candidate) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then(self.job_rank.cmp(&other.job_rank))
            .then(self.vehicle_rank.cmp(&other.vehicle_rank))
            .then(self.insertion.position.cmp(&other.insertion.position))
    }
}

/// Position of every index once sorted by `key`, used as tie-break ranks.
fn ranks_by_key<T, K: Ord>(items: &[T], key: impl Fn(&T) -> K) -> Vec<usize> {
    let mut order = (0..items.len()).collect::<Vec<_>>();
    order.sort_by_key(|&index| key(&items[index]));

    let mut ranks = vec![0; items.len()];
    for (rank, index) in order.into_iter().enumerate() {
        ranks[index] = rank;
    }

    ranks
}

fn job_ranks(problem: &VehicleRoutingProblem, seed: Option<u64>) -> Vec<usize> {
    match seed {
        None => ranks_by_key(problem.jobs(), Job::external_id),
        Some(seed) => {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut ranks = (0..problem.jobs().len()).collect::<Vec<_>>();
            ranks.shuffle(&mut rng);
            ranks
        }
    }
}

/// Cost of reaching the job from the vehicle start, or of returning to the end for
/// vehicles without a start.
fn cost_from_vehicle(problem: &VehicleRoutingProblem, vehicle: &Vehicle, job: &Job) -> f64 {
    match (vehicle.start_location_id(), vehicle.end_location_id()) {
        (Some(start), _) => problem.travel_cost(start, job.location_id()),
        (None, Some(end)) => problem.travel_cost(job.location_id(), end),
        (None, None) => 0.0,
    }
}

/// Opens every empty route with the unassigned job preferred by `init`.
#[instrument(skip_all, level = Level::DEBUG)]
fn open_routes(solution: &mut WorkingSolution, init: InitStrategy, job_ranks: &[usize]) {
    let problem = Arc::clone(solution.problem_arc());

    for index in 0..solution.routes().len() {
        let route_id = RouteIdx::new(index);
        let route = solution.route(route_id);

        if !route.is_empty() {
            continue;
        }

        let vehicle = route.vehicle(&problem);

        let preference = |job_id: JobIdx| -> f64 {
            let job = problem.job(job_id);
            match init {
                InitStrategy::None => 0.0,
                InitStrategy::HigherAmount => -job.demand().total(),
                InitStrategy::Nearest => cost_from_vehicle(&problem, vehicle, job),
                InitStrategy::Furthest => -cost_from_vehicle(&problem, vehicle, job),
                InitStrategy::EarliestDeadline => {
                    job.time_windows().latest_end().as_secs_f64()
                }
            }
        };

        let seed_job = solution
            .sorted_unassigned_jobs()
            .into_iter()
            .filter(|&job_id| route.can_insert(&problem, job_id, 0))
            .min_by(|&a, &b| {
                preference(a)
                    .total_cmp(&preference(b))
                    .then(job_ranks[a.get()].cmp(&job_ranks[b.get()]))
            });

        if let Some(job_id) = seed_job {
            debug!(route = index, job_id = job_id.get(), ?init, "Open route");
            solution.insert(&Insertion {
                route_id,
                job_index: job_id,
                position: 0,
            });
        }
    }
}

/// Greedy insertion of the unassigned jobs, one at a time, until no feasible insertion is
/// left. Each job is valued by its cheapest insertion minus the weighted regret of not
/// inserting it in its best vehicle.
#[instrument(skip_all, level = Level::DEBUG)]
fn insert_jobs(
    solution: &mut WorkingSolution,
    regret_coefficient: f64,
    job_ranks: &[usize],
    vehicle_ranks: &[usize],
) {
    let problem = Arc::clone(solution.problem_arc());

    // Insertions into routes keep the same cost while the routes remain unchanged
    let mut insertion_cache = InsertionCache::new();

    while solution.has_unassigned() {
        let mut best_candidate: Option<Candidate> = None;

        for job_id in solution.sorted_unassigned_jobs() {
            let mut best: Option<(InsertionCacheEntry, RouteIdx)> = None;
            let mut second_best_cost = f64::INFINITY;

            for (route_id, route) in solution.routes().iter().enumerate_idx::<RouteIdx>() {
                let Some(entry) = insertion_cache.get_or_compute(route_id, route, job_id, || {
                    route
                        .best_insertion(&problem, job_id)
                        .map(|(cost, position)| InsertionCacheEntry { cost, position })
                }) else {
                    continue;
                };

                match best {
                    Some((best_entry, best_route_id))
                        if entry.cost > best_entry.cost
                            || (entry.cost == best_entry.cost
                                && vehicle_ranks[route_id.get()]
                                    >= vehicle_ranks[best_route_id.get()]) =>
                    {
                        second_best_cost = second_best_cost.min(entry.cost);
                    }
                    _ => {
                        if let Some((previous, _)) = best {
                            second_best_cost = second_best_cost.min(previous.cost);
                        }
                        best = Some((entry, route_id));
                    }
                }
            }

            let Some((entry, route_id)) = best else {
                continue;
            };

            let value = if regret_coefficient == 0.0 {
                entry.cost
            } else if second_best_cost.is_infinite() {
                // Only one vehicle can take the job
                f64::NEG_INFINITY
            } else {
                entry.cost - regret_coefficient * (second_best_cost - entry.cost)
            };

            let candidate = Candidate {
                value,
                job_rank: job_ranks[job_id.get()],
                vehicle_rank: vehicle_ranks[route_id.get()],
                insertion: Insertion {
                    route_id,
                    job_index: job_id,
                    position: entry.position,
                },
            };

            if best_candidate
                .as_ref()
                .is_none_or(|best| candidate.cmp(best) == Ordering::Less)
            {
                best_candidate = Some(candidate);
            }
        }

        let Some(candidate) = best_candidate else {
            break;
        };

        solution.insert(&candidate.insertion);
        insertion_cache.clear(solution.routes());
    }
}

/// Builds a solution from scratch. Jobs without any feasible insertion are left
/// unassigned.
#[instrument(skip_all, level = Level::DEBUG)]
pub fn construct_solution(
    problem: &Arc<VehicleRoutingProblem>,
    params: &ConstructionParams,
) -> WorkingSolution {
    debug!(?params, "Start construction heuristic");

    let mut solution = WorkingSolution::new(Arc::clone(problem));
    let job_ranks = job_ranks(problem, params.seed);
    let vehicle_ranks = ranks_by_key(problem.vehicles(), Vehicle::external_id);

    if params.init != InitStrategy::None {
        open_routes(&mut solution, params.init, &job_ranks);
    }

    insert_jobs(
        &mut solution,
        params.regret_coefficient,
        &job_ranks,
        &vehicle_ranks,
    );

    for job_id in solution.sorted_unassigned_jobs() {
        if let Err(outcome) = find_best_insertion(&solution, job_id) {
            debug!(job_id = job_id.get(), ?outcome, "Job left unassigned");
        }
    }

    debug!(score = %solution.score(), "Construction done");

    solution
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        problem::{job::JobIdx, time_window::TimeWindow},
        solver::{
            construction::{
                construct_solution::construct_solution,
                construction_params::{ConstructionParams, InitStrategy},
            },
            solution::route_id::RouteIdx,
        },
        test_utils,
    };

    #[test]
    fn test_cheapest_insertion_on_a_line() {
        let jobs = test_utils::create_basic_jobs(vec![3, 1, 2]);
        let vehicles = test_utils::create_basic_vehicles(vec![0]);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::line_matrix(4),
            jobs,
            vehicles,
        ));

        let solution = construct_solution(&problem, &ConstructionParams::default());

        assert!(!solution.has_unassigned());
        assert_eq!(solution.total_cost(), 6.0);
        assert_eq!(test_utils::route_job_ids(&solution, 0), vec![0, 2, 1]);
    }

    #[test]
    fn test_jobs_split_between_depots() {
        let jobs = test_utils::create_basic_jobs(vec![1, 8, 2, 7]);
        let vehicles = test_utils::create_basic_vehicles(vec![0, 9]);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::line_matrix(10),
            jobs,
            vehicles,
        ));

        for regret_coefficient in [0.0, 0.3, 1.0] {
            let solution = construct_solution(
                &problem,
                &ConstructionParams {
                    regret_coefficient,
                    ..ConstructionParams::default()
                },
            );

            let mut first = test_utils::route_job_ids(&solution, 0);
            let mut second = test_utils::route_job_ids(&solution, 1);
            first.sort();
            second.sort();

            assert_eq!(first, vec![0, 2]);
            assert_eq!(second, vec![1, 3]);
        }
    }

    #[test]
    fn test_oversized_job_stays_unassigned() {
        let mut jobs = test_utils::create_jobs_with_demand(vec![1, 2], 3.0);
        jobs.push(test_utils::create_job_with_demand(2, 3, 20.0));
        let vehicles = test_utils::create_vehicles_with_capacity(vec![0], 10.0);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::line_matrix(4),
            jobs,
            vehicles,
        ));

        let solution = construct_solution(&problem, &ConstructionParams::default());

        assert_eq!(solution.sorted_unassigned_jobs(), vec![JobIdx::new(2)]);
        assert_eq!(solution.route(RouteIdx::new(0)).len(), 2);
    }

    #[test]
    fn test_unreachable_time_window_stays_unassigned() {
        let jobs = vec![
            test_utils::create_job(0, 1, TimeWindow::UNBOUNDED),
            test_utils::create_job(1, 3, TimeWindow::from_secs(0, 2)),
        ];
        let vehicles = test_utils::create_basic_vehicles(vec![0]);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::line_matrix(4),
            jobs,
            vehicles,
        ));

        let solution = construct_solution(&problem, &ConstructionParams::default());

        assert_eq!(solution.sorted_unassigned_jobs(), vec![JobIdx::new(1)]);
    }

    #[test]
    fn test_init_strategy_opens_route_with_furthest_job() {
        let jobs = test_utils::create_basic_jobs(vec![1, 5, 3]);
        let vehicles = test_utils::create_basic_vehicles(vec![0]);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::line_matrix(6),
            jobs,
            vehicles,
        ));

        let solution = construct_solution(
            &problem,
            &ConstructionParams {
                init: InitStrategy::Furthest,
                ..ConstructionParams::default()
            },
        );

        assert!(!solution.has_unassigned());
        assert_eq!(solution.total_cost(), 10.0);
    }

    #[test]
    fn test_seeded_construction_is_reproducible() {
        let jobs = test_utils::create_basic_jobs((1..9).collect());
        let vehicles = test_utils::create_basic_vehicles(vec![0, 0, 0]);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::grid_matrix(3, 3),
            jobs,
            vehicles,
        ));

        let params = ConstructionParams {
            regret_coefficient: 0.3,
            init: InitStrategy::HigherAmount,
            seed: Some(42),
        };

        let first = construct_solution(&problem, &params);
        let second = construct_solution(&problem, &params);

        assert!(first.is_identical(&second));
    }
}
