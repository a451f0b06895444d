#![allow(dead_code)]

use std::sync::Arc;

use iris_optimizer::{
    problem::{
        amount::Amount,
        job::{Job, JobBuilder},
        time_window::TimeWindow,
        travel_cost_matrix::TravelMatrices,
        vehicle::{Vehicle, VehicleBuilder},
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solver::{
        accepted_solution::AcceptedSolution,
        evaluator::{ViolatedConstraint, evaluate_solution},
    },
};
use jiff::SignedDuration;
use rand::{Rng, SeedableRng, rngs::SmallRng};

pub fn create_job(
    id: u64,
    location_id: usize,
    service: i64,
    demand: f64,
    time_windows: Vec<TimeWindow>,
) -> Job {
    create_job_with_skills(id, location_id, service, demand, time_windows, vec![])
}

pub fn create_job_with_skills(
    id: u64,
    location_id: usize,
    service: i64,
    demand: f64,
    time_windows: Vec<TimeWindow>,
    skills: Vec<u32>,
) -> Job {
    let mut builder = JobBuilder::default();

    builder
        .set_external_id(id)
        .set_location_id(location_id)
        .set_service_duration(SignedDuration::from_secs(service))
        .set_demand(Amount::from_vec(vec![demand]));

    if !time_windows.is_empty() {
        builder.set_time_windows(time_windows);
    }

    if !skills.is_empty() {
        builder.set_skills(skills);
    }

    builder.build()
}

pub fn create_vehicle(id: u64, depot: usize, capacity: f64, time_window: TimeWindow) -> Vehicle {
    create_vehicle_with_skills(id, depot, capacity, time_window, vec![])
}

pub fn create_vehicle_with_skills(
    id: u64,
    depot: usize,
    capacity: f64,
    time_window: TimeWindow,
    skills: Vec<u32>,
) -> Vehicle {
    let mut builder = VehicleBuilder::default();

    builder
        .set_vehicle_id(id)
        .set_depot_location_id(depot)
        .set_capacity(Amount::from_vec(vec![capacity]))
        .set_time_window(time_window);

    if !skills.is_empty() {
        builder.set_skills(skills);
    }

    builder.build()
}

pub fn create_test_problem(
    rows: Vec<Vec<f64>>,
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
) -> Arc<VehicleRoutingProblem> {
    let mut builder = VehicleRoutingProblemBuilder::default();

    builder.set_travel_costs(TravelMatrices::from_rows(rows.clone(), Some(rows), None).unwrap());
    builder.set_jobs(jobs);
    builder.set_vehicles(vehicles);

    Arc::new(builder.build().unwrap())
}

/// Symmetric matrix of the rounded euclidean distances between `points`.
pub fn euclidean_rows(points: &[(f64, f64)]) -> Vec<Vec<f64>> {
    points
        .iter()
        .map(|&(x1, y1)| {
            points
                .iter()
                .map(|&(x2, y2)| ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt().round())
                .collect()
        })
        .collect()
}

/// Random instance with a single depot at location 0. Roughly one job out of four
/// has a time window, one out of five requires a skill, and demands are sized so that
/// every vehicle is needed. Vehicle `v` has skill `1 + v % 2`.
pub fn create_random_problem(
    seed: u64,
    job_count: usize,
    vehicle_count: usize,
) -> Arc<VehicleRoutingProblem> {
    let mut rng = SmallRng::seed_from_u64(seed);

    let points = (0..=job_count)
        .map(|_| (rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)))
        .collect::<Vec<_>>();

    let jobs = (1..=job_count)
        .map(|location_id| {
            let time_windows = if rng.random_bool(0.25) {
                let start = rng.random_range(0..400);
                vec![TimeWindow::from_secs(start, start + rng.random_range(50..200))]
            } else {
                vec![]
            };

            let skills = if rng.random_bool(0.2) {
                vec![1 + rng.random_range(0..vehicle_count.min(2)) as u32]
            } else {
                vec![]
            };

            create_job_with_skills(
                location_id as u64,
                location_id,
                rng.random_range(0..10),
                rng.random_range(1..5) as f64,
                time_windows,
                skills,
            )
        })
        .collect();

    let capacity = (job_count as f64 * 4.0 / vehicle_count as f64).ceil();

    let vehicles = (0..vehicle_count)
        .map(|id| {
            create_vehicle_with_skills(
                id as u64,
                0,
                capacity,
                TimeWindow::from_secs(0, 2000),
                vec![1 + (id % 2) as u32],
            )
        })
        .collect();

    create_test_problem(euclidean_rows(&points), jobs, vehicles)
}

/// Every job is served once or unassigned, and every route respects its constraints.
pub fn assert_valid_solution(accepted: &AcceptedSolution) {
    let evaluation = evaluate_solution(&accepted.solution);

    assert!(evaluation.is_partition, "jobs are not partitioned");

    for route in &evaluation.routes {
        assert!(
            !route.violations.contains(&ViolatedConstraint::Skills),
            "job served by a vehicle without its skills"
        );
        assert!(route.feasible, "infeasible route {:?}", route.violations);
    }

    assert_eq!(evaluation.unassigned.len(), accepted.score.unassigned);
    assert!((evaluation.cost - accepted.score.cost).abs() < 1e-6);
}

pub fn route_external_ids(accepted: &AcceptedSolution) -> Vec<Vec<u64>> {
    let problem = accepted.solution.problem();

    accepted
        .solution
        .routes()
        .iter()
        .map(|route| {
            route
                .job_ids()
                .iter()
                .map(|&job_id| problem.job(job_id).external_id())
                .collect()
        })
        .collect()
}
