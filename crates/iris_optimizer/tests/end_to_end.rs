mod setup;

use std::sync::Arc;

use iris_matrix_providers::{
    travel_matrix_client::TravelMatrixClient, travel_matrix_provider::TravelMatrixProvider,
};
use iris_optimizer::{
    json::{
        input::JsonVehicleRoutingProblem,
        output::{JsonComputingTimes, JsonSolution},
    },
    problem::{location::LocationIdx, time_window::TimeWindow},
    solver::{
        solver::Solver,
        solver_params::{SolverParams, Threads},
    },
};

// Locations 0, 1, 2, 3 sit on a line at 0, 5, 8 and 12
fn line_rows() -> Vec<Vec<f64>> {
    let positions = [0.0, 5.0, 8.0, 12.0_f64];

    positions
        .iter()
        .map(|from| positions.iter().map(|to| (to - from).abs()).collect())
        .collect()
}

fn params() -> SolverParams {
    SolverParams {
        threads: Threads::Multi(2),
        ..SolverParams::default()
    }
}

#[test]
fn test_single_vehicle_serves_every_job() {
    let problem = setup::create_test_problem(
        line_rows(),
        vec![
            setup::create_job(1, 1, 10, 3.0, vec![]),
            setup::create_job(2, 2, 10, 3.0, vec![]),
            setup::create_job(3, 3, 10, 3.0, vec![]),
        ],
        vec![setup::create_vehicle(1, 0, 10.0, TimeWindow::from_secs(0, 1000))],
    );

    let solution = Solver::new(Arc::clone(&problem), params()).solve().unwrap();

    setup::assert_valid_solution(&solution);
    assert!(solution.is_complete());
    assert_eq!(solution.score.cost, 24.0);

    let routes = setup::route_external_ids(&solution);
    assert!(routes[0] == vec![1, 2, 3] || routes[0] == vec![3, 2, 1]);
}

#[test]
fn test_oversized_job_is_unassigned() {
    let problem = setup::create_test_problem(
        line_rows(),
        vec![
            setup::create_job(1, 1, 10, 3.0, vec![]),
            setup::create_job(2, 2, 10, 11.0, vec![]),
            setup::create_job(3, 3, 10, 3.0, vec![]),
        ],
        vec![setup::create_vehicle(1, 0, 10.0, TimeWindow::from_secs(0, 1000))],
    );

    let solution = Solver::new(Arc::clone(&problem), params()).solve().unwrap();

    setup::assert_valid_solution(&solution);
    assert_eq!(solution.score.unassigned, 1);

    let unassigned = solution.solution.sorted_unassigned_jobs();
    assert_eq!(problem.job(unassigned[0]).external_id(), 2);
}

#[test]
fn test_unreachable_time_window_is_unassigned() {
    let problem = setup::create_test_problem(
        line_rows(),
        vec![
            setup::create_job(1, 1, 10, 3.0, vec![]),
            setup::create_job(2, 2, 10, 3.0, vec![]),
            // The vehicle needs 12 seconds to get there
            setup::create_job(3, 3, 10, 3.0, vec![TimeWindow::from_secs(0, 5)]),
        ],
        vec![setup::create_vehicle(1, 0, 10.0, TimeWindow::from_secs(0, 1000))],
    );

    let solution = Solver::new(Arc::clone(&problem), params()).solve().unwrap();

    setup::assert_valid_solution(&solution);
    assert_eq!(solution.score.unassigned, 1);
    assert_eq!(setup::route_external_ids(&solution)[0].len(), 2);
}

#[test]
fn test_skilled_job_goes_to_the_only_compatible_vehicle() {
    let problem = setup::create_test_problem(
        line_rows(),
        vec![
            setup::create_job(1, 1, 10, 1.0, vec![]),
            setup::create_job_with_skills(2, 2, 10, 1.0, vec![], vec![7]),
            setup::create_job(3, 3, 10, 1.0, vec![]),
        ],
        vec![
            setup::create_vehicle(1, 0, 10.0, TimeWindow::from_secs(0, 1000)),
            setup::create_vehicle_with_skills(2, 0, 10.0, TimeWindow::from_secs(0, 1000), vec![7]),
        ],
    );

    let solution = Solver::new(Arc::clone(&problem), params()).solve().unwrap();

    setup::assert_valid_solution(&solution);
    assert!(solution.is_complete());

    let routes = setup::route_external_ids(&solution);
    assert!(!routes[0].contains(&2));
    assert!(routes[1].contains(&2));
}

#[test]
fn test_unreachable_pair_is_never_travelled() {
    let mut rows = line_rows();
    rows[1][2] = f64::INFINITY;
    rows[2][1] = f64::INFINITY;

    let problem = setup::create_test_problem(
        rows,
        vec![
            setup::create_job(1, 1, 0, 1.0, vec![]),
            setup::create_job(2, 2, 0, 1.0, vec![]),
        ],
        vec![setup::create_vehicle(1, 0, 10.0, TimeWindow::from_secs(0, 1000))],
    );

    let solution = Solver::new(Arc::clone(&problem), params()).solve().unwrap();

    setup::assert_valid_solution(&solution);
    assert_eq!(solution.score.unassigned, 1);

    for route in solution.solution.routes() {
        let locations = route.compute_location_ids(&problem);
        for pair in locations.windows(2) {
            assert!(problem.is_reachable(pair[0], pair[1]));
        }
        assert!(
            !locations.contains(&LocationIdx::new(1)) || !locations.contains(&LocationIdx::new(2))
        );
    }
}

#[tokio::test]
async fn test_json_round_trip() {
    let input = r#"{
        "vehicles": [
            { "id": 1, "start_index": 0, "end_index": 0, "capacity": [10], "time_window": [0, 1000] }
        ],
        "jobs": [
            { "id": 1, "location_index": 1, "service": 10, "amount": [3] },
            { "id": 2, "location_index": 2, "service": 10, "amount": [3] },
            { "id": 3, "location_index": 3, "service": 10, "amount": [3] }
        ],
        "matrix": [[0, 5, 8, 12], [5, 0, 3, 7], [8, 3, 0, 4], [12, 7, 4, 0]]
    }"#;

    let problem = JsonVehicleRoutingProblem::from_json(input)
        .unwrap()
        .build_problem(
            &TravelMatrixClient::new(),
            TravelMatrixProvider::AsTheCrowFlies { speed_kmh: 50.0 },
        )
        .await
        .unwrap();

    let solution = Solver::new(Arc::new(problem), params()).solve().unwrap();
    let output = JsonSolution::from_solution(&solution.solution, JsonComputingTimes::default());

    assert_eq!(output.code, 0);
    assert_eq!(output.summary.cost, 24.0);
    assert_eq!(output.summary.unassigned, 0);
    assert_eq!(output.summary.service, 30);
    assert_eq!(output.routes.len(), 1);
    assert_eq!(output.routes[0].steps.len(), 5);
    assert_eq!(output.routes[0].amount, vec![9.0]);

    let end = &output.routes[0].steps[4];
    assert_eq!(end.arrival, 54);
    assert_eq!(end.load, vec![0.0]);
}
