use std::sync::Arc;

use crate::{
    problem::{
        amount::Amount,
        job::{Job, JobBuilder},
        travel_cost_matrix::TravelMatrices,
        time_window::TimeWindow,
        vehicle::{Vehicle, VehicleBuilder},
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solver::{
        insertion::Insertion,
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

/// Locations on a line, travelling between `i` and `j` takes `|i - j|`.
pub fn line_rows(size: usize) -> Vec<Vec<f64>> {
    (0..size)
        .map(|i| (0..size).map(|j| i.abs_diff(j) as f64).collect())
        .collect()
}

pub fn line_matrix(size: usize) -> TravelMatrices {
    let rows = line_rows(size);
    TravelMatrices::from_rows(rows.clone(), Some(rows), None).unwrap()
}

fn grid_rows(rows: usize, cols: usize, factor: impl Fn(usize, usize) -> f64) -> Vec<Vec<f64>> {
    let size = rows * cols;
    let point = |index: usize| ((index % cols) as f64, (index / cols) as f64);

    (0..size)
        .map(|i| {
            (0..size)
                .map(|j| {
                    let (x1, y1) = point(i);
                    let (x2, y2) = point(j);
                    ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt() * factor(i, j)
                })
                .collect()
        })
        .collect()
}

/// Euclidean distances between the nodes of a `rows x cols` grid, row by row.
pub fn grid_matrix(rows: usize, cols: usize) -> TravelMatrices {
    let rows = grid_rows(rows, cols, |_, _| 1.0);
    TravelMatrices::from_rows(rows.clone(), Some(rows), None).unwrap()
}

/// Same grid, going "backwards" costs more than going "forwards".
pub fn asymmetric_grid_matrix(rows: usize, cols: usize) -> TravelMatrices {
    let rows = grid_rows(rows, cols, |i, j| if i < j { 1.0 } else { 1.5 });
    TravelMatrices::from_rows(rows.clone(), Some(rows), None).unwrap()
}

pub fn create_basic_jobs(location_ids: Vec<usize>) -> Vec<Job> {
    location_ids
        .iter()
        .enumerate()
        .map(|(index, &location_id)| {
            let mut builder = JobBuilder::default();
            builder.set_external_id(index as u64);
            builder.set_location_id(location_id);
            builder.build()
        })
        .collect()
}

pub fn create_jobs_with_demand(location_ids: Vec<usize>, demand: f64) -> Vec<Job> {
    location_ids
        .iter()
        .enumerate()
        .map(|(index, &location_id)| create_job_with_demand(index as u64, location_id, demand))
        .collect()
}

pub fn create_job_with_demand(external_id: u64, location_id: usize, demand: f64) -> Job {
    let mut builder = JobBuilder::default();
    builder
        .set_external_id(external_id)
        .set_location_id(location_id)
        .set_demand(Amount::from_vec(vec![demand]));
    builder.build()
}

pub fn create_job(external_id: u64, location_id: usize, time_window: TimeWindow) -> Job {
    let mut builder = JobBuilder::default();
    builder
        .set_external_id(external_id)
        .set_location_id(location_id)
        .set_time_windows(vec![time_window]);
    builder.build()
}

pub fn create_basic_vehicles(location_ids: Vec<usize>) -> Vec<Vehicle> {
    location_ids
        .iter()
        .enumerate()
        .map(|(index, &location_id)| {
            let mut builder = VehicleBuilder::default();
            builder.set_depot_location_id(location_id);
            builder.set_vehicle_id(index as u64);
            builder.build()
        })
        .collect()
}

pub fn create_vehicles_with_capacity(location_ids: Vec<usize>, capacity: f64) -> Vec<Vehicle> {
    location_ids
        .iter()
        .enumerate()
        .map(|(index, &location_id)| {
            let mut builder = VehicleBuilder::default();
            builder
                .set_depot_location_id(location_id)
                .set_vehicle_id(index as u64)
                .set_capacity(Amount::from_vec(vec![capacity]));
            builder.build()
        })
        .collect()
}

pub fn create_test_problem(
    travel_costs: TravelMatrices,
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
) -> VehicleRoutingProblem {
    let mut builder = VehicleRoutingProblemBuilder::default();

    builder.set_travel_costs(travel_costs);
    builder.set_jobs(jobs);
    builder.set_vehicles(vehicles);

    builder.build().unwrap()
}

pub struct TestRoute {
    pub vehicle_id: usize,
    pub job_ids: Vec<usize>,
}

pub fn create_test_working_solution(
    problem: Arc<VehicleRoutingProblem>,
    routes: Vec<TestRoute>,
) -> WorkingSolution {
    let mut solution = WorkingSolution::new(problem);

    for route in &routes {
        for (position, &job_id) in route.job_ids.iter().enumerate() {
            solution.insert(&Insertion {
                route_id: RouteIdx::new(route.vehicle_id),
                job_index: job_id.into(),
                position,
            });
        }
    }

    solution
}

pub fn route_job_ids(solution: &WorkingSolution, route_id: usize) -> Vec<usize> {
    solution
        .route(RouteIdx::new(route_id))
        .job_ids()
        .iter()
        .map(|job_id| job_id.get())
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::problem::location::LocationIdx;

    use super::*;

    #[test]
    fn test_grid_matrices() {
        let symmetric = grid_matrix(2, 3);
        let asymmetric = asymmetric_grid_matrix(2, 3);

        assert!(symmetric.is_symmetric());
        assert!(!asymmetric.is_symmetric());

        assert_eq!(
            symmetric.travel_cost(LocationIdx::new(0), LocationIdx::new(4)),
            2.0f64.sqrt()
        );
        assert_eq!(
            asymmetric.travel_cost(LocationIdx::new(2), LocationIdx::new(0)),
            3.0
        );
    }
}
