use iris_matrix_providers::{
    travel_matrix_client::{MatrixProviderError, TravelMatrixClient},
    travel_matrix_provider::TravelMatrixProvider,
};
use jiff::SignedDuration;
use serde::Serialize;
use tracing::instrument;

use crate::{
    json::types::{FromProblem, JsonCoordinates, JsonStatusCode},
    problem::{
        job::JobIdx, location::LocationIdx, vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        evaluator::{RouteEvaluation, evaluate_solution},
        solution::working_solution::WorkingSolution,
    },
};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JsonStepType {
    Start,
    Job,
    End,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename = "Step")]
pub struct JsonStep {
    #[serde(rename = "type")]
    pub step_type: JsonStepType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<JsonCoordinates>,
    pub arrival: i64,
    /// Travel time since the start of the route
    pub duration: i64,
    /// Distance since the start of the route
    pub distance: f64,
    pub load: Vec<f64>,
    pub waiting_time: i64,
    pub service: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename = "Route")]
pub struct JsonRoute {
    pub vehicle: u64,
    pub cost: f64,
    pub service: i64,
    pub duration: i64,
    pub waiting_time: i64,
    pub distance: f64,
    pub amount: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<String>,
    pub steps: Vec<JsonStep>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename = "Unassigned")]
pub struct JsonUnassigned {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<JsonCoordinates>,
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct JsonComputingTimes {
    /// Milliseconds spent parsing the input and fetching the matrices
    pub loading: i64,
    /// Milliseconds spent searching
    pub solving: i64,
}

impl JsonComputingTimes {
    pub fn new(loading: SignedDuration, solving: SignedDuration) -> Self {
        JsonComputingTimes {
            loading: loading.as_millis() as i64,
            solving: solving.as_millis() as i64,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename = "Summary")]
pub struct JsonSummary {
    pub cost: f64,
    pub unassigned: usize,
    pub service: i64,
    pub duration: i64,
    pub waiting_time: i64,
    pub distance: f64,
    pub computing_times: JsonComputingTimes,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename = "Solution")]
pub struct JsonSolution {
    pub code: i32,
    pub summary: JsonSummary,
    pub unassigned: Vec<JsonUnassigned>,
    pub routes: Vec<JsonRoute>,
}

fn coordinates(
    problem: &VehicleRoutingProblem,
    location_id: LocationIdx,
) -> Option<JsonCoordinates> {
    JsonCoordinates::try_from(problem.location(location_id)).ok()
}

impl FromProblem<JobIdx> for JsonUnassigned {
    fn from_problem(job_id: JobIdx, problem: &VehicleRoutingProblem) -> Self {
        let job = problem.job(job_id);

        JsonUnassigned {
            id: job.external_id(),
            location: coordinates(problem, job.location_id()),
        }
    }
}

impl FromProblem<(VehicleIdx, &RouteEvaluation)> for JsonRoute {
    fn from_problem(
        (vehicle_id, evaluation): (VehicleIdx, &RouteEvaluation),
        problem: &VehicleRoutingProblem,
    ) -> Self {
        let vehicle = problem.vehicle(vehicle_id);
        let mut steps = Vec::with_capacity(evaluation.visits.len() + 2);

        if let Some(start_location_id) = vehicle.start_location_id() {
            steps.push(JsonStep {
                step_type: JsonStepType::Start,
                job: None,
                location: coordinates(problem, start_location_id),
                arrival: evaluation.start_time.as_secs(),
                duration: 0,
                distance: 0.0,
                load: evaluation.load.to_vec(),
                waiting_time: 0,
                service: 0,
            });
        }

        let mut service = SignedDuration::ZERO;

        for visit in &evaluation.visits {
            let job = problem.job(visit.job_id);
            service += job.duration();

            steps.push(JsonStep {
                step_type: JsonStepType::Job,
                job: Some(job.external_id()),
                location: coordinates(problem, job.location_id()),
                arrival: visit.arrival_time.as_secs(),
                duration: visit.duration.as_secs(),
                distance: visit.distance,
                load: visit.load.to_vec(),
                waiting_time: visit.waiting_duration.as_secs(),
                service: job.duration().as_secs(),
            });
        }

        if let Some(end_location_id) = vehicle.end_location_id() {
            let load = evaluation
                .visits
                .last()
                .map_or_else(|| evaluation.load.to_vec(), |visit| visit.load.to_vec());

            steps.push(JsonStep {
                step_type: JsonStepType::End,
                job: None,
                location: coordinates(problem, end_location_id),
                arrival: evaluation.end_time.as_secs(),
                duration: evaluation.duration.as_secs(),
                distance: evaluation.distance,
                load,
                waiting_time: 0,
                service: 0,
            });
        }

        JsonRoute {
            vehicle: vehicle.external_id(),
            cost: evaluation.cost,
            service: service.as_secs(),
            duration: evaluation.duration.as_secs(),
            waiting_time: evaluation.total_waiting_duration().as_secs(),
            distance: evaluation.distance,
            amount: evaluation.load.to_vec(),
            geometry: None,
            steps,
        }
    }
}

impl JsonSolution {
    /// Output document of a solution, routes without jobs are left out.
    pub fn from_solution(solution: &WorkingSolution, computing_times: JsonComputingTimes) -> Self {
        let problem = solution.problem();
        let evaluation = evaluate_solution(solution);

        let routes = solution
            .routes()
            .iter()
            .zip(&evaluation.routes)
            .filter(|(route, _)| !route.is_empty())
            .map(|(route, route_evaluation)| {
                JsonRoute::from_problem((route.vehicle_id(), route_evaluation), problem)
            })
            .collect::<Vec<_>>();

        let unassigned = evaluation
            .unassigned
            .iter()
            .map(|&job_id| JsonUnassigned::from_problem(job_id, problem))
            .collect::<Vec<_>>();

        let summary = JsonSummary {
            cost: evaluation.cost,
            unassigned: unassigned.len(),
            service: routes.iter().map(|route| route.service).sum(),
            duration: routes.iter().map(|route| route.duration).sum(),
            waiting_time: routes.iter().map(|route| route.waiting_time).sum(),
            distance: routes.iter().map(|route| route.distance).sum(),
            computing_times,
        };

        JsonSolution {
            code: JsonStatusCode::Ok.code(),
            summary,
            unassigned,
            routes,
        }
    }

    /// Fills the route geometries from the routing engine. Routes going through a location
    /// without coordinates keep no geometry.
    #[instrument(skip_all, level = "debug")]
    pub async fn add_geometry(
        &mut self,
        client: &TravelMatrixClient,
        provider: &TravelMatrixProvider,
    ) -> Result<(), MatrixProviderError> {
        for route in self.routes.iter_mut() {
            let points = route
                .steps
                .iter()
                .map(|step| step.location)
                .collect::<Option<Vec<_>>>();

            let Some(points) = points else {
                continue;
            };

            // A single location has nothing to draw
            if points.len() < 2 {
                continue;
            }

            route.geometry = client.fetch_route_geometry(&points, provider).await?;
        }

        Ok(())
    }
}
