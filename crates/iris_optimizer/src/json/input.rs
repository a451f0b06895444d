use fxhash::FxHashMap;
use iris_matrix_providers::{
    travel_matrix_client::{MatrixProviderError, TravelMatrixClient},
    travel_matrix_provider::TravelMatrixProvider,
};
use jiff::SignedDuration;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    json::types::{JsonCoordinates, JsonStatusCode},
    problem::{
        amount::Amount,
        job::{Job, JobBuilder},
        location::Location,
        time_window::TimeWindow,
        travel_cost_matrix::TravelMatrices,
        validation::ValidationError,
        vehicle::{Vehicle, VehicleBuilder},
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
};

/// Matrix rows, `null` marks a pair the routing engine could not connect.
pub type JsonMatrix = Vec<Vec<Option<f64>>>;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Missing {field} for {entity} {id}")]
    MissingLocation {
        entity: &'static str,
        id: u64,
        field: &'static str,
    },

    #[error("Routing error: {0}")]
    Routing(#[from] MatrixProviderError),
}

impl InputError {
    pub fn code(&self) -> i32 {
        match self {
            InputError::Routing(_) => JsonStatusCode::Routing.code(),
            InputError::Parse(_)
            | InputError::Validation(_)
            | InputError::MissingLocation { .. } => JsonStatusCode::Input.code(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename = "VehicleRoutingProblem")]
pub struct JsonVehicleRoutingProblem {
    pub vehicles: Vec<JsonVehicle>,
    pub jobs: Vec<JsonJob>,

    /// Travel durations in seconds, replaces the routing engine when present.
    pub matrix: Option<JsonMatrix>,
    pub distances: Option<JsonMatrix>,
    pub costs: Option<JsonMatrix>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields, rename = "Vehicle")]
pub struct JsonVehicle {
    pub id: u64,
    pub start: Option<JsonCoordinates>,
    pub start_index: Option<usize>,
    pub end: Option<JsonCoordinates>,
    pub end_index: Option<usize>,
    pub capacity: Option<Vec<f64>>,
    pub skills: Option<Vec<u32>>,
    pub time_window: Option<[i64; 2]>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields, rename = "Job")]
pub struct JsonJob {
    pub id: u64,
    pub location: Option<JsonCoordinates>,
    pub location_index: Option<usize>,
    pub service: Option<i64>,
    pub amount: Option<Vec<f64>>,
    pub skills: Option<Vec<u32>>,
    pub time_windows: Option<Vec<[i64; 2]>>,
}

/// Assigns a matrix index to every place referenced by the problem.
///
/// With a custom matrix the indices come from the input and the coordinates are only
/// kept for the output. Without one, each distinct coordinate becomes a new location.
struct LocationRegistry {
    has_matrix: bool,
    coordinates: Vec<JsonCoordinates>,
    index_by_key: FxHashMap<[u64; 2], usize>,
    /// Matrix mode only, indices are checked against the matrix when the problem is built.
    coordinates_by_index: FxHashMap<usize, JsonCoordinates>,
}

impl LocationRegistry {
    fn new(has_matrix: bool) -> Self {
        LocationRegistry {
            has_matrix,
            coordinates: Vec::new(),
            index_by_key: FxHashMap::default(),
            coordinates_by_index: FxHashMap::default(),
        }
    }

    fn resolve(
        &mut self,
        (entity, id): (&'static str, u64),
        (field, index_field): (&'static str, &'static str),
        coordinates: Option<JsonCoordinates>,
        index: Option<usize>,
    ) -> Result<Option<usize>, InputError> {
        if self.has_matrix {
            return match (index, coordinates) {
                (Some(index), coordinates) => {
                    if let Some(coordinates) = coordinates {
                        self.coordinates_by_index.insert(index, coordinates);
                    }
                    Ok(Some(index))
                }
                (None, Some(_)) => Err(InputError::MissingLocation {
                    entity,
                    id,
                    field: index_field,
                }),
                (None, None) => Ok(None),
            };
        }

        match (coordinates, index) {
            (Some(coordinates), _) => {
                let next = self.coordinates.len();
                let index = *self.index_by_key.entry(coordinates.key()).or_insert(next);

                if index == next {
                    self.coordinates.push(coordinates);
                }

                Ok(Some(index))
            }
            (None, Some(_)) => Err(InputError::MissingLocation { entity, id, field }),
            (None, None) => Ok(None),
        }
    }

    fn locations(&self, num_locations: usize) -> Vec<Location> {
        if self.has_matrix {
            (0..num_locations)
                .map(|index| {
                    self.coordinates_by_index
                        .get(&index)
                        .map_or_else(Location::unknown, Location::from)
                })
                .collect()
        } else {
            self.coordinates.iter().map(Location::from).collect()
        }
    }

    /// Points handed to the routing engine.
    fn points(&self) -> &[JsonCoordinates] {
        &self.coordinates
    }
}

fn matrix_rows(matrix: JsonMatrix) -> Vec<Vec<f64>> {
    matrix
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|value| value.unwrap_or(f64::INFINITY))
                .collect()
        })
        .collect()
}

impl JsonVehicleRoutingProblem {
    pub fn from_json(input: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Builds and validates the problem. Travel matrices come from the input when it has
    /// a `matrix`, from `provider` otherwise.
    #[instrument(skip_all, level = "debug")]
    pub async fn build_problem(
        self,
        client: &TravelMatrixClient,
        provider: TravelMatrixProvider,
    ) -> Result<VehicleRoutingProblem, InputError> {
        let mut registry = LocationRegistry::new(self.matrix.is_some());

        // Jobs without amount get a zero demand of the fleet dimension
        let dimensions = self
            .vehicles
            .first()
            .and_then(|vehicle| vehicle.capacity.as_ref())
            .map_or(0, Vec::len);

        let vehicles = self
            .vehicles
            .into_iter()
            .map(|vehicle| build_vehicle(vehicle, &mut registry))
            .collect::<Result<Vec<_>, _>>()?;

        let jobs = self
            .jobs
            .into_iter()
            .map(|job| build_job(job, dimensions, &mut registry))
            .collect::<Result<Vec<_>, _>>()?;

        let travel_costs = match self.matrix {
            Some(matrix) => TravelMatrices::from_rows(
                matrix_rows(matrix),
                self.distances.map(matrix_rows),
                self.costs.map(matrix_rows),
            )?,
            None => {
                let matrices = client.fetch_matrix(registry.points(), provider).await?;
                TravelMatrices::from_travel_matrices(matrices)?
            }
        };

        debug!(
            jobs = jobs.len(),
            vehicles = vehicles.len(),
            locations = travel_costs.num_locations(),
            "Building problem"
        );

        let mut builder = VehicleRoutingProblemBuilder::default();

        builder.set_locations(registry.locations(travel_costs.num_locations()));
        builder.set_travel_costs(travel_costs);
        builder.set_vehicles(vehicles);
        builder.set_jobs(jobs);

        Ok(builder.build()?)
    }
}

fn build_vehicle(
    vehicle: JsonVehicle,
    registry: &mut LocationRegistry,
) -> Result<Vehicle, InputError> {
    let mut builder = VehicleBuilder::default();

    builder.set_vehicle_id(vehicle.id);

    if let Some(start) = registry.resolve(
        ("vehicle", vehicle.id),
        ("start", "start_index"),
        vehicle.start,
        vehicle.start_index,
    )? {
        builder.set_start_location_id(start);
    }

    if let Some(end) = registry.resolve(
        ("vehicle", vehicle.id),
        ("end", "end_index"),
        vehicle.end,
        vehicle.end_index,
    )? {
        builder.set_end_location_id(end);
    }

    if let Some(capacity) = vehicle.capacity {
        builder.set_capacity(Amount::from_vec(capacity));
    }

    if let Some(skills) = vehicle.skills {
        builder.set_skills(skills);
    }

    if let Some([start, end]) = vehicle.time_window {
        builder.set_time_window(TimeWindow::from_secs(start, end));
    }

    Ok(builder.build())
}

fn build_job(
    job: JsonJob,
    dimensions: usize,
    registry: &mut LocationRegistry,
) -> Result<Job, InputError> {
    let location_id = registry
        .resolve(
            ("job", job.id),
            ("location", "location_index"),
            job.location,
            job.location_index,
        )?
        .ok_or(InputError::MissingLocation {
            entity: "job",
            id: job.id,
            field: if registry.has_matrix {
                "location_index"
            } else {
                "location"
            },
        })?;

    let mut builder = JobBuilder::default();

    builder.set_external_id(job.id);
    builder.set_location_id(location_id);
    builder.set_demand(
        job.amount
            .map_or_else(|| Amount::with_dimensions(dimensions), Amount::from_vec),
    );

    if let Some(service) = job.service {
        builder.set_service_duration(SignedDuration::from_secs(service));
    }

    if let Some(skills) = job.skills {
        builder.set_skills(skills);
    }

    if let Some(time_windows) = job.time_windows {
        builder.set_time_windows(
            time_windows
                .into_iter()
                .map(|[start, end]| TimeWindow::from_secs(start, end))
                .collect(),
        );
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use iris_matrix_providers::{
        travel_matrix_client::{MatrixProviderError, TravelMatrixClient},
        travel_matrix_provider::TravelMatrixProvider,
    };
    use jiff::SignedDuration;

    use crate::problem::{
        job::JobIdx, location::LocationIdx, validation::ValidationError, vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    };

    use super::{InputError, JsonVehicleRoutingProblem};

    fn provider() -> TravelMatrixProvider {
        TravelMatrixProvider::AsTheCrowFlies { speed_kmh: 50.0 }
    }

    async fn build(input: &str) -> Result<VehicleRoutingProblem, InputError> {
        JsonVehicleRoutingProblem::from_json(input)?
            .build_problem(&TravelMatrixClient::new(), provider())
            .await
    }

    #[tokio::test]
    async fn test_build_problem_with_matrix() {
        let problem = build(
            r#"{
                "vehicles": [
                    { "id": 7, "start_index": 0, "end_index": 0, "capacity": [10], "time_window": [0, 1000] }
                ],
                "jobs": [
                    { "id": 1, "location_index": 1, "service": 10, "amount": [3] },
                    { "id": 2, "location_index": 2, "time_windows": [[0, 50], [100, 200]], "skills": [1] }
                ],
                "matrix": [[0, 5, 8], [5, 0, null], [8, 3, 0]]
            }"#,
        )
        .await
        .unwrap();

        let vehicle = problem.vehicle(VehicleIdx::new(0));
        assert_eq!(vehicle.external_id(), 7);
        assert_eq!(vehicle.start_location_id(), Some(LocationIdx::new(0)));
        assert_eq!(vehicle.end_location_id(), Some(LocationIdx::new(0)));
        assert_eq!(vehicle.latest_end(), SignedDuration::from_secs(1000));

        let first = problem.job(JobIdx::new(0));
        assert_eq!(first.duration(), SignedDuration::from_secs(10));
        assert_eq!(first.demand().to_vec(), vec![3.0]);

        let second = problem.job(JobIdx::new(1));
        assert_eq!(second.demand().to_vec(), vec![0.0]);
        assert_eq!(second.time_windows().as_slice().len(), 2);
        assert_eq!(second.skills().len(), 1);

        assert!(!problem.is_reachable(LocationIdx::new(1), LocationIdx::new(2)));
        assert!(problem.is_reachable(LocationIdx::new(2), LocationIdx::new(1)));
        assert_eq!(
            problem.travel_cost(LocationIdx::new(0), LocationIdx::new(2)),
            8.0
        );
    }

    #[tokio::test]
    async fn test_build_problem_from_coordinates() {
        let problem = build(
            r#"{
                "vehicles": [
                    { "id": 1, "start": [2.35, 48.85], "end": [2.35, 48.85] },
                    { "id": 2, "start": [2.30, 48.80] }
                ],
                "jobs": [
                    { "id": 1, "location": [2.36, 48.86] },
                    { "id": 2, "location": [2.30, 48.80] }
                ]
            }"#,
        )
        .await
        .unwrap();

        // Shared coordinates map to a single location
        assert_eq!(problem.locations().len(), 3);
        assert_eq!(
            problem.vehicle(VehicleIdx::new(0)).end_location_id(),
            Some(LocationIdx::new(0))
        );
        assert_eq!(problem.vehicle(VehicleIdx::new(1)).end_location_id(), None);
        assert_eq!(
            problem.job(JobIdx::new(1)).location_id(),
            LocationIdx::new(1)
        );
        assert_eq!(
            problem.location(LocationIdx::new(2)).coordinates(),
            Some([2.36, 48.86])
        );
        assert!(
            problem.travel_time(LocationIdx::new(0), LocationIdx::new(2)) > SignedDuration::ZERO
        );
    }

    #[tokio::test]
    async fn test_missing_location_index() {
        let result = build(
            r#"{
                "vehicles": [{ "id": 1, "start_index": 0 }],
                "jobs": [{ "id": 1, "location": [2.36, 48.86] }],
                "matrix": [[0, 1], [1, 0]]
            }"#,
        )
        .await;

        let Err(error) = result else {
            panic!("a job without location_index must be rejected");
        };
        assert!(matches!(
            error,
            InputError::MissingLocation {
                entity: "job",
                id: 1,
                field: "location_index"
            }
        ));
        assert_eq!(error.code(), 2);
    }

    #[tokio::test]
    async fn test_validation_errors_are_input_errors() {
        let result = build(
            r#"{
                "vehicles": [{ "id": 1, "start_index": 0, "capacity": [4, 2] }],
                "jobs": [{ "id": 1, "location_index": 1, "amount": [1] }],
                "matrix": [[0, 1], [1, 0]]
            }"#,
        )
        .await;

        let Err(error) = result else {
            panic!("mismatched dimensions must be rejected");
        };
        assert!(matches!(
            error,
            InputError::Validation(ValidationError::DimensionMismatch { job: 1, .. })
        ));
        assert_eq!(error.code(), 2);
    }

    #[tokio::test]
    async fn test_huge_location_index_is_rejected() {
        let result = build(
            r#"{
                "vehicles": [{ "id": 1, "start": [2.35, 48.85], "start_index": 18446744073709551615 }],
                "jobs": [{ "id": 1, "location_index": 1 }],
                "matrix": [[0, 1], [1, 0]]
            }"#,
        )
        .await;

        let Err(error) = result else {
            panic!("an out of range start_index must be rejected");
        };
        assert!(matches!(
            error,
            InputError::Validation(ValidationError::LocationOutOfRange {
                entity: "vehicle",
                id: 1,
                index: usize::MAX,
                size: 2
            })
        ));
        assert_eq!(error.code(), 2);
    }

    #[tokio::test]
    async fn test_coordinates_are_kept_with_matrix() {
        let problem = build(
            r#"{
                "vehicles": [{ "id": 1, "start": [2.35, 48.85], "start_index": 2 }],
                "jobs": [{ "id": 1, "location_index": 1 }],
                "matrix": [[0, 1, 2], [1, 0, 1], [2, 1, 0]]
            }"#,
        )
        .await
        .unwrap();

        assert_eq!(problem.locations().len(), 3);
        assert_eq!(problem.location(LocationIdx::new(0)).coordinates(), None);
        assert_eq!(
            problem.location(LocationIdx::new(2)).coordinates(),
            Some([2.35, 48.85])
        );
    }

    #[tokio::test]
    async fn test_invalid_durations_are_input_errors() {
        let negative_service = build(
            r#"{
                "vehicles": [{ "id": 1, "start_index": 0 }],
                "jobs": [{ "id": 4, "location_index": 1, "service": -500 }],
                "matrix": [[0, 1], [1, 0]]
            }"#,
        )
        .await;

        let Err(error) = negative_service else {
            panic!("a negative service duration must be rejected");
        };
        assert!(matches!(
            error,
            InputError::Validation(ValidationError::NegativeServiceDuration(4))
        ));

        let huge_travel_time = build(
            r#"{
                "vehicles": [{ "id": 1, "start_index": 0 }],
                "jobs": [{ "id": 1, "location_index": 1 }],
                "matrix": [[0, 1e20], [1e20, 0]]
            }"#,
        )
        .await;

        let Err(error) = huge_travel_time else {
            panic!("an out of range travel time must be rejected");
        };
        assert!(matches!(
            error,
            InputError::Validation(ValidationError::TravelTimeOutOfRange { .. })
        ));
        assert_eq!(error.code(), 2);
    }

    #[test]
    fn test_unknown_job_field_is_rejected() {
        let result = JsonVehicleRoutingProblem::from_json(
            r#"{
                "vehicles": [{ "id": 1, "start_index": 0 }],
                "jobs": [{ "id": 1, "location_index": 1, "pickup": [1] }]
            }"#,
        );

        let error = result.unwrap_err();
        assert!(matches!(error, InputError::Parse(_)));
        assert_eq!(error.code(), 2);
    }

    #[test]
    fn test_routing_error_code() {
        let error = InputError::Routing(MatrixProviderError::DimensionMismatch {
            locations: 2,
            expected: 4,
            actual: 1,
        });

        assert_eq!(error.code(), 3);
    }
}
