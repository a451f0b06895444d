use thiserror::Error;

/// Problem descriptions rejected before any search starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("No jobs to assign")]
    NoJobs,

    #[error("No vehicles available")]
    NoVehicles,

    #[error("Duplicate job id {0}")]
    DuplicateJobId(u64),

    #[error("Duplicate vehicle id {0}")]
    DuplicateVehicleId(u64),

    #[error("Missing travel matrices")]
    MissingMatrices,

    #[error("Matrix is not square: {size} entries")]
    MatrixNotSquare { size: usize },

    #[error("Matrix sizes mismatch: {times} times, {distances} distances, {costs} costs")]
    MatrixSizeMismatch {
        times: usize,
        distances: usize,
        costs: usize,
    },

    #[error("Negative or NaN value in {matrix} matrix at ({from}, {to})")]
    InvalidMatrixValue {
        matrix: &'static str,
        from: usize,
        to: usize,
    },

    #[error("Travel time {value} in duration matrix at ({from}, {to}) is out of range")]
    TravelTimeOutOfRange { from: usize, to: usize, value: f64 },

    #[error("Location index {index} of {entity} {id} is out of range for {size} locations")]
    LocationOutOfRange {
        entity: &'static str,
        id: u64,
        index: usize,
        size: usize,
    },

    #[error("Vehicle {0} has neither a start nor an end location")]
    MissingVehicleLocation(u64),

    #[error("Demand of job {job} has {demand} dimensions, capacity of vehicle {vehicle} has {capacity}")]
    DimensionMismatch {
        job: u64,
        vehicle: u64,
        demand: usize,
        capacity: usize,
    },

    #[error("Capacity of vehicle {vehicle} has {capacity} dimensions, expected {expected}")]
    VehicleDimensionMismatch {
        vehicle: u64,
        capacity: usize,
        expected: usize,
    },

    #[error("Negative service duration on job {0}")]
    NegativeServiceDuration(u64),

    #[error("Negative amount on {entity} {id}")]
    NegativeAmount { entity: &'static str, id: u64 },

    #[error("Invalid time window on {entity} {id}: start is after end")]
    InvalidTimeWindow { entity: &'static str, id: u64 },

    #[error("Overlapping time windows on job {0}")]
    OverlappingTimeWindows(u64),
}
