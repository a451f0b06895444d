use fxhash::FxHashSet;
use jiff::SignedDuration;

use crate::{
    problem::{
        job::{Job, JobIdx},
        location::{Location, LocationIdx},
        travel_cost_matrix::{Cost, Distance, TravelMatrices},
        validation::ValidationError,
        vehicle::{Vehicle, VehicleIdx},
    },
    utils::enumerate_idx::EnumerateIdx,
};

/// Upper bound on the granular neighborhood size kept per job.
pub const MAX_NEAREST_JOBS: usize = 256;

type PrecomputedNearestJobs = Vec<Vec<JobIdx>>;

pub struct VehicleRoutingProblem {
    locations: Vec<Location>,
    vehicles: Vec<Vehicle>,
    jobs: Vec<Job>,
    travel_costs: TravelMatrices,

    has_time_windows: bool,
    has_capacity: bool,

    precomputed_vehicle_compatibilities: Vec<bool>,
    precomputed_nearest_jobs: PrecomputedNearestJobs,
}

struct VehicleRoutingProblemParams {
    locations: Vec<Location>,
    vehicles: Vec<Vehicle>,
    jobs: Vec<Job>,
    travel_costs: TravelMatrices,
}

impl VehicleRoutingProblem {
    fn new(params: VehicleRoutingProblemParams) -> Self {
        let precomputed_vehicle_compatibilities =
            VehicleRoutingProblem::precompute_vehicle_compatibilities(
                &params.vehicles,
                &params.jobs,
            );

        let precomputed_nearest_jobs =
            VehicleRoutingProblem::precompute_nearest_jobs(&params.jobs, &params.travel_costs);

        Self {
            has_time_windows: params.jobs.iter().any(|job| job.has_time_windows()),
            has_capacity: params.jobs.iter().any(|job| !job.demand().is_empty()),
            locations: params.locations,
            vehicles: params.vehicles,
            jobs: params.jobs,
            travel_costs: params.travel_costs,
            precomputed_vehicle_compatibilities,
            precomputed_nearest_jobs,
        }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, job_id: JobIdx) -> &Job {
        &self.jobs[job_id]
    }

    pub fn vehicle(&self, vehicle_id: VehicleIdx) -> &Vehicle {
        &self.vehicles[vehicle_id]
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, location_id: LocationIdx) -> &Location {
        &self.locations[location_id]
    }

    pub fn travel_costs(&self) -> &TravelMatrices {
        &self.travel_costs
    }

    #[inline]
    pub fn travel_distance(&self, from: LocationIdx, to: LocationIdx) -> Distance {
        self.travel_costs.travel_distance(from, to)
    }

    #[inline]
    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> SignedDuration {
        self.travel_costs.travel_time(from, to)
    }

    #[inline]
    pub fn travel_cost(&self, from: LocationIdx, to: LocationIdx) -> Cost {
        self.travel_costs.travel_cost(from, to)
    }

    #[inline]
    pub fn is_reachable(&self, from: LocationIdx, to: LocationIdx) -> bool {
        self.travel_costs.is_reachable(from, to)
    }

    /// Missing endpoints (no start, open route) cost nothing.
    #[inline]
    pub fn travel_cost_or_zero(&self, from: Option<LocationIdx>, to: Option<LocationIdx>) -> Cost {
        if let (Some(from), Some(to)) = (from, to) {
            self.travel_cost(from, to)
        } else {
            0.0
        }
    }

    #[inline]
    pub fn travel_time_or_zero(
        &self,
        from: Option<LocationIdx>,
        to: Option<LocationIdx>,
    ) -> SignedDuration {
        if let (Some(from), Some(to)) = (from, to) {
            self.travel_time(from, to)
        } else {
            SignedDuration::ZERO
        }
    }

    #[inline]
    pub fn travel_distance_or_zero(
        &self,
        from: Option<LocationIdx>,
        to: Option<LocationIdx>,
    ) -> Distance {
        if let (Some(from), Some(to)) = (from, to) {
            self.travel_distance(from, to)
        } else {
            0.0
        }
    }

    #[inline]
    pub fn is_reachable_or_none(&self, from: Option<LocationIdx>, to: Option<LocationIdx>) -> bool {
        if let (Some(from), Some(to)) = (from, to) {
            self.is_reachable(from, to)
        } else {
            true
        }
    }

    pub fn is_symmetric(&self) -> bool {
        self.travel_costs.is_symmetric()
    }

    pub fn has_time_windows(&self) -> bool {
        self.has_time_windows
    }

    pub fn has_capacity(&self) -> bool {
        self.has_capacity
    }

    #[inline]
    pub fn is_job_compatible_with_vehicle(&self, vehicle_id: VehicleIdx, job_id: JobIdx) -> bool {
        let index = vehicle_id.get() * self.jobs.len() + job_id.get();
        self.precomputed_vehicle_compatibilities[index]
    }

    /// Other jobs sorted by increasing `min(c(a, b), c(b, a))`, ties by index.
    pub fn nearest_jobs(&self, job_id: JobIdx) -> &[JobIdx] {
        &self.precomputed_nearest_jobs[job_id.get()]
    }

    fn precompute_vehicle_compatibilities(vehicles: &[Vehicle], jobs: &[Job]) -> Vec<bool> {
        let mut compatibilities = vec![true; vehicles.len() * jobs.len()];

        for (vehicle_index, vehicle) in vehicles.iter().enumerate() {
            for (job_index, job) in jobs.iter().enumerate() {
                let index = vehicle_index * jobs.len() + job_index;
                compatibilities[index] = vehicle.is_compatible_with(job);
            }
        }

        compatibilities
    }

    fn precompute_nearest_jobs(jobs: &[Job], travel_costs: &TravelMatrices) -> PrecomputedNearestJobs {
        let limit = MAX_NEAREST_JOBS.min(jobs.len().saturating_sub(1));

        jobs.iter()
            .enumerate_idx::<JobIdx>()
            .map(|(job_id, job)| {
                let mut others = jobs
                    .iter()
                    .enumerate_idx::<JobIdx>()
                    .filter(|&(other_id, _)| other_id != job_id)
                    .map(|(other_id, other)| {
                        let (a, b) = (job.location_id(), other.location_id());
                        let cost = travel_costs
                            .travel_cost(a, b)
                            .min(travel_costs.travel_cost(b, a));
                        (cost, other_id)
                    })
                    .collect::<Vec<_>>();

                others.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                others.truncate(limit);
                others.into_iter().map(|(_, other_id)| other_id).collect()
            })
            .collect()
    }
}

#[derive(Default)]
pub struct VehicleRoutingProblemBuilder {
    jobs: Option<Vec<Job>>,
    vehicles: Option<Vec<Vehicle>>,
    locations: Option<Vec<Location>>,
    travel_costs: Option<TravelMatrices>,
}

impl VehicleRoutingProblemBuilder {
    pub fn set_jobs(&mut self, jobs: Vec<Job>) -> &mut VehicleRoutingProblemBuilder {
        self.jobs = Some(jobs);
        self
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) -> &mut VehicleRoutingProblemBuilder {
        self.vehicles = Some(vehicles);
        self
    }

    /// Coordinates of each matrix row, only needed for output and geometry.
    pub fn set_locations(&mut self, locations: Vec<Location>) -> &mut VehicleRoutingProblemBuilder {
        self.locations = Some(locations);
        self
    }

    pub fn set_travel_costs(
        &mut self,
        travel_costs: TravelMatrices,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.travel_costs = Some(travel_costs);
        self
    }

    pub fn build(self) -> Result<VehicleRoutingProblem, ValidationError> {
        let jobs = self.jobs.unwrap_or_default();
        let vehicles = self.vehicles.unwrap_or_default();
        let travel_costs = self.travel_costs.ok_or(ValidationError::MissingMatrices)?;
        let num_locations = travel_costs.num_locations();

        if jobs.is_empty() {
            return Err(ValidationError::NoJobs);
        }

        if vehicles.is_empty() {
            return Err(ValidationError::NoVehicles);
        }

        validate_vehicles(&vehicles, num_locations)?;
        validate_jobs(&jobs, num_locations)?;
        validate_dimensions(&jobs, &vehicles)?;

        let mut locations = self.locations.unwrap_or_default();
        locations.resize(num_locations, Location::unknown());

        Ok(VehicleRoutingProblem::new(VehicleRoutingProblemParams {
            locations,
            vehicles,
            jobs,
            travel_costs,
        }))
    }
}

fn check_location(
    entity: &'static str,
    id: u64,
    location_id: LocationIdx,
    num_locations: usize,
) -> Result<(), ValidationError> {
    if location_id.get() >= num_locations {
        return Err(ValidationError::LocationOutOfRange {
            entity,
            id,
            index: location_id.get(),
            size: num_locations,
        });
    }

    Ok(())
}

fn validate_vehicles(vehicles: &[Vehicle], num_locations: usize) -> Result<(), ValidationError> {
    let mut ids = FxHashSet::default();

    for vehicle in vehicles {
        let id = vehicle.external_id();

        if !ids.insert(id) {
            return Err(ValidationError::DuplicateVehicleId(id));
        }

        if vehicle.start_location_id().is_none() && vehicle.end_location_id().is_none() {
            return Err(ValidationError::MissingVehicleLocation(id));
        }

        for location_id in [vehicle.start_location_id(), vehicle.end_location_id()]
            .into_iter()
            .flatten()
        {
            check_location("vehicle", id, location_id, num_locations)?;
        }

        if vehicle.capacity().has_negative() {
            return Err(ValidationError::NegativeAmount {
                entity: "vehicle",
                id,
            });
        }

        if !vehicle.time_window().is_well_formed() {
            return Err(ValidationError::InvalidTimeWindow {
                entity: "vehicle",
                id,
            });
        }
    }

    Ok(())
}

fn validate_jobs(jobs: &[Job], num_locations: usize) -> Result<(), ValidationError> {
    let mut ids = FxHashSet::default();

    for job in jobs {
        let id = job.external_id();

        if !ids.insert(id) {
            return Err(ValidationError::DuplicateJobId(id));
        }

        check_location("job", id, job.location_id(), num_locations)?;

        if job.demand().has_negative() {
            return Err(ValidationError::NegativeAmount { entity: "job", id });
        }

        if job.duration().is_negative() {
            return Err(ValidationError::NegativeServiceDuration(id));
        }

        let windows = job.time_windows().as_slice();

        if windows.iter().any(|window| !window.is_well_formed()) {
            return Err(ValidationError::InvalidTimeWindow { entity: "job", id });
        }

        if windows.windows(2).any(|pair| pair[0].overlaps(&pair[1])) {
            return Err(ValidationError::OverlappingTimeWindows(id));
        }
    }

    Ok(())
}

/// Every job demand and vehicle capacity must share the same number of dimensions.
fn validate_dimensions(jobs: &[Job], vehicles: &[Vehicle]) -> Result<(), ValidationError> {
    let reference = &vehicles[0];
    let dimensions = reference.capacity().len();

    for vehicle in vehicles {
        if vehicle.capacity().len() != dimensions {
            return Err(ValidationError::VehicleDimensionMismatch {
                vehicle: vehicle.external_id(),
                capacity: vehicle.capacity().len(),
                expected: dimensions,
            });
        }
    }

    for job in jobs {
        if job.demand().len() != dimensions {
            return Err(ValidationError::DimensionMismatch {
                job: job.external_id(),
                vehicle: reference.external_id(),
                demand: job.demand().len(),
                capacity: dimensions,
            });
        }
    }

    Ok(())
}
