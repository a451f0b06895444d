use jiff::SignedDuration;

use crate::{
    problem::{
        amount::Amount,
        job::JobIdx,
        location::LocationIdx,
        vehicle::{Vehicle, VehicleIdx},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::solution::utils::{
        compute_vehicle_end, compute_vehicle_start, is_vehicle_end_feasible, schedule_visit,
    },
};

#[derive(Clone)]
pub struct WorkingSolutionRoute {
    vehicle_id: VehicleIdx,

    /// Incremented on every change, used to invalidate cached insertions.
    version: usize,

    /// List of job IDs in the route order
    job_ids: Vec<JobIdx>,

    /// List of arrival times at each job
    arrival_times: Vec<SignedDuration>,

    /// List of waiting durations at each job
    waiting_durations: Vec<SignedDuration>,

    /// List of departure times at each job
    departure_times: Vec<SignedDuration>,

    // fwd_costs[i] stores the cost of travelling from job 0 to job i in route order
    fwd_costs: Vec<f64>,

    // bwd_costs[i] stores the cost of travelling from job i back to job 0,
    // used to price reversed segments on asymmetric matrices
    bwd_costs: Vec<f64>,

    /// Sum of the demands of every job, loaded at the start
    load: Amount,

    cost: f64,
    distance: f64,
    transport_duration: SignedDuration,
    end_arrival_time: Option<SignedDuration>,
}

impl WorkingSolutionRoute {
    pub fn empty(problem: &VehicleRoutingProblem, vehicle_id: VehicleIdx) -> Self {
        let mut route = WorkingSolutionRoute {
            vehicle_id,
            version: 0,
            job_ids: Vec::new(),
            arrival_times: Vec::new(),
            waiting_durations: Vec::new(),
            departure_times: Vec::new(),
            fwd_costs: Vec::new(),
            bwd_costs: Vec::new(),
            load: Amount::with_dimensions(problem.vehicle(vehicle_id).capacity().len()),
            cost: 0.0,
            distance: 0.0,
            transport_duration: SignedDuration::ZERO,
            end_arrival_time: None,
        };

        route.update_data(problem);

        route
    }

    pub fn len(&self) -> usize {
        self.job_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.job_ids.is_empty()
    }

    pub fn version(&self) -> usize {
        self.version
    }

    pub fn vehicle_id(&self) -> VehicleIdx {
        self.vehicle_id
    }

    pub fn vehicle<'a>(&self, problem: &'a VehicleRoutingProblem) -> &'a Vehicle {
        problem.vehicle(self.vehicle_id)
    }

    pub fn job_ids(&self) -> &[JobIdx] {
        &self.job_ids
    }

    pub fn job_id(&self, position: usize) -> JobIdx {
        self.job_ids[position]
    }

    pub fn contains_job(&self, job_id: JobIdx) -> bool {
        self.job_ids.contains(&job_id)
    }

    pub fn job_ids_iter(
        &self,
        start: usize,
        end: usize,
    ) -> impl DoubleEndedIterator<Item = JobIdx> + Clone + '_ {
        self.job_ids[start..end].iter().copied()
    }

    pub fn arrival_time(&self, position: usize) -> SignedDuration {
        self.arrival_times[position]
    }

    pub fn waiting_duration(&self, position: usize) -> SignedDuration {
        self.waiting_durations[position]
    }

    pub fn departure_time(&self, position: usize) -> SignedDuration {
        self.departure_times[position]
    }

    pub fn total_waiting_duration(&self) -> SignedDuration {
        self.waiting_durations
            .iter()
            .fold(SignedDuration::ZERO, |acc, &waiting| acc + waiting)
    }

    pub fn load(&self) -> &Amount {
        &self.load
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn transport_duration(&self) -> SignedDuration {
        self.transport_duration
    }

    pub fn start_time(&self, problem: &VehicleRoutingProblem) -> SignedDuration {
        compute_vehicle_start(problem, self.vehicle_id)
    }

    /// Arrival at the end location, or departure from the last job for open routes.
    pub fn end_time(&self, problem: &VehicleRoutingProblem) -> SignedDuration {
        self.end_arrival_time
            .or_else(|| self.departure_times.last().copied())
            .unwrap_or_else(|| self.start_time(problem))
    }

    #[inline]
    pub fn location_id(&self, problem: &VehicleRoutingProblem, position: usize) -> LocationIdx {
        problem.job(self.job_ids[position]).location_id()
    }

    /// Location visited right before `position`, the vehicle start for the first job.
    #[inline]
    pub fn previous_location_id(
        &self,
        problem: &VehicleRoutingProblem,
        position: usize,
    ) -> Option<LocationIdx> {
        if position == 0 {
            self.vehicle(problem).start_location_id()
        } else {
            Some(self.location_id(problem, position - 1))
        }
    }

    /// Location of the job at `position`, the vehicle end past the last job.
    #[inline]
    pub fn location_id_or_end(
        &self,
        problem: &VehicleRoutingProblem,
        position: usize,
    ) -> Option<LocationIdx> {
        if position >= self.len() {
            self.vehicle(problem).end_location_id()
        } else {
            Some(self.location_id(problem, position))
        }
    }

    /// Every location travelled through, including the vehicle start and end.
    pub fn compute_location_ids(&self, problem: &VehicleRoutingProblem) -> Vec<LocationIdx> {
        if self.is_empty() {
            return vec![];
        }

        let vehicle = self.vehicle(problem);

        vehicle
            .start_location_id()
            .into_iter()
            .chain(
                self.job_ids
                    .iter()
                    .map(|&job_id| problem.job(job_id).location_id()),
            )
            .chain(vehicle.end_location_id())
            .collect()
    }

    /// Cost of the edges between the jobs of `[start, end)`, in route order.
    #[inline]
    pub fn segment_cost(&self, problem: &VehicleRoutingProblem, start: usize, end: usize) -> f64 {
        if end <= start + 1 {
            return 0.0;
        }

        let cost = self.fwd_costs[end - 1] - self.fwd_costs[start];
        if cost.is_finite() {
            cost
        } else {
            self.walk_segment_cost(problem, start, end, false)
        }
    }

    /// Cost of the edges between the jobs of `[start, end)`, walked in reverse.
    #[inline]
    pub fn reversed_segment_cost(
        &self,
        problem: &VehicleRoutingProblem,
        start: usize,
        end: usize,
    ) -> f64 {
        if end <= start + 1 {
            return 0.0;
        }

        let cost = self.bwd_costs[end - 1] - self.bwd_costs[start];
        if cost.is_finite() {
            cost
        } else {
            self.walk_segment_cost(problem, start, end, true)
        }
    }

    // Prefix sums are unusable once an unreachable edge entered them, before or inside the
    // segment.
    fn walk_segment_cost(
        &self,
        problem: &VehicleRoutingProblem,
        start: usize,
        end: usize,
        reversed: bool,
    ) -> f64 {
        self.job_ids[start..end]
            .windows(2)
            .map(|pair| {
                let from = problem.job(pair[0]).location_id();
                let to = problem.job(pair[1]).location_id();
                if reversed {
                    problem.travel_cost(to, from)
                } else {
                    problem.travel_cost(from, to)
                }
            })
            .sum()
    }

    /// Cost of the edges around and inside `[start, end)`, as currently travelled.
    fn replaced_edges_cost(&self, problem: &VehicleRoutingProblem, start: usize, end: usize) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        let previous = self.previous_location_id(problem, start);
        let next = self.location_id_or_end(problem, end);

        if start == end {
            return problem.travel_cost_or_zero(previous, next);
        }

        problem.travel_cost_or_zero(previous, Some(self.location_id(problem, start)))
            + self.segment_cost(problem, start, end)
            + problem.travel_cost_or_zero(Some(self.location_id(problem, end - 1)), next)
    }

    /// Cost change of replacing the jobs in `[start, end)` by `job_ids`, computed from the
    /// modified edges only.
    pub fn replace_cost_delta(
        &self,
        problem: &VehicleRoutingProblem,
        job_ids: impl Iterator<Item = JobIdx>,
        start: usize,
        end: usize,
    ) -> f64 {
        let current_cost = self.replaced_edges_cost(problem, start, end);

        let mut previous = self.previous_location_id(problem, start);
        let mut new_cost = 0.0;
        let mut count = 0;

        for job_id in job_ids {
            let location_id = problem.job(job_id).location_id();
            new_cost += problem.travel_cost_or_zero(previous, Some(location_id));
            previous = Some(location_id);
            count += 1;
        }

        // An empty route does not travel
        if self.len() - (end - start) + count == 0 {
            return -current_cost;
        }

        new_cost += problem.travel_cost_or_zero(previous, self.location_id_or_end(problem, end));

        new_cost - current_cost
    }

    pub fn insertion_cost_delta(
        &self,
        problem: &VehicleRoutingProblem,
        job_id: JobIdx,
        position: usize,
    ) -> f64 {
        self.replace_cost_delta(problem, std::iter::once(job_id), position, position)
    }

    pub fn removal_cost_delta(&self, problem: &VehicleRoutingProblem, position: usize) -> f64 {
        self.replace_cost_delta(problem, std::iter::empty(), position, position + 1)
    }

    /// Checks whether the route stays feasible when the jobs of `[start, end)` are replaced
    /// by `job_ids`.
    pub fn is_valid_change(
        &self,
        problem: &VehicleRoutingProblem,
        job_ids: impl Iterator<Item = JobIdx> + Clone,
        start: usize,
        end: usize,
    ) -> bool {
        self.is_valid_capacity_change(problem, job_ids.clone(), start, end)
            && self.is_valid_tw_change(problem, job_ids, start, end)
    }

    /// Capacity and skills of the new jobs. Every job is loaded at the start, so the total
    /// load is the only one to check.
    pub fn is_valid_capacity_change(
        &self,
        problem: &VehicleRoutingProblem,
        job_ids: impl Iterator<Item = JobIdx>,
        start: usize,
        end: usize,
    ) -> bool {
        let mut load = self.load.clone();

        for job_id in self.job_ids_iter(start, end) {
            load -= problem.job(job_id).demand();
        }

        for job_id in job_ids {
            if !problem.is_job_compatible_with_vehicle(self.vehicle_id, job_id) {
                return false;
            }
            load += problem.job(job_id).demand();
        }

        load.fits_in(self.vehicle(problem).capacity())
    }

    /// Reachability, job time windows and vehicle shift of the changed route.
    pub fn is_valid_tw_change(
        &self,
        problem: &VehicleRoutingProblem,
        job_ids: impl Iterator<Item = JobIdx>,
        start: usize,
        end: usize,
    ) -> bool {
        let mut previous_location_id = self.previous_location_id(problem, start);
        let mut previous_departure_time = if start == 0 {
            self.start_time(problem)
        } else {
            self.departure_times[start - 1]
        };
        let mut visited = start;

        for job_id in job_ids {
            let visit = schedule_visit(
                problem,
                self.vehicle_id,
                previous_location_id,
                previous_departure_time,
                job_id,
            );

            if !visit.is_feasible() {
                return false;
            }

            previous_location_id = Some(problem.job(job_id).location_id());
            previous_departure_time = visit.departure_time;
            visited += 1;
        }

        for position in end..self.len() {
            let job_id = self.job_ids[position];
            let visit = schedule_visit(
                problem,
                self.vehicle_id,
                previous_location_id,
                previous_departure_time,
                job_id,
            );

            if !visit.is_feasible() {
                return false;
            }

            // Service start is monotone in the arrival time, the rest of the route can only
            // be served earlier than it currently is.
            if visit.arrival_time <= self.arrival_times[position] {
                return true;
            }

            previous_location_id = Some(problem.job(job_id).location_id());
            previous_departure_time = visit.departure_time;
            visited += 1;
        }

        if visited == 0 {
            return true;
        }

        is_vehicle_end_feasible(
            problem,
            self.vehicle_id,
            previous_location_id,
            previous_departure_time,
        )
    }

    pub fn can_insert(&self, problem: &VehicleRoutingProblem, job_id: JobIdx, position: usize) -> bool {
        self.is_valid_change(problem, std::iter::once(job_id), position, position)
    }

    /// Cheapest feasible position for `job_id`, ties broken by the earliest position.
    pub fn best_insertion(
        &self,
        problem: &VehicleRoutingProblem,
        job_id: JobIdx,
    ) -> Option<(f64, usize)> {
        let job = problem.job(job_id);

        if !problem.is_job_compatible_with_vehicle(self.vehicle_id, job_id)
            || !self
                .load
                .fits_with(job.demand(), self.vehicle(problem).capacity())
        {
            return None;
        }

        let mut best: Option<(f64, usize)> = None;

        for position in 0..=self.len() {
            let delta = self.insertion_cost_delta(problem, job_id, position);

            if best.is_some_and(|(best_delta, _)| delta >= best_delta) {
                continue;
            }

            if self.is_valid_tw_change(problem, std::iter::once(job_id), position, position) {
                best = Some((delta, position));
            }
        }

        best
    }

    pub fn insert_job(&mut self, problem: &VehicleRoutingProblem, job_id: JobIdx, position: usize) {
        self.job_ids.insert(position, job_id);
        self.update_data(problem);
    }

    pub fn remove_job(&mut self, problem: &VehicleRoutingProblem, position: usize) -> JobIdx {
        let job_id = self.job_ids.remove(position);
        self.update_data(problem);
        job_id
    }

    /// Replaces the jobs in `[start, end)` by `job_ids`.
    pub fn replace_jobs(
        &mut self,
        problem: &VehicleRoutingProblem,
        job_ids: &[JobIdx],
        start: usize,
        end: usize,
    ) {
        self.job_ids.splice(start..end, job_ids.iter().copied());
        self.update_data(problem);
    }

    fn update_data(&mut self, problem: &VehicleRoutingProblem) {
        let len = self.job_ids.len();
        self.version += 1;

        self.arrival_times.clear();
        self.waiting_durations.clear();
        self.departure_times.clear();
        self.fwd_costs.clear();
        self.bwd_costs.clear();
        self.load.reset();

        self.arrival_times.reserve(len);
        self.waiting_durations.reserve(len);
        self.departure_times.reserve(len);
        self.fwd_costs.reserve(len);
        self.bwd_costs.reserve(len);

        self.cost = 0.0;
        self.distance = 0.0;
        self.transport_duration = SignedDuration::ZERO;
        self.end_arrival_time = None;

        if len == 0 {
            return;
        }

        let mut previous_location_id = self.vehicle(problem).start_location_id();
        let mut previous_departure_time = self.start_time(problem);

        for (position, &job_id) in self.job_ids.iter().enumerate() {
            let job = problem.job(job_id);
            let location_id = job.location_id();

            let visit = schedule_visit(
                problem,
                self.vehicle_id,
                previous_location_id,
                previous_departure_time,
                job_id,
            );

            self.arrival_times.push(visit.arrival_time);
            self.waiting_durations.push(visit.waiting_duration);
            self.departure_times.push(visit.departure_time);

            if position == 0 {
                self.fwd_costs.push(0.0);
                self.bwd_costs.push(0.0);
            } else {
                self.fwd_costs.push(
                    self.fwd_costs[position - 1]
                        + problem.travel_cost_or_zero(previous_location_id, Some(location_id)),
                );
                self.bwd_costs.push(
                    self.bwd_costs[position - 1]
                        + problem.travel_cost_or_zero(Some(location_id), previous_location_id),
                );
            }

            self.cost += problem.travel_cost_or_zero(previous_location_id, Some(location_id));
            self.distance += problem.travel_distance_or_zero(previous_location_id, Some(location_id));
            self.transport_duration +=
                problem.travel_time_or_zero(previous_location_id, Some(location_id));
            self.load += job.demand();

            previous_location_id = Some(location_id);
            previous_departure_time = visit.departure_time;
        }

        let end_location_id = self.vehicle(problem).end_location_id();
        self.cost += problem.travel_cost_or_zero(previous_location_id, end_location_id);
        self.distance += problem.travel_distance_or_zero(previous_location_id, end_location_id);
        self.transport_duration += problem.travel_time_or_zero(previous_location_id, end_location_id);
        self.end_arrival_time = compute_vehicle_end(
            problem,
            self.vehicle_id,
            previous_location_id,
            previous_departure_time,
        );
    }
}
