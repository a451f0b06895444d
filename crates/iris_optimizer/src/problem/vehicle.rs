use fxhash::FxHashSet;
use jiff::SignedDuration;

use crate::{
    define_index_newtype,
    problem::{
        amount::Amount, job::Job, location::LocationIdx, skill::Skill, time_window::TimeWindow,
    },
};

define_index_newtype!(VehicleIdx, Vehicle);

#[derive(Debug, Clone)]
pub struct Vehicle {
    external_id: u64,
    start_location_id: Option<LocationIdx>,
    end_location_id: Option<LocationIdx>,
    capacity: Amount,
    skills: FxHashSet<Skill>,
    time_window: TimeWindow,
}

impl Vehicle {
    pub fn external_id(&self) -> u64 {
        self.external_id
    }

    /// `None` when the route starts at its first job.
    pub fn start_location_id(&self) -> Option<LocationIdx> {
        self.start_location_id
    }

    /// `None` for open routes, the vehicle stops at its last job.
    pub fn end_location_id(&self) -> Option<LocationIdx> {
        self.end_location_id
    }

    pub fn capacity(&self) -> &Amount {
        &self.capacity
    }

    pub fn skills(&self) -> &FxHashSet<Skill> {
        &self.skills
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub fn earliest_start(&self) -> SignedDuration {
        self.time_window.start()
    }

    pub fn latest_end(&self) -> SignedDuration {
        self.time_window.end()
    }

    /// A vehicle can serve a job when it has every skill the job requires.
    pub fn is_compatible_with(&self, job: &Job) -> bool {
        job.skills().is_subset(&self.skills)
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<u64>,
    start_location_id: Option<usize>,
    end_location_id: Option<usize>,
    capacity: Option<Amount>,
    skills: Option<FxHashSet<Skill>>,
    time_window: Option<TimeWindow>,
}

impl VehicleBuilder {
    pub fn set_vehicle_id(&mut self, external_id: u64) -> &mut VehicleBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_start_location_id(&mut self, location_id: usize) -> &mut VehicleBuilder {
        self.start_location_id = Some(location_id);
        self
    }

    pub fn set_end_location_id(&mut self, location_id: usize) -> &mut VehicleBuilder {
        self.end_location_id = Some(location_id);
        self
    }

    /// Start and end at the same location.
    pub fn set_depot_location_id(&mut self, location_id: usize) -> &mut VehicleBuilder {
        self.start_location_id = Some(location_id);
        self.end_location_id = Some(location_id);
        self
    }

    pub fn set_capacity(&mut self, capacity: Amount) -> &mut VehicleBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_skills(&mut self, skills: Vec<u32>) -> &mut VehicleBuilder {
        self.skills = Some(skills.into_iter().map(Skill::new).collect());
        self
    }

    pub fn set_time_window(&mut self, time_window: TimeWindow) -> &mut VehicleBuilder {
        self.time_window = Some(time_window);
        self
    }

    pub fn build(self) -> Vehicle {
        Vehicle {
            external_id: self.external_id.unwrap_or_default(),
            start_location_id: self.start_location_id.map(LocationIdx::new),
            end_location_id: self.end_location_id.map(LocationIdx::new),
            capacity: self.capacity.unwrap_or_default(),
            skills: self.skills.unwrap_or_default(),
            time_window: self.time_window.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::problem::job::JobBuilder;

    use super::*;

    #[test]
    fn test_skill_compatibility_requires_superset() {
        let mut vehicle = VehicleBuilder::default();
        vehicle.set_skills(vec![1, 2]);
        let vehicle = vehicle.build();

        let mut job = JobBuilder::default();
        job.set_skills(vec![1]);
        assert!(vehicle.is_compatible_with(&job.build()));

        let mut job = JobBuilder::default();
        job.set_skills(vec![1, 3]);
        assert!(!vehicle.is_compatible_with(&job.build()));

        assert!(vehicle.is_compatible_with(&JobBuilder::default().build()));
    }
}
