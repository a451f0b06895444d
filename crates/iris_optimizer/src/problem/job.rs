use fxhash::FxHashSet;
use jiff::SignedDuration;

use crate::{
    define_index_newtype,
    problem::{
        amount::Amount,
        location::LocationIdx,
        skill::Skill,
        time_window::{TimeWindow, TimeWindows},
    },
};

define_index_newtype!(JobIdx, Job);

#[derive(Debug, Clone)]
pub struct Job {
    external_id: u64,
    location_id: LocationIdx,
    duration: SignedDuration,
    demand: Amount,
    skills: FxHashSet<Skill>,
    time_windows: TimeWindows,
}

impl Job {
    pub fn external_id(&self) -> u64 {
        self.external_id
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn duration(&self) -> SignedDuration {
        self.duration
    }

    pub fn demand(&self) -> &Amount {
        &self.demand
    }

    pub fn skills(&self) -> &FxHashSet<Skill> {
        &self.skills
    }

    pub fn time_windows(&self) -> &TimeWindows {
        &self.time_windows
    }

    pub fn has_time_windows(&self) -> bool {
        !self.time_windows.is_unbounded()
    }
}

#[derive(Default)]
pub struct JobBuilder {
    external_id: Option<u64>,
    location_id: Option<usize>,
    duration: Option<SignedDuration>,
    demand: Option<Amount>,
    skills: Option<FxHashSet<Skill>>,
    time_windows: Option<Vec<TimeWindow>>,
}

impl JobBuilder {
    pub fn set_external_id(&mut self, external_id: u64) -> &mut JobBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_location_id(&mut self, location_id: usize) -> &mut JobBuilder {
        self.location_id = Some(location_id);
        self
    }

    pub fn set_service_duration(&mut self, duration: SignedDuration) -> &mut JobBuilder {
        self.duration = Some(duration);
        self
    }

    pub fn set_demand(&mut self, demand: Amount) -> &mut JobBuilder {
        self.demand = Some(demand);
        self
    }

    pub fn set_skills(&mut self, skills: Vec<u32>) -> &mut JobBuilder {
        self.skills = Some(skills.into_iter().map(Skill::new).collect());
        self
    }

    pub fn set_time_windows(&mut self, time_windows: Vec<TimeWindow>) -> &mut JobBuilder {
        self.time_windows = Some(time_windows);
        self
    }

    pub fn build(self) -> Job {
        Job {
            external_id: self.external_id.unwrap_or_default(),
            location_id: LocationIdx::new(self.location_id.unwrap_or_default()),
            duration: self.duration.unwrap_or(SignedDuration::ZERO),
            demand: self.demand.unwrap_or_default(),
            skills: self.skills.unwrap_or_default(),
            time_windows: TimeWindows::new(self.time_windows.unwrap_or_default()),
        }
    }
}
