use fxhash::FxHashMap;

use crate::{
    problem::job::JobIdx,
    solver::solution::{route::WorkingSolutionRoute, route_id::RouteIdx},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsertionCacheEntry {
    pub cost: f64,
    pub position: usize,
}

/// Best insertion of a job in a route, valid as long as the route version is unchanged.
/// `None` entries record that the job does not fit in the route.
#[derive(Default)]
pub struct InsertionCache {
    cache: FxHashMap<(RouteIdx, usize, JobIdx), Option<InsertionCacheEntry>>,
}

impl InsertionCache {
    pub fn new() -> Self {
        Self {
            cache: FxHashMap::default(),
        }
    }

    pub fn get(
        &self,
        route_idx: RouteIdx,
        version: usize,
        job_idx: JobIdx,
    ) -> Option<&Option<InsertionCacheEntry>> {
        self.cache.get(&(route_idx, version, job_idx))
    }

    pub fn insert(
        &mut self,
        route_idx: RouteIdx,
        version: usize,
        job_idx: JobIdx,
        entry: Option<InsertionCacheEntry>,
    ) {
        self.cache.insert((route_idx, version, job_idx), entry);
    }

    pub fn get_or_compute(
        &mut self,
        route_idx: RouteIdx,
        route: &WorkingSolutionRoute,
        job_idx: JobIdx,
        compute: impl FnOnce() -> Option<InsertionCacheEntry>,
    ) -> Option<InsertionCacheEntry> {
        *self
            .cache
            .entry((route_idx, route.version(), job_idx))
            .or_insert_with(compute)
    }

    /// Drops the entries of routes that changed since they were computed.
    pub fn clear(&mut self, routes: &[WorkingSolutionRoute]) {
        self.cache.retain(|(route_idx, version, _), _| {
            if let Some(route) = routes.get(route_idx.get()) {
                *version == route.version()
            } else {
                false
            }
        });
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
