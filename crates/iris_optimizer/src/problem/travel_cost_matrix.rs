use std::sync::Arc;

use jiff::SignedDuration;

use crate::problem::{location::LocationIdx, validation::ValidationError};

pub type Distance = f64;
pub type Time = f64;
pub type Cost = f64;

/// This matrix use a flat structure to store distances, times, and costs between locations.
/// To find the index for a pair of locations, use the formula:
/// `index = from * num_locations + to`, where `num_locations` is the total
///
/// A pair the routing engine could not connect holds a non-finite value.
#[derive(Debug, Clone)]
pub struct TravelMatrices {
    distances: Arc<Vec<Distance>>,
    times: Arc<Vec<Time>>,
    costs: Arc<Vec<Cost>>,
    num_locations: usize,
    is_symmetric: bool,
}

fn is_flat_matrix_symmetric(matrix: &[f64], num_locations: usize) -> bool {
    for i in 0..num_locations {
        for j in (i + 1)..num_locations {
            if matrix[i * num_locations + j] != matrix[j * num_locations + i] {
                return false;
            }
        }
    }
    true
}

fn check_values(
    matrix: &[f64],
    name: &'static str,
    num_locations: usize,
) -> Result<(), ValidationError> {
    match matrix.iter().position(|value| value.is_nan() || *value < 0.0) {
        Some(index) => Err(ValidationError::InvalidMatrixValue {
            matrix: name,
            from: index / num_locations,
            to: index % num_locations,
        }),
        None => Ok(()),
    }
}

/// Longest finite travel time accepted, in seconds. Keeps the sums along a route far from the
/// `SignedDuration` bounds.
pub const MAX_TRAVEL_TIME_SECS: f64 = 1e12;

fn check_travel_times(times: &[Time], num_locations: usize) -> Result<(), ValidationError> {
    match times
        .iter()
        .position(|value| value.is_finite() && *value > MAX_TRAVEL_TIME_SECS)
    {
        Some(index) => Err(ValidationError::TravelTimeOutOfRange {
            from: index / num_locations,
            to: index % num_locations,
            value: times[index],
        }),
        None => Ok(()),
    }
}

impl TravelMatrices {
    pub fn new(
        times: Vec<Time>,
        distances: Vec<Distance>,
        costs: Option<Vec<Cost>>,
    ) -> Result<Self, ValidationError> {
        let size = times.len();
        let num_locations = size.isqrt();

        if num_locations * num_locations != size {
            return Err(ValidationError::MatrixNotSquare { size });
        }

        let costs_len = costs.as_ref().map_or(size, Vec::len);
        if distances.len() != size || costs_len != size {
            return Err(ValidationError::MatrixSizeMismatch {
                times: size,
                distances: distances.len(),
                costs: costs_len,
            });
        }

        check_values(&times, "duration", num_locations)?;
        check_travel_times(&times, num_locations)?;
        check_values(&distances, "distance", num_locations)?;

        let times = Arc::new(times);
        let costs = match costs {
            Some(costs) => {
                check_values(&costs, "cost", num_locations)?;
                Arc::new(costs)
            }
            None => Arc::clone(&times),
        };
        let is_symmetric = is_flat_matrix_symmetric(&costs, num_locations);

        Ok(TravelMatrices {
            distances: Arc::new(distances),
            times,
            costs,
            num_locations,
            is_symmetric,
        })
    }

    pub fn from_rows(
        times: Vec<Vec<Time>>,
        distances: Option<Vec<Vec<Distance>>>,
        costs: Option<Vec<Vec<Cost>>>,
    ) -> Result<Self, ValidationError> {
        let rows = times.len();
        if times.iter().any(|row| row.len() != rows) {
            return Err(ValidationError::MatrixNotSquare {
                size: times.iter().map(Vec::len).sum(),
            });
        }

        let times: Vec<Time> = times.into_iter().flatten().collect();
        let distances = distances
            .map(|rows| rows.into_iter().flatten().collect())
            .unwrap_or_else(|| vec![0.0; times.len()]);
        let costs = costs.map(|rows| rows.into_iter().flatten().collect());

        Self::new(times, distances, costs)
    }

    pub fn from_travel_matrices(
        matrices: iris_matrix_providers::travel_matrices::TravelMatrices,
    ) -> Result<Self, ValidationError> {
        Self::new(matrices.times, matrices.distances, matrices.costs)
    }

    #[inline(always)]
    fn index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    #[inline(always)]
    pub fn is_reachable(&self, from: LocationIdx, to: LocationIdx) -> bool {
        let index = self.index(from, to);
        from == to || (self.times[index].is_finite() && self.costs[index].is_finite())
    }

    #[inline(always)]
    pub fn travel_distance(&self, from: LocationIdx, to: LocationIdx) -> Distance {
        if from == to {
            return 0.0;
        }

        self.distances[self.index(from, to)]
    }

    /// Unreachable pairs saturate to `SignedDuration::MAX`.
    #[inline(always)]
    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> SignedDuration {
        if from == to {
            return SignedDuration::ZERO;
        }

        let time = self.times[self.index(from, to)];
        if time.is_finite() {
            SignedDuration::from_secs_f64(time)
        } else {
            SignedDuration::MAX
        }
    }

    #[inline(always)]
    pub fn travel_cost(&self, from: LocationIdx, to: LocationIdx) -> Cost {
        if from == to {
            return 0.0;
        }

        self.costs[self.index(from, to)]
    }

    pub fn is_symmetric(&self) -> bool {
        self.is_symmetric
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }
}
