use serde::{Deserialize, Serialize};

/// TravelMatrices holds the travel distance, time, and cost matrices.
/// Stored as flat vectors, `index = from * num_locations + to`.
///
/// Unreachable pairs are stored as `f64::INFINITY`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TravelMatrices {
    pub distances: Vec<f64>,
    pub times: Vec<f64>,

    // Some providers don't give use a cost
    pub costs: Option<Vec<f64>>,
}

impl TravelMatrices {
    pub fn from_rows(
        times: Vec<Vec<f64>>,
        distances: Option<Vec<Vec<f64>>>,
        costs: Option<Vec<Vec<f64>>>,
    ) -> Self {
        let len = times.iter().map(Vec::len).sum();
        TravelMatrices {
            times: times.into_iter().flatten().collect(),
            distances: distances
                .map(|rows| rows.into_iter().flatten().collect())
                .unwrap_or_else(|| vec![0.0; len]),
            costs: costs.map(|rows| rows.into_iter().flatten().collect()),
        }
    }

    pub fn num_locations(&self) -> usize {
        self.times.len().isqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_defaults_distances() {
        let matrices = TravelMatrices::from_rows(vec![vec![0.0, 5.0], vec![6.0, 0.0]], None, None);

        assert_eq!(matrices.num_locations(), 2);
        assert_eq!(matrices.times, vec![0.0, 5.0, 6.0, 0.0]);
        assert_eq!(matrices.distances, vec![0.0; 4]);
        assert!(matrices.costs.is_none());
    }
}
