use geo::{Distance, Haversine};

use crate::travel_matrices::TravelMatrices;

/// Great-circle distances between every pair of points, times derived from a constant speed.
/// Times and distances are rounded to whole seconds and meters.
pub fn as_the_crow_flies_matrices<P>(points: &[P], speed_kmh: f64) -> TravelMatrices
where
    for<'a> &'a P: Into<geo_types::Point>,
{
    let points: Vec<geo_types::Point> = points.iter().map(|point| point.into()).collect();
    let num_locations = points.len();
    let speed = speed_kmh / 3.6;

    let mut distances = vec![0.0; num_locations * num_locations];
    let mut times = vec![0.0; num_locations * num_locations];

    for (i, &from) in points.iter().enumerate() {
        for (j, &to) in points.iter().enumerate() {
            if i == j {
                continue;
            }

            let distance = Haversine.distance(from, to);
            distances[i * num_locations + j] = distance.round();
            times[i * num_locations + j] = (distance / speed).round();
        }
    }

    TravelMatrices {
        distances,
        times,
        costs: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LonLat(f64, f64);

    impl From<&LonLat> for geo_types::Point {
        fn from(value: &LonLat) -> Self {
            geo_types::Point::new(value.0, value.1)
        }
    }

    #[test]
    fn test_as_the_crow_flies_is_symmetric() {
        let points = vec![LonLat(2.3522, 48.8566), LonLat(4.8357, 45.7640)];

        let matrices = as_the_crow_flies_matrices(&points, 90.0);

        assert_eq!(matrices.distances[0], 0.0);
        assert_eq!(matrices.distances[1], matrices.distances[2]);
        // Paris - Lyon is roughly 392km
        assert!((matrices.distances[1] - 392_000.0).abs() < 2_000.0);
        assert_eq!(matrices.times[1], (matrices.distances[1] / 25.0).round());
    }

    #[test]
    fn test_as_the_crow_flies_matches_haversine() {
        let points = vec![LonLat(0.0, 0.0), LonLat(1.0, 0.0), LonLat(0.0, 1.0)];

        let matrices = as_the_crow_flies_matrices(&points, 36.0);

        // One degree along the equator and along a meridian, mean earth radius
        let degree = (6_371_008.8 * std::f64::consts::PI / 180.0).round();
        assert_eq!(matrices.distances[1], degree);
        assert_eq!(matrices.distances[2], degree);
        assert_eq!(matrices.distances[3], degree);
        assert_eq!(matrices.times[1], (degree / 10.0).round());
    }
}
