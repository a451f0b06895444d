use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

define_index_newtype!(LocationIdx, Location);

/// A row/column of the travel matrices, with its coordinates when they are known.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    coordinates: Option<[f64; 2]>,
}

impl Location {
    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        Location {
            coordinates: Some([lon, lat]),
        }
    }

    pub fn unknown() -> Self {
        Location { coordinates: None }
    }

    pub fn coordinates(&self) -> Option<[f64; 2]> {
        self.coordinates
    }

    pub fn point(&self) -> Option<geo_types::Point> {
        self.coordinates
            .map(|[lon, lat]| geo_types::Point::new(lon, lat))
    }
}
