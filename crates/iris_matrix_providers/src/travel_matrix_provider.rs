use serde::{Deserialize, Serialize};

use crate::travel_matrices::TravelMatrices;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub enum TravelMatrixProvider {
    /// http://project-osrm.org/docs/v5.24.0/api/#table-service
    Osrm {
        url: String,
        profile: String,
    },
    AsTheCrowFlies {
        speed_kmh: f64,
    },

    Custom {
        matrices: TravelMatrices,
    },
}

impl TravelMatrixProvider {
    pub fn supports_geometry(&self) -> bool {
        matches!(self, TravelMatrixProvider::Osrm { .. })
    }
}
