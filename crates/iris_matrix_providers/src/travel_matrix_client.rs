use iris_osrm::client::{OsrmError, OsrmMatrixClient, OsrmMatrixClientParams};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    as_the_crow_flies::as_the_crow_flies_matrices, travel_matrices::TravelMatrices,
    travel_matrix_provider::TravelMatrixProvider,
};

#[derive(Debug, Error)]
pub enum MatrixProviderError {
    #[error(transparent)]
    Osrm(#[from] OsrmError),

    #[error("Matrix has {actual} entries, expected {expected} for {locations} locations")]
    DimensionMismatch {
        locations: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Default)]
pub struct TravelMatrixClient;

impl TravelMatrixClient {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip_all, level = "debug")]
    pub async fn fetch_matrix<P>(
        &self,
        points: &[P],
        provider: TravelMatrixProvider,
    ) -> Result<TravelMatrices, MatrixProviderError>
    where
        for<'a> &'a P: Into<geo_types::Point>,
    {
        let matrices = match provider {
            TravelMatrixProvider::Osrm { url, profile } => {
                let client = OsrmMatrixClient::new(OsrmMatrixClientParams {
                    osrm_url: url,
                    profile,
                });
                let matrices = client.fetch_matrix(points).await?;

                TravelMatrices {
                    times: matrices.times,
                    distances: matrices.distances,
                    costs: None,
                }
            }
            TravelMatrixProvider::AsTheCrowFlies { speed_kmh } => {
                as_the_crow_flies_matrices(points, speed_kmh)
            }
            TravelMatrixProvider::Custom { matrices } => matrices,
        };

        check_dimensions(&matrices, points.len())?;

        debug!("Fetched travel matrices for {} locations", points.len());

        Ok(matrices)
    }

    /// Encoded polyline going through `points` in order.
    /// Returns `None` when the provider has no road network to draw from.
    pub async fn fetch_route_geometry<P>(
        &self,
        points: &[P],
        provider: &TravelMatrixProvider,
    ) -> Result<Option<String>, MatrixProviderError>
    where
        for<'a> &'a P: Into<geo_types::Point>,
    {
        match provider {
            TravelMatrixProvider::Osrm { url, profile } => {
                let client = OsrmMatrixClient::new(OsrmMatrixClientParams {
                    osrm_url: url.clone(),
                    profile: profile.clone(),
                });
                let route = client.fetch_route(points).await?;
                Ok(Some(route.geometry))
            }
            TravelMatrixProvider::AsTheCrowFlies { .. } | TravelMatrixProvider::Custom { .. } => {
                Ok(None)
            }
        }
    }
}

fn check_dimensions(
    matrices: &TravelMatrices,
    locations: usize,
) -> Result<(), MatrixProviderError> {
    let expected = locations * locations;

    let sizes = [
        Some(matrices.times.len()),
        Some(matrices.distances.len()),
        matrices.costs.as_ref().map(Vec::len),
    ];

    for actual in sizes.into_iter().flatten() {
        if actual != expected {
            return Err(MatrixProviderError::DimensionMismatch {
                locations,
                expected,
                actual,
            });
        }
    }

    Ok(())
}
