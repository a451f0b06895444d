use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OsrmError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OSRM error: {code} - {message}")]
    Api { code: String, message: String },

    #[error("Incomplete response")]
    IncompleteResponse,

    #[error("At least {expected} locations are required, got {actual}")]
    NotEnoughLocations { expected: usize, actual: usize },
}

pub struct OsrmMatrices {
    /// Travel times in seconds, `f64::INFINITY` when OSRM could not find a route
    pub times: Vec<f64>,

    /// Distances in meters, `f64::INFINITY` when OSRM could not find a route
    pub distances: Vec<f64>,
}

pub struct OsrmRoute {
    /// Encoded polyline (precision 5)
    pub geometry: String,
    pub distance: f64,
    pub duration: f64,
}

#[derive(Deserialize)]
struct TableResponse {
    code: String,
    message: Option<String>,
    durations: Option<Vec<Vec<Option<f64>>>>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Deserialize)]
struct RouteResponse {
    code: String,
    message: Option<String>,
    routes: Option<Vec<RouteResponseRoute>>,
}

#[derive(Deserialize)]
struct RouteResponseRoute {
    geometry: String,
    distance: f64,
    duration: f64,
}

pub struct OsrmMatrixClientParams {
    /// Base url of the OSRM server, e.g. `http://0.0.0.0:5000`
    pub osrm_url: String,
    pub profile: String,
}

pub const OSRM_TABLE_API_PATH: &str = "/table/v1/";
pub const OSRM_ROUTE_API_PATH: &str = "/route/v1/";

pub struct OsrmMatrixClient {
    params: OsrmMatrixClientParams,
    client: reqwest::Client,
}

impl OsrmMatrixClient {
    pub fn new(params: OsrmMatrixClientParams) -> Self {
        Self {
            params,
            client: reqwest::Client::new(),
        }
    }

    fn build_url<P>(&self, path: &str, points: &[P]) -> String
    where
        for<'a> &'a P: Into<geo_types::Point>,
    {
        let mut url = self.params.osrm_url.trim_end_matches('/').to_owned();
        url.push_str(path);
        url.push_str(&self.params.profile);
        url.push('/');
        url.push_str(&format_coordinates(points));
        url
    }

    pub async fn fetch_matrix<P>(&self, points: &[P]) -> Result<OsrmMatrices, OsrmError>
    where
        for<'a> &'a P: Into<geo_types::Point>,
    {
        if points.is_empty() {
            return Err(OsrmError::NotEnoughLocations {
                expected: 1,
                actual: 0,
            });
        }

        let url = self.build_url(OSRM_TABLE_API_PATH, points);

        debug!("OSRM: requesting table for {} locations", points.len());

        let response: TableResponse = self
            .client
            .get(url)
            .query(&[("annotations", "duration,distance")])
            .send()
            .await?
            .json()
            .await?;

        if response.code != "Ok" {
            return Err(OsrmError::Api {
                code: response.code,
                message: response.message.unwrap_or_default(),
            });
        }

        let durations = response.durations.ok_or(OsrmError::IncompleteResponse)?;
        let distances = response.distances.ok_or(OsrmError::IncompleteResponse)?;

        if durations.len() != points.len() || distances.len() != points.len() {
            return Err(OsrmError::IncompleteResponse);
        }

        Ok(OsrmMatrices {
            times: flatten_table(durations),
            distances: flatten_table(distances),
        })
    }

    pub async fn fetch_route<P>(&self, points: &[P]) -> Result<OsrmRoute, OsrmError>
    where
        for<'a> &'a P: Into<geo_types::Point>,
    {
        if points.len() < 2 {
            return Err(OsrmError::NotEnoughLocations {
                expected: 2,
                actual: points.len(),
            });
        }

        let url = self.build_url(OSRM_ROUTE_API_PATH, points);

        let response: RouteResponse = self
            .client
            .get(url)
            .query(&[
                ("overview", "full"),
                ("geometries", "polyline"),
                ("steps", "false"),
            ])
            .send()
            .await?
            .json()
            .await?;

        if response.code != "Ok" {
            return Err(OsrmError::Api {
                code: response.code,
                message: response.message.unwrap_or_default(),
            });
        }

        let route = response
            .routes
            .and_then(|routes| routes.into_iter().next())
            .ok_or(OsrmError::IncompleteResponse)?;

        Ok(OsrmRoute {
            geometry: route.geometry,
            distance: route.distance,
            duration: route.duration,
        })
    }
}

fn format_coordinates<P>(points: &[P]) -> String
where
    for<'a> &'a P: Into<geo_types::Point>,
{
    points
        .iter()
        .map(|point| {
            let point: geo_types::Point = point.into();
            format!("{},{}", point.x(), point.y())
        })
        .collect::<Vec<_>>()
        .join(";")
}

// Unreachable pairs come back as `null`
fn flatten_table(table: Vec<Vec<Option<f64>>>) -> Vec<f64> {
    table
        .into_iter()
        .flatten()
        .map(|value| value.unwrap_or(f64::INFINITY))
        .collect()
}
