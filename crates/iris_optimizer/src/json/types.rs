use serde::{Deserialize, Serialize};

use crate::problem::{location::Location, vehicle_routing_problem::VehicleRoutingProblem};

pub trait FromProblem<T> {
    fn from_problem(value: T, problem: &VehicleRoutingProblem) -> Self;
}

/// `[lon, lat]` pair, as found in the input and output documents.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct JsonCoordinates(pub [f64; 2]);

impl JsonCoordinates {
    pub fn lon(&self) -> f64 {
        self.0[0]
    }

    pub fn lat(&self) -> f64 {
        self.0[1]
    }

    /// Bit pattern of the coordinates, two identical coordinates share the same key.
    pub(crate) fn key(&self) -> [u64; 2] {
        [self.0[0].to_bits(), self.0[1].to_bits()]
    }
}

impl From<&JsonCoordinates> for geo_types::Point {
    fn from(value: &JsonCoordinates) -> Self {
        geo_types::Point::new(value.lon(), value.lat())
    }
}

impl From<&JsonCoordinates> for Location {
    fn from(value: &JsonCoordinates) -> Self {
        Location::from_lon_lat(value.lon(), value.lat())
    }
}

impl TryFrom<&Location> for JsonCoordinates {
    type Error = ();

    fn try_from(value: &Location) -> Result<Self, Self::Error> {
        value.coordinates().map(JsonCoordinates).ok_or(())
    }
}

/// Status codes shared by the success and error documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum JsonStatusCode {
    Ok = 0,
    Internal = 1,
    Input = 2,
    Routing = 3,
}

impl JsonStatusCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Document written instead of a solution when the run fails.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JsonError {
    pub code: i32,
    pub error: String,
}

impl JsonError {
    pub fn new(code: i32, error: impl Into<String>) -> Self {
        JsonError {
            code,
            error: error.into(),
        }
    }
}
