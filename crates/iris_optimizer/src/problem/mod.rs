pub mod amount;
pub mod job;
pub mod location;
pub mod skill;
pub mod time_window;
pub mod travel_cost_matrix;
pub mod validation;
pub mod vehicle;
pub mod vehicle_routing_problem;
