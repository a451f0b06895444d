pub mod construct_solution;
pub mod construction_params;
