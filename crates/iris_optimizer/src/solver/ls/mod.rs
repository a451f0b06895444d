pub mod inter_or_opt;
pub mod inter_relocate;
pub mod inter_swap;
pub mod local_search;
pub mod r#move;
pub mod neighborhood;
pub mod or_opt;
pub mod relocate;
pub mod swap;
pub mod two_opt;
