pub mod guards;
pub mod paths;
