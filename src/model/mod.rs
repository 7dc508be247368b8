pub mod paths;
pub mod registry;
