pub mod crash;
pub mod paths;
