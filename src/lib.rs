pub mod config;
pub mod plugin;
pub mod resource;
pub mod utils;
