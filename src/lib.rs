pub mod asset_version;
pub mod config;
pub mod error;
pub mod finite_state;
pub mod logging;
pub mod outputs;
pub mod platform;
pub mod workflow;
