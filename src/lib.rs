pub mod audit;
pub mod cli;
pub mod config;
pub mod contact;
pub mod dashboard;
pub mod donations;
pub mod error;
pub mod forum;
pub mod portal;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod timer;
pub mod utils;
