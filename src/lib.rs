pub mod bootstrap;
pub mod config;
pub mod console;
pub mod models;
pub mod repositories;
pub mod services;

pub use bootstrap::bootstrap_tuner;
pub use services::tuning::Service;
