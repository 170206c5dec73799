mod errors;
mod service;
mod service_builder;

pub use errors::Error;
pub use service::{RunSummary, Service, Session};
pub use service_builder::ServiceBuilder;
