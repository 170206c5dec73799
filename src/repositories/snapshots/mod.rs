mod errors;
mod models;
mod repository;

pub use errors::Error;
pub use models::SnapshotRecord;
pub use repository::Repository;
