mod errors;
mod repository;

pub use errors::Error;
pub use repository::Repository;
