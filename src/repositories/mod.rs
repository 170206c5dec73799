pub mod best;
pub mod records;
pub mod snapshots;
