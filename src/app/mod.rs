// HTTP surface over the registry, prediction service and retrain worker.

pub mod routes;

pub use routes::{router, AppState};
