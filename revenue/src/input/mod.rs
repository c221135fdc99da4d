pub mod snapshot;
pub mod scenario;
