pub mod run;
pub mod json;

pub use self::run::{RevenueResult, TrainRun, NO_RUN_MESSAGE};
