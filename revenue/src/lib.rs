extern crate smallvec;
extern crate regex;
extern crate failure;
#[macro_use] extern crate failure_derive;
#[macro_use] extern crate serde_json;

pub mod input;
pub mod network;
pub mod train;
pub mod context;
pub mod modifier;
pub mod search;
pub mod output;

#[cfg(test)]
mod tests;

pub use crate::network::{build_graph, build_graph_with, Graph};
pub use crate::output::{RevenueResult, TrainRun};
pub use crate::search::{compute_best_routes, compute_with_budget, spawn_calculation, Config};
pub use crate::train::TrainDescriptor;

use std::path::Path;

use crate::input::scenario::{parse_scenario, Scenario};
use crate::input::snapshot::TrainSpec;

pub type AppResult<T> = Result<T, failure::Error>;

pub fn read_file(f :&Path) -> AppResult<String> {
  use std::fs::File;
  use std::io::prelude::*;
  use std::io::BufReader;

  let file = File::open(f)?;
  let mut file = BufReader::new(&file);
  let mut contents = String::new();
  file.read_to_string(&mut contents)?;
  Ok(contents)
}

pub fn get_scenario(s :&Path) -> AppResult<Scenario> {
    let contents = read_file(s)?;
    let scenario = parse_scenario(&contents)?;
    Ok(scenario)
}

/// Descriptors for the company's trains, each pointing back at its
/// position in `trains`.
pub fn trains_from_specs(trains :&[TrainSpec]) -> Vec<TrainDescriptor> {
    trains.iter().enumerate().map(|(i, t)| TrainDescriptor::from_train(t, i)).collect()
}
