//! Route search. One call takes a snapshot of the graph and the trains,
//! builds a private working copy, runs the modifiers and the
//! branch-and-bound, and projects the winner into a `RevenueResult`.

pub mod budget;
pub mod network;
pub mod candidates;
pub mod optimizer;
pub mod worker;

use std::time::Duration;

use log::{debug, info};

use crate::context::RevenueContext;
use crate::modifier::{ActiveModifier, ModifierSet};
use crate::network::Graph;
use crate::output::RevenueResult;
use crate::train::TrainDescriptor;

pub use self::budget::{Budget, CancelToken};
pub use self::candidates::{Run, RunView};
pub use self::network::Network;
pub use self::optimizer::{Optimizer, SearchStats, Solution};
pub use self::worker::{spawn_calculation, Calculation};

#[derive(Debug, Clone)]
pub struct Config {
    /// Run the graph reduction on the working copy before searching.
    pub optimize_graph: bool,
    /// Wall clock limit for one calculation.
    pub time_budget: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            optimize_graph: true,
            time_budget: None,
        }
    }
}

pub fn compute_best_routes(graph :&Graph, trains :&[TrainDescriptor], modifiers :&ModifierSet,
                           config :&Config) -> RevenueResult {
    let budget = Budget::new(CancelToken::new(), config.time_budget);
    compute_with_budget(graph, trains, modifiers, config, &budget)
}

pub fn compute_with_budget(graph :&Graph, trains :&[TrainDescriptor], modifiers :&ModifierSet,
                           config :&Config, budget :&Budget) -> RevenueResult {
    let mut ctx = RevenueContext::new(graph.clone(), trains.to_vec());
    for m in modifiers.graph_modifiers() {
        debug!("applying {}", m.name());
        m.modify_context(&mut ctx);
    }

    if config.optimize_graph {
        ctx.protect_referenced();
        let stats = ctx.graph.optimize();
        debug!("reduced graph to {} vertices, {} edges ({:?})",
               ctx.graph.vertex_count(), ctx.graph.edge_count(), stats);
    }

    let active = modifiers.dynamic_modifiers()
        .filter_map(|m| {
            let prepared = m.prepare(&ctx);
            debug!("{} {}", m.name(), if prepared.is_some() { "active" } else { "inactive" });
            prepared
        })
        .collect::<Vec<Box<dyn ActiveModifier>>>();

    let net = Network::compile(&ctx);
    info!("searching {} trains on {} vertices, {} edges",
          ctx.trains.len(), net.vertices.len(), net.edge_count());

    let solution = Optimizer::new(&net, &ctx.trains, &active, budget).solve();
    RevenueResult::from_solution(&net, &ctx.trains, &active, solution)
}
