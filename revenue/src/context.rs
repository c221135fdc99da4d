use std::collections::BTreeSet;

use crate::network::{Graph, VertexId};
use crate::train::TrainDescriptor;

/// Value added once to every run that visits all of `vertices`.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueBonus {
    pub name: String,
    pub value: i32,
    pub vertices: BTreeSet<VertexId>,
    /// Only trains with this name qualify.
    pub train: Option<String>,
}

impl RevenueBonus {
    pub fn new(name :&str, value :i32, vertices :BTreeSet<VertexId>) -> RevenueBonus {
        RevenueBonus { name: name.to_string(), value, vertices, train: None }
    }

    pub fn applies_to(&self, train :&TrainDescriptor) -> bool {
        !train.ignore_bonuses && self.train.as_ref().map(|n| n == &train.name).unwrap_or(true)
    }
}

/// A single run may visit at most one of these vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitSet {
    pub vertices: BTreeSet<VertexId>,
}

/// Working copy for one calculation. Everything in here is private to the
/// calculation; modifiers may rewrite it before the search starts.
#[derive(Debug, Clone, Default)]
pub struct RevenueContext {
    pub graph: Graph,
    pub trains: Vec<TrainDescriptor>,
    pub bonuses: Vec<RevenueBonus>,
    pub visit_sets: Vec<VisitSet>,
}

impl RevenueContext {
    pub fn new(graph :Graph, trains :Vec<TrainDescriptor>) -> RevenueContext {
        RevenueContext { graph, trains, bonuses: vec![], visit_sets: vec![] }
    }

    /// Keeps vertices that bonuses and visit sets refer to out of the
    /// graph reduction.
    pub fn protect_referenced(&mut self) {
        let referenced = self.bonuses.iter().flat_map(|b| b.vertices.iter())
            .chain(self.visit_sets.iter().flat_map(|s| s.vertices.iter()))
            .cloned()
            .collect::<Vec<_>>();
        for v in &referenced {
            self.graph.protect(v);
        }
    }
}
