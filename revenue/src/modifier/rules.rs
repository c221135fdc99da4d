use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::context::{RevenueBonus, RevenueContext, VisitSet};
use crate::network::{Graph, VertexId};
use super::GraphModifier;

/// Off-board areas that are worth nothing in the current phase are closed.
#[derive(Debug, Clone, Default)]
pub struct DisableEmptySinks;

impl GraphModifier for DisableEmptySinks {
    fn name(&self) -> &str {
        "disable-empty-sinks"
    }

    fn modify_graph(&self, graph :&mut Graph) {
        let closed = graph.vertices()
            .filter(|v| v.is_station() && v.sink && v.value == 0 && !graph.is_protected(&v.id))
            .map(|v| v.id.clone())
            .collect::<Vec<_>>();
        for id in closed {
            debug!("closing {}", id);
            graph.remove_vertex(&id);
        }
    }
}

/// A run may visit only one station of a location.
#[derive(Debug, Clone, Default)]
pub struct OneStopPerLocation;

impl GraphModifier for OneStopPerLocation {
    fn name(&self) -> &str {
        "one-stop-per-hex"
    }

    fn modify_context(&self, ctx :&mut RevenueContext) {
        let mut by_location :BTreeMap<&str, BTreeSet<VertexId>> = BTreeMap::new();
        for v in ctx.graph.vertices().filter(|v| v.is_station()) {
            by_location.entry(v.location.as_str()).or_insert_with(BTreeSet::new).insert(v.id.clone());
        }
        for (_, vertices) in by_location.into_iter().filter(|(_, vs)| vs.len() > 1) {
            let set = VisitSet { vertices };
            if !ctx.visit_sets.contains(&set) {
                ctx.visit_sets.push(set);
            }
        }
    }
}

/// Bonus for running through a set of locations, usually granted by a
/// private company or a special property.
#[derive(Debug, Clone)]
pub struct LocationBonus {
    pub bonus: RevenueBonus,
}

impl LocationBonus {
    pub fn new(name :&str, value :i32, vertices :&[&str]) -> LocationBonus {
        LocationBonus {
            bonus: RevenueBonus::new(name, value, vertices.iter().map(|v| VertexId::from(*v)).collect()),
        }
    }

    pub fn for_train(mut self, train :&str) -> LocationBonus {
        self.bonus.train = Some(train.to_string());
        self
    }
}

impl GraphModifier for LocationBonus {
    fn name(&self) -> &str {
        &self.bonus.name
    }

    fn modify_context(&self, ctx :&mut RevenueContext) {
        if ctx.bonuses.iter().any(|b| b == &self.bonus) {
            return;
        }
        ctx.bonuses.push(self.bonus.clone());
    }
}

/// Trains of these names never collect bonuses.
#[derive(Debug, Clone)]
pub struct NoBonusForTrains {
    pub trains: Vec<String>,
}

impl GraphModifier for NoBonusForTrains {
    fn name(&self) -> &str {
        "no-bonus"
    }

    fn modify_context(&self, ctx :&mut RevenueContext) {
        for t in ctx.trains.iter_mut().filter(|t| self.trains.contains(&t.name)) {
            t.ignore_bonuses = true;
        }
    }
}

/// Two trains coupled into one, running as the sum of both.
#[derive(Debug, Clone)]
pub struct DoubleHeading {
    pub first: String,
    pub second: String,
}

impl GraphModifier for DoubleHeading {
    fn name(&self) -> &str {
        "double-heading"
    }

    fn modify_context(&self, ctx :&mut RevenueContext) {
        let first = ctx.trains.iter().position(|t| t.name == self.first);
        let second = ctx.trains.iter().enumerate()
            .position(|(i, t)| t.name == self.second && Some(i) != first);
        let (first, second) = match (first, second) {
            (Some(a), Some(b)) => (a, b),
            _ => return,
        };
        let composite = ctx.trains[first].couple(&ctx.trains[second]);
        debug!("coupling {} and {} into {}", self.first, self.second, composite.name);
        let (hi, lo) = if first > second { (first, second) } else { (second, first) };
        ctx.trains.remove(hi);
        ctx.trains.remove(lo);
        ctx.trains.push(composite);
    }
}
