//! Title specific rules, plugged into graph building and the search.
//!
//! Two contracts exist. A [`GraphModifier`] rewrites the working copy once,
//! before the search. A [`DynamicModifier`] decides per calculation whether
//! it takes part; if so it hands back an [`ActiveModifier`] that owns all
//! state for that calculation and is consulted for every candidate
//! assignment. The search never knows which rules it is running.

pub mod rules;
pub mod dynamic;

use crate::context::RevenueContext;
use crate::network::Graph;
use crate::output::TrainRun;
use crate::search::RunView;

pub use self::dynamic::{ConnectionBonus, MajorEndpoints};
pub use self::rules::{DisableEmptySinks, DoubleHeading, LocationBonus, NoBonusForTrains, OneStopPerLocation};

pub trait GraphModifier: Send + Sync {
    fn name(&self) -> &str;

    /// Applied by the graph builder right after construction.
    fn modify_graph(&self, _graph :&mut Graph) {}

    /// Applied to the working copy of a calculation before the search.
    fn modify_context(&self, _ctx :&mut RevenueContext) {}
}

pub trait DynamicModifier: Send + Sync {
    fn name(&self) -> &str;

    /// `None` if the rule does not apply to this calculation.
    fn prepare(&self, ctx :&RevenueContext) -> Option<Box<dyn ActiveModifier>>;
}

pub trait ActiveModifier: Send {
    /// Largest total adjustment `evaluate` can return for any assignment.
    fn predicted_upper_bound(&self) -> i32 {
        0
    }

    /// A rejected run earns nothing, and no modifier sees it in
    /// `evaluate`. Must depend on the run alone, not on the train
    /// running it.
    fn rejects(&self, _run :&RunView) -> bool {
        false
    }

    /// Additive correction of an assignment's value, given the runs no
    /// modifier rejects. Must not depend on anything but its arguments and
    /// the state built in `prepare`.
    fn evaluate(&self, _runs :&[RunView], _is_final :bool) -> i32 {
        0
    }

    /// Rewrites the accepted runs for presentation. Runs rejected during
    /// the search arrive with `valid` cleared.
    fn adjust_final(&self, _runs :&mut [TrainRun]) {}

    fn explain(&self, _runs :&[TrainRun]) -> Option<String> {
        None
    }
}

/// Rules registered for a game session, in registration order.
#[derive(Default)]
pub struct ModifierSet {
    graph: Vec<Box<dyn GraphModifier>>,
    dynamic: Vec<Box<dyn DynamicModifier>>,
}

impl ModifierSet {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_graph<M: GraphModifier + 'static>(&mut self, m :M) -> &mut Self {
        self.graph.push(Box::new(m));
        self
    }

    pub fn add_dynamic<M: DynamicModifier + 'static>(&mut self, m :M) -> &mut Self {
        self.dynamic.push(Box::new(m));
        self
    }

    pub fn graph_modifiers(&self) -> impl Iterator<Item = &dyn GraphModifier> {
        self.graph.iter().map(|m| m.as_ref())
    }

    pub fn dynamic_modifiers(&self) -> impl Iterator<Item = &dyn DynamicModifier> {
        self.dynamic.iter().map(|m| m.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty() && self.dynamic.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.graph.iter().map(|m| m.name())
            .chain(self.dynamic.iter().map(|m| m.name()))
            .collect()
    }
}

impl std::fmt::Debug for ModifierSet {
    fn fmt(&self, f :&mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ModifierSet {:?}", self.names())
    }
}
