//! Branch-and-bound over trains.
//!
//! Trains are visited strongest first. Every train either takes one of its
//! candidate runs that shares no edge with the runs already chosen, or
//! stays idle. A branch is cut as soon as its optimistic value (chosen
//! runs + the best run of every remaining train + the modifiers' upper
//! bounds) cannot beat the best complete assignment found so far. Only a
//! strictly better assignment replaces the incumbent, so among equal
//! assignments the first one in search order wins.
//!
//! A train left idle while a weaker train it dominates still has to be
//! placed makes that weaker train idle too: swapping the weaker train's run
//! over to the stronger one is never worse, and that assignment is searched
//! anyway.

use std::rc::Rc;

use log::{debug, trace};

use crate::modifier::ActiveModifier;
use crate::train::{strength_order, TrainDescriptor};
use super::budget::{Budget, Ticker};
use super::candidates::{enumerate_runs, Run, RunView};
use super::network::Network;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub candidates: usize,
    pub nodes: u64,
}

#[derive(Debug, Clone)]
pub struct Solution {
    /// One entry per train, in train order.
    pub assignment: Vec<Option<Run>>,
    /// Per train, whether a modifier rejected the assigned run.
    pub rejected: Vec<bool>,
    pub total: i32,
    pub optimal: bool,
    pub stats: SearchStats,
}

/// Search state for one calculation.
///
/// No two trains of an assignment share an edge, greedy or not. Stations
/// may be visited by several trains.
pub struct Optimizer<'a> {
    net: &'a Network,
    trains: &'a [TrainDescriptor],
    modifiers: &'a [Box<dyn ActiveModifier>],
    order: Vec<usize>,
    candidates: Vec<Rc<Vec<Run>>>,
    rejected: Vec<Rc<Vec<bool>>>,
    shares_previous: Vec<bool>,
    /// Earlier positions whose train dominates the train at this position.
    dominators: Vec<Vec<usize>>,
    suffix: Vec<i32>,
    modifier_bound: i32,
    ticker: Ticker,
    used: Vec<bool>,
    chosen: Vec<Option<usize>>,
    best: Option<(i32, Vec<Option<usize>>)>,
    complete: bool,
    stats: SearchStats,
}

impl<'a> Optimizer<'a> {
    pub fn new(net :&'a Network, trains :&'a [TrainDescriptor],
               modifiers :&'a [Box<dyn ActiveModifier>], budget :&Budget) -> Optimizer<'a> {
        let mut order = (0..trains.len()).collect::<Vec<_>>();
        order.sort_by(|a, b| strength_order(&trains[*a], &trains[*b]).then(a.cmp(b)));

        let mut candidates :Vec<Rc<Vec<Run>>> = Vec::new();
        let mut rejected :Vec<Rc<Vec<bool>>> = Vec::new();
        let mut complete = true;
        let mut stats = SearchStats::default();
        for (pos, t) in order.iter().enumerate() {
            let shared = order[..pos].iter().position(|o| trains[*o].same_capacity(&trains[*t]));
            match shared {
                Some(p) => {
                    candidates.push(candidates[p].clone());
                    rejected.push(rejected[p].clone());
                },
                None => {
                    let (runs, finished) = enumerate_runs(net, &trains[*t], budget);
                    debug!("train {}: {} candidate runs{}", trains[*t].name, runs.len(),
                           if finished { "" } else { " (cut short)" });
                    complete &= finished;
                    stats.candidates += runs.len();
                    let flags = runs.iter()
                        .map(|r| {
                            let view = RunView::new(net, &trains[*t], r);
                            modifiers.iter().any(|m| m.rejects(&view))
                        })
                        .collect();
                    candidates.push(Rc::new(runs));
                    rejected.push(Rc::new(flags));
                },
            }
        }

        let shares_previous = (0..order.len())
            .map(|p| p > 0 && trains[order[p]].same_capacity(&trains[order[p - 1]]))
            .collect();

        let dominators :Vec<Vec<usize>> = (0..order.len())
            .map(|p| {
                let weaker = &trains[order[p]];
                (0..p).filter(|q| {
                    let stronger = &trains[order[*q]];
                    stronger.dominates(weaker)
                        && net.bonuses.iter().all(|b| !b.bonus.applies_to(weaker) || b.bonus.applies_to(stronger))
                }).collect::<Vec<_>>()
            })
            .collect();

        let mut suffix = vec![0; order.len() + 1];
        for p in (0..order.len()).rev() {
            let best = candidates[p].iter().zip(rejected[p].iter())
                .find(|(_, rejected)| !**rejected)
                .map(|(r, _)| r.value.max(0))
                .unwrap_or(0);
            suffix[p] = suffix[p + 1] + best;
        }

        let modifier_bound = modifiers.iter().map(|m| m.predicted_upper_bound()).sum();

        Optimizer {
            net,
            trains,
            modifiers,
            chosen: vec![None; order.len()],
            order,
            candidates,
            rejected,
            shares_previous,
            dominators,
            suffix,
            modifier_bound,
            ticker: Ticker::new(budget, 256),
            used: vec![false; net.edge_count()],
            best: None,
            complete,
            stats,
        }
    }

    /// Best assignment found. Not `optimal` if the budget ran out during
    /// enumeration or search; the first descent always completes, so even
    /// then every train gets its best run that fits.
    pub fn solve(mut self) -> Solution {
        self.search(0, 0);
        let optimal = self.complete && !self.ticker.stopped();

        let chosen = self.best.take().map(|(_, c)| c).unwrap_or_else(|| vec![None; self.order.len()]);
        let mut assignment = vec![None; self.trains.len()];
        let mut rejected = vec![false; self.trains.len()];
        for (pos, k) in chosen.iter().enumerate() {
            if let Some(k) = k {
                assignment[self.order[pos]] = Some(self.candidates[pos][*k].clone());
                rejected[self.order[pos]] = self.rejected[pos][*k];
            }
        }

        let raw :i32 = assignment.iter().zip(rejected.iter())
            .filter(|(_, rejected)| !**rejected)
            .filter_map(|(r, _)| r.as_ref().map(|r| r.value))
            .sum();
        let total = raw + self.final_adjustment(&assignment, &rejected);
        debug!("search finished after {} nodes, total {}{}", self.stats.nodes, total,
               if optimal { "" } else { " (cancelled)" });

        Solution { assignment, rejected, total, optimal, stats: self.stats }
    }

    fn final_adjustment(&self, assignment :&[Option<Run>], rejected :&[bool]) -> i32 {
        let views = assignment.iter().enumerate()
            .filter(|(i, _)| !rejected[*i])
            .filter_map(|(i, r)| r.as_ref().map(|r| RunView::new(self.net, &self.trains[i], r)))
            .collect::<Vec<_>>();
        self.modifiers.iter().map(|m| {
            let adjustment = m.evaluate(&views, true);
            debug_assert_eq!(adjustment, m.evaluate(&views, true),
                             "modifier evaluation must not depend on earlier calls");
            adjustment
        }).sum()
    }

    fn search(&mut self, pos :usize, value :i32) {
        self.stats.nodes += 1;
        // the first descent runs to a leaf whatever the budget says
        if self.ticker.tick() && self.best.is_some() {
            return;
        }
        if pos == self.order.len() {
            self.leaf(value);
            return;
        }

        let rest = self.suffix[pos + 1] + self.modifier_bound;
        let runs = self.candidates[pos].clone();
        let rejected = self.rejected[pos].clone();
        let (first, mut may_run) = if self.shares_previous[pos] {
            match self.chosen[pos - 1] {
                Some(k) => (k + 1, true),
                None => (0, false),
            }
        } else {
            (0, true)
        };
        if self.dominators[pos].iter().any(|p| self.chosen[*p].is_none()) {
            may_run = false;
        }

        if may_run {
            for (k, run) in runs.iter().enumerate().skip(first) {
                if self.cannot_improve(value + run.value + rest) {
                    break;
                }
                if run.edges.iter().any(|e| self.used[*e]) {
                    continue;
                }
                let gain = if rejected[k] { 0 } else { run.value };
                for e in &run.edges {
                    self.used[*e] = true;
                }
                self.chosen[pos] = Some(k);
                self.search(pos + 1, value + gain);
                self.chosen[pos] = None;
                for e in &run.edges {
                    self.used[*e] = false;
                }
                if self.ticker.stopped() && self.best.is_some() {
                    return;
                }
            }
        }

        if self.cannot_improve(value + rest) {
            return;
        }
        self.search(pos + 1, value);
    }

    fn cannot_improve(&self, bound :i32) -> bool {
        match self.best {
            Some((best, _)) => bound <= best,
            None => false,
        }
    }

    fn leaf(&mut self, value :i32) {
        let adjustment :i32 = {
            let views = self.chosen.iter().enumerate()
                .filter_map(|(pos, k)| k.filter(|k| !self.rejected[pos][*k]).map(|k| RunView::new(
                    self.net, &self.trains[self.order[pos]], &self.candidates[pos][k])))
                .collect::<Vec<_>>();
            self.modifiers.iter().map(|m| m.evaluate(&views, false)).sum()
        };
        let total = value + adjustment;
        if !self.cannot_improve(total) {
            trace!("new best assignment {:?} = {}", self.chosen, total);
            self.best = Some((total, self.chosen.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RevenueContext;
    use crate::input::snapshot::StopKind::Major;
    use crate::network::{Graph, Vertex, VertexId};

    /// Keeps every branch open.
    struct Loose;

    impl ActiveModifier for Loose {
        fn predicted_upper_bound(&self) -> i32 {
            1000
        }
    }

    fn fork() -> Network {
        let mut g = Graph::new();
        g.add_vertex(Vertex::station("T", 0, Major, 10));
        g.add_vertex(Vertex::station("X", 0, Major, 50));
        g.add_vertex(Vertex::station("Y", 0, Major, 10));
        g.add_edge(&VertexId::from("T.0"), &VertexId::from("X.0"), false).unwrap();
        g.add_edge(&VertexId::from("T.0"), &VertexId::from("Y.0"), false).unwrap();
        g.add_token(&VertexId::from("T.0"));
        Network::compile(&RevenueContext::new(g, vec![]))
    }

    #[test]
    fn test_dominated_train_idles_after_stronger_one() {
        let net = fork();
        let trains = vec![TrainDescriptor::parse("3").unwrap(), TrainDescriptor::parse("2").unwrap()];
        let modifiers :Vec<Box<dyn ActiveModifier>> = vec![Box::new(Loose)];
        let budget = Budget::unlimited();

        let pruned = Optimizer::new(&net, &trains, &modifiers, &budget);
        let expected :Vec<Vec<usize>> = vec![vec![], vec![0]];
        assert_eq!(pruned.dominators, expected);
        let pruned = pruned.solve();

        let mut plain = Optimizer::new(&net, &trains, &modifiers, &budget);
        for d in plain.dominators.iter_mut() {
            d.clear();
        }
        let plain = plain.solve();

        assert_eq!(pruned.total, 80);
        assert_eq!(plain.total, 80);
        assert_eq!(pruned.assignment, plain.assignment);
        assert!(pruned.optimal && plain.optimal);
        assert!(pruned.stats.nodes < plain.stats.nodes,
                "{} nodes with domination, {} without", pruned.stats.nodes, plain.stats.nodes);
    }

    #[test]
    fn test_rejected_runs_earn_nothing() {
        struct NoY;
        impl ActiveModifier for NoY {
            fn rejects(&self, run :&RunView) -> bool {
                run.vertices().any(|v| v.id.as_str() == "Y.0")
            }
            fn evaluate(&self, runs :&[RunView], _is_final :bool) -> i32 {
                assert!(runs.iter().all(|r| !self.rejects(r)));
                0
            }
        }
        let net = fork();
        let trains = vec![TrainDescriptor::parse("3").unwrap(), TrainDescriptor::parse("2").unwrap()];
        let modifiers :Vec<Box<dyn ActiveModifier>> = vec![Box::new(NoY)];
        let solution = Optimizer::new(&net, &trains, &modifiers, &Budget::unlimited()).solve();
        assert_eq!(solution.total, 60);
        let values = solution.assignment.iter().zip(solution.rejected.iter())
            .filter(|(_, rejected)| !**rejected)
            .filter_map(|(r, _)| r.as_ref().map(|r| r.value))
            .collect::<Vec<_>>();
        assert_eq!(values, vec![60]);
    }
}
