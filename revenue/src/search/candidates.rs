//! Enumeration of every run a single train could make on its own.
//!
//! Runs are grown from the company's tokens: first all arms (simple walks
//! that end at a station) leaving a token, then every pair of disjoint arms
//! is joined at the token. A run therefore always contains a token.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::network::Vertex;
use crate::train::TrainDescriptor;
use super::budget::{Budget, Ticker};
use super::network::{EdgeIdx, Network, VertexIdx};

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub path: Vec<VertexIdx>,
    pub edges: SmallVec<[EdgeIdx; 8]>,
    pub value: i32,
}

/// A candidate run as handed to dynamic modifiers.
#[derive(Clone, Copy)]
pub struct RunView<'a> {
    network: &'a Network,
    train: &'a TrainDescriptor,
    run: &'a Run,
}

impl<'a> RunView<'a> {
    pub fn new(network :&'a Network, train :&'a TrainDescriptor, run :&'a Run) -> RunView<'a> {
        RunView { network, train, run }
    }

    pub fn train(&self) -> &'a TrainDescriptor {
        self.train
    }

    pub fn value(&self) -> i32 {
        self.run.value
    }

    pub fn vertices(&self) -> impl Iterator<Item = &'a Vertex> + 'a {
        let network = self.network;
        self.run.path.iter().map(move |v| &network.vertices[*v])
    }

    pub fn stops(&self) -> impl Iterator<Item = &'a Vertex> + 'a {
        self.vertices().filter(|v| v.is_station())
    }

    pub fn first(&self) -> Option<&'a Vertex> {
        self.run.path.first().map(|v| &self.network.vertices[*v])
    }

    pub fn last(&self) -> Option<&'a Vertex> {
        self.run.path.last().map(|v| &self.network.vertices[*v])
    }
}

#[derive(Debug, Clone, Default)]
struct Arm {
    vertices: Vec<VertexIdx>,
    edges: SmallVec<[EdgeIdx; 8]>,
    visits: SmallVec<[usize; 4]>,
    majors: u32,
    minors: u32,
}

fn stop_counts(v :&Vertex) -> (u32, u32) {
    (v.is_major() as u32, v.is_minor() as u32)
}

struct Walk<'a, 'b> {
    net: &'a Network,
    train: &'a TrainDescriptor,
    ticker: &'b mut Ticker,
    start: VertexIdx,
    on_path: Vec<bool>,
    visit_used: Vec<bool>,
    current: Arm,
    arms: Vec<Arm>,
}

impl<'a, 'b> Walk<'a, 'b> {
    fn arms(net :&'a Network, train :&'a TrainDescriptor, ticker :&'b mut Ticker,
            start :VertexIdx) -> Vec<Arm> {
        let mut walk = Walk {
            net,
            train,
            ticker,
            start,
            on_path: vec![false; net.vertices.len()],
            visit_used: vec![false; net.visit_set_count],
            current: Arm::default(),
            arms: vec![Arm::default()],
        };
        walk.on_path[start] = true;
        for s in &net.visit_sets[start] {
            walk.visit_used[*s] = true;
        }
        walk.extend(start, None);
        walk.arms
    }

    fn extend(&mut self, v :VertexIdx, via :Option<EdgeIdx>) {
        if self.ticker.tick() {
            return;
        }
        let net = self.net;
        let at_side = net.vertices[v].is_side();
        let (start_majors, start_minors) = stop_counts(&net.vertices[self.start]);

        for &(e, w) in &net.adjacency[v] {
            if self.on_path[w] {
                continue;
            }
            // no reversing on a hex edge between two station spurs
            if at_side {
                if let Some(incoming) = via {
                    if !net.greedy[incoming] && !net.greedy[e] {
                        continue;
                    }
                }
            }
            if net.visit_sets[w].iter().any(|s| self.visit_used[*s]) {
                continue;
            }
            let target = &net.vertices[w];
            let (dm, dn) = stop_counts(target);
            let (majors, minors) = (self.current.majors + dm, self.current.minors + dn);
            if !self.train.fits(start_majors + majors, start_minors + minors) {
                continue;
            }

            self.on_path[w] = true;
            for s in &net.visit_sets[w] {
                self.visit_used[*s] = true;
            }
            self.current.vertices.push(w);
            self.current.edges.push(e);
            let saved = (self.current.majors, self.current.minors);
            self.current.majors = majors;
            self.current.minors = minors;

            if target.is_station() {
                let mut arm = self.current.clone();
                arm.visits = arm.vertices.iter()
                    .flat_map(|x| net.visit_sets[*x].iter().cloned())
                    .collect();
                self.arms.push(arm);
            }
            if !(target.is_station() && target.sink) {
                self.extend(w, Some(e));
            }

            self.current.majors = saved.0;
            self.current.minors = saved.1;
            self.current.vertices.pop();
            self.current.edges.pop();
            for s in &net.visit_sets[w] {
                self.visit_used[*s] = false;
            }
            self.on_path[w] = false;
        }
    }
}

/// All distinct runs of `train`, best first. Runs of equal value keep the
/// order in which they were found. The flag is false if the budget ran out
/// first; the runs found up to then are still returned, and every arm found
/// is at least used as a run ending at its token.
pub fn enumerate_runs(net :&Network, train :&TrainDescriptor, budget :&Budget) -> (Vec<Run>, bool) {
    let mut ticker = Ticker::new(budget, 256);
    let mut seen :HashSet<SmallVec<[EdgeIdx; 8]>> = HashSet::new();
    let mut runs = Vec::new();

    let mut vertex_mark = vec![0usize; net.vertices.len()];
    let mut edge_mark = vec![0usize; net.edge_count()];
    let mut visit_mark = vec![0usize; net.visit_set_count];
    let mut stamp = 0usize;

    for &start in &net.tokens {
        let arms = Walk::arms(net, train, &mut ticker, start);
        let start_vertex = &net.vertices[start];
        let (start_majors, start_minors) = stop_counts(start_vertex);

        for (i, a) in arms.iter().enumerate() {
            if i > 0 && ticker.stopped() {
                break;
            }
            stamp += 1;
            for v in &a.vertices { vertex_mark[*v] = stamp; }
            for e in &a.edges { edge_mark[*e] = stamp; }
            for s in &a.visits { visit_mark[*s] = stamp; }

            for b in arms.iter().skip(i + 1) {
                // pairs with the empty arm are always taken
                if ticker.tick() && i > 0 {
                    break;
                }
                if start_vertex.sink && !a.vertices.is_empty() {
                    break;
                }
                if b.vertices.iter().any(|v| vertex_mark[*v] == stamp)
                    || b.edges.iter().any(|e| edge_mark[*e] == stamp)
                    || b.visits.iter().any(|s| visit_mark[*s] == stamp) {
                    continue;
                }
                if !train.fits(start_majors + a.majors + b.majors, start_minors + a.minors + b.minors) {
                    continue;
                }

                let path = a.vertices.iter().rev().cloned()
                    .chain(Some(start))
                    .chain(b.vertices.iter().cloned())
                    .collect::<Vec<_>>();
                if train.long_form {
                    let ends_major = |v :Option<&VertexIdx>| v.map(|v| net.vertices[*v].is_major()).unwrap_or(false);
                    if !ends_major(path.first()) || !ends_major(path.last()) {
                        continue;
                    }
                }

                let mut key = a.edges.iter().chain(b.edges.iter()).cloned().collect::<SmallVec<[EdgeIdx; 8]>>();
                key.sort();
                if !seen.insert(key) {
                    continue;
                }

                let value = run_value(net, train, &path);
                let edges = a.edges.iter().rev().chain(b.edges.iter()).cloned().collect();
                runs.push(Run { path, edges, value });
            }
        }
        if ticker.stopped() {
            break;
        }
    }

    runs.sort_by(|x, y| y.value.cmp(&x.value));
    (runs, !ticker.stopped())
}

/// Stop values plus every bonus the run collects.
pub fn run_value(net :&Network, train :&TrainDescriptor, path :&[VertexIdx]) -> i32 {
    let stops :i32 = path.iter().map(|v| train.stop_value(&net.vertices[*v])).sum();
    let bonuses :i32 = net.bonuses.iter()
        .filter(|b| b.bonus.applies_to(train))
        .filter(|b| b.vertices.iter().all(|v| path.contains(v)))
        .map(|b| b.bonus.value)
        .sum();
    stops + bonuses
}
