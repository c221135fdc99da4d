use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;

use super::vertex::*;

#[derive(Debug, Clone, PartialEq, Fail)]
pub enum GraphError {
    #[fail(display = "unknown location {} referenced from {}", _1, _0)]
    UnknownLocation(String, String),
    #[fail(display = "location {} is defined more than once", _0)]
    DuplicateLocation(String),
    #[fail(display = "segment {} of {} has identical end points", _1, _0)]
    DegenerateSegment(String, usize),
    #[fail(display = "segment {} of {} refers to missing station {}", _1, _0, _2)]
    UnknownStation(String, usize, usize),
    #[fail(display = "invalid side {} on {}", _1, _0)]
    InvalidSide(String, u8),
    #[fail(display = "unknown vertex {}", _0)]
    UnknownVertex(String),
    #[fail(display = "edge would connect {} to itself", _0)]
    LoopEdge(String),
}

/// Simple undirected graph over an arena of vertices keyed by id.
/// Iteration order is by id, which keeps everything built on top of it
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: BTreeMap<VertexId, Vertex>,
    edges: BTreeMap<EdgeId, Edge>,
    adjacency: BTreeMap<VertexId, BTreeSet<EdgeId>>,
    pairs: HashMap<(VertexId, VertexId), EdgeId>,
    tokens: BTreeSet<VertexId>,
    protected: BTreeSet<VertexId>,
    next_edge: EdgeId,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ReductionStats {
    pub hermits: usize,
    pub dead_ends: usize,
    pub merged: usize,
    pub chains: usize,
}

impl ReductionStats {
    pub fn changed(&self) -> bool {
        self.hermits + self.dead_ends + self.merged + self.chains > 0
    }
}

impl Graph {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns false if a vertex with the same id already exists, in which
    /// case the existing vertex is kept.
    pub fn add_vertex(&mut self, v :Vertex) -> bool {
        if self.vertices.contains_key(&v.id) {
            return false;
        }
        self.adjacency.insert(v.id.clone(), BTreeSet::new());
        self.vertices.insert(v.id.clone(), v);
        true
    }

    pub fn contains(&self, id :&VertexId) -> bool {
        self.vertices.contains_key(id)
    }

    pub fn vertex(&self, id :&VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn vertex_mut(&mut self, id :&VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge(&self, id :EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().map(|(id, e)| (*id, e))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges_of<'a>(&'a self, v :&VertexId) -> impl Iterator<Item = (EdgeId, &'a Edge)> + 'a {
        let edges = &self.edges;
        self.adjacency.get(v).into_iter()
            .flat_map(move |set| set.iter().filter_map(move |id| edges.get(id).map(|e| (*id, e))))
    }

    pub fn degree(&self, v :&VertexId) -> usize {
        self.adjacency.get(v).map(|s| s.len()).unwrap_or(0)
    }

    pub fn edge_between(&self, a :&VertexId, b :&VertexId) -> Option<EdgeId> {
        self.pairs.get(&pair_key(a, b)).cloned()
    }

    /// Connects two existing vertices. Connecting an already connected pair
    /// returns the existing edge, so the graph never has parallel edges.
    pub fn add_edge(&mut self, a :&VertexId, b :&VertexId, greedy :bool) -> Result<EdgeId, GraphError> {
        for v in &[a, b] {
            if !self.vertices.contains_key(*v) {
                return Err(GraphError::UnknownVertex(v.to_string()));
            }
        }
        let edge = Edge::new(a.clone(), b.clone(), greedy)
            .ok_or_else(|| GraphError::LoopEdge(a.to_string()))?;
        if let Some(existing) = self.pairs.get(&edge.key()) {
            return Ok(*existing);
        }
        Ok(self.insert_edge(edge))
    }

    fn insert_edge(&mut self, edge :Edge) -> EdgeId {
        let id = self.next_edge;
        self.next_edge += 1;
        self.pairs.insert(edge.key(), id);
        for v in &[&edge.a, &edge.b] {
            self.adjacency.entry((*v).clone()).or_insert_with(BTreeSet::new).insert(id);
        }
        self.edges.insert(id, edge);
        id
    }

    pub fn remove_edge(&mut self, id :EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(&id)?;
        self.pairs.remove(&edge.key());
        for v in &[&edge.a, &edge.b] {
            if let Some(set) = self.adjacency.get_mut(*v) {
                set.remove(&id);
            }
        }
        Some(edge)
    }

    /// Removes a vertex together with its edges.
    pub fn remove_vertex(&mut self, id :&VertexId) -> Option<Vertex> {
        let incident = self.adjacency.remove(id).unwrap_or_default();
        for e in incident {
            self.remove_edge(e);
        }
        self.tokens.remove(id);
        self.protected.remove(id);
        self.vertices.remove(id)
    }

    /// Marks a station where the operating company may start its runs.
    pub fn add_token(&mut self, id :&VertexId) {
        self.tokens.insert(id.clone());
        self.protected.insert(id.clone());
    }

    pub fn tokens(&self) -> impl Iterator<Item = &VertexId> {
        self.tokens.iter()
    }

    pub fn is_token(&self, id :&VertexId) -> bool {
        self.tokens.contains(id)
    }

    pub fn protect(&mut self, id :&VertexId) {
        if self.vertices.contains_key(id) {
            self.protected.insert(id.clone());
        }
    }

    pub fn is_protected(&self, id :&VertexId) -> bool {
        self.protected.contains(id)
    }

    /// Track ends that lead nowhere: synthesized dead ends and side
    /// vertices with at most one edge.
    pub fn loose_ends(&self) -> Vec<VertexId> {
        self.vertices.values()
            .filter(|v| v.dead_end || (v.is_side() && self.degree(&v.id) <= 1))
            .map(|v| v.id.clone())
            .collect()
    }

    /// Removes vertices that cannot take part in any run and compresses
    /// pass-through sides. Station and protected vertices are kept.
    pub fn optimize(&mut self) -> ReductionStats {
        let mut stats = ReductionStats::default();
        loop {
            let mut changed = false;
            let ids = self.vertices.keys().cloned().collect::<Vec<_>>();
            for id in ids {
                let is_side = match self.vertices.get(&id) {
                    Some(v) => v.is_side(),
                    None => continue,
                };
                if !is_side || self.protected.contains(&id) {
                    continue;
                }

                let incident = self.adjacency.get(&id)
                    .map(|s| s.iter().cloned().collect::<Vec<_>>())
                    .unwrap_or_default();
                match incident.len() {
                    0 => {
                        self.remove_vertex(&id);
                        stats.hermits += 1;
                        changed = true;
                    },
                    1 => {
                        self.remove_vertex(&id);
                        stats.dead_ends += 1;
                        changed = true;
                    },
                    2 => {
                        let (e1, e2) = match (self.edges.get(&incident[0]), self.edges.get(&incident[1])) {
                            (Some(e1), Some(e2)) => (e1.clone(), e2.clone()),
                            _ => continue,
                        };
                        if e1.greedy && e2.greedy {
                            if self.merge_through(&id, &e1, &e2) {
                                stats.merged += 1;
                                changed = true;
                            }
                        } else if !e1.greedy && !e2.greedy {
                            self.remove_vertex(&id);
                            stats.chains += 1;
                            changed = true;
                        }
                    },
                    _ => {},
                }
            }
            if !changed {
                break;
            }
        }
        debug!("graph reduction: {:?}, {} vertices and {} edges left",
               stats, self.vertices.len(), self.edges.len());
        stats
    }

    fn merge_through(&mut self, id :&VertexId, e1 :&Edge, e2 :&Edge) -> bool {
        let (x, y) = match (e1.other(id), e2.other(id)) {
            (Some(x), Some(y)) => (x.clone(), y.clone()),
            _ => return false,
        };
        // A parallel edge would be lost, keep the side instead.
        if x == y || self.pairs.contains_key(&pair_key(&x, &y)) {
            return false;
        }
        self.remove_vertex(id);
        self.insert_edge(Edge { a: x, b: y, greedy: true, length: e1.length + e2.length });
        true
    }
}

#[cfg(test)]
fn station(loc :&str) -> Vertex {
    Vertex::station(loc, 0, crate::input::snapshot::StopKind::Major, 10)
}

#[test]
fn test_add_edge_deduplicates() {
    let mut g = Graph::new();
    g.add_vertex(station("A"));
    g.add_vertex(Vertex::side("A", 0));
    let a = VertexId::station("A", 0);
    let s = VertexId::side("A", 0);
    let e1 = g.add_edge(&a, &s, false).unwrap();
    let e2 = g.add_edge(&s, &a, false).unwrap();
    assert_eq!(e1, e2);
    assert_eq!(g.edge_count(), 1);
    assert_eq!(g.add_edge(&a, &a, false), Err(GraphError::LoopEdge("A.0".to_string())));
    assert!(g.add_edge(&a, &"X.0".into(), false).is_err());
}

#[test]
fn test_optimize_merges_greedy_chain() {
    // A.0 -ng- A:0 =g= B:3 =g= B:0 =g= C:3 -ng- C.0, plus a lone side
    let mut g = Graph::new();
    g.add_vertex(station("A"));
    g.add_vertex(station("C"));
    for (loc, side) in &[("A", 0), ("B", 3), ("B", 0), ("C", 3), ("X", 1)] {
        g.add_vertex(Vertex::side(loc, *side));
    }
    g.add_edge(&"A.0".into(), &"A:0".into(), false).unwrap();
    g.add_edge(&"A:0".into(), &"B:3".into(), true).unwrap();
    g.add_edge(&"B:3".into(), &"B:0".into(), true).unwrap();
    g.add_edge(&"B:0".into(), &"C:3".into(), true).unwrap();
    g.add_edge(&"C:3".into(), &"C.0".into(), false).unwrap();

    let stats = g.optimize();
    assert_eq!(stats.hermits, 1);
    assert_eq!(stats.merged, 2);
    assert_eq!(g.vertex_count(), 4);
    assert!(!g.contains(&"B:0".into()) && !g.contains(&"B:3".into()));
    let through = g.edge_between(&"A:0".into(), &"C:3".into()).unwrap();
    let through = g.edge(through).unwrap();
    assert!(through.greedy);
    assert_eq!(through.length, 3);

    // the sides next to stations have mixed edges, nothing left to merge
    assert!(!g.optimize().changed());
}

#[test]
fn test_optimize_removes_reversing_side() {
    // two station spurs meeting on a side without a neighbour
    let mut g = Graph::new();
    g.add_vertex(station("A"));
    g.add_vertex(Vertex::station("A", 1, crate::input::snapshot::StopKind::Minor, 10));
    g.add_vertex(Vertex::side("A", 2));
    g.add_edge(&"A.0".into(), &"A:2".into(), false).unwrap();
    g.add_edge(&"A.1".into(), &"A:2".into(), false).unwrap();
    let stats = g.optimize();
    assert_eq!(stats.chains, 1);
    assert_eq!(g.vertex_count(), 2);
    assert_eq!(g.edge_count(), 0);
}
