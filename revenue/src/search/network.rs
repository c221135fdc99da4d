use std::collections::HashMap;

use log::debug;
use smallvec::SmallVec;

use crate::context::{RevenueBonus, RevenueContext};
use crate::network::{Vertex, VertexId};

pub type VertexIdx = usize;
pub type EdgeIdx = usize;

#[derive(Debug, Clone)]
pub struct CompiledBonus {
    pub bonus: RevenueBonus,
    pub vertices: Vec<VertexIdx>,
}

/// Dense index view of a context. Vertices are numbered in id order and
/// edges in edge id order.
#[derive(Debug, Clone)]
pub struct Network {
    pub vertices: Vec<Vertex>,
    pub adjacency: Vec<Vec<(EdgeIdx, VertexIdx)>>,
    pub greedy: Vec<bool>,
    pub tokens: Vec<VertexIdx>,
    pub visit_sets: Vec<SmallVec<[usize; 2]>>,
    pub visit_set_count: usize,
    pub bonuses: Vec<CompiledBonus>,
    index: HashMap<VertexId, VertexIdx>,
}

impl Network {
    pub fn compile(ctx :&RevenueContext) -> Network {
        let vertices = ctx.graph.vertices().cloned().collect::<Vec<_>>();
        let index = vertices.iter().enumerate()
            .map(|(i, v)| (v.id.clone(), i))
            .collect::<HashMap<_, _>>();

        let mut adjacency = vec![Vec::new(); vertices.len()];
        let mut greedy = Vec::new();
        for (_, edge) in ctx.graph.edges() {
            let (a, b) = match (index.get(&edge.a), index.get(&edge.b)) {
                (Some(a), Some(b)) => (*a, *b),
                _ => continue,
            };
            let e = greedy.len();
            greedy.push(edge.greedy);
            adjacency[a].push((e, b));
            adjacency[b].push((e, a));
        }

        let tokens = ctx.graph.tokens().filter_map(|t| index.get(t).cloned()).collect();

        let mut visit_sets = vec![SmallVec::new(); vertices.len()];
        for (s, set) in ctx.visit_sets.iter().enumerate() {
            for v in set.vertices.iter().filter_map(|v| index.get(v)) {
                visit_sets[*v].push(s);
            }
        }

        let mut bonuses = Vec::new();
        for bonus in &ctx.bonuses {
            let resolved = bonus.vertices.iter().map(|v| index.get(v).cloned())
                .collect::<Option<Vec<_>>>();
            match resolved {
                Some(vs) if !vs.is_empty() => bonuses.push(CompiledBonus { bonus: bonus.clone(), vertices: vs }),
                _ => debug!("bonus {} can never be reached, dropped", bonus.name),
            }
        }

        Network {
            vertices,
            adjacency,
            greedy,
            tokens,
            visit_sets,
            visit_set_count: ctx.visit_sets.len(),
            bonuses,
            index,
        }
    }

    pub fn index_of(&self, id :&VertexId) -> Option<VertexIdx> {
        self.index.get(id).cloned()
    }

    pub fn edge_count(&self) -> usize {
        self.greedy.len()
    }
}
