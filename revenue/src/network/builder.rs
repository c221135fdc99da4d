use std::collections::{BTreeSet, HashMap};

use log::{debug, trace};

use crate::input::snapshot::*;
use crate::modifier::ModifierSet;
use super::graph::{Graph, GraphError};
use super::vertex::*;

/// Converts the tile layout of every map location into a graph.
/// Any inconsistency in the snapshot aborts the build.
pub fn build_graph(map :&MapSnapshot) -> Result<Graph, GraphError> {
    let mut graph = Graph::new();

    let mut index = HashMap::new();
    for loc in &map.locations {
        if index.insert(loc.id.as_str(), loc).is_some() {
            return Err(GraphError::DuplicateLocation(loc.id.clone()));
        }
    }

    // Stations, sides with track and the tile's own segments.
    for loc in &map.locations {
        add_tile(&mut graph, loc)?;
    }

    // Connections across hex boundaries.
    let mut seen = BTreeSet::new();
    for loc in &map.locations {
        for (side, neighbor_id) in &loc.neighbors {
            if *side >= SIDES {
                return Err(GraphError::InvalidSide(loc.id.clone(), *side));
            }
            let neighbor = index.get(neighbor_id.as_str())
                .ok_or_else(|| GraphError::UnknownLocation(loc.id.clone(), neighbor_id.clone()))?;
            let here = VertexId::side(&loc.id, *side);
            let there = VertexId::side(&neighbor.id, opposite(*side));
            if !seen.insert(pair_key(&here, &there)) {
                continue;
            }
            connect(&mut graph, (&loc.id, *side), (&neighbor.id, opposite(*side)))?;
        }
    }

    debug!("built graph with {} vertices and {} edges", graph.vertex_count(), graph.edge_count());
    Ok(graph)
}

/// Builds the graph and lets the registered graph modifiers rewrite it.
pub fn build_graph_with(map :&MapSnapshot, modifiers :&ModifierSet) -> Result<Graph, GraphError> {
    let mut graph = build_graph(map)?;
    for m in modifiers.graph_modifiers() {
        trace!("applying graph modifier {}", m.name());
        m.modify_graph(&mut graph);
    }
    Ok(graph)
}

fn resolve(loc :&MapLocation, segment :usize, end :Endpoint) -> Result<Vertex, GraphError> {
    match end {
        Endpoint::Station(i) => {
            let st = loc.tile.stations.get(i)
                .ok_or_else(|| GraphError::UnknownStation(loc.id.clone(), segment, i))?;
            Ok(Vertex::station(&loc.id, i, st.kind, st.value))
        },
        Endpoint::Side(s) => {
            if s >= SIDES {
                return Err(GraphError::InvalidSide(loc.id.clone(), s));
            }
            Ok(Vertex::side(&loc.id, rotate(s, loc.rotation)))
        },
    }
}

fn add_tile(graph :&mut Graph, loc :&MapLocation) -> Result<(), GraphError> {
    for (i, st) in loc.tile.stations.iter().enumerate() {
        let mut v = Vertex::station(&loc.id, i, st.kind, st.value);
        v.sink = st.sink;
        let id = v.id.clone();
        graph.add_vertex(v);
        if st.token {
            graph.add_token(&id);
        }
    }

    for (i, Segment(a, b)) in loc.tile.segments.iter().enumerate() {
        let va = resolve(loc, i, *a)?;
        let vb = resolve(loc, i, *b)?;
        if va.id == vb.id {
            return Err(GraphError::DegenerateSegment(loc.id.clone(), i));
        }
        let greedy = va.is_side() && vb.is_side();
        let (ida, idb) = (va.id.clone(), vb.id.clone());
        graph.add_vertex(va);
        graph.add_vertex(vb);
        graph.add_edge(&ida, &idb, greedy)?;
    }
    Ok(())
}

fn connect(graph :&mut Graph, a :(&str, Side), b :(&str, Side)) -> Result<(), GraphError> {
    let ida = VertexId::side(a.0, a.1);
    let idb = VertexId::side(b.0, b.1);
    match (graph.contains(&ida), graph.contains(&idb)) {
        (true, true) => {},
        (true, false) => dead_end(graph, b.0, b.1),
        (false, true) => dead_end(graph, a.0, a.1),
        (false, false) => return Ok(()),
    }
    graph.add_edge(&ida, &idb, true)?;
    Ok(())
}

fn dead_end(graph :&mut Graph, location :&str, side :Side) {
    let mut v = Vertex::side(location, side);
    v.dead_end = true;
    trace!("track ends at {}", v.id);
    graph.add_vertex(v);
}
