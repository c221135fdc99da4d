//! Abstract track network derived from the tile map.

pub mod vertex;
pub mod graph;
pub mod builder;

pub use self::builder::{build_graph, build_graph_with};
pub use self::graph::{Graph, GraphError, ReductionStats};
pub use self::vertex::{Edge, EdgeId, Vertex, VertexId, VertexKind};
