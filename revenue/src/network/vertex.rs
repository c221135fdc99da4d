use std::fmt;

use crate::input::snapshot::{Side, StopKind};

/// Map location key of a vertex. Stations are `<location>.<index>`,
/// tile sides are `<location>:<side>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub String);

impl VertexId {
    pub fn station(location :&str, index :usize) -> VertexId {
        VertexId(format!("{}.{}", location, index))
    }

    pub fn side(location :&str, side :Side) -> VertexId {
        VertexId(format!("{}:{}", location, side))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f :&mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'a> From<&'a str> for VertexId {
    fn from(s :&'a str) -> VertexId {
        VertexId(s.to_string())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VertexKind {
    Major,
    Minor,
    Side,
}

impl From<StopKind> for VertexKind {
    fn from(k :StopKind) -> VertexKind {
        match k {
            StopKind::Major => VertexKind::Major,
            StopKind::Minor => VertexKind::Minor,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub kind: VertexKind,
    pub location: String,
    pub value: i32,
    pub sink: bool,
    /// Synthesized where track runs into a hex side without track.
    pub dead_end: bool,
}

impl Vertex {
    pub fn station(location :&str, index :usize, kind :StopKind, value :i32) -> Vertex {
        Vertex {
            id: VertexId::station(location, index),
            kind: kind.into(),
            location: location.to_string(),
            value,
            sink: false,
            dead_end: false,
        }
    }

    pub fn side(location :&str, side :Side) -> Vertex {
        Vertex {
            id: VertexId::side(location, side),
            kind: VertexKind::Side,
            location: location.to_string(),
            value: 0,
            sink: false,
            dead_end: false,
        }
    }

    pub fn is_station(&self) -> bool {
        self.kind != VertexKind::Side
    }

    pub fn is_side(&self) -> bool {
        self.kind == VertexKind::Side
    }

    pub fn is_major(&self) -> bool {
        self.kind == VertexKind::Major
    }

    pub fn is_minor(&self) -> bool {
        self.kind == VertexKind::Minor
    }
}

pub type EdgeId = usize;

/// Undirected connection. Greedy edges are pass-through track (side to side
/// and across hex boundaries); non-greedy edges touch a station.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub a: VertexId,
    pub b: VertexId,
    pub greedy: bool,
    pub length: u32,
}

impl Edge {
    /// `None` for a loop.
    pub fn new(a :VertexId, b :VertexId, greedy :bool) -> Option<Edge> {
        if a == b {
            return None;
        }
        Some(Edge { a, b, greedy, length: 1 })
    }

    pub fn other(&self, v :&VertexId) -> Option<&VertexId> {
        if &self.a == v {
            Some(&self.b)
        } else if &self.b == v {
            Some(&self.a)
        } else {
            None
        }
    }

    pub fn key(&self) -> (VertexId, VertexId) {
        pair_key(&self.a, &self.b)
    }
}

pub fn pair_key(a :&VertexId, b :&VertexId) -> (VertexId, VertexId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

#[test]
fn test_vertex_ids_are_stable() {
    assert_eq!(VertexId::station("E5", 1), VertexId::from("E5.1"));
    assert_eq!(VertexId::side("E5", 3).as_str(), "E5:3");
    assert_eq!(Vertex::side("E5", 3).id, Vertex::side("E5", 3).id);
}

#[test]
fn test_edge_rejects_loop() {
    assert!(Edge::new("A.0".into(), "A.0".into(), false).is_none());
    let e = Edge::new("B:1".into(), "A.0".into(), false).unwrap();
    assert_eq!(e.other(&"A.0".into()), Some(&VertexId::from("B:1")));
    assert_eq!(e.key(), (VertexId::from("A.0"), VertexId::from("B:1")));
}
