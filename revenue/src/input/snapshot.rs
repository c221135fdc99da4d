//! Read-only snapshot of the map and the operating company's trains,
//! as handed over by the host game for one revenue calculation.

pub type LocationId = String;
pub type Side = u8;

pub const SIDES: Side = 6;

#[derive(Debug, Clone, Default)]
pub struct MapSnapshot {
    pub locations: Vec<MapLocation>,
}

#[derive(Debug, Clone)]
pub struct MapLocation {
    pub id: LocationId,
    pub tile: Tile,
    pub rotation: Side,
    /// Hex sides facing another location. The neighbour is entered on the
    /// opposite side.
    pub neighbors: Vec<(Side, LocationId)>,
}

#[derive(Debug, Clone, Default)]
pub struct Tile {
    pub stations: Vec<Station>,
    pub segments: Vec<Segment>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopKind {
    Major,
    Minor,
}

#[derive(Debug, Clone)]
pub struct Station {
    pub kind: StopKind,
    pub value: i32,
    /// The operating company has a token here.
    pub token: bool,
    /// Runs may end here but not pass through.
    pub sink: bool,
}

/// Track end point in unrotated tile coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Side(Side),
    Station(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Segment(pub Endpoint, pub Endpoint);

/// Native train attributes as kept by the company bookkeeping.
#[derive(Debug, Clone)]
pub struct TrainSpec {
    pub name: String,
    pub majors: u32,
    pub minors: u32,
    pub major_multiplier: i32,
    pub minor_multiplier: i32,
    pub express: bool,
}

impl TrainSpec {
    pub fn plain(name :&str, majors :u32) -> TrainSpec {
        TrainSpec {
            name: name.to_string(),
            majors,
            minors: 0,
            major_multiplier: 1,
            minor_multiplier: 1,
            express: false,
        }
    }
}

impl MapSnapshot {
    pub fn location(&self, id :&str) -> Option<&MapLocation> {
        self.locations.iter().find(|l| l.id == id)
    }
}

pub fn opposite(side :Side) -> Side {
    (side % SIDES + SIDES / 2) % SIDES
}

pub fn rotate(side :Side, rotation :Side) -> Side {
    (side % SIDES + rotation % SIDES) % SIDES
}
