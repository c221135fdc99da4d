use std::num::ParseIntError;

use regex::Regex;

use crate::modifier::*;
use crate::train::{code_regex, TrainDescriptor};
use super::snapshot::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    MajorEndpoints,
    OneStopPerHex,
    DisableEmptySinks,
    Bonus { name :String, value :i32, vertices :Vec<String>, train :Option<String> },
    Connection { name :String, value :i32, from :Vec<String>, to :Vec<String> },
    NoBonus(String),
    DoubleHeading(String, String),
}

/// Everything needed for one revenue calculation, read from a file.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub map: MapSnapshot,
    pub trains: Vec<TrainSpec>,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Fail)]
pub enum ParseError {
    #[fail(display = "error in regular expression: {}", _0)]
    RegexError(String),
    #[fail(display = "line {}: no hex declared yet", _0)]
    NoHex(usize),
    #[fail(display = "line {}: error converting number", _0)]
    Number(usize),
    #[fail(display = "line {}: unknown hex {}", _0, _1)]
    UnknownHex(usize, String),
    #[fail(display = "line {}: {}", _0, _1)]
    Train(usize, String),
    #[fail(display = "line {}: unrecognized line: {}", _0, _1)]
    Unrecognized(usize, String),
}

impl Scenario {
    pub fn train_descriptors(&self) -> Vec<TrainDescriptor> {
        crate::trains_from_specs(&self.trains)
    }

    /// Rules in file order.
    pub fn modifiers(&self) -> ModifierSet {
        let mut set = ModifierSet::new();
        for rule in &self.rules {
            match rule {
                Rule::MajorEndpoints => { set.add_dynamic(MajorEndpoints); },
                Rule::OneStopPerHex => { set.add_graph(OneStopPerLocation); },
                Rule::DisableEmptySinks => { set.add_graph(DisableEmptySinks); },
                Rule::Bonus { name, value, vertices, train } => {
                    let bonus = LocationBonus::new(name, *value, &ids(vertices));
                    match train {
                        Some(t) => set.add_graph(bonus.for_train(t)),
                        None => set.add_graph(bonus),
                    };
                },
                Rule::Connection { name, value, from, to } => {
                    set.add_dynamic(ConnectionBonus::new(name, *value, &ids(from), &ids(to)));
                },
                Rule::NoBonus(train) => {
                    set.add_graph(NoBonusForTrains { trains: vec![train.clone()] });
                },
                Rule::DoubleHeading(a, b) => {
                    set.add_graph(DoubleHeading { first: a.clone(), second: b.clone() });
                },
            }
        }
        set
    }
}

fn ids(v :&[String]) -> Vec<&str> {
    v.iter().map(|s| s.as_str()).collect()
}

fn endpoint(s :&str) -> Option<Endpoint> {
    if s.starts_with('s') {
        s[1..].parse::<usize>().ok().map(Endpoint::Station)
    } else {
        s.parse::<Side>().ok().map(Endpoint::Side)
    }
}

fn list(s :&str) -> Vec<String> {
    s.split(',').filter(|x| !x.is_empty()).map(|x| x.to_string()).collect()
}

/// Parses the scenario format
///
/// * hex A1 rot 2
/// * station major 20 token
/// * track s0 3
/// * link A1 3 A2
/// * train 3+2 as green
/// * rule bonus mail 20 A1.0,C3.0 train green
///
/// Station and track lines belong to the last `hex`. `#` starts a comment.
pub fn parse_scenario(input :&str) -> Result<Scenario, ParseError> {
    let re = |s :&str| Regex::new(s).map_err(|e| ParseError::RegexError(format!("{:?}", e)));
    let hex_re = re(r"^hex\s+(?P<id>[\w\-]+)(?:\s+rot\s+(?P<rot>\d+))?$")?;
    let station_re = re(r"^station\s+(?P<kind>major|minor)\s+(?P<value>-?\d+)(?P<flags>(?:\s+(?:token|sink))*)$")?;
    let track_re = re(r"^track\s+(?P<a>s?\d+)\s+(?P<b>s?\d+)$")?;
    let link_re = re(r"^link\s+(?P<a>[\w\-]+)\s+(?P<side>\d+)\s+(?P<b>[\w\-]+)$")?;
    let train_re = re(r"^train\s+(?P<code>\S+)(?:\s+as\s+(?P<name>\S+))?$")?;
    let rule_re = re(r"(?x) ^ rule \s+ (?P<rule>[\w\-]+) (?P<args>(?:\s+\S+)*) $")?;
    let code_re = code_regex().map_err(|e| ParseError::RegexError(e.to_string()))?;

    let mut scenario = Scenario::default();
    let mut links = Vec::new();

    for (n, raw) in input.lines().enumerate() {
        let line_no = n + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let number = |_ :ParseIntError| ParseError::Number(line_no);

        if let Some(groups) = hex_re.captures(line) {
            let rotation = match groups.name("rot") {
                Some(r) => r.as_str().parse::<Side>().map_err(number)?,
                None => 0,
            };
            if rotation >= SIDES {
                return Err(ParseError::Number(line_no));
            }
            scenario.map.locations.push(MapLocation {
                id: groups["id"].to_string(),
                tile: Tile::default(),
                rotation,
                neighbors: vec![],
            });
            continue;
        }
        if let Some(groups) = station_re.captures(line) {
            let loc = scenario.map.locations.last_mut().ok_or(ParseError::NoHex(line_no))?;
            let flags = groups["flags"].split_whitespace().collect::<Vec<_>>();
            loc.tile.stations.push(Station {
                kind: if &groups["kind"] == "major" { StopKind::Major } else { StopKind::Minor },
                value: groups["value"].parse::<i32>().map_err(number)?,
                token: flags.contains(&"token"),
                sink: flags.contains(&"sink"),
            });
            continue;
        }
        if let Some(groups) = track_re.captures(line) {
            let loc = scenario.map.locations.last_mut().ok_or(ParseError::NoHex(line_no))?;
            let a = endpoint(&groups["a"]).ok_or(ParseError::Number(line_no))?;
            let b = endpoint(&groups["b"]).ok_or(ParseError::Number(line_no))?;
            loc.tile.segments.push(Segment(a, b));
            continue;
        }
        if let Some(groups) = link_re.captures(line) {
            let side = groups["side"].parse::<Side>().map_err(number)?;
            links.push((line_no, groups["a"].to_string(), side, groups["b"].to_string()));
            continue;
        }
        if let Some(groups) = train_re.captures(line) {
            let code = TrainDescriptor::parse_with(&code_re, &groups["code"])
                .map_err(|e| ParseError::Train(line_no, e.to_string()))?;
            let name = groups.name("name").map(|m| m.as_str()).unwrap_or(&groups["code"]);
            scenario.trains.push(TrainSpec {
                name: name.to_string(),
                majors: code.majors,
                minors: code.minors,
                major_multiplier: code.multiply_majors,
                minor_multiplier: code.multiply_minors,
                express: code.long_form,
            });
            continue;
        }
        if let Some(groups) = rule_re.captures(line) {
            let args = groups["args"].split_whitespace().collect::<Vec<_>>();
            let value = |s :&str| s.parse::<i32>().map_err(number);
            let rule = match (&groups["rule"], args.as_slice()) {
                ("major-endpoints", []) => Rule::MajorEndpoints,
                ("one-stop-per-hex", []) => Rule::OneStopPerHex,
                ("disable-empty-sinks", []) => Rule::DisableEmptySinks,
                ("bonus", [name, v, vertices]) => Rule::Bonus {
                    name: name.to_string(), value: value(*v)?, vertices: list(vertices), train: None,
                },
                ("bonus", [name, v, vertices, "train", train]) => Rule::Bonus {
                    name: name.to_string(), value: value(*v)?, vertices: list(vertices),
                    train: Some(train.to_string()),
                },
                ("connection", [name, v, from, to]) => Rule::Connection {
                    name: name.to_string(), value: value(*v)?, from: list(from), to: list(to),
                },
                ("no-bonus", [train]) => Rule::NoBonus(train.to_string()),
                ("double-heading", [a, b]) => Rule::DoubleHeading(a.to_string(), b.to_string()),
                _ => return Err(ParseError::Unrecognized(line_no, line.to_string())),
            };
            scenario.rules.push(rule);
            continue;
        }
        return Err(ParseError::Unrecognized(line_no, line.to_string()));
    }

    for (line_no, a, side, b) in links {
        let loc = scenario.map.locations.iter_mut().find(|l| l.id == a)
            .ok_or_else(|| ParseError::UnknownHex(line_no, a.clone()))?;
        loc.neighbors.push((side, b));
    }

    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{build_graph, VertexId};

    const TWO_HEXES :&str = "
        # two cities joined across one hex side
        hex A rot 1
        station major 20 token
        track s0 2           # rotated to side 3
        hex B
        station major 30 sink
        track 0 s0
        link A 3 B
        train 2
        train 3+1x2 as big
        rule major-endpoints
        rule bonus mail 10 A.0,B.0 train big
    ";

    #[test]
    fn test_parse_scenario() {
        let s = parse_scenario(TWO_HEXES).unwrap();
        assert_eq!(s.map.locations.len(), 2);
        let a = s.map.location("A").unwrap();
        assert_eq!(a.rotation, 1);
        assert!(a.tile.stations[0].token);
        assert_eq!(a.tile.segments, vec![Segment(Endpoint::Station(0), Endpoint::Side(2))]);
        assert_eq!(a.neighbors, vec![(3, "B".to_string())]);
        assert!(s.map.location("B").unwrap().tile.stations[0].sink);

        assert_eq!(s.trains.len(), 2);
        assert_eq!(s.trains[1].name, "big");
        assert_eq!((s.trains[1].majors, s.trains[1].minors, s.trains[1].major_multiplier), (3, 1, 2));

        assert_eq!(s.rules[0], Rule::MajorEndpoints);
        assert_eq!(s.rules[1], Rule::Bonus {
            name: "mail".to_string(),
            value: 10,
            vertices: vec!["A.0".to_string(), "B.0".to_string()],
            train: Some("big".to_string()),
        });
        assert_eq!(s.modifiers().names(), vec!["mail", "major-endpoints"]);
    }

    #[test]
    fn test_scenario_builds_graph() {
        let s = parse_scenario(TWO_HEXES).unwrap();
        let g = build_graph(&s.map).unwrap();
        let a = VertexId::station("A", 0);
        let b = VertexId::station("B", 0);
        assert!(g.edge_between(&a, &VertexId::side("A", 3)).is_some());
        assert!(g.edge_between(&VertexId::side("A", 3), &VertexId::side("B", 0)).is_some());
        assert!(g.edge_between(&VertexId::side("B", 0), &b).is_some());
        assert!(g.is_token(&a));
        assert!(g.vertex(&b).unwrap().sink);
        assert_eq!(s.train_descriptors()[1].train_ref, Some(1));
    }

    #[test]
    fn test_parse_errors() {
        match parse_scenario("station major 10") {
            Err(ParseError::NoHex(1)) => {},
            x => panic!("unexpected {:?}", x),
        }
        match parse_scenario("hex A rot 7") {
            Err(ParseError::Number(1)) => {},
            x => panic!("unexpected {:?}", x),
        }
        match parse_scenario("hex A\n\nlink B 0 A") {
            Err(ParseError::UnknownHex(3, ref id)) if id == "B" => {},
            x => panic!("unexpected {:?}", x),
        }
        match parse_scenario("train 4Q") {
            Err(ParseError::Train(1, _)) => {},
            x => panic!("unexpected {:?}", x),
        }
        match parse_scenario("rule bonus mail") {
            Err(ParseError::Unrecognized(1, _)) => {},
            x => panic!("unexpected {:?}", x),
        }
        match parse_scenario("tunnel A B") {
            Err(ParseError::Unrecognized(1, _)) => {},
            x => panic!("unexpected {:?}", x),
        }
    }
}
