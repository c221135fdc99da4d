use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use maplit::*;

use crate::*;
use crate::input::scenario::parse_scenario;
use crate::input::snapshot::StopKind::{self, Major, Minor};
use crate::input::snapshot::TrainSpec;
use crate::modifier::*;
use crate::network::{Vertex, VertexId};
use crate::output::NO_RUN_MESSAGE;
use crate::search::{Budget, CancelToken};

fn graph(stations :HashMap<&str, (StopKind, i32)>, edges :&[(&str, &str)], tokens :&[&str]) -> Graph {
    let mut g = Graph::new();
    for (id, (kind, value)) in stations {
        let mut parts = id.splitn(2, '.');
        let loc = parts.next().unwrap();
        let index = parts.next().unwrap().parse::<usize>().unwrap();
        g.add_vertex(Vertex::station(loc, index, kind, value));
    }
    for (a, b) in edges {
        g.add_edge(&VertexId::from(*a), &VertexId::from(*b), false).unwrap();
    }
    for t in tokens {
        g.add_token(&VertexId::from(*t));
    }
    g
}

/// `n` by `n` majors worth 10 each, token in the corner `N0.0`.
fn grid(n :usize) -> Graph {
    let mut g = Graph::new();
    let id = |r :usize, c :usize| VertexId::station(&format!("N{}", r * n + c), 0);
    for i in 0..n * n {
        g.add_vertex(Vertex::station(&format!("N{}", i), 0, Major, 10));
    }
    for r in 0..n {
        for c in 0..n {
            if c + 1 < n {
                g.add_edge(&id(r, c), &id(r, c + 1), false).unwrap();
            }
            if r + 1 < n {
                g.add_edge(&id(r, c), &id(r + 1, c), false).unwrap();
            }
        }
    }
    g.add_token(&id(0, 0));
    g
}

fn trains(codes :&[&str]) -> Vec<TrainDescriptor> {
    codes.iter().map(|c| TrainDescriptor::parse(c).unwrap()).collect()
}

fn stops(run :&TrainRun) -> Vec<&str> {
    run.stops.iter().map(|s| s.as_str()).collect()
}

fn solve(g :&Graph, trains :&[TrainDescriptor], modifiers :&ModifierSet) -> RevenueResult {
    compute_best_routes(g, trains, modifiers, &Config::default())
}

const FOUR_HEXES :&str = "
    hex A
    station major 20 token
    track s0 0
    track s0 3
    hex B
    track 3 0
    hex C
    station major 30
    track 3 s0
    hex D
    station minor 10
    track 0 s0
    track s0 2
    link A 0 B
    link B 0 C
    link A 3 D
    train 3
    train 2
";

#[test]
fn test_best_run_on_three_station_line() {
    let g = graph(hashmap!{ "A.0" => (Major, 10), "B.0" => (Major, 20), "C.0" => (Major, 30) },
                  &[("A.0", "B.0"), ("B.0", "C.0")], &["B.0"]);
    let result = solve(&g, &trains(&["2"]), &ModifierSet::new());
    assert_eq!(result.total, 50);
    assert!(result.optimal);
    assert_eq!(stops(&result.runs[0]), vec!["B.0", "C.0"]);
    assert_eq!(format!("{}", result), "2: B.0 - C.0 = 50\ntotal: 50");
}

#[test]
fn test_no_trains_no_runs() {
    let g = graph(hashmap!{ "A.0" => (Major, 10), "B.0" => (Major, 20) }, &[("A.0", "B.0")], &["A.0"]);
    let result = solve(&g, &[], &ModifierSet::new());
    assert_eq!(result.total, 0);
    assert!(result.runs.is_empty());
    assert!(result.explanation.is_empty());
}

#[test]
fn test_trains_never_share_an_edge() {
    let g = graph(hashmap!{ "T.0" => (Major, 10), "A.0" => (Major, 40) }, &[("T.0", "A.0")], &["T.0"]);
    let result = solve(&g, &trains(&["2", "2"]), &ModifierSet::new());
    assert_eq!(result.total, 50);
    assert_eq!(result.runs.len(), 2);
    assert_eq!(result.runs.iter().filter(|r| !r.is_empty()).count(), 1);
    assert_eq!(stops(&result.runs[0]), vec!["T.0", "A.0"]);
    assert_eq!(format!("{}", result.runs[1]), "2: idle");
}

#[test]
fn test_major_endpoints_change_the_optimum() {
    let g = graph(hashmap!{ "T.0" => (Major, 10), "M.0" => (Minor, 50), "C.0" => (Major, 20) },
                  &[("T.0", "M.0"), ("T.0", "C.0")], &["T.0"]);
    let free = solve(&g, &trains(&["2"]), &ModifierSet::new());
    assert_eq!(free.total, 60);
    assert_eq!(stops(&free.runs[0]), vec!["T.0", "M.0"]);

    let mut rules = ModifierSet::new();
    rules.add_dynamic(MajorEndpoints);
    let strict = solve(&g, &trains(&["2"]), &rules);
    assert_eq!(strict.total, 30);
    assert_eq!(stops(&strict.runs[0]), vec!["T.0", "C.0"]);
    assert!(strict.runs[0].valid);
}

#[test]
fn test_major_endpoints_without_valid_run() {
    let g = graph(hashmap!{ "T.0" => (Major, 10), "M.0" => (Minor, 50) }, &[("T.0", "M.0")], &["T.0"]);
    let mut rules = ModifierSet::new();
    rules.add_dynamic(MajorEndpoints);
    let result = solve(&g, &trains(&["2"]), &rules);
    assert_eq!(result.total, 0);
    assert!(result.runs[0].is_empty());
    assert!(result.explanation.iter().any(|l| l == NO_RUN_MESSAGE));
}

#[test]
fn test_one_stop_per_location() {
    let g = graph(hashmap!{ "T.0" => (Major, 10), "H.0" => (Major, 30), "H.1" => (Major, 40) },
                  &[("T.0", "H.0"), ("T.0", "H.1")], &["T.0"]);
    assert_eq!(solve(&g, &trains(&["3"]), &ModifierSet::new()).total, 80);

    let mut rules = ModifierSet::new();
    rules.add_graph(OneStopPerLocation);
    let result = solve(&g, &trains(&["3"]), &rules);
    assert_eq!(result.total, 50);
    assert_eq!(stops(&result.runs[0]), vec!["T.0", "H.1"]);
}

#[test]
fn test_visit_sets_bind_each_run_not_each_train() {
    let g = graph(hashmap!{ "T.0" => (Major, 10), "H.0" => (Major, 30), "H.1" => (Major, 40) },
                  &[("T.0", "H.0"), ("T.0", "H.1")], &["T.0"]);
    let mut rules = ModifierSet::new();
    rules.add_graph(OneStopPerLocation);
    let result = solve(&g, &trains(&["3", "2"]), &rules);
    assert_eq!(result.total, 90);
    assert_eq!(stops(&result.runs[0]), vec!["T.0", "H.1"]);
    assert_eq!(stops(&result.runs[1]), vec!["T.0", "H.0"]);
}

#[test]
fn test_long_form_runs_end_at_majors() {
    let g = graph(hashmap!{ "T.0" => (Major, 10), "M.0" => (Minor, 50), "C.0" => (Major, 20) },
                  &[("T.0", "M.0"), ("T.0", "C.0")], &["T.0"]);
    let local = solve(&g, &trains(&["5"]), &ModifierSet::new());
    assert_eq!(local.total, 80);
    assert_eq!(stops(&local.runs[0]), vec!["M.0", "T.0", "C.0"]);

    let express = solve(&g, &trains(&["5E"]), &ModifierSet::new());
    assert_eq!(express.total, 30);
    assert_eq!(stops(&express.runs[0]), vec!["T.0", "C.0"]);
}

#[test]
fn test_minor_stops_take_major_slots_in_search() {
    let g = graph(hashmap!{ "T.0" => (Major, 10), "P.0" => (Minor, 20), "Q.0" => (Minor, 30), "C.0" => (Major, 40) },
                  &[("T.0", "P.0"), ("P.0", "Q.0"), ("Q.0", "C.0")], &["T.0"]);
    let result = solve(&g, &trains(&["2+1"]), &ModifierSet::new());
    assert_eq!(result.total, 60);
    assert_eq!(stops(&result.runs[0]), vec!["T.0", "P.0", "Q.0"]);

    let result = solve(&g, &trains(&["2+2"]), &ModifierSet::new());
    assert_eq!(result.total, 100);

    let result = solve(&g, &trains(&["2"]), &ModifierSet::new());
    assert_eq!(result.total, 30);
    assert_eq!(stops(&result.runs[0]), vec!["T.0", "P.0"]);
}

#[test]
fn test_sinks_end_runs() {
    let mut g = graph(hashmap!{ "T.0" => (Major, 10), "S.0" => (Major, 50), "A.0" => (Major, 5) },
                      &[("T.0", "S.0"), ("S.0", "A.0")], &["T.0"]);
    assert_eq!(solve(&g, &trains(&["3"]), &ModifierSet::new()).total, 65);
    g.vertex_mut(&"S.0".into()).unwrap().sink = true;
    assert_eq!(solve(&g, &trains(&["3"]), &ModifierSet::new()).total, 60);
}

#[test]
fn test_location_bonus() {
    let g = graph(hashmap!{ "T.0" => (Major, 10), "A.0" => (Major, 10), "B.0" => (Major, 50) },
                  &[("T.0", "A.0"), ("T.0", "B.0")], &["T.0"]);
    let two = trains(&["2"]);
    assert_eq!(solve(&g, &two, &ModifierSet::new()).total, 60);

    let mut rules = ModifierSet::new();
    rules.add_graph(LocationBonus::new("mail", 100, &["T.0", "A.0"]));
    let result = solve(&g, &two, &rules);
    assert_eq!(result.total, 120);
    assert_eq!(stops(&result.runs[0]), vec!["T.0", "A.0"]);

    let mut rules = ModifierSet::new();
    rules.add_graph(LocationBonus::new("mail", 100, &["T.0", "A.0"]).for_train("5"));
    assert_eq!(solve(&g, &two, &rules).total, 60);

    let mut rules = ModifierSet::new();
    rules.add_graph(LocationBonus::new("mail", 100, &["T.0", "A.0"]))
         .add_graph(NoBonusForTrains { trains: vec!["2".to_string()] });
    assert_eq!(solve(&g, &two, &rules).total, 60);
}

#[test]
fn test_connection_bonus() {
    let g = graph(hashmap!{ "A.0" => (Major, 10), "T.0" => (Major, 20), "C.0" => (Major, 30) },
                  &[("A.0", "T.0"), ("T.0", "C.0")], &["T.0"]);
    let mut rules = ModifierSet::new();
    rules.add_dynamic(ConnectionBonus::new("east-west", 25, &["A.0"], &["C.0"]));

    let result = solve(&g, &trains(&["3"]), &rules);
    assert_eq!(result.total, 85);
    assert_eq!(result.runs[0].value, 60);
    assert_eq!(result.explanation, vec!["east-west: 1 x 25 = 25".to_string()]);

    let result = solve(&g, &trains(&["2"]), &rules);
    assert_eq!(result.total, 50);
    assert!(result.explanation.is_empty());
}

#[test]
fn test_discarded_run_earns_no_connection_bonus() {
    let g = graph(hashmap!{ "T.0" => (Major, 10), "B.0" => (Major, 20), "M.0" => (Minor, 5) },
                  &[("T.0", "B.0"), ("T.0", "M.0")], &["T.0"]);
    let mut rules = ModifierSet::new();
    rules.add_dynamic(MajorEndpoints)
        .add_dynamic(ConnectionBonus::new("cx", 100, &["T.0"], &["M.0"]));
    let result = solve(&g, &trains(&["2", "2"]), &rules);
    assert_eq!(result.total, 30);
    assert_eq!(stops(&result.runs[0]), vec!["T.0", "B.0"]);
    assert!(result.runs[1].is_empty());
    assert!(!result.explanation.iter().any(|l| l.starts_with("cx")));
    assert_eq!(format!("{}", result),
               "2: T.0 - B.0 = 30\n2: idle\nruns must end at major stations, discarded: 2\ntotal: 30");
}

#[test]
fn test_double_heading() {
    let g = graph(hashmap!{ "T.0" => (Major, 10), "A.0" => (Major, 20), "B.0" => (Major, 30), "C.0" => (Major, 40) },
                  &[("T.0", "A.0"), ("A.0", "B.0"), ("B.0", "C.0")], &["T.0"]);
    let pair = trains_from_specs(&[TrainSpec::plain("a", 2), TrainSpec::plain("b", 2)]);
    assert_eq!(solve(&g, &pair, &ModifierSet::new()).total, 30);

    let mut rules = ModifierSet::new();
    rules.add_graph(DoubleHeading { first: "a".to_string(), second: "b".to_string() });
    let result = solve(&g, &pair, &rules);
    assert_eq!(result.total, 100);
    assert_eq!(result.runs.len(), 1);
    assert_eq!(result.runs[0].train, "a&b");
    assert_eq!(result.runs[0].train_ref, None);
}

#[test]
fn test_scenario_with_track_through_hexes() {
    let scenario = parse_scenario(FOUR_HEXES).unwrap();
    let g = build_graph_with(&scenario.map, &scenario.modifiers()).unwrap();
    let trains = scenario.train_descriptors();

    let reduced = compute_best_routes(&g, &trains, &ModifierSet::new(), &Config::default());
    let full = compute_best_routes(&g, &trains, &ModifierSet::new(),
                                   &Config { optimize_graph: false, ..Config::default() });
    assert_eq!(reduced.total, 80);
    assert_eq!(full.total, 80);
    assert_eq!(stops(&reduced.runs[0]), vec!["A.0", "C.0"]);
    assert_eq!(stops(&reduced.runs[1]), vec!["A.0", "D.0"]);
    assert_eq!(reduced.runs.iter().map(stops).collect::<Vec<_>>(),
               full.runs.iter().map(stops).collect::<Vec<_>>());
    assert!(full.runs[0].path.contains(&VertexId::side("B", 3)));
    assert_eq!(reduced.runs[0].train_ref, Some(0));

    let mut merged = g.clone();
    let stats = merged.optimize();
    assert!(stats.merged > 0, "{:?}", stats);
    assert!(!merged.contains(&VertexId::side("B", 3)));
    let again = compute_best_routes(&merged, &trains, &ModifierSet::new(),
                                    &Config { optimize_graph: false, ..Config::default() });
    assert_eq!(again.total, full.total);
    assert_eq!(again.runs.iter().map(stops).collect::<Vec<_>>(),
               full.runs.iter().map(stops).collect::<Vec<_>>());
}

#[test]
fn test_reduction_keeps_stations_and_protected() {
    let scenario = parse_scenario(FOUR_HEXES).unwrap();
    let mut g = build_graph(&scenario.map).unwrap();
    let stations = g.vertices().filter(|v| v.is_station()).map(|v| v.id.clone()).collect::<Vec<_>>();
    let pinned = VertexId::side("B", 0);
    g.protect(&pinned);
    assert_eq!(g.loose_ends(), vec![VertexId::side("D", 2)]);

    let stats = g.optimize();
    assert!(stats.changed());
    assert_eq!(stats.dead_ends, 1);
    for s in &stations {
        assert!(g.contains(s), "{} removed", s);
    }
    assert!(g.contains(&pinned));
    assert!(!g.contains(&VertexId::side("D", 2)));

    let before = (g.vertex_count(), g.edge_count());
    assert!(!g.optimize().changed());
    assert_eq!((g.vertex_count(), g.edge_count()), before);
}

#[test]
fn test_repeated_calculations_agree() {
    let scenario = parse_scenario(FOUR_HEXES).unwrap();
    let g = build_graph(&scenario.map).unwrap();
    let trains = scenario.train_descriptors();
    let a = solve(&g, &trains, &ModifierSet::new());
    let b = solve(&g, &trains, &ModifierSet::new());
    assert_eq!(a.runs, b.runs);
    assert_eq!(a.total, b.total);
}

#[test]
fn test_disabled_sink_leaves_nothing_to_run() {
    let text = "
        hex A
        station major 20 token
        track s0 0
        hex B
        station major 0 sink
        track 3 s0
        link A 0 B
        train 2
    ";
    let scenario = parse_scenario(text).unwrap();
    let g = build_graph(&scenario.map).unwrap();
    assert_eq!(solve(&g, &scenario.train_descriptors(), &ModifierSet::new()).total, 20);

    let scenario = parse_scenario(&format!("{}\nrule disable-empty-sinks", text)).unwrap();
    let g = build_graph_with(&scenario.map, &scenario.modifiers()).unwrap();
    assert!(!g.contains(&VertexId::station("B", 0)));
    let result = solve(&g, &scenario.train_descriptors(), &scenario.modifiers());
    assert_eq!(result.total, 0);
    assert_eq!(result.explanation, vec![NO_RUN_MESSAGE.to_string()]);
}

#[test]
fn test_cancelled_calculation_is_provisional() {
    let token = CancelToken::new();
    token.cancel();
    let budget = Budget::new(token, None);
    let result = compute_with_budget(&grid(6), &trains(&["D"]), &ModifierSet::new(),
                                     &Config::default(), &budget);
    assert!(!result.optimal);
    assert!(result.total > 0);
    assert!(!result.runs[0].is_empty());
    assert_eq!(result.runs[0].stops[0], VertexId::station("N0", 0));
    assert!(format!("{}", result).ends_with("(provisional, search was cut short)"));
}

#[test]
fn test_deadline_keeps_runs_found_so_far() {
    let config = Config { time_budget: Some(Duration::from_millis(10)), ..Config::default() };
    let result = compute_best_routes(&grid(6), &trains(&["D", "2"]), &ModifierSet::new(), &config);
    assert!(!result.optimal);
    assert!(result.stats.candidates > 0);
    assert!(result.total >= 20);
    assert!(!result.runs[0].is_empty());
}

#[test]
fn test_cancelled_worker_still_answers() {
    let scenario = parse_scenario(FOUR_HEXES).unwrap();
    let g = build_graph(&scenario.map).unwrap();
    let calc = spawn_calculation(g, scenario.train_descriptors(), Arc::new(ModifierSet::new()),
                                 Config::default());
    calc.cancel();
    let result = calc.wait().unwrap();
    assert!(result.total <= 80);
    assert_eq!(result.runs.len(), 2);
}
