//! Canonical run capacity of a train.

use std::cmp::{Ordering, Reverse};

use regex::Regex;

use crate::input::snapshot::TrainSpec;
use crate::network::{Vertex, VertexKind};

/// Stop capacity of trains that may visit any number of stops.
pub const UNLIMITED: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainDescriptor {
    pub name: String,
    pub majors: u32,
    pub minors: u32,
    /// Minor stops neither count against capacity nor score.
    pub ignore_minors: bool,
    pub multiply_majors: i32,
    pub multiply_minors: i32,
    /// Both ends of a run have to be major stops.
    pub long_form: bool,
    pub ignore_bonuses: bool,
    /// Index of the native train, `None` for trains made up by modifiers.
    pub train_ref: Option<usize>,
}

#[derive(Debug, PartialEq, Fail)]
pub enum TrainCodeError {
    #[fail(display = "empty train code")]
    EmptyCode,
    #[fail(display = "invalid train code: {}", _0)]
    InvalidCode(String),
    #[fail(display = "error in regular expression: {}", _0)]
    RegexError(String),
}

impl TrainDescriptor {
    pub fn from_train(spec :&TrainSpec, index :usize) -> TrainDescriptor {
        TrainDescriptor {
            name: spec.name.clone(),
            majors: spec.majors,
            minors: spec.minors,
            ignore_minors: spec.minor_multiplier == 0,
            multiply_majors: spec.major_multiplier,
            multiply_minors: spec.minor_multiplier,
            long_form: spec.express,
            ignore_bonuses: false,
            train_ref: Some(index),
        }
    }

    /// Parses train codes such as `4`, `3+2`, `5E`, `D`, `6x2` and
    /// double-headed composites like `3&4`.
    pub fn parse(code :&str) -> Result<TrainDescriptor, TrainCodeError> {
        TrainDescriptor::parse_with(&code_regex()?, code)
    }

    /// Like `parse`, with the component pattern from `code_regex` compiled
    /// once by the caller.
    pub fn parse_with(component_re :&Regex, code :&str) -> Result<TrainDescriptor, TrainCodeError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(TrainCodeError::EmptyCode);
        }
        let invalid = || TrainCodeError::InvalidCode(code.to_string());

        let mut train :Option<TrainDescriptor> = None;
        for part in code.split('&') {
            let groups = component_re.captures(part.trim()).ok_or_else(invalid)?;
            let majors = match &groups["majors"] {
                "D" => UNLIMITED,
                n => n.parse::<u32>().map_err(|_| invalid())?,
            };
            let minors = match groups.name("minors") {
                Some(m) => m.as_str().parse::<u32>().map_err(|_| invalid())?,
                None => 0,
            };
            let mult = match groups.name("mult") {
                Some(m) => m.as_str().parse::<i32>().map_err(|_| invalid())?,
                None => 1,
            };
            let component = TrainDescriptor {
                name: part.trim().to_string(),
                majors,
                minors,
                ignore_minors: mult == 0,
                multiply_majors: mult,
                multiply_minors: mult,
                long_form: groups.name("express").is_some(),
                ignore_bonuses: false,
                train_ref: None,
            };
            train = Some(match train {
                None => component,
                Some(t) => t.couple(&component),
            });
        }
        let mut train = train.ok_or_else(invalid)?;
        train.name = code.to_string();
        Ok(train)
    }

    /// Two trains running as one: capacities add up, the weaker multiplier
    /// and the looser run form win.
    pub fn couple(&self, other :&TrainDescriptor) -> TrainDescriptor {
        let multiply_minors = self.multiply_minors.min(other.multiply_minors);
        TrainDescriptor {
            name: format!("{}&{}", self.name, other.name),
            majors: self.majors.saturating_add(other.majors),
            minors: self.minors.saturating_add(other.minors),
            ignore_minors: multiply_minors == 0,
            multiply_majors: self.multiply_majors.min(other.multiply_majors),
            multiply_minors,
            long_form: self.long_form && other.long_form,
            ignore_bonuses: self.ignore_bonuses || other.ignore_bonuses,
            train_ref: None,
        }
    }

    pub fn minor_capacity(&self) -> u32 {
        if self.ignore_minors { UNLIMITED } else { self.minors }
    }

    /// Minor stops take minor slots first and major slots after that.
    pub fn fits(&self, majors :u32, minors :u32) -> bool {
        if self.ignore_minors {
            return majors <= self.majors;
        }
        let overflow = minors.saturating_sub(self.minors);
        majors.saturating_add(overflow) <= self.majors
    }

    pub fn stop_value(&self, v :&Vertex) -> i32 {
        match v.kind {
            VertexKind::Major => v.value * self.multiply_majors,
            VertexKind::Minor if self.ignore_minors => 0,
            VertexKind::Minor => v.value * self.multiply_minors,
            VertexKind::Side => 0,
        }
    }

    /// Strict partial order: `self` can run everything `other` can, and
    /// more, for at least the same revenue.
    pub fn dominates(&self, other :&TrainDescriptor) -> bool {
        let (ma, mb) = (self.majors, other.majors);
        let (na, nb) = (self.minor_capacity(), other.minor_capacity());
        ma >= mb && na >= nb && (ma > mb || na > nb)
            && self.multiply_majors >= other.multiply_majors
            && self.multiply_minors >= other.multiply_minors
            && (!self.long_form || other.long_form)
            && (!self.ignore_bonuses || other.ignore_bonuses)
    }

    /// Equal in everything that influences a run.
    pub fn same_capacity(&self, other :&TrainDescriptor) -> bool {
        TrainDescriptor { train_ref: None, ..self.clone() }
            == TrainDescriptor { train_ref: None, ..other.clone() }
    }
}

/// Pattern for one component of a train code.
pub fn code_regex() -> Result<Regex, TrainCodeError> {
    Regex::new(r"^(?P<majors>\d+|D)(?:\+(?P<minors>\d+))?(?P<express>E)?(?:x(?P<mult>\d+))?$")
        .map_err(|e| TrainCodeError::RegexError(format!("{:?}", e)))
}

/// Strongest trains first. Consistent with `dominates`: a dominating train
/// is never ordered after the train it dominates.
pub fn strength_order(a :&TrainDescriptor, b :&TrainDescriptor) -> Ordering {
    let key = |t :&TrainDescriptor| (Reverse(t.majors), Reverse(t.minor_capacity()),
                                     Reverse(t.multiply_majors), Reverse(t.multiply_minors),
                                     t.long_form, t.ignore_bonuses);
    key(a).cmp(&key(b)).then_with(|| a.name.cmp(&b.name))
}

#[test]
fn test_parse_codes() {
    let t = TrainDescriptor::parse("4").unwrap();
    assert_eq!((t.majors, t.minors, t.multiply_majors, t.long_form), (4, 0, 1, false));

    let t = TrainDescriptor::parse("3+2").unwrap();
    assert_eq!((t.majors, t.minors), (3, 2));

    let t = TrainDescriptor::parse("5E").unwrap();
    assert!(t.long_form);

    let t = TrainDescriptor::parse("D").unwrap();
    assert_eq!(t.majors, UNLIMITED);

    let t = TrainDescriptor::parse("6x2").unwrap();
    assert_eq!((t.majors, t.multiply_majors, t.multiply_minors), (6, 2, 2));

    let t = TrainDescriptor::parse("2x0").unwrap();
    assert!(t.ignore_minors);

    assert_eq!(TrainDescriptor::parse("  "), Err(TrainCodeError::EmptyCode));
    assert_eq!(TrainDescriptor::parse("4Q"), Err(TrainCodeError::InvalidCode("4Q".to_string())));
    assert!(TrainDescriptor::parse("3&").is_err());
}

#[test]
fn test_parse_with_shared_regex() {
    let re = code_regex().unwrap();
    let codes = ["2", "3+1", "D", "4x2&3"];
    for code in &codes {
        assert_eq!(TrainDescriptor::parse_with(&re, code), TrainDescriptor::parse(code));
    }
    assert_eq!(TrainDescriptor::parse_with(&re, "E5"), Err(TrainCodeError::InvalidCode("E5".to_string())));
}

#[test]
fn test_parse_double_heading() {
    let t = TrainDescriptor::parse("3&4").unwrap();
    assert_eq!(t.name, "3&4");
    assert_eq!(t.majors, 7);
    assert_eq!(t.train_ref, None);

    let t = TrainDescriptor::parse("3E&4").unwrap();
    assert!(!t.long_form);
    let t = TrainDescriptor::parse("D&2").unwrap();
    assert_eq!(t.majors, UNLIMITED);
    let t = TrainDescriptor::parse("4x2&3").unwrap();
    assert_eq!((t.majors, t.multiply_majors), (7, 1));
}

#[test]
fn test_couple_named_trains() {
    let mut a = TrainDescriptor::from_train(&TrainSpec::plain("green", 3), 0);
    a.ignore_bonuses = true;
    let b = TrainDescriptor::from_train(&TrainSpec::plain("blue", 2), 1);
    let t = a.couple(&b);
    assert_eq!(t.name, "green&blue");
    assert_eq!(t.majors, 5);
    assert!(t.ignore_bonuses);
    assert_eq!(t.train_ref, None);
}

#[test]
fn test_from_train_ignores_minors_without_multiplier() {
    let mut spec = TrainSpec::plain("3", 3);
    spec.minor_multiplier = 0;
    let t = TrainDescriptor::from_train(&spec, 2);
    assert!(t.ignore_minors);
    assert_eq!(t.minor_capacity(), UNLIMITED);
    assert_eq!(t.train_ref, Some(2));
    assert!(t.fits(3, 40));
    assert!(!t.fits(4, 0));
}

#[test]
fn test_minor_stops_overflow_into_major_slots() {
    let t = TrainDescriptor::parse("3+1").unwrap();
    assert!(t.fits(3, 1));
    assert!(t.fits(2, 2));
    assert!(!t.fits(3, 2));
}

#[test]
fn test_domination_is_strict_partial_order() {
    let trains = ["2", "3", "4", "3+2", "4E", "D", "5x2"].iter()
        .map(|c| TrainDescriptor::parse(c).unwrap())
        .collect::<Vec<_>>();
    for a in &trains {
        assert!(!a.dominates(a), "{} dominates itself", a.name);
        for b in &trains {
            if a.dominates(b) {
                assert!(!b.dominates(a));
            }
            for c in &trains {
                if a.dominates(b) && b.dominates(c) {
                    assert!(a.dominates(c), "{} {} {}", a.name, b.name, c.name);
                }
            }
        }
    }
    let four = &trains[2];
    let two = &trains[0];
    assert!(four.dominates(two));
    assert!(!trains[4].dominates(two)); // long-form is more restricted
}

#[test]
fn test_strength_order_respects_domination() {
    let mut trains = ["2", "D", "3+2", "4"].iter()
        .map(|c| TrainDescriptor::parse(c).unwrap())
        .collect::<Vec<_>>();
    trains.sort_by(strength_order);
    let names = trains.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["D", "4", "3+2", "2"]);
}
