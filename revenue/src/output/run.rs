use std::fmt;

use log::debug;

use crate::modifier::ActiveModifier;
use crate::network::VertexId;
use crate::search::{Network, Run, SearchStats, Solution};
use crate::train::TrainDescriptor;

pub const NO_RUN_MESSAGE: &str = "no train can run a valid route";

/// The route one train takes in the accepted assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainRun {
    pub train: String,
    pub train_ref: Option<usize>,
    pub path: Vec<VertexId>,
    pub stops: Vec<VertexId>,
    pub value: i32,
    /// Cleared when a rule rejected the run.
    pub valid: bool,
}

impl TrainRun {
    pub fn idle(train :&TrainDescriptor) -> TrainRun {
        TrainRun {
            train: train.name.clone(),
            train_ref: train.train_ref,
            path: vec![],
            stops: vec![],
            value: 0,
            valid: true,
        }
    }

    pub fn from_run(net :&Network, train :&TrainDescriptor, run :&Run) -> TrainRun {
        let path = run.path.iter().map(|v| &net.vertices[*v]).collect::<Vec<_>>();
        TrainRun {
            train: train.name.clone(),
            train_ref: train.train_ref,
            stops: path.iter().filter(|v| v.is_station()).map(|v| v.id.clone()).collect(),
            path: path.iter().map(|v| v.id.clone()).collect(),
            value: run.value,
            valid: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn truncate(&mut self) {
        self.path.clear();
        self.stops.clear();
        self.value = 0;
        self.valid = false;
    }
}

#[derive(Debug, Clone)]
pub struct RevenueResult {
    /// One run per train of the calculation, idle trains included.
    pub runs: Vec<TrainRun>,
    pub total: i32,
    /// False if the search was cut short; the result is then provisional.
    pub optimal: bool,
    pub explanation: Vec<String>,
    pub stats: SearchStats,
}

impl RevenueResult {
    pub fn from_solution(net :&Network, trains :&[TrainDescriptor], modifiers :&[Box<dyn ActiveModifier>],
                         solution :Solution) -> RevenueResult {
        let mut runs = trains.iter().zip(solution.assignment.iter()).zip(solution.rejected.iter())
            .map(|((t, r), rejected)| match r {
                Some(run) => TrainRun { valid: !rejected, ..TrainRun::from_run(net, t, run) },
                None => TrainRun::idle(t),
            })
            .collect::<Vec<_>>();

        let mut explanation = modifiers.iter().filter_map(|m| m.explain(&runs)).collect::<Vec<_>>();
        for m in modifiers {
            m.adjust_final(&mut runs);
        }
        for run in runs.iter_mut().filter(|r| !r.valid && !r.is_empty()) {
            run.truncate();
        }

        let mut total = solution.total;
        if runs.iter().all(|r| r.is_empty()) {
            if total != 0 {
                debug!("no run survived, dropping total of {}", total);
            }
            total = 0;
            if !trains.is_empty() {
                explanation.push(NO_RUN_MESSAGE.to_string());
            }
        }

        RevenueResult { runs, total, optimal: solution.optimal, explanation, stats: solution.stats }
    }

    pub fn run_of(&self, train :&str) -> Option<&TrainRun> {
        self.runs.iter().find(|r| r.train == train)
    }
}

impl fmt::Display for TrainRun {
    fn fmt(&self, f :&mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "{}: idle", self.train);
        }
        let stops = self.stops.iter().map(|s| s.as_str()).collect::<Vec<_>>();
        write!(f, "{}: {} = {}", self.train, stops.join(" - "), self.value)
    }
}

impl fmt::Display for RevenueResult {
    fn fmt(&self, f :&mut fmt::Formatter) -> fmt::Result {
        for run in &self.runs {
            writeln!(f, "{}", run)?;
        }
        for line in &self.explanation {
            writeln!(f, "{}", line)?;
        }
        write!(f, "total: {}", self.total)?;
        if !self.optimal {
            write!(f, " (provisional, search was cut short)")?;
        }
        Ok(())
    }
}

#[test]
fn test_display_of_runs() {
    let mut run = TrainRun {
        train: "3".to_string(),
        train_ref: Some(0),
        path: vec!["A1.0".into(), "A1:2".into(), "B2.0".into()],
        stops: vec!["A1.0".into(), "B2.0".into()],
        value: 50,
        valid: true,
    };
    assert_eq!(format!("{}", run), "3: A1.0 - B2.0 = 50");
    run.truncate();
    assert_eq!(format!("{}", run), "3: idle");
    assert!(!run.valid);
}

#[test]
fn test_display_of_provisional_result() {
    let result = RevenueResult {
        runs: vec![],
        total: 0,
        optimal: false,
        explanation: vec![NO_RUN_MESSAGE.to_string()],
        stats: SearchStats::default(),
    };
    assert_eq!(format!("{}", result),
               "no train can run a valid route\ntotal: 0 (provisional, search was cut short)");
}
