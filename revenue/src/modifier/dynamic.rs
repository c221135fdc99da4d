use std::collections::BTreeSet;

use crate::context::RevenueContext;
use crate::network::{Vertex, VertexId};
use crate::output::TrainRun;
use crate::search::RunView;
use super::{ActiveModifier, DynamicModifier};

/// Runs have to start and end at major stations. Other runs are rejected:
/// they earn nothing and are discarded from the result.
#[derive(Debug, Clone, Default)]
pub struct MajorEndpoints;

struct ActiveMajorEndpoints {
    majors: BTreeSet<VertexId>,
}

impl ActiveMajorEndpoints {
    fn valid(&self, run :&TrainRun) -> bool {
        match (run.stops.first(), run.stops.last()) {
            (Some(a), Some(b)) => self.majors.contains(a) && self.majors.contains(b),
            _ => true,
        }
    }
}

impl DynamicModifier for MajorEndpoints {
    fn name(&self) -> &str {
        "major-endpoints"
    }

    fn prepare(&self, ctx :&RevenueContext) -> Option<Box<dyn ActiveModifier>> {
        if ctx.trains.is_empty() {
            return None;
        }
        let majors = ctx.graph.vertices().filter(|v| v.is_major()).map(|v| v.id.clone()).collect();
        Some(Box::new(ActiveMajorEndpoints { majors }))
    }
}

impl ActiveModifier for ActiveMajorEndpoints {
    fn rejects(&self, run :&RunView) -> bool {
        let ends_major = |v :Option<&Vertex>| v.map(|v| v.is_major()).unwrap_or(false);
        !ends_major(run.first()) || !ends_major(run.last())
    }

    fn adjust_final(&self, runs :&mut [TrainRun]) {
        for run in runs.iter_mut().filter(|r| !r.is_empty()) {
            if !self.valid(run) {
                run.truncate();
            }
        }
    }

    fn explain(&self, runs :&[TrainRun]) -> Option<String> {
        let dropped = runs.iter()
            .filter(|r| !r.is_empty() && !self.valid(r))
            .map(|r| r.train.as_str())
            .collect::<Vec<_>>();
        if dropped.is_empty() {
            None
        } else {
            Some(format!("runs must end at major stations, discarded: {}", dropped.join(", ")))
        }
    }
}

/// Bonus for each run connecting one group of locations to another,
/// e.g. east to west.
#[derive(Debug, Clone)]
pub struct ConnectionBonus {
    pub name: String,
    pub value: i32,
    pub from: BTreeSet<VertexId>,
    pub to: BTreeSet<VertexId>,
}

impl ConnectionBonus {
    pub fn new(name :&str, value :i32, from :&[&str], to :&[&str]) -> ConnectionBonus {
        ConnectionBonus {
            name: name.to_string(),
            value,
            from: from.iter().map(|v| VertexId::from(*v)).collect(),
            to: to.iter().map(|v| VertexId::from(*v)).collect(),
        }
    }
}

struct ActiveConnectionBonus {
    name: String,
    value: i32,
    from: BTreeSet<VertexId>,
    to: BTreeSet<VertexId>,
    excluded: BTreeSet<String>,
    trains: i32,
}

impl ActiveConnectionBonus {
    fn connects<'a, I: Iterator<Item = &'a VertexId>>(&self, vertices :I) -> bool {
        let (mut from, mut to) = (false, false);
        for v in vertices {
            from |= self.from.contains(v);
            to |= self.to.contains(v);
        }
        from && to
    }
}

impl DynamicModifier for ConnectionBonus {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&self, ctx :&RevenueContext) -> Option<Box<dyn ActiveModifier>> {
        let present = |set :&BTreeSet<VertexId>| set.iter()
            .filter(|v| ctx.graph.contains(v))
            .cloned()
            .collect::<BTreeSet<_>>();
        let (from, to) = (present(&self.from), present(&self.to));
        if from.is_empty() || to.is_empty() || ctx.trains.is_empty() {
            return None;
        }
        Some(Box::new(ActiveConnectionBonus {
            name: self.name.clone(),
            value: self.value,
            from,
            to,
            excluded: ctx.trains.iter().filter(|t| t.ignore_bonuses).map(|t| t.name.clone()).collect(),
            trains: ctx.trains.len() as i32,
        }))
    }
}

impl ActiveModifier for ActiveConnectionBonus {
    fn predicted_upper_bound(&self) -> i32 {
        self.value.max(0) * self.trains
    }

    fn evaluate(&self, runs :&[RunView], _is_final :bool) -> i32 {
        runs.iter()
            .filter(|r| !r.train().ignore_bonuses)
            .filter(|r| self.connects(r.vertices().map(|v| &v.id)))
            .count() as i32 * self.value
    }

    fn explain(&self, runs :&[TrainRun]) -> Option<String> {
        let qualifying = runs.iter()
            .filter(|r| r.valid && !self.excluded.contains(&r.train) && self.connects(r.path.iter()))
            .count();
        if qualifying == 0 {
            None
        } else {
            Some(format!("{}: {} x {} = {}", self.name, qualifying, self.value, qualifying as i32 * self.value))
        }
    }
}
