//! JSON view of a result, for map highlighting in a UI.

use std::io;

use failure::Error;
use serde_json::Value;

use super::run::{RevenueResult, TrainRun};

fn run_json(run :&TrainRun) -> Value {
    json!({
        "train": run.train,
        "train_ref": run.train_ref,
        "path": run.path.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
        "stops": run.stops.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
        "value": run.value,
        "valid": run.valid,
    })
}

pub fn result_json(result :&RevenueResult) -> Value {
    json!({
        "total": result.total,
        "optimal": result.optimal,
        "runs": result.runs.iter().map(run_json).collect::<Vec<_>>(),
        "explanation": result.explanation,
        "stats": {
            "candidates": result.stats.candidates,
            "nodes": result.stats.nodes,
        },
    })
}

pub fn write_result<W: io::Write>(result :&RevenueResult, f :&mut W) -> Result<(), Error> {
    serde_json::to_writer_pretty(&mut *f, &result_json(result))?;
    writeln!(f)?;
    Ok(())
}

#[test]
fn test_result_json_lists_runs() {
    use crate::search::SearchStats;
    let result = RevenueResult {
        runs: vec![TrainRun {
            train: "2".to_string(),
            train_ref: Some(0),
            path: vec!["A.0".into(), "B.0".into()],
            stops: vec!["A.0".into(), "B.0".into()],
            value: 30,
            valid: true,
        }],
        total: 30,
        optimal: true,
        explanation: vec![],
        stats: SearchStats { candidates: 1, nodes: 3 },
    };
    let v = result_json(&result);
    assert_eq!(v["total"], 30);
    assert_eq!(v["runs"][0]["stops"][1], "B.0");
    assert_eq!(v["runs"][0]["train_ref"], 0);
    assert_eq!(v["stats"]["nodes"], 3);

    let mut buf = Vec::new();
    write_result(&result, &mut buf).unwrap();
    let parsed :Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(parsed, v);
}
