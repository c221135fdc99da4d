extern crate revenue;
extern crate failure;
extern crate structopt;
extern crate env_logger;
extern crate log;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::LevelFilter;
use revenue::*;
use structopt::StructOpt;

/// Revenue -- best routes for a company's trains
#[derive(StructOpt, Debug)]
#[structopt(name="revenue")]
struct Opt {
    /// Verbose mode (-v, -vv, -vvv)
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,

    /// Scenario file with map, trains and rules
    #[structopt(parse(from_os_str))]
    scenario: PathBuf,

    /// Output JSON result file
    #[structopt(short = "j", long = "json", parse(from_os_str))]
    json: Option<PathBuf>,

    /// Time budget in seconds
    #[structopt(short = "t", long = "time")]
    time: Option<f64>,

    /// Search the graph as built, without reduction
    #[structopt(long = "no-reduce")]
    no_reduce: bool,

    /// Print loose track ends and reduction statistics, then stop
    #[structopt(long = "diagnose")]
    diagnose: bool,
}

fn run(opt :&Opt) -> AppResult<()> {
    let scenario = get_scenario(&opt.scenario)?;
    let modifiers = scenario.modifiers();
    let graph = build_graph_with(&scenario.map, &modifiers)?;
    if opt.verbose >= 2 {
        println!("Graph:");
        for v in graph.vertices() {
            println!("  * {:?}", v);
        }
        for (_, e) in graph.edges() {
            println!("  - {:?}", e);
        }
    }

    if opt.diagnose {
        println!("{} vertices, {} edges", graph.vertex_count(), graph.edge_count());
        for v in graph.loose_ends() {
            println!("loose end: {}", v);
        }
        let mut reduced = graph.clone();
        let stats = reduced.optimize();
        println!("reduction: {:?}", stats);
        println!("{} vertices, {} edges after reduction", reduced.vertex_count(), reduced.edge_count());
        return Ok(());
    }

    let config = Config {
        optimize_graph: !opt.no_reduce,
        time_budget: opt.time.map(|t| Duration::from_millis((t.max(0.0) * 1000.0) as u64)),
    };
    let calc = spawn_calculation(graph, scenario.train_descriptors(), Arc::new(modifiers), config);
    let result = calc.wait().ok_or_else(|| failure::err_msg("revenue calculation failed"))?;
    println!("{}", result);
    if opt.verbose >= 1 {
        println!("{} candidate runs, {} search nodes", result.stats.candidates, result.stats.nodes);
    }

    if let Some(ref json) = opt.json {
        use std::fs::File;
        use std::io::BufWriter;
        let file = File::create(json)?;
        let mut writer = BufWriter::new(&file);
        revenue::output::json::write_result(&result, &mut writer)?;
    }

    Ok(())
}

pub fn main() {
    let opt = Opt::from_args();
    let level = match opt.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();
    match run(&opt) {
        Ok(()) => {},
        Err(e) => {
            println!("Error:\n{}", e.as_fail());
            std::process::exit(1);
        },
    }
}
