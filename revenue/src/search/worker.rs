use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use log::{debug, warn};

use crate::modifier::ModifierSet;
use crate::network::Graph;
use crate::output::RevenueResult;
use crate::train::TrainDescriptor;
use super::budget::{Budget, CancelToken};
use super::{compute_with_budget, Config};

/// A calculation running on its own thread.
pub struct Calculation {
    cancel: CancelToken,
    receiver: Receiver<RevenueResult>,
    handle: Option<thread::JoinHandle<()>>,
}

/// Starts a calculation off the calling thread. The worker owns its
/// snapshot of the graph and the trains.
pub fn spawn_calculation(graph :Graph, trains :Vec<TrainDescriptor>, modifiers :Arc<ModifierSet>,
                         config :Config) -> Calculation {
    let cancel = CancelToken::new();
    let budget = Budget::new(cancel.clone(), config.time_budget);
    let (tx, rx) = channel();
    let handle = thread::spawn(move || {
        let result = compute_with_budget(&graph, &trains, &modifiers, &config, &budget);
        if tx.send(result).is_err() {
            debug!("calculation finished after its receiver was dropped");
        }
    });
    Calculation { cancel, receiver: rx, handle: Some(handle) }
}

impl Calculation {
    /// The worker stops at its next budget check and delivers its best
    /// result so far.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// `None` while the calculation is still running.
    pub fn try_result(&mut self) -> Option<RevenueResult> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            },
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                None
            },
        }
    }

    /// Blocks until the worker is done. `None` if it died without a result.
    pub fn wait(mut self) -> Option<RevenueResult> {
        let result = self.receiver.recv().ok();
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("revenue calculation thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Vertex, VertexId};
    use crate::input::snapshot::StopKind;

    fn line() -> (Graph, Vec<TrainDescriptor>) {
        let mut g = Graph::new();
        for (i, value) in [10, 20, 30].iter().enumerate() {
            g.add_vertex(Vertex::station(&format!("L{}", i), 0, StopKind::Major, *value));
        }
        let id = |i :usize| VertexId::station(&format!("L{}", i), 0);
        g.add_edge(&id(0), &id(1), false).unwrap();
        g.add_edge(&id(1), &id(2), false).unwrap();
        g.add_token(&id(1));
        (g, vec![TrainDescriptor::parse("2").unwrap()])
    }

    #[test]
    fn test_worker_matches_direct_call() {
        let (g, trains) = line();
        let modifiers = Arc::new(ModifierSet::new());
        let direct = super::super::compute_best_routes(&g, &trains, &modifiers, &Config::default());
        let calc = spawn_calculation(g, trains, modifiers, Config::default());
        let result = calc.wait().unwrap();
        assert_eq!(result.total, direct.total);
        assert_eq!(result.runs, direct.runs);
        assert!(result.optimal);
    }

    #[test]
    fn test_try_result_eventually_delivers() {
        let (g, trains) = line();
        let mut calc = spawn_calculation(g, trains, Arc::new(ModifierSet::new()), Config::default());
        let result = loop {
            if let Some(r) = calc.try_result() {
                break r;
            }
            thread::yield_now();
        };
        assert_eq!(result.total, 50);
    }
}
