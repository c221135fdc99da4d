use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared abort flag for a running calculation.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How long a search may keep going. Exhaustion is not an error, the
/// search just stops and reports what it has.
#[derive(Clone, Debug, Default)]
pub struct Budget {
    cancel: CancelToken,
    deadline: Option<Instant>,
}

impl Budget {
    pub fn unlimited() -> Budget {
        Default::default()
    }

    pub fn new(cancel :CancelToken, time :Option<Duration>) -> Budget {
        Budget { cancel, deadline: time.map(|d| Instant::now() + d) }
    }

    pub fn token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn exhausted(&self) -> bool {
        self.cancel.is_cancelled()
            || self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
    }
}

/// Checks the budget every `interval` steps only.
#[derive(Debug)]
pub struct Ticker {
    budget: Budget,
    interval: u32,
    count: u32,
    stopped: bool,
}

impl Ticker {
    pub fn new(budget :&Budget, interval :u32) -> Ticker {
        Ticker { budget: budget.clone(), interval: interval.max(1), count: 0, stopped: false }
    }

    /// True once the budget has run out.
    pub fn tick(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        self.count += 1;
        if self.count >= self.interval {
            self.count = 0;
            self.stopped = self.budget.exhausted();
        }
        self.stopped
    }

    pub fn stopped(&self) -> bool {
        self.stopped
    }
}

#[test]
fn test_cancel_is_shared() {
    let token = CancelToken::new();
    let budget = Budget::new(token.clone(), None);
    assert!(!budget.exhausted());
    token.cancel();
    assert!(budget.exhausted());

    let mut ticker = Ticker::new(&budget, 3);
    assert!(!ticker.tick());
    assert!(!ticker.tick());
    assert!(ticker.tick());
    assert!(ticker.stopped());
}

#[test]
fn test_zero_time_budget_is_exhausted() {
    let budget = Budget::new(CancelToken::new(), Some(Duration::from_secs(0)));
    assert!(budget.exhausted());
    assert!(!Budget::unlimited().exhausted());
}
