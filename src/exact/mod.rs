use crate::tree_decomposition::TreeDecomposition;
use std::time::{Duration, Instant};

#[cfg(feature = "handle-ctrlc")]
use crate::signals::received_ctrl_c;

mod io_decomposer;
mod pid;

pub use io_decomposer::{IoDecomposer, Refinement};
pub use pid::Pid;

/// Limits for a single exact search. `None` means unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchBudget {
    pub max_steps: Option<usize>,
    pub time_limit: Option<Duration>,
}

impl SearchBudget {
    impl_setter!(self, max_steps, Option<usize>);
    impl_setter!(self, time_limit, Option<Duration>);

    pub fn unlimited() -> Self {
        Self::default()
    }

    pub(crate) fn tracker(&self) -> BudgetTracker {
        BudgetTracker {
            steps: 0,
            max_steps: self.max_steps,
            deadline: self.time_limit.map(|limit| Instant::now() + limit),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Exhausted;

pub(crate) struct BudgetTracker {
    steps: usize,
    max_steps: Option<usize>,
    deadline: Option<Instant>,
}

impl BudgetTracker {
    /// Accounts for one unit of work.
    pub(crate) fn tick(&mut self) -> Result<(), Exhausted> {
        self.steps += 1;
        if let Some(max_steps) = self.max_steps {
            if self.steps > max_steps {
                return Err(Exhausted);
            }
        }
        // the clock is only read every 64 steps
        if self.steps % 64 == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(Exhausted);
                }
            }
        }
        #[cfg(feature = "handle-ctrlc")]
        if received_ctrl_c() {
            return Err(Exhausted);
        }
        Ok(())
    }

    #[cfg(any(feature = "log", test))]
    pub(crate) fn steps(&self) -> usize {
        self.steps
    }
}

/// Proven bounds on the treewidth when no decomposition narrower than `upperbound` was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub lowerbound: usize,
    pub upperbound: usize,
}

#[derive(Debug)]
pub enum ComputationResult {
    ComputedTreeDecomposition(TreeDecomposition),
    Bounds(Bounds),
}

impl ComputationResult {
    pub fn computed_tree_decomposition(self) -> Option<TreeDecomposition> {
        match self {
            ComputationResult::ComputedTreeDecomposition(td) => Some(td),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::exact::{Exhausted, SearchBudget};
    use std::time::Duration;

    #[test]
    fn step_limit() {
        let mut tracker = SearchBudget::default().max_steps(Some(3)).tracker();
        assert_eq!(tracker.tick(), Ok(()));
        assert_eq!(tracker.tick(), Ok(()));
        assert_eq!(tracker.tick(), Ok(()));
        assert_eq!(tracker.tick(), Err(Exhausted));
        assert_eq!(tracker.steps(), 4);
    }

    #[test]
    fn expired_deadline() {
        let mut tracker = SearchBudget::default()
            .time_limit(Some(Duration::from_secs(0)))
            .tracker();
        let result: Result<Vec<()>, Exhausted> = (0..64).map(|_| tracker.tick()).collect();
        assert_eq!(result, Err(Exhausted));
    }

    #[test]
    fn unlimited() {
        let mut tracker = SearchBudget::unlimited().tracker();
        for _ in 0..1000 {
            assert_eq!(tracker.tick(), Ok(()));
        }
    }
}
