//! Anti-explosion budget.
//!
//! Every expensive engine operation charges a counter here. A limit of 0
//! means unlimited; exceeding a non-zero limit aborts the operation with
//! `BudgetExceeded` instead of letting a request run away.
//!
//! ```ignore
//! let mut budget = Budget::with_defaults();
//! budget.charge(Operation::Limit, Metric::RewriteSteps, 1)?;
//! ```

use std::fmt;

/// Operations that consume budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Operation {
    /// Rule applications and canonical passes
    #[default]
    Simplify = 0,
    /// Limit evaluation (sub-limits, L'Hôpital rounds)
    Limit = 1,
}

impl Operation {
    pub const COUNT: usize = 2;

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simplify => write!(f, "Simplify"),
            Self::Limit => write!(f, "Limit"),
        }
    }
}

/// Metrics being measured for budget tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Metric {
    /// Nodes created in Context (proxy for memory)
    NodesCreated = 0,
    /// Rule applications or recursive sub-problems (proxy for time)
    RewriteSteps = 1,
}

impl Metric {
    pub const COUNT: usize = 2;

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodesCreated => write!(f, "NodesCreated"),
            Self::RewriteSteps => write!(f, "RewriteSteps"),
        }
    }
}

/// Error returned when a budget limit is exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetExceeded {
    pub op: Operation,
    pub metric: Metric,
    pub used: u64,
    pub limit: u64,
}

impl fmt::Display for BudgetExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "budget exceeded during {}: {} used {} (limit {})",
            self.op, self.metric, self.used, self.limit
        )
    }
}

impl std::error::Error for BudgetExceeded {}

/// Budget configuration and runtime state, array-indexed by
/// `(Operation, Metric)`.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    limits: [[u64; Metric::COUNT]; Operation::COUNT],
    used: [[u64; Metric::COUNT]; Operation::COUNT],
}

impl Budget {
    /// Create a new budget with no limits (all zeros = unlimited).
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits sized for single interactive problems.
    pub fn with_defaults() -> Self {
        let mut b = Self::new();
        b.set_limit(Operation::Simplify, Metric::RewriteSteps, 5_000);
        b.set_limit(Operation::Simplify, Metric::NodesCreated, 200_000);
        b.set_limit(Operation::Limit, Metric::RewriteSteps, 2_000);
        b
    }

    #[inline]
    pub fn set_limit(&mut self, op: Operation, metric: Metric, limit: u64) {
        self.limits[op.index()][metric.index()] = limit;
    }

    #[inline]
    pub fn limit(&self, op: Operation, metric: Metric) -> u64 {
        self.limits[op.index()][metric.index()]
    }

    #[inline]
    pub fn used(&self, op: Operation, metric: Metric) -> u64 {
        self.used[op.index()][metric.index()]
    }

    pub fn reset(&mut self) {
        self.used = [[0; Metric::COUNT]; Operation::COUNT];
    }

    /// Charge `amount` to an (operation, metric) pair.
    ///
    /// Returns `Err(BudgetExceeded)` once the running total passes a non-zero
    /// limit.
    #[inline]
    pub fn charge(
        &mut self,
        op: Operation,
        metric: Metric,
        amount: u64,
    ) -> Result<(), BudgetExceeded> {
        let limit = self.limits[op.index()][metric.index()];
        let used = &mut self.used[op.index()][metric.index()];

        *used = used.saturating_add(amount);

        if limit > 0 && *used > limit {
            return Err(BudgetExceeded {
                op,
                metric,
                used: *used,
                limit,
            });
        }

        Ok(())
    }
}
