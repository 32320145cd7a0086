//! Types for the limit framework.

use crate::helpers::InfSign;
use crate::Step;
use calc_ast::ExprId;

/// Where the variable goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approach {
    /// x → +∞
    PosInfinity,
    /// x → -∞
    NegInfinity,
    /// x → a⁺
    Point(ExprId),
}

#[derive(Debug, Clone, Default)]
pub struct LimitOptions {
    /// Record a step for the resolved limit.
    pub steps: bool,
}

/// Result of limit computation.
#[derive(Debug)]
pub struct LimitResult {
    /// The computed limit expression (or residual `limit(...)` if unresolved).
    pub expr: ExprId,
    /// Steps taken during computation (if requested).
    pub steps: Vec<Step>,
    /// Warning message if limit could not be determined safely.
    pub warning: Option<String>,
}

/// Value of a sub-limit while composing.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LimitValue {
    Finite(ExprId),
    Infinite(InfSign),
}
