//! Symbolic limits.
//!
//! Limits at `±oo` and one-sided (right) limits at a point. The engine is
//! conservative: when no rule settles the value it returns the residual
//! `limit(expr, x, a)` with a warning instead of guessing.
//!
//! ```ignore
//! use calc_engine::limits::{limit, Approach, LimitOptions};
//!
//! let result = limit(ctx, expr, "x", Approach::PosInfinity, &opts, &mut budget)?;
//! ```

mod engine;
mod helpers;
mod rules;
mod types;

pub use engine::limit;
pub use helpers::mk_limit;
pub use types::{Approach, LimitOptions, LimitResult};
