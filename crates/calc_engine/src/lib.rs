#![allow(clippy::too_many_arguments)] // Rule helpers thread context, var and budget

#[macro_use]
pub mod macros;

pub mod budget;
pub mod calculus;
pub mod canonical;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod helpers;
pub mod limits;
pub mod poly;
pub mod rule;
pub mod rules;
pub mod step;

pub use budget::{Budget, BudgetExceeded, Metric, Operation};
pub use calculus::{differentiate, integrate};
pub use canonical::{expand, normalize};
pub use engine::Simplifier;
pub use error::CasError;
pub use evaluator::eval_f64;
pub use limits::{limit, Approach, LimitOptions, LimitResult};
pub use rule::{Rewrite, SimpleRule};
pub use step::{ImportanceLevel, Step};
