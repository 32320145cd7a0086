//! From a natural-language calculus problem to a typeset answer.
//!
//! The pipeline is a chain of text transformations: the problem is analyzed
//! for an operation and an expression (asking an [`ExpressionModel`] when no
//! expression is written out), a small script is generated, the script runs
//! in a restricted namespace backed by `calc_engine`, and its printed output
//! is converted to LaTeX.

pub mod analysis;
pub mod error;
pub mod explain;
pub mod expression;
pub mod interpreter;
pub mod latex;
pub mod llm;
pub mod operation;
pub mod script;
pub mod solver;

pub use analysis::{
    analyze_problem, detect_operation, extract_expression, extract_limit_point, ParsedProblem,
};
pub use error::SolveError;
pub use explain::explain;
pub use expression::{clean_expression, format_expression, validate_expression};
pub use interpreter::{execute_script, ExecutionOutput, Interpreter, StepSummary};
pub use latex::{output_to_latex, plain_to_latex};
pub use llm::{build_extraction_prompt, ExpressionModel, LlmError};
pub use operation::{LimitPoint, Operation};
pub use script::{generate_script, Script, Statement};
pub use solver::{PreparedProblem, Solution, Solver};
