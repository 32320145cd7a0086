pub mod display;
pub mod expression;
pub mod latex;
pub mod latex_core;
pub mod ordering;
pub mod traversal;

pub use display::DisplayExpr;
pub use expression::{Constant, Context, Expr, ExprId};
pub use latex::{LaTeXExpr, LaTeXRenderer};
pub use ordering::{compare_expr, expr_eq};
pub use traversal::{collect_functions, collect_variables, contains_named_var};
