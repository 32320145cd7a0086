//! Read-only tree walks.
//!
//! All walks use an explicit stack so deep expressions cannot overflow.

use crate::{Context, Expr, ExprId};
use std::collections::BTreeSet;

fn children(ctx: &Context, id: ExprId, stack: &mut Vec<ExprId>) {
    match ctx.get(id) {
        Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r) | Expr::Pow(l, r) => {
            stack.push(*l);
            stack.push(*r);
        }
        Expr::Neg(inner) => stack.push(*inner),
        Expr::Function(_, args) => stack.extend(args.iter().copied()),
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => {}
    }
}

/// Check if an expression mentions the variable `var`.
pub fn contains_named_var(ctx: &Context, expr: ExprId, var: &str) -> bool {
    let mut stack = vec![expr];
    while let Some(current) = stack.pop() {
        if let Expr::Variable(name) = ctx.get(current) {
            if name == var {
                return true;
            }
        }
        children(ctx, current, &mut stack);
    }
    false
}

/// Names of all free variables, sorted.
pub fn collect_variables(ctx: &Context, expr: ExprId) -> BTreeSet<String> {
    let mut vars = BTreeSet::new();
    let mut stack = vec![expr];
    while let Some(current) = stack.pop() {
        if let Expr::Variable(name) = ctx.get(current) {
            vars.insert(name.clone());
        }
        children(ctx, current, &mut stack);
    }
    vars
}

/// Names of all called functions, sorted.
pub fn collect_functions(ctx: &Context, expr: ExprId) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut stack = vec![expr];
    while let Some(current) = stack.pop() {
        if let Expr::Function(name, _) = ctx.get(current) {
            names.insert(name.clone());
        }
        children(ctx, current, &mut stack);
    }
    names
}
