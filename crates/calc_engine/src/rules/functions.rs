use crate::rule::Rewrite;
use calc_ast::{Constant, Context, DisplayExpr, Expr, ExprId};
use num_traits::{One, Signed, Zero};

/// Closed-form values of elementary functions at special arguments, and the
/// `log`/`exp` inverse pair. Returns `None` when nothing applies.
pub fn eval_special(ctx: &mut Context, name: &str, args: &[ExprId]) -> Option<ExprId> {
    if name == "log" && args.len() == 2 {
        // log(u, b) = log(u) / log(b)
        let ln_u = ctx.call("log", vec![args[0]]);
        let ln_b = ctx.call("log", vec![args[1]]);
        return Some(ctx.add(Expr::Div(ln_u, ln_b)));
    }

    let [arg] = args else {
        return None;
    };
    let arg = *arg;

    match ctx.get(arg).clone() {
        Expr::Number(n) if n.is_zero() => match name {
            "sin" | "tan" | "asin" | "atan" | "sinh" | "tanh" => Some(ctx.num(0)),
            "cos" | "cosh" | "exp" => Some(ctx.num(1)),
            "acos" => Some(pi_over(ctx, 2)),
            "abs" => Some(arg),
            _ => None,
        },
        Expr::Number(n) if n.is_one() => match name {
            "log" | "acos" => Some(ctx.num(0)),
            "asin" => Some(pi_over(ctx, 2)),
            "atan" => Some(pi_over(ctx, 4)),
            "abs" => Some(arg),
            _ => None,
        },
        Expr::Number(n) if name == "abs" => Some(ctx.number(n.abs())),
        Expr::Constant(Constant::E) if name == "log" => Some(ctx.num(1)),
        Expr::Constant(Constant::Pi) => match name {
            "sin" | "tan" => Some(ctx.num(0)),
            "cos" => Some(ctx.num(-1)),
            "abs" => Some(arg),
            _ => None,
        },
        Expr::Constant(Constant::E) if name == "abs" => Some(arg),
        Expr::Function(inner, inner_args) if name == "log" && inner == "exp" => {
            // log(exp(u)) = u
            inner_args.first().copied()
        }
        Expr::Function(inner, inner_args) if name == "abs" && inner == "abs" => {
            Some(ctx.call("abs", inner_args))
        }
        _ => None,
    }
}

fn pi_over(ctx: &mut Context, k: i64) -> ExprId {
    let pi = ctx.constant(Constant::Pi);
    let den = ctx.num(k);
    ctx.add(Expr::Div(pi, den))
}

define_rule!(
    EvaluateFunctionRule,
    "Evaluate Function",
    Some(vec!["Function"]),
    |ctx, expr| {
        let Expr::Function(name, args) = ctx.get(expr).clone() else {
            return None;
        };
        let value = eval_special(ctx, &name, &args)?;
        let description = format!(
            "{} = {}",
            DisplayExpr { context: ctx, id: expr },
            DisplayExpr { context: ctx, id: value }
        );
        Some(Rewrite::simple(value, description))
    }
);

pub fn register(simplifier: &mut crate::Simplifier) {
    simplifier.add_rule(Box::new(EvaluateFunctionRule));
}
