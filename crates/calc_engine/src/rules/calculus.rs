use crate::budget::Budget;
use crate::calculus::{differentiate, integrate};
use crate::canonical::normalize;
use crate::helpers::{get_integer, inf_sign, InfSign};
use crate::limits::{limit, Approach, LimitOptions};
use crate::rule::Rewrite;
use calc_ast::{Context, DisplayExpr, Expr, ExprId};
use tracing::debug;

/// Highest order accepted in `diff(f, x, n)`.
const MAX_DIFF_ORDER: i64 = 10;

fn variable_name(ctx: &Context, id: ExprId) -> Option<String> {
    match ctx.get(id) {
        Expr::Variable(name) => Some(name.clone()),
        _ => None,
    }
}

fn show(ctx: &Context, id: ExprId) -> DisplayExpr<'_> {
    DisplayExpr { context: ctx, id }
}

define_rule!(
    IntegrateRule,
    "Symbolic Integration",
    Some(vec!["Function"]),
    |ctx, expr| {
        let Expr::Function(name, args) = ctx.get(expr).clone() else {
            return None;
        };
        if name != "integrate" {
            return None;
        }
        let (integrand, var) = match args.as_slice() {
            [f, v] => (*f, variable_name(ctx, *v)?),
            [f] => (*f, "x".to_string()),
            _ => return None,
        };
        let integrand = normalize(ctx, integrand);
        let Some(result) = integrate(ctx, integrand, &var) else {
            debug!(integrand = %show(ctx, integrand), "no antiderivative found");
            return None;
        };
        let description = format!(
            "integrate({}, {}) = {}",
            show(ctx, integrand),
            var,
            show(ctx, result)
        );
        Some(Rewrite::simple(result, description))
    }
);

define_rule!(
    DiffRule,
    "Symbolic Differentiation",
    Some(vec!["Function"]),
    |ctx, expr| {
        let Expr::Function(name, args) = ctx.get(expr).clone() else {
            return None;
        };
        if name != "diff" {
            return None;
        }
        let (target, var, order) = match args.as_slice() {
            [f, v] => (*f, variable_name(ctx, *v)?, 1),
            [f, v, n] => (*f, variable_name(ctx, *v)?, get_integer(ctx, *n)?),
            _ => return None,
        };
        if !(1..=MAX_DIFF_ORDER).contains(&order) {
            return None;
        }
        let mut result = target;
        for _ in 0..order {
            let raw = differentiate(ctx, result, &var)?;
            result = normalize(ctx, raw);
        }
        let description = format!(
            "diff({}, {}) = {}",
            show(ctx, target),
            var,
            show(ctx, result)
        );
        Some(Rewrite::simple(result, description))
    }
);

define_rule!(LimitRule, "Limit", Some(vec!["Function"]), |ctx, expr| {
    let Expr::Function(name, args) = ctx.get(expr).clone() else {
        return None;
    };
    if name != "limit" {
        return None;
    }
    let [f, v, point] = args.as_slice() else {
        return None;
    };
    let var = variable_name(ctx, *v)?;
    let approach = match inf_sign(ctx, *point) {
        Some(InfSign::Pos) => Approach::PosInfinity,
        Some(InfSign::Neg) => Approach::NegInfinity,
        None => Approach::Point(normalize(ctx, *point)),
    };

    let mut budget = Budget::with_defaults();
    match limit(ctx, *f, &var, approach, &LimitOptions::default(), &mut budget) {
        Ok(result) if result.warning.is_none() => {
            let description = format!(
                "limit({}, {}, {}) = {}",
                show(ctx, *f),
                var,
                show(ctx, *point),
                show(ctx, result.expr)
            );
            Some(Rewrite::simple(result.expr, description))
        }
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "limit aborted");
            None
        }
    }
});

pub fn register(simplifier: &mut crate::Simplifier) {
    simplifier.add_rule(Box::new(DiffRule));
    simplifier.add_rule(Box::new(IntegrateRule));
    simplifier.add_rule(Box::new(LimitRule));
}
