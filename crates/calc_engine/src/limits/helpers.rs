//! Helper functions for limit computation.

use calc_ast::{contains_named_var, Constant, Context, Expr, ExprId};
use std::collections::HashMap;

use crate::canonical::normalize;
use crate::evaluator::eval_f64;
use crate::helpers::{is_zero, mk_infinity, InfSign};

use super::types::{Approach, LimitValue};

/// Offsets tried, nearest first, when probing a sign right of a point.
const POINT_OFFSETS: [f64; 3] = [1e-6, 1e-4, 1e-2];

/// Magnitudes tried, smallest first, when probing a sign towards ±∞.
/// Large values overflow `exp`, so several are kept.
const FAR_POINTS: [f64; 3] = [1e3, 1e2, 30.0];

pub fn depends_on(ctx: &Context, expr: ExprId, var: &str) -> bool {
    contains_named_var(ctx, expr, var)
}

/// The point an approach tends to, as an expression (`oo`, `-oo`, `a`).
pub fn approach_point(ctx: &mut Context, approach: Approach) -> ExprId {
    match approach {
        Approach::PosInfinity => mk_infinity(ctx, InfSign::Pos),
        Approach::NegInfinity => mk_infinity(ctx, InfSign::Neg),
        Approach::Point(a) => a,
    }
}

/// Residual `limit(expr, var, point)`.
pub fn mk_limit(ctx: &mut Context, expr: ExprId, var: &str, approach: Approach) -> ExprId {
    let var_expr = ctx.var(var);
    let point = approach_point(ctx, approach);
    ctx.call("limit", vec![expr, var_expr, point])
}

pub(crate) fn value_to_expr(ctx: &mut Context, value: LimitValue) -> ExprId {
    match value {
        LimitValue::Finite(e) => normalize(ctx, e),
        LimitValue::Infinite(sign) => mk_infinity(ctx, sign),
    }
}

/// True when a finite limit value is exactly zero.
pub(crate) fn is_zero_value(ctx: &mut Context, value: ExprId) -> bool {
    let v = normalize(ctx, value);
    is_zero(ctx, v)
}

/// Sign of a closed numeric expression; `None` for zero or symbolic values.
pub(crate) fn finite_sign(ctx: &Context, value: ExprId) -> Option<InfSign> {
    let v = eval_f64(ctx, value, &HashMap::new())?;
    if v > 0.0 {
        Some(InfSign::Pos)
    } else if v < 0.0 {
        Some(InfSign::Neg)
    } else {
        None
    }
}

/// Sign of `expr` just inside the approach: right of the point, or far out
/// towards the infinity.
pub(crate) fn sample_sign(
    ctx: &Context,
    expr: ExprId,
    var: &str,
    approach: Approach,
) -> Option<InfSign> {
    let samples: Vec<f64> = match approach {
        Approach::PosInfinity => FAR_POINTS.to_vec(),
        Approach::NegInfinity => FAR_POINTS.iter().map(|p| -p).collect(),
        Approach::Point(a) => {
            let a = eval_f64(ctx, a, &HashMap::new())?;
            POINT_OFFSETS.iter().map(|h| a + h).collect()
        }
    };
    samples.into_iter().find_map(|x| {
        let vars = HashMap::from([(var.to_string(), x)]);
        let v = eval_f64(ctx, expr, &vars)?;
        if v > 0.0 {
            Some(InfSign::Pos)
        } else if v < 0.0 {
            Some(InfSign::Neg)
        } else {
            None
        }
    })
}

/// `e` raised to a limit value.
pub(crate) fn exp_of(ctx: &mut Context, value: LimitValue) -> LimitValue {
    match value {
        LimitValue::Finite(v) => {
            let e = ctx.constant(Constant::E);
            LimitValue::Finite(ctx.add(Expr::Pow(e, v)))
        }
        LimitValue::Infinite(InfSign::Pos) => LimitValue::Infinite(InfSign::Pos),
        LimitValue::Infinite(InfSign::Neg) => LimitValue::Finite(ctx.num(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calc_ast::DisplayExpr;
    use calc_parser::parse;

    #[test]
    fn test_mk_limit_residual() {
        let mut ctx = Context::new();
        let expr = parse("sin(x)", &mut ctx).unwrap();
        let residual = mk_limit(&mut ctx, expr, "x", Approach::NegInfinity);
        assert_eq!(
            DisplayExpr {
                context: &ctx,
                id: residual
            }
            .to_string(),
            "limit(sin(x), x, -oo)"
        );
    }

    #[test]
    fn test_sample_sign() {
        let mut ctx = Context::new();
        let expr = parse("1/x", &mut ctx).unwrap();
        let zero = ctx.num(0);
        assert_eq!(
            sample_sign(&ctx, expr, "x", Approach::Point(zero)),
            Some(InfSign::Pos)
        );
        assert_eq!(
            sample_sign(&ctx, expr, "x", Approach::NegInfinity),
            Some(InfSign::Neg)
        );
    }
}
