//! Limit computation engine.
//!
//! Entry point for computing limits with conservative policy.

use calc_ast::{Constant, Context, DisplayExpr, Expr, ExprId};
use tracing::debug;

use crate::canonical::normalize;
use crate::{Budget, CasError, Step};

use super::helpers::{approach_point, mk_limit, value_to_expr};
use super::rules::Limiter;
use super::types::{Approach, LimitOptions, LimitResult};

/// Compute the limit of `expr` as `var` follows `approach`.
///
/// Point limits are taken from the right. Unresolved limits come back as
/// the residual `limit(expr, var, point)` with a warning; only an exhausted
/// budget is an error.
///
/// ```ignore
/// let result = limit(
///     ctx,
///     expr,
///     "x",
///     Approach::PosInfinity,
///     &LimitOptions::default(),
///     &mut budget,
/// )?;
/// ```
pub fn limit(
    ctx: &mut Context,
    expr: ExprId,
    var: &str,
    approach: Approach,
    opts: &LimitOptions,
    budget: &mut Budget,
) -> Result<LimitResult, CasError> {
    let normalized = normalize(ctx, expr);

    let value = Limiter::new(var, approach, budget).limit_of(ctx, normalized, 0)?;

    if let Some(value) = value {
        let result = value_to_expr(ctx, value);
        if !matches!(ctx.get(result), Expr::Constant(Constant::Undefined)) {
            let mut steps = Vec::new();
            if opts.steps {
                let point = approach_point(ctx, approach);
                let description = format!(
                    "lim {} -> {} of {}",
                    var,
                    DisplayExpr {
                        context: ctx,
                        id: point
                    },
                    DisplayExpr {
                        context: ctx,
                        id: expr
                    }
                );
                steps.push(Step::new(&description, "Limit", expr, result, Some(ctx)));
            }
            return Ok(LimitResult {
                expr: result,
                steps,
                warning: None,
            });
        }
    }

    debug!(var, "limit left unevaluated");
    let residual = mk_limit(ctx, expr, var, approach);
    Ok(LimitResult {
        expr: residual,
        steps: Vec::new(),
        warning: Some("Could not determine limit safely".to_string()),
    })
}
