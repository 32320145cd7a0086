use calc_ast::{Constant, Context, Expr, ExprId};
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Sign of an infinite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfSign {
    Pos,
    Neg,
}

impl InfSign {
    pub fn flip(self) -> Self {
        match self {
            InfSign::Pos => InfSign::Neg,
            InfSign::Neg => InfSign::Pos,
        }
    }
}

/// Integer value of a number node.
pub fn get_integer(ctx: &Context, expr: ExprId) -> Option<i64> {
    match ctx.get(expr) {
        Expr::Number(n) if n.is_integer() => n.to_integer().to_i64(),
        _ => None,
    }
}

pub fn is_zero(ctx: &Context, expr: ExprId) -> bool {
    matches!(ctx.get(expr), Expr::Number(n) if n.is_zero())
}

pub fn is_one(ctx: &Context, expr: ExprId) -> bool {
    matches!(ctx.get(expr), Expr::Number(n) if n.is_one())
}

/// Detect ±∞ in either of the shapes the engine produces:
/// `oo`, `-oo` as `Neg(oo)`, or `-1*oo` from the canonical pass.
pub fn inf_sign(ctx: &Context, id: ExprId) -> Option<InfSign> {
    match ctx.get(id) {
        Expr::Constant(Constant::Infinity) => Some(InfSign::Pos),
        Expr::Neg(inner) => inf_sign(ctx, *inner).map(InfSign::flip),
        Expr::Mul(l, r) => match ctx.get(*l) {
            Expr::Number(n) if !n.is_zero() => {
                let sign = inf_sign(ctx, *r)?;
                Some(if n.is_negative() { sign.flip() } else { sign })
            }
            _ => None,
        },
        _ => None,
    }
}

pub fn mk_infinity(ctx: &mut Context, sign: InfSign) -> ExprId {
    let inf = ctx.add(Expr::Constant(Constant::Infinity));
    match sign {
        InfSign::Pos => inf,
        InfSign::Neg => ctx.add(Expr::Neg(inf)),
    }
}

/// True when `oo` or `nan` appears anywhere in the tree.
pub fn contains_non_finite(ctx: &Context, expr: ExprId) -> bool {
    let mut stack = vec![expr];
    while let Some(current) = stack.pop() {
        match ctx.get(current) {
            Expr::Constant(Constant::Infinity | Constant::Undefined) => return true,
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Pow(l, r) => {
                stack.push(*l);
                stack.push(*r);
            }
            Expr::Neg(inner) => stack.push(*inner),
            Expr::Function(_, args) => stack.extend(args.iter().copied()),
            Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => {}
        }
    }
    false
}

/// Replace every occurrence of variable `var` with `value`.
pub fn substitute_var(ctx: &mut Context, expr: ExprId, var: &str, value: ExprId) -> ExprId {
    match ctx.get(expr).clone() {
        Expr::Variable(v) if v == var => value,
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => expr,
        Expr::Add(l, r) => {
            let (nl, nr) = substitute_pair(ctx, l, r, var, value);
            ctx.add(Expr::Add(nl, nr))
        }
        Expr::Sub(l, r) => {
            let (nl, nr) = substitute_pair(ctx, l, r, var, value);
            ctx.add(Expr::Sub(nl, nr))
        }
        Expr::Mul(l, r) => {
            let (nl, nr) = substitute_pair(ctx, l, r, var, value);
            ctx.add(Expr::Mul(nl, nr))
        }
        Expr::Div(l, r) => {
            let (nl, nr) = substitute_pair(ctx, l, r, var, value);
            ctx.add(Expr::Div(nl, nr))
        }
        Expr::Pow(b, e) => {
            let (nb, ne) = substitute_pair(ctx, b, e, var, value);
            ctx.add(Expr::Pow(nb, ne))
        }
        Expr::Neg(inner) => {
            let ni = substitute_var(ctx, inner, var, value);
            ctx.add(Expr::Neg(ni))
        }
        Expr::Function(name, args) => {
            let new_args = args
                .iter()
                .map(|a| substitute_var(ctx, *a, var, value))
                .collect();
            ctx.add(Expr::Function(name, new_args))
        }
    }
}

fn substitute_pair(
    ctx: &mut Context,
    l: ExprId,
    r: ExprId,
    var: &str,
    value: ExprId,
) -> (ExprId, ExprId) {
    let nl = substitute_var(ctx, l, var, value);
    let nr = substitute_var(ctx, r, var, value);
    (nl, nr)
}
