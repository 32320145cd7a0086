//! Plain-text rendering of expressions.
//!
//! The output re-parses to the same tree shape under `calc_parser`, which the
//! solver relies on when it converts printed results back into LaTeX.

use crate::{Constant, Context, Expr, ExprId};
use num_traits::{One, Signed};
use std::fmt;

pub struct DisplayExpr<'a> {
    pub context: &'a Context,
    pub id: ExprId,
}

const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_NEG: u8 = 3;
const PREC_POW: u8 = 4;
const PREC_ATOM: u8 = 5;

pub(crate) fn precedence(ctx: &Context, id: ExprId) -> u8 {
    match ctx.get(id) {
        Expr::Add(_, _) | Expr::Sub(_, _) => PREC_ADD,
        Expr::Mul(l, _) if is_minus_one(ctx, *l) => PREC_NEG,
        Expr::Mul(_, _) | Expr::Div(_, _) => PREC_MUL,
        Expr::Neg(_) => PREC_NEG,
        Expr::Number(n) if n.is_negative() => PREC_NEG,
        Expr::Number(n) if !n.is_integer() => PREC_MUL,
        Expr::Pow(_, _) => PREC_POW,
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) | Expr::Function(_, _) => {
            PREC_ATOM
        }
    }
}

fn is_minus_one(ctx: &Context, id: ExprId) -> bool {
    matches!(ctx.get(id), Expr::Number(n) if n.is_integer() && (-n).is_one())
}

/// True when the node prints with a leading minus sign.
pub(crate) fn is_negative_form(ctx: &Context, id: ExprId) -> bool {
    match ctx.get(id) {
        Expr::Number(n) => n.is_negative(),
        Expr::Neg(_) => true,
        Expr::Mul(l, _) => is_negative_form(ctx, *l),
        _ => false,
    }
}

impl<'a> DisplayExpr<'a> {
    fn child(&self, id: ExprId) -> DisplayExpr<'a> {
        DisplayExpr {
            context: self.context,
            id,
        }
    }

    fn write_wrapped(&self, f: &mut fmt::Formatter<'_>, id: ExprId, wrap: bool) -> fmt::Result {
        if wrap {
            write!(f, "({})", self.child(id))
        } else {
            write!(f, "{}", self.child(id))
        }
    }

    /// Writes `id` without its leading minus sign. Only valid when
    /// `is_negative_form(id)` holds.
    fn write_magnitude(&self, f: &mut fmt::Formatter<'_>, id: ExprId) -> fmt::Result {
        let ctx = self.context;
        match ctx.get(id) {
            Expr::Number(n) => write_number(f, &-n),
            Expr::Neg(inner) => {
                let wrap = precedence(ctx, *inner) <= PREC_ADD;
                self.write_wrapped(f, *inner, wrap)
            }
            Expr::Mul(l, r) => {
                if is_minus_one(ctx, *l) {
                    let wrap = precedence(ctx, *r) <= PREC_ADD;
                    return self.write_wrapped(f, *r, wrap);
                }
                self.write_magnitude(f, *l)?;
                write!(f, "*")?;
                let wrap = precedence(ctx, *r) < PREC_MUL || is_negative_form(ctx, *r);
                self.write_wrapped(f, *r, wrap)
            }
            _ => write!(f, "{}", self.child(id)),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: &num_rational::BigRational) -> fmt::Result {
    if n.is_integer() {
        write!(f, "{}", n.numer())
    } else {
        write!(f, "{}/{}", n.numer(), n.denom())
    }
}

impl<'a> fmt::Display for DisplayExpr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.context;
        match ctx.get(self.id) {
            Expr::Number(n) => write_number(f, n),
            Expr::Constant(c) => match c {
                Constant::Pi => write!(f, "pi"),
                Constant::E => write!(f, "e"),
                Constant::Infinity => write!(f, "oo"),
                Constant::Undefined => write!(f, "nan"),
            },
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Add(l, r) => {
                self.write_wrapped(f, *l, false)?;
                if is_negative_form(ctx, *r) {
                    write!(f, " - ")?;
                    self.write_magnitude(f, *r)
                } else {
                    write!(f, " + ")?;
                    self.write_wrapped(f, *r, false)
                }
            }
            Expr::Sub(l, r) => {
                self.write_wrapped(f, *l, false)?;
                write!(f, " - ")?;
                let wrap = precedence(ctx, *r) <= PREC_ADD || is_negative_form(ctx, *r);
                self.write_wrapped(f, *r, wrap)
            }
            Expr::Mul(l, r) => {
                if is_minus_one(ctx, *l) {
                    write!(f, "-")?;
                    let wrap = precedence(ctx, *r) < PREC_POW;
                    return self.write_wrapped(f, *r, wrap);
                }
                let wrap_l = precedence(ctx, *l) < PREC_MUL;
                self.write_wrapped(f, *l, wrap_l)?;
                write!(f, "*")?;
                let wrap_r = precedence(ctx, *r) <= PREC_MUL && !matches!(ctx.get(*r), Expr::Mul(_, _))
                    || is_negative_form(ctx, *r);
                self.write_wrapped(f, *r, wrap_r)
            }
            Expr::Div(l, r) => {
                let wrap_l = precedence(ctx, *l) < PREC_MUL;
                self.write_wrapped(f, *l, wrap_l)?;
                write!(f, "/")?;
                let wrap_r = precedence(ctx, *r) <= PREC_NEG;
                self.write_wrapped(f, *r, wrap_r)
            }
            Expr::Pow(b, e) => {
                let wrap_b = precedence(ctx, *b) <= PREC_POW;
                self.write_wrapped(f, *b, wrap_b)?;
                write!(f, "^")?;
                let wrap_e = precedence(ctx, *e) < PREC_ATOM;
                self.write_wrapped(f, *e, wrap_e)
            }
            Expr::Neg(inner) => {
                write!(f, "-")?;
                let p = precedence(ctx, *inner);
                self.write_wrapped(f, *inner, p <= PREC_ADD || p == PREC_NEG)
            }
            Expr::Function(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", self.child(*arg))?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(ctx: &Context, id: ExprId) -> String {
        DisplayExpr { context: ctx, id }.to_string()
    }

    #[test]
    fn test_display_sum_and_product() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let two = ctx.num(2);
        let one = ctx.num(1);
        let prod = ctx.add(Expr::Mul(two, x));
        let sum = ctx.add(Expr::Add(prod, one));
        assert_eq!(show(&ctx, sum), "2*x + 1");
    }

    #[test]
    fn test_display_negative_term_as_subtraction() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let m3 = ctx.num(-3);
        let sum = ctx.add(Expr::Add(x, m3));
        assert_eq!(show(&ctx, sum), "x - 3");

        let sin = ctx.call("sin", vec![x]);
        let neg_sin = ctx.add(Expr::Neg(sin));
        let sum = ctx.add(Expr::Add(x, neg_sin));
        assert_eq!(show(&ctx, sum), "x - sin(x)");
    }

    #[test]
    fn test_display_power_grouping() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let one = ctx.num(1);
        let half = ctx.rational(1, 2);
        let sum = ctx.add(Expr::Add(x, one));
        let pow = ctx.add(Expr::Pow(sum, half));
        assert_eq!(show(&ctx, pow), "(x + 1)^(1/2)");
    }

    #[test]
    fn test_display_minus_one_coefficient() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let m1 = ctx.num(-1);
        let cos = ctx.call("cos", vec![x]);
        let prod = ctx.add(Expr::Mul(m1, cos));
        assert_eq!(show(&ctx, prod), "-cos(x)");
    }

    #[test]
    fn test_display_constants() {
        let mut ctx = Context::new();
        let inf = ctx.constant(Constant::Infinity);
        let neg = ctx.add(Expr::Neg(inf));
        assert_eq!(show(&ctx, neg), "-oo");
        let pi = ctx.constant(Constant::Pi);
        assert_eq!(show(&ctx, pi), "pi");
    }
}
