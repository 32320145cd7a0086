//! LaTeX expression rendering
//!
//! `LaTeXRenderer` carries the recursive walk; implementors only provide the
//! context and the root id, and may override individual node formats.

use crate::latex_core::{
    clean_latex_negatives, render_add, render_constant, render_div, render_function, render_neg,
    render_number, render_sub,
};
use crate::{Constant, Context, Expr, ExprId};
use num_bigint::BigInt;
use num_traits::{One, Signed};

pub trait LaTeXRenderer {
    fn context(&self) -> &Context;

    fn root_id(&self) -> ExprId;

    fn to_latex(&self) -> String {
        clean_latex_negatives(&self.expr_to_latex(self.root_id(), false))
    }

    /// Render `id`; when `parens` is set, sums and negations are grouped.
    fn expr_to_latex(&self, id: ExprId, parens: bool) -> String {
        let ctx = self.context();
        let latex = match ctx.get(id) {
            Expr::Number(n) => render_number(n),
            Expr::Constant(c) => render_constant(c),
            Expr::Variable(name) => name.clone(),
            Expr::Add(l, r) => render_add(
                ctx,
                *l,
                *r,
                |e, p| self.expr_to_latex(e, p),
                |e| self.mul_operand(e, false),
            ),
            Expr::Sub(l, r) => render_sub(*l, *r, |e, p| self.expr_to_latex(e, p)),
            Expr::Mul(l, r) => self.format_mul(*l, *r),
            Expr::Div(l, r) => render_div(ctx, *l, *r, |e, p| self.expr_to_latex(e, p)),
            Expr::Pow(b, e) => self.format_pow(*b, *e),
            Expr::Neg(e) => render_neg(*e, |e, p| self.expr_to_latex(e, p)),
            Expr::Function(name, args) => {
                render_function(name, args, |e, p| self.expr_to_latex(e, p))
            }
        };

        let grouped = matches!(
            ctx.get(id),
            Expr::Add(_, _) | Expr::Sub(_, _) | Expr::Neg(_)
        ) || matches!(ctx.get(id), Expr::Number(n) if n.is_negative());

        if parens && grouped {
            format!("\\left({}\\right)", latex)
        } else {
            latex
        }
    }

    /// Render a factor of a product. Right-hand negative factors are grouped
    /// so `x \cdot -2` never appears.
    fn mul_operand(&self, id: ExprId, right: bool) -> String {
        let ctx = self.context();
        match ctx.get(id) {
            Expr::Add(_, _) | Expr::Sub(_, _) => self.expr_to_latex(id, true),
            Expr::Neg(_) if right => self.expr_to_latex(id, true),
            Expr::Number(n) if right && n.is_negative() => self.expr_to_latex(id, true),
            _ => self.expr_to_latex(id, false),
        }
    }

    fn format_mul(&self, l: ExprId, r: ExprId) -> String {
        let ctx = self.context();
        if let Expr::Number(n) = ctx.get(l) {
            if n.is_negative() && (-n).is_one() {
                return format!("-{}", self.mul_operand(r, true));
            }
        }
        format!(
            "{} \\cdot {}",
            self.mul_operand(l, false),
            self.mul_operand(r, true)
        )
    }

    fn format_pow(&self, base: ExprId, exp: ExprId) -> String {
        let ctx = self.context();

        if let Expr::Number(n) = ctx.get(exp) {
            if n.is_one() {
                return self.expr_to_latex(base, false);
            }
            if !n.is_integer() && n.numer().is_one() && *n.denom() == BigInt::from(2) {
                return format!("\\sqrt{{{}}}", self.expr_to_latex(base, false));
            }
        }

        if let Expr::Constant(Constant::E) = ctx.get(base) {
            return format!("e^{{{}}}", self.expr_to_latex(exp, false));
        }

        let base_str = self.expr_to_latex_base(base);
        let exp_str = self.expr_to_latex(exp, false);
        format!("{{{}}}^{{{}}}", base_str, exp_str)
    }

    /// Power bases other than atoms and function calls get parentheses.
    fn expr_to_latex_base(&self, id: ExprId) -> String {
        let ctx = self.context();
        let atomic = match ctx.get(id) {
            Expr::Number(n) => n.is_integer() && !n.is_negative(),
            Expr::Constant(_) | Expr::Variable(_) => true,
            Expr::Function(name, _) => name != "exp",
            _ => false,
        };
        let inner = self.expr_to_latex(id, false);
        if atomic {
            inner
        } else {
            format!("\\left({}\\right)", inner)
        }
    }
}

/// Converts an expression to LaTeX format for rendering with MathJax
pub struct LaTeXExpr<'a> {
    pub context: &'a Context,
    pub id: ExprId,
}

impl<'a> LaTeXRenderer for LaTeXExpr<'a> {
    fn context(&self) -> &Context {
        self.context
    }

    fn root_id(&self) -> ExprId {
        self.id
    }
}

impl<'a> LaTeXExpr<'a> {
    pub fn to_latex(&self) -> String {
        LaTeXRenderer::to_latex(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;

    fn latex(ctx: &Context, id: ExprId) -> String {
        LaTeXExpr { context: ctx, id }.to_latex()
    }

    #[test]
    fn test_latex_basic() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let two = ctx.num(2);
        let expr = ctx.add(Expr::Mul(two, x));
        assert_eq!(latex(&ctx, expr), "2 \\cdot x");
    }

    #[test]
    fn test_latex_fraction() {
        let mut ctx = Context::new();
        let one = ctx.num(1);
        let two = ctx.num(2);
        let frac = ctx.add(Expr::Div(one, two));
        assert_eq!(latex(&ctx, frac), "\\frac{1}{2}");
    }

    #[test]
    fn test_latex_power() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let two = ctx.num(2);
        let power = ctx.add(Expr::Pow(x, two));
        assert_eq!(latex(&ctx, power), "{x}^{2}");
    }

    #[test]
    fn test_latex_sqrt_from_power() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let half = ctx.rational(1, 2);
        let sqrt_expr = ctx.add(Expr::Pow(x, half));
        assert_eq!(latex(&ctx, sqrt_expr), "\\sqrt{x}");
    }

    #[test]
    fn test_latex_negative_term() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let sin = ctx.call("sin", vec![x]);
        let m1 = ctx.num(-1);
        let neg_sin = ctx.add(Expr::Mul(m1, sin));
        let sum = ctx.add(Expr::Add(x, neg_sin));
        assert_eq!(latex(&ctx, sum), "x - \\sin\\left(x\\right)");
    }

    #[test]
    fn test_latex_grouped_base() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let one = ctx.num(1);
        let three = ctx.num(3);
        let sum = ctx.add(Expr::Add(x, one));
        let pow = ctx.add(Expr::Pow(sum, three));
        assert_eq!(latex(&ctx, pow), "{\\left(x + 1\\right)}^{3}");
    }
}
