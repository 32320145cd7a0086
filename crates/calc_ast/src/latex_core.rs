//! Core LaTeX rendering helpers shared by the LaTeX renderers.
//!
//! Everything here produces MathJax-compatible markup.

use crate::{Constant, Context, Expr, ExprId};
use num_rational::BigRational;
use num_traits::{One, Signed};

/// Post-process LaTeX to fix negative sign patterns
/// Handles cases like "+ -" → "-" and "- -" → "+"
pub fn clean_latex_negatives(latex: &str) -> String {
    let result = latex.replace("+ -", "- ");
    result.replace("- -", "+ ")
}

/// Render a rational number as LaTeX
/// Negative fractions are rendered as -\frac{a}{b} instead of \frac{-a}{b}
pub fn render_number(n: &BigRational) -> String {
    if n.is_integer() {
        format!("{}", n.numer())
    } else if n.is_negative() {
        let positive = -n;
        format!("-\\frac{{{}}}{{{}}}", positive.numer(), positive.denom())
    } else {
        format!("\\frac{{{}}}{{{}}}", n.numer(), n.denom())
    }
}

pub fn render_constant(c: &Constant) -> String {
    match c {
        Constant::Pi => "\\pi".to_string(),
        Constant::E => "e".to_string(),
        Constant::Infinity => "\\infty".to_string(),
        Constant::Undefined => "\\text{undefined}".to_string(),
    }
}

/// Render a Div expression, handling negative numerators properly
pub fn render_div<F>(ctx: &Context, l: ExprId, r: ExprId, render_fn: F) -> String
where
    F: Fn(ExprId, bool) -> String,
{
    match ctx.get(l) {
        Expr::Neg(inner) => {
            let numer = render_fn(*inner, false);
            let denom = render_fn(r, false);
            format!("-\\frac{{{}}}{{{}}}", numer, denom)
        }
        Expr::Number(n) if n.is_negative() => {
            let numer = render_number(&-n);
            let denom = render_fn(r, false);
            format!("-\\frac{{{}}}{{{}}}", numer, denom)
        }
        _ => {
            let numer = render_fn(l, false);
            let denom = render_fn(r, false);
            format!("\\frac{{{}}}{{{}}}", numer, denom)
        }
    }
}

/// Render addition, detecting negative right operand to show as subtraction
pub fn render_add<F, G>(
    ctx: &Context,
    l: ExprId,
    r: ExprId,
    render_fn: F,
    render_mul_fn: G,
) -> String
where
    F: Fn(ExprId, bool) -> String,
    G: Fn(ExprId) -> String,
{
    let left = render_fn(l, false);

    let (is_negative, right_str) = match ctx.get(r) {
        Expr::Number(n) if n.is_negative() => (true, render_number(&-n)),
        Expr::Neg(inner) => (true, render_fn(*inner, true)),
        Expr::Mul(ml, mr) => match ctx.get(*ml) {
            Expr::Number(coef) if coef.is_negative() => {
                let positive_coef = -coef;
                let rest_latex = render_mul_fn(*mr);
                if positive_coef.is_one() {
                    (true, rest_latex)
                } else {
                    (
                        true,
                        format!("{} \\cdot {}", render_number(&positive_coef), rest_latex),
                    )
                }
            }
            _ => (false, render_fn(r, false)),
        },
        _ => (false, render_fn(r, false)),
    };

    if is_negative {
        format!("{} - {}", left, right_str)
    } else {
        format!("{} + {}", left, right_str)
    }
}

pub fn render_sub<F>(l: ExprId, r: ExprId, render_fn: F) -> String
where
    F: Fn(ExprId, bool) -> String,
{
    let left = render_fn(l, false);
    let right = render_fn(r, true);
    format!("{} - {}", left, right)
}

pub fn render_neg<F>(e: ExprId, render_fn: F) -> String
where
    F: Fn(ExprId, bool) -> String,
{
    let inner = render_fn(e, true);
    format!("-{}", inner)
}

fn join_args<F>(args: &[ExprId], render_fn: &F) -> String
where
    F: Fn(ExprId, bool) -> String,
{
    args.iter()
        .map(|a| render_fn(*a, false))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render named functions, including the residual calculus operators
/// `diff`, `integrate` and `limit`.
pub fn render_function<F>(name: &str, args: &[ExprId], render_fn: F) -> String
where
    F: Fn(ExprId, bool) -> String,
{
    match (name, args.len()) {
        ("sin" | "cos" | "tan" | "sinh" | "cosh" | "tanh", 1) => {
            format!("\\{}\\left({}\\right)", name, render_fn(args[0], false))
        }
        ("asin" | "acos" | "atan", 1) => {
            // asin -> \arcsin
            format!(
                "\\arc{}\\left({}\\right)",
                &name[1..],
                render_fn(args[0], false)
            )
        }
        ("log", 1) => format!("\\log\\left({}\\right)", render_fn(args[0], false)),
        ("ln", 1) => format!("\\ln\\left({}\\right)", render_fn(args[0], false)),
        ("log", 2) => format!(
            "\\log_{{{}}}\\left({}\\right)",
            render_fn(args[1], false),
            render_fn(args[0], false)
        ),
        ("exp", 1) => format!("e^{{{}}}", render_fn(args[0], false)),
        ("sqrt", 1) => format!("\\sqrt{{{}}}", render_fn(args[0], false)),
        ("sqrt", 2) => format!(
            "\\sqrt[{}]{{{}}}",
            render_fn(args[1], false),
            render_fn(args[0], false)
        ),
        ("abs", 1) => format!("\\left|{}\\right|", render_fn(args[0], false)),
        ("diff", 2) => format!(
            "\\frac{{d}}{{d{}}}\\left({}\\right)",
            render_fn(args[1], false),
            render_fn(args[0], false)
        ),
        ("integrate", 2) => format!(
            "\\int {} \\, d{}",
            render_fn(args[0], false),
            render_fn(args[1], false)
        ),
        ("limit", 3) => format!(
            "\\lim_{{{} \\to {}}} {}",
            render_fn(args[1], false),
            render_fn(args[2], false),
            render_fn(args[0], true)
        ),
        _ => format!("\\text{{{}}}\\left({}\\right)", name, join_args(args, &render_fn)),
    }
}
