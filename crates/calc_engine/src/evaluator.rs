//! Numeric evaluation of expressions using f64 values.
//!
//! The limit engine uses it to read the sign of an expression near a
//! point; it is also handy for checking rewrites numerically in tests.

use calc_ast::{Constant, Context, Expr, ExprId};
use num_traits::ToPrimitive;
use std::collections::HashMap;

const MAX_DEPTH: usize = 200;

/// Evaluate `expr` with the variables bound in `var_map`.
///
/// Returns `None` for unbound variables, unknown functions, `oo`/`nan`, and
/// any non-finite intermediate result.
pub fn eval_f64(ctx: &Context, expr: ExprId, var_map: &HashMap<String, f64>) -> Option<f64> {
    eval_f64_depth(ctx, expr, var_map, MAX_DEPTH)
}

fn eval_f64_depth(
    ctx: &Context,
    expr: ExprId,
    var_map: &HashMap<String, f64>,
    depth: usize,
) -> Option<f64> {
    if depth == 0 {
        return None;
    }
    let eval = |id: ExprId| eval_f64_depth(ctx, id, var_map, depth - 1);

    let value = match ctx.get(expr) {
        Expr::Number(n) => n.to_f64()?,
        Expr::Variable(name) => *var_map.get(name)?,
        Expr::Constant(Constant::Pi) => std::f64::consts::PI,
        Expr::Constant(Constant::E) => std::f64::consts::E,
        Expr::Constant(Constant::Infinity | Constant::Undefined) => return None,
        Expr::Add(l, r) => eval(*l)? + eval(*r)?,
        Expr::Sub(l, r) => eval(*l)? - eval(*r)?,
        Expr::Mul(l, r) => eval(*l)? * eval(*r)?,
        Expr::Div(l, r) => {
            let den = eval(*r)?;
            if den == 0.0 {
                return None;
            }
            eval(*l)? / den
        }
        Expr::Pow(b, e) => {
            let base = eval(*b)?;
            let exp = eval(*e)?;
            if base < 0.0 && exp.fract() != 0.0 {
                return None;
            }
            base.powf(exp)
        }
        Expr::Neg(inner) => -eval(*inner)?,
        Expr::Function(name, args) => {
            let values: Option<Vec<f64>> = args.iter().map(|a| eval(*a)).collect();
            eval_function(name, &values?)?
        }
    };

    value.is_finite().then_some(value)
}

fn eval_function(name: &str, args: &[f64]) -> Option<f64> {
    match (name, args) {
        ("sin", [a]) => Some(a.sin()),
        ("cos", [a]) => Some(a.cos()),
        ("tan", [a]) => Some(a.tan()),
        ("asin", [a]) if a.abs() <= 1.0 => Some(a.asin()),
        ("acos", [a]) if a.abs() <= 1.0 => Some(a.acos()),
        ("atan", [a]) => Some(a.atan()),
        ("sinh", [a]) => Some(a.sinh()),
        ("cosh", [a]) => Some(a.cosh()),
        ("tanh", [a]) => Some(a.tanh()),
        ("exp", [a]) => Some(a.exp()),
        ("log" | "ln", [a]) if *a > 0.0 => Some(a.ln()),
        ("log", [a, b]) if *a > 0.0 && *b > 0.0 && *b != 1.0 => Some(a.ln() / b.ln()),
        ("sqrt", [a]) if *a >= 0.0 => Some(a.sqrt()),
        ("abs", [a]) => Some(a.abs()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calc_parser::parse;

    fn eval_at(input: &str, x: f64) -> Option<f64> {
        let mut ctx = Context::new();
        let expr = parse(input, &mut ctx).unwrap();
        let vars = HashMap::from([("x".to_string(), x)]);
        eval_f64(&ctx, expr, &vars)
    }

    #[test]
    fn test_polynomial() {
        assert_eq!(eval_at("x^2 + 2*x + 1", 2.0), Some(9.0));
    }

    #[test]
    fn test_functions_and_constants() {
        let v = eval_at("sin(pi/2) + log(e)", 0.0).unwrap();
        assert!((v - 2.0).abs() < 1e-12);
        let v = eval_at("sqrt(x)*exp(0)", 4.0).unwrap();
        assert!((v - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_points() {
        assert_eq!(eval_at("1/x", 0.0), None);
        assert_eq!(eval_at("log(x)", -1.0), None);
        assert_eq!(eval_at("sqrt(x)", -4.0), None);
        assert_eq!(eval_at("oo", 0.0), None);
        assert_eq!(eval_at("y + 1", 0.0), None);
    }
}
