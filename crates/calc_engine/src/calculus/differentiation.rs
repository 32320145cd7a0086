use calc_ast::{contains_named_var, Constant, Context, Expr, ExprId};

/// Symbolic derivative of `expr` with respect to `var`.
///
/// The result is raw (unsimplified); callers run it through the canonical
/// pass. Returns `None` when an unknown function of `var` is met.
pub fn differentiate(ctx: &mut Context, expr: ExprId, var: &str) -> Option<ExprId> {
    if contains_undefined(ctx, expr) {
        return Some(ctx.constant(Constant::Undefined));
    }
    // Constant Rule: diff(c, x) = 0
    if !contains_named_var(ctx, expr, var) {
        return Some(ctx.num(0));
    }

    match ctx.get(expr).clone() {
        Expr::Variable(_) => Some(ctx.num(1)),
        Expr::Add(l, r) => {
            let dl = differentiate(ctx, l, var)?;
            let dr = differentiate(ctx, r, var)?;
            Some(ctx.add(Expr::Add(dl, dr)))
        }
        Expr::Sub(l, r) => {
            let dl = differentiate(ctx, l, var)?;
            let dr = differentiate(ctx, r, var)?;
            Some(ctx.add(Expr::Sub(dl, dr)))
        }
        Expr::Neg(inner) => {
            let d = differentiate(ctx, inner, var)?;
            Some(ctx.add(Expr::Neg(d)))
        }
        Expr::Mul(l, r) => {
            // Product Rule: (uv)' = u'v + uv'
            let dl = differentiate(ctx, l, var)?;
            let dr = differentiate(ctx, r, var)?;
            let term1 = ctx.add(Expr::Mul(dl, r));
            let term2 = ctx.add(Expr::Mul(l, dr));
            Some(ctx.add(Expr::Add(term1, term2)))
        }
        Expr::Div(l, r) => {
            // u/v as u * v^(-1): u'/v - u*v'/v^2
            let dl = differentiate(ctx, l, var)?;
            let dr = differentiate(ctx, r, var)?;
            let term1 = ctx.add(Expr::Div(dl, r));
            let two = ctx.num(2);
            let den = ctx.add(Expr::Pow(r, two));
            let num = ctx.add(Expr::Mul(l, dr));
            let term2 = ctx.add(Expr::Div(num, den));
            Some(ctx.add(Expr::Sub(term1, term2)))
        }
        Expr::Pow(base, exp) => {
            if !contains_named_var(ctx, exp, var) {
                // n * u^(n-1) * u'
                let db = differentiate(ctx, base, var)?;
                let one = ctx.num(1);
                let n_minus_one = ctx.add(Expr::Sub(exp, one));
                let pow_term = ctx.add(Expr::Pow(base, n_minus_one));
                let term = ctx.add(Expr::Mul(exp, pow_term));
                Some(ctx.add(Expr::Mul(term, db)))
            } else if !contains_named_var(ctx, base, var) {
                // a^u * ln(a) * u'
                let de = differentiate(ctx, exp, var)?;
                if matches!(ctx.get(base), Expr::Constant(Constant::E)) {
                    return Some(ctx.add(Expr::Mul(expr, de)));
                }
                let ln_a = ctx.call("log", vec![base]);
                let term = ctx.add(Expr::Mul(expr, ln_a));
                Some(ctx.add(Expr::Mul(term, de)))
            } else {
                // u^v * (v' * ln(u) + v * u' / u)
                let db = differentiate(ctx, base, var)?;
                let de = differentiate(ctx, exp, var)?;
                let ln_base = ctx.call("log", vec![base]);
                let term1 = ctx.add(Expr::Mul(de, ln_base));
                let term2_num = ctx.add(Expr::Mul(exp, db));
                let term2 = ctx.add(Expr::Div(term2_num, base));
                let inner = ctx.add(Expr::Add(term1, term2));
                Some(ctx.add(Expr::Mul(expr, inner)))
            }
        }
        Expr::Function(name, args) => differentiate_function(ctx, expr, &name, &args, var),
        Expr::Number(_) | Expr::Constant(_) => Some(ctx.num(0)),
    }
}

fn differentiate_function(
    ctx: &mut Context,
    expr: ExprId,
    name: &str,
    args: &[ExprId],
    var: &str,
) -> Option<ExprId> {
    if name == "log" && args.len() == 2 {
        // log(u, b) = log(u)/log(b)
        let ln_u = ctx.call("log", vec![args[0]]);
        let ln_b = ctx.call("log", vec![args[1]]);
        let quotient = ctx.add(Expr::Div(ln_u, ln_b));
        return differentiate(ctx, quotient, var);
    }

    let [arg] = args else {
        return None;
    };
    let arg = *arg;
    let da = differentiate(ctx, arg, var)?;

    let outer = match name {
        // cos(u)
        "sin" => ctx.call("cos", vec![arg]),
        // -sin(u)
        "cos" => {
            let sin_u = ctx.call("sin", vec![arg]);
            ctx.add(Expr::Neg(sin_u))
        }
        // tan(u)^2 + 1
        "tan" => {
            let tan_u = ctx.call("tan", vec![arg]);
            let two = ctx.num(2);
            let sq = ctx.add(Expr::Pow(tan_u, two));
            let one = ctx.num(1);
            ctx.add(Expr::Add(sq, one))
        }
        // 1/sqrt(1 - u^2)
        "asin" => {
            let root = one_minus_square_root(ctx, arg);
            let one = ctx.num(1);
            ctx.add(Expr::Div(one, root))
        }
        // -1/sqrt(1 - u^2)
        "acos" => {
            let root = one_minus_square_root(ctx, arg);
            let m1 = ctx.num(-1);
            ctx.add(Expr::Div(m1, root))
        }
        // 1/(u^2 + 1)
        "atan" => {
            let two = ctx.num(2);
            let sq = ctx.add(Expr::Pow(arg, two));
            let one = ctx.num(1);
            let den = ctx.add(Expr::Add(sq, one));
            let one = ctx.num(1);
            ctx.add(Expr::Div(one, den))
        }
        "exp" => expr,
        // 1/u
        "log" | "ln" => {
            let one = ctx.num(1);
            ctx.add(Expr::Div(one, arg))
        }
        // 1/(2*sqrt(u))
        "sqrt" => {
            let two = ctx.num(2);
            let den = ctx.add(Expr::Mul(two, expr));
            let one = ctx.num(1);
            ctx.add(Expr::Div(one, den))
        }
        // u/abs(u)
        "abs" => ctx.add(Expr::Div(arg, expr)),
        "sinh" => ctx.call("cosh", vec![arg]),
        "cosh" => ctx.call("sinh", vec![arg]),
        _ => return None,
    };

    Some(ctx.add(Expr::Mul(outer, da)))
}

fn contains_undefined(ctx: &Context, expr: ExprId) -> bool {
    match ctx.get(expr) {
        Expr::Constant(Constant::Undefined) => true,
        Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r) | Expr::Pow(l, r) => {
            contains_undefined(ctx, *l) || contains_undefined(ctx, *r)
        }
        Expr::Neg(inner) => contains_undefined(ctx, *inner),
        Expr::Function(_, args) => args.iter().any(|a| contains_undefined(ctx, *a)),
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => false,
    }
}

fn one_minus_square_root(ctx: &mut Context, arg: ExprId) -> ExprId {
    let two = ctx.num(2);
    let sq = ctx.add(Expr::Pow(arg, two));
    let one = ctx.num(1);
    let diff = ctx.add(Expr::Sub(one, sq));
    ctx.call("sqrt", vec![diff])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::normalize;
    use calc_ast::DisplayExpr;
    use calc_parser::parse;

    fn d(input: &str) -> Option<String> {
        let mut ctx = Context::new();
        let expr = parse(input, &mut ctx).unwrap();
        let raw = differentiate(&mut ctx, expr, "x")?;
        let out = normalize(&mut ctx, raw);
        Some(
            DisplayExpr {
                context: &ctx,
                id: out,
            }
            .to_string(),
        )
    }

    #[test]
    fn test_polynomials() {
        assert_eq!(d("x^2 + 2*x").as_deref(), Some("2*x + 2"));
        assert_eq!(d("x**3 - 5").as_deref(), Some("3*x^2"));
        assert_eq!(d("7").as_deref(), Some("0"));
        assert_eq!(d("(x + 1)^2").as_deref(), Some("2*x + 2"));
    }

    #[test]
    fn test_product_rule() {
        assert_eq!(
            d("x^2*sin(x)").as_deref(),
            Some("x^2*cos(x) + 2*x*sin(x)")
        );
        assert_eq!(
            d("exp(x)*cos(x)").as_deref(),
            Some("exp(x)*cos(x) - exp(x)*sin(x)")
        );
    }

    #[test]
    fn test_quotient() {
        assert_eq!(d("1/x").as_deref(), Some("-1/x^2"));
        assert_eq!(d("sin(x)/x").as_deref(), Some("cos(x)/x - sin(x)/x^2"));
    }

    #[test]
    fn test_chain_rule() {
        assert_eq!(d("sin(2*x)").as_deref(), Some("2*cos(2*x)"));
        assert_eq!(d("exp(3*x)").as_deref(), Some("3*exp(3*x)"));
        assert_eq!(d("log(x)").as_deref(), Some("1/x"));
        assert_eq!(d("sqrt(x)").as_deref(), Some("1/(2*sqrt(x))"));
        assert_eq!(d("atan(x)").as_deref(), Some("1/(x^2 + 1)"));
        assert_eq!(d("tan(x)").as_deref(), Some("tan(x)^2 + 1"));
    }

    #[test]
    fn test_exponentials() {
        assert_eq!(d("2^x").as_deref(), Some("2^x*log(2)"));
        assert_eq!(d("e^x").as_deref(), Some("exp(x)"));
    }

    #[test]
    fn test_undefined_propagates() {
        let mut ctx = Context::new();
        let nan = ctx.constant(Constant::Undefined);
        let x = ctx.var("x");
        let sum = ctx.add(Expr::Add(x, nan));
        for expr in [nan, sum] {
            let out = differentiate(&mut ctx, expr, "x").unwrap();
            assert!(matches!(ctx.get(out), Expr::Constant(Constant::Undefined)));
        }
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(d("foo(x)"), None);
        assert_eq!(d("foo(2)").as_deref(), Some("0"));
    }
}
