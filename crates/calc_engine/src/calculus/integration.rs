//! Table-driven antiderivatives over the canonical term form.
//!
//! The integrand is split into terms; each term into a constant part and
//! the factors that depend on the variable. One or two such factors are
//! matched against known patterns; sums raised to small powers are
//! multiplied out first. Anything else yields `None`.

use calc_ast::{Constant, Context, Expr, ExprId};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use tracing::debug;

use crate::canonical::{
    build_sum, build_term, expand, expand_terms, normalize, sum_terms, Exponent, Factor, Term,
    MAX_EXPAND_POWER,
};
use crate::poly::Poly;

/// Nesting allowed for integration by parts and expansion.
const MAX_DEPTH: usize = 6;

/// Highest power of `x` reduced by repeated integration by parts.
const MAX_PARTS_POWER: i64 = 4;

/// Antiderivative of `expr` with respect to `var`, without constant.
pub fn integrate(ctx: &mut Context, expr: ExprId, var: &str) -> Option<ExprId> {
    let raw = integrate_depth(ctx, expr, var, 0)?;
    Some(normalize(ctx, raw))
}

fn integrate_depth(ctx: &mut Context, expr: ExprId, var: &str, depth: usize) -> Option<ExprId> {
    if depth > MAX_DEPTH {
        debug!("integration depth exhausted");
        return None;
    }
    let terms = sum_terms(ctx, expr);
    let mut acc: Option<ExprId> = None;
    for term in &terms {
        let part = integrate_term(ctx, term, var, depth)?;
        acc = Some(match acc {
            Some(prev) => ctx.add(Expr::Add(prev, part)),
            None => part,
        });
    }
    Some(acc.unwrap_or_else(|| ctx.num(0)))
}

fn integrate_term(ctx: &mut Context, term: &Term, var: &str, depth: usize) -> Option<ExprId> {
    let (dependent, constant): (Vec<Factor>, Vec<Factor>) = term
        .factors
        .iter()
        .cloned()
        .partition(|f| f.depends_on(ctx, var));

    let k = build_term(
        ctx,
        &Term {
            coef: term.coef.clone(),
            factors: constant,
        },
    );
    let body = integrate_factors(ctx, &dependent, var, depth)?;
    Some(ctx.add(Expr::Mul(k, body)))
}

fn integrate_factors(
    ctx: &mut Context,
    factors: &[Factor],
    var: &str,
    depth: usize,
) -> Option<ExprId> {
    if factors.iter().any(|f| is_expandable(ctx, f)) {
        return integrate_expanded(ctx, factors, var, depth);
    }
    match factors {
        [] => Some(ctx.var(var)),
        [f] => integrate_single(ctx, f, var),
        [f, g] => integrate_pair(ctx, f, g, var, depth)
            .or_else(|| integrate_pair(ctx, g, f, var, depth)),
        _ => None,
    }
}

/// A sum raised to a positive integer power small enough for
/// `expand_terms` to multiply out.
fn is_expandable(ctx: &Context, f: &Factor) -> bool {
    match (&f.exp, ctx.get(f.base)) {
        (Exponent::Rational(q), Expr::Add(_, _) | Expr::Sub(_, _)) if q.is_integer() => q
            .to_integer()
            .to_i64()
            .is_some_and(|k| (1..=MAX_EXPAND_POWER).contains(&k)),
        _ => false,
    }
}

fn integrate_expanded(
    ctx: &mut Context,
    factors: &[Factor],
    var: &str,
    depth: usize,
) -> Option<ExprId> {
    let product = Term {
        coef: BigRational::one(),
        factors: factors.to_vec(),
    };
    let expanded = expand_terms(ctx, std::slice::from_ref(&product));
    let sum = build_sum(ctx, &expanded);
    integrate_depth(ctx, sum, var, depth + 1)
}

// ============================================================================
// Single factor
// ============================================================================

fn integrate_single(ctx: &mut Context, f: &Factor, var: &str) -> Option<ExprId> {
    match &f.exp {
        Exponent::Symbolic(g) => integrate_exponential(ctx, f.base, *g, var),
        Exponent::Rational(n) => {
            if let Some(result) = integrate_function_power(ctx, f.base, n, var) {
                return Some(result);
            }
            if let Some(result) = integrate_linear_power(ctx, f.base, n, var) {
                return Some(result);
            }
            integrate_quadratic_power(ctx, f.base, n, var)
        }
    }
}

/// `c^(a*x + b)`
fn integrate_exponential(ctx: &mut Context, base: ExprId, g: ExprId, var: &str) -> Option<ExprId> {
    if calc_ast::contains_named_var(ctx, base, var) {
        return None;
    }
    // log(c) is undefined or complex for c <= 0
    if matches!(ctx.get(base), Expr::Number(c) if !c.is_positive()) {
        return None;
    }
    let (a, _) = linear_coeffs(ctx, g, var)?;
    let power = if matches!(ctx.get(base), Expr::Constant(Constant::E)) {
        ctx.call("exp", vec![g])
    } else {
        ctx.add(Expr::Pow(base, g))
    };
    let den = if matches!(ctx.get(base), Expr::Constant(Constant::E)) {
        a
    } else {
        let ln_c = ctx.call("log", vec![base]);
        ctx.add(Expr::Mul(a, ln_c))
    };
    Some(ctx.add(Expr::Div(power, den)))
}

/// `(a*x + b)^n`, including `1/(a*x + b)`.
fn integrate_linear_power(
    ctx: &mut Context,
    base: ExprId,
    n: &BigRational,
    var: &str,
) -> Option<ExprId> {
    let (a, _) = linear_coeffs(ctx, base, var)?;
    if *n == -BigRational::one() {
        let ln_u = ctx.call("log", vec![base]);
        return Some(ctx.add(Expr::Div(ln_u, a)));
    }
    let n1 = ctx.number(n + BigRational::one());
    let raised = ctx.add(Expr::Pow(base, n1));
    let den = ctx.add(Expr::Mul(n1, a));
    Some(ctx.add(Expr::Div(raised, den)))
}

/// `1/(k*x^2 + m)` and `1/sqrt(m - k*x^2)`.
fn integrate_quadratic_power(
    ctx: &mut Context,
    base: ExprId,
    n: &BigRational,
    var: &str,
) -> Option<ExprId> {
    let poly = Poly::from_expr(ctx, base, var)?;
    let [m, zero, k] = poly.coeffs() else {
        return None;
    };
    if !zero.is_zero() {
        return None;
    }
    let x = ctx.var(var);
    let minus_half = -BigRational::new(BigInt::from(1), BigInt::from(2));

    if *n == -BigRational::one() && k.is_positive() && m.is_positive() {
        // atan(x*sqrt(k/m)) / sqrt(k*m)
        let ratio = ctx.number(k / m);
        let scale = ctx.call("sqrt", vec![ratio]);
        let arg = ctx.add(Expr::Mul(x, scale));
        let atan = ctx.call("atan", vec![arg]);
        let prod = ctx.number(k * m);
        let den = ctx.call("sqrt", vec![prod]);
        return Some(ctx.add(Expr::Div(atan, den)));
    }
    if *n == minus_half && k.is_negative() && m.is_positive() {
        // asin(x*sqrt(-k/m)) / sqrt(-k)
        let ratio = ctx.number(-k / m);
        let scale = ctx.call("sqrt", vec![ratio]);
        let arg = ctx.add(Expr::Mul(x, scale));
        let asin = ctx.call("asin", vec![arg]);
        let neg_k = ctx.number(-k.clone());
        let den = ctx.call("sqrt", vec![neg_k]);
        return Some(ctx.add(Expr::Div(asin, den)));
    }
    None
}

/// Elementary functions of a linear argument, and a few of their squares.
fn integrate_function_power(
    ctx: &mut Context,
    base: ExprId,
    n: &BigRational,
    var: &str,
) -> Option<ExprId> {
    let (name, u) = unary_call(ctx, base)?;
    let (a, _) = linear_coeffs(ctx, u, var)?;
    let power = n.to_integer().to_i64().filter(|_| n.is_integer())?;

    let antiderivative = match (name.as_str(), power) {
        // -cos(u)
        ("sin", 1) => {
            let cos_u = ctx.call("cos", vec![u]);
            ctx.add(Expr::Neg(cos_u))
        }
        ("cos", 1) => ctx.call("sin", vec![u]),
        // -log(cos(u))
        ("tan", 1) => {
            let cos_u = ctx.call("cos", vec![u]);
            let ln = ctx.call("log", vec![cos_u]);
            ctx.add(Expr::Neg(ln))
        }
        // u*log(u) - u
        ("log", 1) => {
            let ln = ctx.call("log", vec![u]);
            let prod = ctx.add(Expr::Mul(u, ln));
            ctx.add(Expr::Sub(prod, u))
        }
        ("sinh", 1) => ctx.call("cosh", vec![u]),
        ("cosh", 1) => ctx.call("sinh", vec![u]),
        // u*atan(u) - log(u^2 + 1)/2
        ("atan", 1) => {
            let atan = ctx.call("atan", vec![u]);
            let prod = ctx.add(Expr::Mul(u, atan));
            let two = ctx.num(2);
            let sq = ctx.add(Expr::Pow(u, two));
            let one = ctx.num(1);
            let inner = ctx.add(Expr::Add(sq, one));
            let ln = ctx.call("log", vec![inner]);
            let half = ctx.add(Expr::Div(ln, two));
            ctx.add(Expr::Sub(prod, half))
        }
        // u/2 - sin(2u)/4
        ("sin", 2) => half_angle(ctx, u, false),
        // u/2 + sin(2u)/4
        ("cos", 2) => half_angle(ctx, u, true),
        // 1/cos(u)^2
        ("cos", -2) => ctx.call("tan", vec![u]),
        _ => return None,
    };
    Some(ctx.add(Expr::Div(antiderivative, a)))
}

fn half_angle(ctx: &mut Context, u: ExprId, plus: bool) -> ExprId {
    let two = ctx.num(2);
    let four = ctx.num(4);
    let half_u = ctx.add(Expr::Div(u, two));
    let double = ctx.add(Expr::Mul(two, u));
    let sin2 = ctx.call("sin", vec![double]);
    let quarter = ctx.add(Expr::Div(sin2, four));
    if plus {
        ctx.add(Expr::Add(half_u, quarter))
    } else {
        ctx.add(Expr::Sub(half_u, quarter))
    }
}

// ============================================================================
// Products of two factors
// ============================================================================

fn integrate_pair(
    ctx: &mut Context,
    f: &Factor,
    g: &Factor,
    var: &str,
    depth: usize,
) -> Option<ExprId> {
    if let Some(n) = var_exponent(ctx, f, var) {
        if is_log_of_var(ctx, g, var) {
            return Some(power_times_log(ctx, &n, var));
        }
        if is_parts_partner(ctx, g, var) {
            return by_parts(ctx, &n, g, var, depth);
        }
        return None;
    }
    if let (Some(("sin", u)), Some(("cos", v))) = (named_linear(ctx, f, var), named_linear(ctx, g, var)) {
        if calc_ast::expr_eq(ctx, u, v) {
            // sin(u)^2 / (2a)
            let (a, _) = linear_coeffs(ctx, u, var)?;
            let sin_u = ctx.call("sin", vec![u]);
            let two = ctx.num(2);
            let sq = ctx.add(Expr::Pow(sin_u, two));
            let den = ctx.add(Expr::Mul(two, a));
            return Some(ctx.add(Expr::Div(sq, den)));
        }
        return None;
    }
    exp_times_trig(ctx, f, g, var)
}

/// Exponent `n` when the factor is `var^n`.
fn var_exponent(ctx: &Context, f: &Factor, var: &str) -> Option<BigRational> {
    match (ctx.get(f.base), &f.exp) {
        (Expr::Variable(v), Exponent::Rational(n)) if v == var => Some(n.clone()),
        _ => None,
    }
}

fn unary_call(ctx: &Context, base: ExprId) -> Option<(String, ExprId)> {
    match ctx.get(base) {
        Expr::Function(name, args) if args.len() == 1 => Some((name.clone(), args[0])),
        _ => None,
    }
}

/// `sin(u)` or `cos(u)` to the first power with `u` linear.
fn named_linear(ctx: &mut Context, f: &Factor, var: &str) -> Option<(&'static str, ExprId)> {
    if !matches!(&f.exp, Exponent::Rational(q) if q.is_one()) {
        return None;
    }
    let (name, u) = unary_call(ctx, f.base)?;
    linear_coeffs(ctx, u, var)?;
    match name.as_str() {
        "sin" => Some(("sin", u)),
        "cos" => Some(("cos", u)),
        _ => None,
    }
}

fn is_log_of_var(ctx: &Context, f: &Factor, var: &str) -> bool {
    matches!(&f.exp, Exponent::Rational(q) if q.is_one())
        && matches!(
            unary_call(ctx, f.base),
            Some((name, arg)) if name == "log" && matches!(ctx.get(arg), Expr::Variable(v) if v == var)
        )
}

/// Factors whose antiderivative does not grow: exponentials and sin/cos of
/// a linear argument.
fn is_parts_partner(ctx: &mut Context, f: &Factor, var: &str) -> bool {
    match &f.exp {
        Exponent::Symbolic(g) => {
            !calc_ast::contains_named_var(ctx, f.base, var) && linear_coeffs(ctx, *g, var).is_some()
        }
        Exponent::Rational(_) => named_linear(ctx, f, var).is_some(),
    }
}

/// `x^n*log(x)`
fn power_times_log(ctx: &mut Context, n: &BigRational, var: &str) -> ExprId {
    let x = ctx.var(var);
    let ln = ctx.call("log", vec![x]);
    if *n == -BigRational::one() {
        // log(x)^2 / 2
        let two = ctx.num(2);
        let sq = ctx.add(Expr::Pow(ln, two));
        return ctx.add(Expr::Div(sq, two));
    }
    // x^(n+1)/(n+1)*log(x) - x^(n+1)/(n+1)^2
    let n1 = n + BigRational::one();
    let n1_expr = ctx.number(n1.clone());
    let raised = ctx.add(Expr::Pow(x, n1_expr));
    let first = ctx.add(Expr::Mul(raised, ln));
    let first = ctx.add(Expr::Div(first, n1_expr));
    let sq = ctx.number(&n1 * &n1);
    let second = ctx.add(Expr::Div(raised, sq));
    ctx.add(Expr::Sub(first, second))
}

/// `∫x^n*h = x^n*H - ∫n*x^(n-1)*H`
fn by_parts(
    ctx: &mut Context,
    n: &BigRational,
    h: &Factor,
    var: &str,
    depth: usize,
) -> Option<ExprId> {
    let power = n.to_integer().to_i64().filter(|_| n.is_integer())?;
    if !(1..=MAX_PARTS_POWER).contains(&power) || depth >= MAX_DEPTH {
        return None;
    }
    let h_int = integrate_single(ctx, h, var)?;
    let h_int = normalize(ctx, h_int);

    let x = ctx.var(var);
    let n_expr = ctx.num(power);
    let xn = ctx.add(Expr::Pow(x, n_expr));
    let first = ctx.add(Expr::Mul(xn, h_int));

    let n_minus_one = ctx.num(power - 1);
    let lowered = ctx.add(Expr::Pow(x, n_minus_one));
    let du = ctx.add(Expr::Mul(n_expr, lowered));
    let rest_integrand = ctx.add(Expr::Mul(du, h_int));
    debug!(power, "integration by parts");
    let rest = integrate_depth(ctx, rest_integrand, var, depth + 1)?;
    Some(ctx.add(Expr::Sub(first, rest)))
}

/// `exp(αx+β)*sin(γx+δ)` and `exp(αx+β)*cos(γx+δ)` by the closed formula.
fn exp_times_trig(ctx: &mut Context, f: &Factor, g: &Factor, var: &str) -> Option<ExprId> {
    let Exponent::Symbolic(p) = f.exp else {
        return None;
    };
    if !matches!(ctx.get(f.base), Expr::Constant(Constant::E)) {
        return None;
    }
    let (alpha, _) = linear_coeffs(ctx, p, var)?;
    let (name, u) = named_linear(ctx, g, var)?;
    let (gamma, _) = linear_coeffs(ctx, u, var)?;

    let exp_p = ctx.call("exp", vec![p]);
    let sin_u = ctx.call("sin", vec![u]);
    let cos_u = ctx.call("cos", vec![u]);
    let a_sin = ctx.add(Expr::Mul(alpha, sin_u));
    let g_cos = ctx.add(Expr::Mul(gamma, cos_u));
    let a_cos = ctx.add(Expr::Mul(alpha, cos_u));
    let g_sin = ctx.add(Expr::Mul(gamma, sin_u));
    let inner = if name == "sin" {
        ctx.add(Expr::Sub(a_sin, g_cos))
    } else {
        ctx.add(Expr::Add(a_cos, g_sin))
    };
    let two = ctx.num(2);
    let a2 = ctx.add(Expr::Pow(alpha, two));
    let g2 = ctx.add(Expr::Pow(gamma, two));
    let den = ctx.add(Expr::Add(a2, g2));
    let num = ctx.add(Expr::Mul(exp_p, inner));
    let quotient = ctx.add(Expr::Div(num, den));
    Some(expand(ctx, quotient))
}

// ============================================================================
// Linear arguments
// ============================================================================

/// Read `expr` as `a*var + b` with `a != 0` and `a`, `b` free of `var`.
pub fn linear_coeffs(ctx: &mut Context, expr: ExprId, var: &str) -> Option<(ExprId, ExprId)> {
    let terms = sum_terms(ctx, expr);
    let mut a_terms = Vec::new();
    let mut b_terms = Vec::new();

    for term in terms {
        let (dependent, rest): (Vec<Factor>, Vec<Factor>) = term
            .factors
            .iter()
            .cloned()
            .partition(|f| f.depends_on(ctx, var));
        match dependent.as_slice() {
            [] => b_terms.push(term),
            [f] if var_exponent(ctx, f, var).is_some_and(|n| n.is_one()) => {
                a_terms.push(Term {
                    coef: term.coef,
                    factors: rest,
                });
            }
            _ => return None,
        }
    }
    if a_terms.is_empty() {
        return None;
    }
    let a = build_sum(ctx, &a_terms);
    let b = build_sum(ctx, &b_terms);
    Some((a, b))
}
