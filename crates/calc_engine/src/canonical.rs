//! Canonical normal form.
//!
//! Any expression is read as a sum of terms; a term is a rational
//! coefficient times a product of factors `base^exponent`. Normalizing
//! flattens nested sums and products, folds numbers, merges factors with
//! equal bases, collects like terms and rebuilds a tree in print order:
//! higher degree in the variables first, constants last, `x^2/2` rather
//! than `1/2*x^2`, `exp(u)` for powers of `e`, `sqrt(u)` for `u^(1/2)`.
//!
//! Numeric coefficients distribute over sums (`2*(x + 1)` is `2*x + 2`);
//! other products of sums are kept as opaque factors, the way the usual
//! CAS printers show them. `expand_terms` multiplies them out on request.

use calc_ast::{compare_expr, contains_named_var, expr_eq, Constant, Context, Expr, ExprId};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;

use crate::rules::functions::eval_special;

/// Largest integer power of a sum multiplied out by `expand_terms`.
pub const MAX_EXPAND_POWER: i64 = 8;

#[derive(Debug, Clone)]
pub enum Exponent {
    Rational(BigRational),
    Symbolic(ExprId),
}

impl Exponent {
    pub fn as_rational(&self) -> Option<&BigRational> {
        match self {
            Exponent::Rational(q) => Some(q),
            Exponent::Symbolic(_) => None,
        }
    }

    fn one() -> Self {
        Exponent::Rational(BigRational::one())
    }
}

#[derive(Debug, Clone)]
pub struct Factor {
    pub base: ExprId,
    pub exp: Exponent,
}

impl Factor {
    pub fn new(base: ExprId, exp: Exponent) -> Self {
        Self { base, exp }
    }

    pub fn depends_on(&self, ctx: &Context, var: &str) -> bool {
        contains_named_var(ctx, self.base, var)
            || matches!(self.exp, Exponent::Symbolic(e) if contains_named_var(ctx, e, var))
    }
}

#[derive(Debug, Clone)]
pub struct Term {
    pub coef: BigRational,
    pub factors: Vec<Factor>,
}

impl Term {
    pub fn constant(coef: BigRational) -> Self {
        Self {
            coef,
            factors: Vec::new(),
        }
    }

    fn single(base: ExprId) -> Self {
        Self {
            coef: BigRational::one(),
            factors: vec![Factor::new(base, Exponent::one())],
        }
    }

    fn negated(mut self) -> Self {
        self.coef = -self.coef;
        self
    }

    fn scaled(mut self, k: &BigRational) -> Self {
        self.coef *= k;
        self
    }

    /// Sum of the rational exponents of plain variables.
    pub fn degree(&self, ctx: &Context) -> BigRational {
        self.factors
            .iter()
            .filter(|f| matches!(ctx.get(f.base), Expr::Variable(_)))
            .filter_map(|f| f.exp.as_rational())
            .fold(BigRational::zero(), |acc, q| acc + q)
    }
}

// ============================================================================
// Entry points
// ============================================================================

pub fn normalize(ctx: &mut Context, expr: ExprId) -> ExprId {
    let terms = sum_terms(ctx, expr);
    build_sum(ctx, &terms)
}

/// Decompose `expr` into collected terms.
pub fn sum_terms(ctx: &mut Context, expr: ExprId) -> Vec<Term> {
    let terms = match ctx.get(expr).clone() {
        Expr::Number(n) => vec![Term::constant(n)],
        Expr::Constant(_) | Expr::Variable(_) => vec![Term::single(expr)],
        Expr::Add(l, r) => {
            let mut terms = sum_terms(ctx, l);
            terms.extend(sum_terms(ctx, r));
            terms
        }
        Expr::Sub(l, r) => {
            let mut terms = sum_terms(ctx, l);
            terms.extend(sum_terms(ctx, r).into_iter().map(Term::negated));
            terms
        }
        Expr::Neg(inner) => sum_terms(ctx, inner)
            .into_iter()
            .map(Term::negated)
            .collect(),
        Expr::Mul(l, r) => {
            let a = sum_terms(ctx, l);
            let b = sum_terms(ctx, r);
            multiply(ctx, a, b)
        }
        Expr::Div(l, r) => {
            let a = sum_terms(ctx, l);
            let b = sum_terms(ctx, r);
            let minus_one = ctx.num(-1);
            let inv = raise(ctx, b, minus_one);
            multiply(ctx, a, inv)
        }
        Expr::Pow(b, e) => {
            let exp = normalize_exponent(ctx, e);
            let base = sum_terms(ctx, b);
            raise(ctx, base, exp)
        }
        Expr::Function(name, args) => function_terms(ctx, &name, &args),
    };
    collect(ctx, terms)
}

fn function_terms(ctx: &mut Context, name: &str, args: &[ExprId]) -> Vec<Term> {
    let args: Vec<ExprId> = args.iter().map(|a| normalize(ctx, *a)).collect();

    match (name, args.as_slice()) {
        ("sqrt", [u]) => {
            let base = sum_terms(ctx, *u);
            let half = ctx.rational(1, 2);
            return raise(ctx, base, half);
        }
        ("exp", [u]) => {
            let e = ctx.constant(Constant::E);
            let base = vec![Term::single(e)];
            return raise(ctx, base, *u);
        }
        _ => {}
    }

    if let Some(value) = eval_special(ctx, name, &args) {
        return sum_terms(ctx, value);
    }

    let call = ctx.call(name, args);
    vec![Term::single(call)]
}

// ============================================================================
// Products and powers
// ============================================================================

fn multiply(ctx: &mut Context, a: Vec<Term>, b: Vec<Term>) -> Vec<Term> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    if a.len() == 1 && b.len() == 1 {
        return vec![mul_terms(ctx, &a[0], &b[0])];
    }
    if a.len() == 1 && a[0].factors.is_empty() {
        let k = a[0].coef.clone();
        return b.into_iter().map(|t| t.scaled(&k)).collect();
    }
    if b.len() == 1 && b[0].factors.is_empty() {
        let k = b[0].coef.clone();
        return a.into_iter().map(|t| t.scaled(&k)).collect();
    }
    let fa = as_single_term(ctx, a);
    let fb = as_single_term(ctx, b);
    vec![mul_terms(ctx, &fa, &fb)]
}

fn as_single_term(ctx: &mut Context, mut terms: Vec<Term>) -> Term {
    if terms.len() == 1 {
        return terms.remove(0);
    }
    let sum = build_sum(ctx, &terms);
    Term::single(sum)
}

pub fn mul_terms(ctx: &mut Context, a: &Term, b: &Term) -> Term {
    let mut factors = a.factors.clone();
    for f in &b.factors {
        merge_factor(ctx, &mut factors, f.clone());
    }
    finish_term(
        ctx,
        Term {
            coef: &a.coef * &b.coef,
            factors,
        },
    )
}

fn merge_factor(ctx: &mut Context, factors: &mut Vec<Factor>, f: Factor) {
    match factors.iter().position(|g| expr_eq(ctx, g.base, f.base)) {
        Some(i) => {
            let sum = add_exponents(ctx, &factors[i].exp, &f.exp);
            if matches!(&sum, Exponent::Rational(q) if q.is_zero()) {
                factors.remove(i);
            } else {
                factors[i].exp = sum;
            }
        }
        None => factors.push(f),
    }
}

fn exponent_expr(ctx: &mut Context, exp: &Exponent) -> ExprId {
    match exp {
        Exponent::Rational(q) => ctx.number(q.clone()),
        Exponent::Symbolic(e) => *e,
    }
}

fn exponent_from(ctx: &mut Context, expr: ExprId) -> Exponent {
    let terms = sum_terms(ctx, expr);
    match constant_value(&terms) {
        Some(q) => Exponent::Rational(q),
        None => Exponent::Symbolic(build_sum(ctx, &terms)),
    }
}

/// The value of a collected sum with no factors left.
fn constant_value(terms: &[Term]) -> Option<BigRational> {
    match terms {
        [] => Some(BigRational::zero()),
        [t] if t.factors.is_empty() => Some(t.coef.clone()),
        _ => None,
    }
}

/// Normalize an exponent, keeping constants as a single number node so
/// `x^(1/3)` carries a rational exponent rather than the tree `1/3`.
fn normalize_exponent(ctx: &mut Context, expr: ExprId) -> ExprId {
    let terms = sum_terms(ctx, expr);
    match constant_value(&terms) {
        Some(q) => ctx.number(q),
        None => build_sum(ctx, &terms),
    }
}

fn add_exponents(ctx: &mut Context, a: &Exponent, b: &Exponent) -> Exponent {
    if let (Exponent::Rational(p), Exponent::Rational(q)) = (a, b) {
        return Exponent::Rational(p + q);
    }
    let ea = exponent_expr(ctx, a);
    let eb = exponent_expr(ctx, b);
    let sum = ctx.add(Expr::Add(ea, eb));
    exponent_from(ctx, sum)
}

fn scale_exponent(ctx: &mut Context, exp: &Exponent, q: &BigRational) -> Exponent {
    match exp {
        Exponent::Rational(p) => Exponent::Rational(p * q),
        Exponent::Symbolic(e) => {
            let k = ctx.number(q.clone());
            let prod = ctx.add(Expr::Mul(k, *e));
            exponent_from(ctx, prod)
        }
    }
}

/// Fold numeric-base factors with integer exponents into the coefficient,
/// and turn `nan` anywhere into a lone `nan` factor.
fn finish_term(ctx: &mut Context, mut term: Term) -> Term {
    let mut kept = Vec::with_capacity(term.factors.len());
    for f in term.factors {
        if let (Expr::Number(b), Exponent::Rational(q)) = (ctx.get(f.base), &f.exp) {
            if let Some(v) = rational_pow(b, q) {
                term.coef *= v;
                continue;
            }
        }
        kept.push(f);
    }
    term.factors = kept;
    term
}

/// Raise a sum (given as terms) to a normalized exponent.
fn raise(ctx: &mut Context, base: Vec<Term>, exp: ExprId) -> Vec<Term> {
    if let Some(q) = ctx.as_number(exp).cloned() {
        if q.is_zero() {
            return vec![Term::constant(BigRational::one())];
        }
        if q.is_one() {
            return base;
        }
        return match base.len() {
            0 if q.is_positive() => Vec::new(),
            0 => vec![undefined_term(ctx)],
            1 => vec![pow_term(ctx, &base[0], &q)],
            _ => {
                let sum = build_sum(ctx, &base);
                vec![Term {
                    coef: BigRational::one(),
                    factors: vec![Factor::new(sum, Exponent::Rational(q))],
                }]
            }
        };
    }

    // Symbolic exponent
    if base.len() == 1 && base[0].factors.is_empty() && base[0].coef.is_one() {
        return base;
    }
    let base_expr = build_sum(ctx, &base);
    if matches!(ctx.get(base_expr), Expr::Constant(Constant::E)) {
        if let Some((k, u)) = scaled_log(ctx, exp) {
            // exp(k*log(u)) = u^k
            let inner = sum_terms(ctx, u);
            let k = ctx.number(k);
            return raise(ctx, inner, k);
        }
    }
    vec![Term {
        coef: BigRational::one(),
        factors: vec![Factor::new(base_expr, Exponent::Symbolic(exp))],
    }]
}

/// Match `k*log(u)` and return `(k, u)`.
fn scaled_log(ctx: &mut Context, expr: ExprId) -> Option<(BigRational, ExprId)> {
    let terms = sum_terms(ctx, expr);
    let [term] = terms.as_slice() else {
        return None;
    };
    let [factor] = term.factors.as_slice() else {
        return None;
    };
    if !matches!(&factor.exp, Exponent::Rational(q) if q.is_one()) {
        return None;
    }
    match ctx.get(factor.base) {
        Expr::Function(name, args) if name == "log" && args.len() == 1 => {
            Some((term.coef.clone(), args[0]))
        }
        _ => None,
    }
}

fn pow_term(ctx: &mut Context, term: &Term, q: &BigRational) -> Term {
    if q.is_integer() {
        if let Some(k) = q.to_integer().to_i32() {
            if term.coef.is_zero() {
                return if k > 0 {
                    Term::constant(BigRational::zero())
                } else {
                    undefined_term(ctx)
                };
            }
            let factors = term
                .factors
                .iter()
                .map(|f| Factor::new(f.base, scale_exponent(ctx, &f.exp, q)))
                .collect();
            return finish_term(
                ctx,
                Term {
                    coef: term.coef.pow(k),
                    factors,
                },
            );
        }
    }

    // Fractional exponent: pull out the coefficient only when its root is
    // exact and factor exponents stay unit-sized.
    let simple_factors = term
        .factors
        .iter()
        .all(|f| matches!(&f.exp, Exponent::Rational(p) if p.abs().is_one()));
    if term.factors.is_empty() || simple_factors {
        if let Some(coef) = rational_pow(&term.coef, q) {
            let factors = term
                .factors
                .iter()
                .map(|f| Factor::new(f.base, scale_exponent(ctx, &f.exp, q)))
                .collect();
            return Term { coef, factors };
        }
        if term.factors.is_empty() && term.coef.is_positive() {
            let base = ctx.number(term.coef.clone());
            return Term {
                coef: BigRational::one(),
                factors: vec![Factor::new(base, Exponent::Rational(q.clone()))],
            };
        }
    }

    let base = build_term(ctx, term);
    Term {
        coef: BigRational::one(),
        factors: vec![Factor::new(base, Exponent::Rational(q.clone()))],
    }
}

fn undefined_term(ctx: &mut Context) -> Term {
    let nan = ctx.constant(Constant::Undefined);
    Term::single(nan)
}

/// Exact `b^q` for rational `q`, when the root is exact and real.
pub fn rational_pow(b: &BigRational, q: &BigRational) -> Option<BigRational> {
    let n = q.denom().to_u32()?;
    let p = q.numer().to_i32()?;
    if b.is_zero() {
        return if p > 0 { Some(BigRational::zero()) } else { None };
    }
    let root = if n == 1 {
        b.clone()
    } else {
        if b.is_negative() {
            return None;
        }
        let num = exact_root(b.numer(), n)?;
        let den = exact_root(b.denom(), n)?;
        BigRational::new(num, den)
    };
    Some(root.pow(p))
}

fn exact_root(v: &BigInt, n: u32) -> Option<BigInt> {
    let r = v.nth_root(n);
    if r.pow(n) == *v {
        Some(r)
    } else {
        None
    }
}

// ============================================================================
// Collection
// ============================================================================

fn collect(ctx: &mut Context, terms: Vec<Term>) -> Vec<Term> {
    let has_pos_inf = terms
        .iter()
        .any(|t| is_bare_infinity(ctx, t) && t.coef.is_positive());
    let has_neg_inf = terms
        .iter()
        .any(|t| is_bare_infinity(ctx, t) && t.coef.is_negative());
    if has_pos_inf && has_neg_inf {
        return vec![undefined_term(ctx)];
    }

    let mut out: Vec<Term> = Vec::with_capacity(terms.len());

    for term in terms {
        if term.coef.is_zero() {
            continue;
        }
        // c*(a + b) with nothing else in the term distributes
        if let Some(inner) = lone_sum(ctx, &term) {
            let expanded: Vec<Term> = sum_terms(ctx, inner)
                .into_iter()
                .map(|t| t.scaled(&term.coef))
                .collect();
            for t in expanded {
                absorb(ctx, &mut out, t);
            }
            continue;
        }
        absorb(ctx, &mut out, term);
    }

    out.retain(|t| !t.coef.is_zero());

    if out.iter().any(|t| is_undefined_term(ctx, t)) {
        return vec![undefined_term(ctx)];
    }
    collapse_infinities(ctx, out)
}

fn absorb(ctx: &Context, out: &mut Vec<Term>, mut term: Term) {
    term.factors.sort_by(|a, b| factor_cmp(ctx, a, b));
    match out
        .iter_mut()
        .find(|t| factors_eq(ctx, &t.factors, &term.factors))
    {
        Some(existing) => existing.coef += term.coef,
        None => out.push(term),
    }
}

fn lone_sum(ctx: &Context, term: &Term) -> Option<ExprId> {
    let [factor] = term.factors.as_slice() else {
        return None;
    };
    match (&factor.exp, ctx.get(factor.base)) {
        (Exponent::Rational(q), Expr::Add(_, _) | Expr::Sub(_, _)) if q.is_one() => {
            Some(factor.base)
        }
        _ => None,
    }
}

fn is_undefined_term(ctx: &Context, term: &Term) -> bool {
    term.factors
        .iter()
        .any(|f| matches!(ctx.get(f.base), Expr::Constant(Constant::Undefined)))
}

/// `oo + c` is `oo`. Opposite infinities were already turned into `nan`.
fn collapse_infinities(ctx: &mut Context, terms: Vec<Term>) -> Vec<Term> {
    let positive = match terms.iter().find(|t| is_bare_infinity(ctx, t)) {
        Some(t) => t.coef.is_positive(),
        None => return terms,
    };
    let inf = ctx.constant(Constant::Infinity);
    let sign = if positive { 1 } else { -1 };
    vec![Term {
        coef: BigRational::from_integer(BigInt::from(sign)),
        factors: vec![Factor::new(inf, Exponent::one())],
    }]
}

fn is_bare_infinity(ctx: &Context, term: &Term) -> bool {
    match term.factors.as_slice() {
        [f] => {
            matches!(ctx.get(f.base), Expr::Constant(Constant::Infinity))
                && matches!(&f.exp, Exponent::Rational(q) if q.is_one())
        }
        _ => false,
    }
}

fn factors_eq(ctx: &Context, a: &[Factor], b: &[Factor]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(f, g)| {
            expr_eq(ctx, f.base, g.base)
                && match (&f.exp, &g.exp) {
                    (Exponent::Rational(p), Exponent::Rational(q)) => p == q,
                    (Exponent::Symbolic(p), Exponent::Symbolic(q)) => expr_eq(ctx, *p, *q),
                    _ => false,
                }
        })
}

// ============================================================================
// Ordering
// ============================================================================

fn factor_class(ctx: &Context, f: &Factor) -> u8 {
    match ctx.get(f.base) {
        Expr::Number(_) => 0,
        Expr::Constant(Constant::E) if matches!(f.exp, Exponent::Symbolic(_)) => 4,
        Expr::Constant(_) => 1,
        Expr::Variable(_) => 2,
        Expr::Function(_, _) => 4,
        _ => 3,
    }
}

fn factor_cmp(ctx: &Context, a: &Factor, b: &Factor) -> Ordering {
    factor_class(ctx, a)
        .cmp(&factor_class(ctx, b))
        .then_with(|| compare_expr(ctx, a.base, b.base))
        .then_with(|| match (&a.exp, &b.exp) {
            (Exponent::Rational(p), Exponent::Rational(q)) => p.cmp(q),
            (Exponent::Symbolic(p), Exponent::Symbolic(q)) => compare_expr(ctx, *p, *q),
            (Exponent::Rational(_), Exponent::Symbolic(_)) => Ordering::Less,
            (Exponent::Symbolic(_), Exponent::Rational(_)) => Ordering::Greater,
        })
}

/// Print order of terms: degree descending, then more factors first, so
/// constants come last.
fn term_cmp(ctx: &Context, a: &Term, b: &Term) -> Ordering {
    b.degree(ctx)
        .cmp(&a.degree(ctx))
        .then_with(|| b.factors.len().cmp(&a.factors.len()))
        .then_with(|| {
            for (f, g) in a.factors.iter().zip(&b.factors) {
                let ord = factor_cmp(ctx, f, g);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        })
        .then_with(|| b.coef.cmp(&a.coef))
}

// ============================================================================
// Rebuilding
// ============================================================================

pub fn build_sum(ctx: &mut Context, terms: &[Term]) -> ExprId {
    let mut sorted: Vec<Term> = terms.to_vec();
    sorted.sort_by(|a, b| term_cmp(ctx, a, b));

    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return ctx.num(0);
    };
    let mut acc = build_term(ctx, &first);
    for term in iter {
        if term.coef.is_negative() {
            let magnitude = build_term(ctx, &term.negated());
            acc = ctx.add(Expr::Sub(acc, magnitude));
        } else {
            let t = build_term(ctx, &term);
            acc = ctx.add(Expr::Add(acc, t));
        }
    }
    acc
}

pub fn build_term(ctx: &mut Context, term: &Term) -> ExprId {
    let mut numer = Vec::new();
    let mut denom = Vec::new();
    for f in &term.factors {
        match &f.exp {
            Exponent::Rational(q) if q.is_negative() => {
                denom.push(power_expr(ctx, f.base, &Exponent::Rational(-q)))
            }
            exp => numer.push(power_expr(ctx, f.base, exp)),
        }
    }

    let p = BigRational::from_integer(term.coef.numer().clone());
    let q = BigRational::from_integer(term.coef.denom().clone());

    if !p.is_one() || numer.is_empty() {
        let n = ctx.number(p);
        numer.insert(0, n);
    }
    if !q.is_one() {
        let d = ctx.number(q);
        denom.insert(0, d);
    }

    let num_expr = product(ctx, &numer);
    if denom.is_empty() {
        num_expr
    } else {
        let den_expr = product(ctx, &denom);
        ctx.add(Expr::Div(num_expr, den_expr))
    }
}

fn product(ctx: &mut Context, factors: &[ExprId]) -> ExprId {
    let mut iter = factors.iter().copied();
    let Some(first) = iter.next() else {
        return ctx.num(1);
    };
    iter.fold(first, |acc, f| ctx.add(Expr::Mul(acc, f)))
}

fn power_expr(ctx: &mut Context, base: ExprId, exp: &Exponent) -> ExprId {
    let is_e = matches!(ctx.get(base), Expr::Constant(Constant::E));
    match exp {
        Exponent::Rational(q) if q.is_one() => base,
        Exponent::Rational(q) if is_e => {
            let k = ctx.number(q.clone());
            ctx.call("exp", vec![k])
        }
        Exponent::Symbolic(e) if is_e => ctx.call("exp", vec![*e]),
        Exponent::Rational(q) if *q == BigRational::new(BigInt::from(1), BigInt::from(2)) => {
            ctx.call("sqrt", vec![base])
        }
        exp => {
            let e = exponent_expr(ctx, exp);
            ctx.add(Expr::Pow(base, e))
        }
    }
}

// ============================================================================
// Expansion
// ============================================================================

/// Multiply out sums raised to small positive integer powers.
pub fn expand_terms(ctx: &mut Context, terms: &[Term]) -> Vec<Term> {
    let mut out = Vec::new();
    for term in terms {
        let mut acc = vec![Term {
            coef: term.coef.clone(),
            factors: Vec::new(),
        }];
        for f in &term.factors {
            let power = match (&f.exp, ctx.get(f.base)) {
                (Exponent::Rational(q), Expr::Add(_, _) | Expr::Sub(_, _)) if q.is_integer() => {
                    q.to_integer().to_i64().filter(|k| (1..=MAX_EXPAND_POWER).contains(k))
                }
                _ => None,
            };
            match power {
                Some(k) => {
                    let inner = sum_terms(ctx, f.base);
                    for _ in 0..k {
                        acc = distribute(ctx, &acc, &inner);
                    }
                }
                None => {
                    let single = Term {
                        coef: BigRational::one(),
                        factors: vec![f.clone()],
                    };
                    acc = distribute(ctx, &acc, std::slice::from_ref(&single));
                }
            }
        }
        out.extend(acc);
    }
    collect(ctx, out)
}

fn distribute(ctx: &mut Context, a: &[Term], b: &[Term]) -> Vec<Term> {
    let mut out = Vec::with_capacity(a.len() * b.len());
    for s in a {
        for t in b {
            out.push(mul_terms(ctx, s, t));
        }
    }
    out
}

pub fn expand(ctx: &mut Context, expr: ExprId) -> ExprId {
    let terms = sum_terms(ctx, expr);
    let expanded = expand_terms(ctx, &terms);
    build_sum(ctx, &expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calc_ast::DisplayExpr;
    use calc_parser::parse;

    fn norm(input: &str) -> String {
        let mut ctx = Context::new();
        let expr = parse(input, &mut ctx).unwrap();
        let out = normalize(&mut ctx, expr);
        DisplayExpr {
            context: &ctx,
            id: out,
        }
        .to_string()
    }

    #[test]
    fn test_fold_and_collect() {
        assert_eq!(norm("2 + 3"), "5");
        assert_eq!(norm("x + x"), "2*x");
        assert_eq!(norm("x - x"), "0");
        assert_eq!(norm("2*x^(2-1)*1 + (0*x + 2*1)"), "2*x + 2");
    }

    #[test]
    fn test_term_order() {
        assert_eq!(norm("1 + x + x^2"), "x^2 + x + 1");
        assert_eq!(norm("x*log(x) - x"), "x*log(x) - x");
        assert_eq!(norm("x - x*log(x)"), "-x*log(x) + x");
        assert_eq!(norm("sin(x) - x*cos(x)"), "-x*cos(x) + sin(x)");
    }

    #[test]
    fn test_powers_merge() {
        assert_eq!(norm("x*x^2"), "x^3");
        assert_eq!(norm("x^2/x"), "x");
        assert_eq!(norm("x/x"), "1");
        assert_eq!(norm("x^-2"), "1/x^2");
    }

    #[test]
    fn test_fractional_exponents_stay_rational() {
        let mut ctx = Context::new();
        let expr = parse("x^(1/3)", &mut ctx).unwrap();
        let terms = sum_terms(&mut ctx, expr);
        let [term] = terms.as_slice() else {
            panic!("expected one term");
        };
        assert!(matches!(
            term.factors[0].exp.as_rational(),
            Some(q) if *q == BigRational::new(BigInt::from(1), BigInt::from(3))
        ));
        assert_eq!(norm("x^(1/2)"), "sqrt(x)");
        assert_eq!(norm("x^(1/3)*x^(2/3)"), "x");
    }

    #[test]
    fn test_rational_coefficients() {
        assert_eq!(norm("x^3/3 + x^2/2"), "x^3/3 + x^2/2");
        assert_eq!(norm("(1/2)*x"), "x/2");
        assert_eq!(norm("-cos(2*x)/2"), "-cos(2*x)/2");
    }

    #[test]
    fn test_numeric_distribution_only() {
        assert_eq!(norm("2*(x + 1)"), "2*x + 2");
        assert_eq!(norm("x*(x + 1)"), "x*(x + 1)");
        assert_eq!(norm("(x + 1)*(x + 1)"), "(x + 1)^2");
    }

    #[test]
    fn test_sqrt_and_exp_forms() {
        assert_eq!(norm("sqrt(x)*sqrt(x)"), "x");
        assert_eq!(norm("1/(2*sqrt(x))"), "1/(2*sqrt(x))");
        assert_eq!(norm("sqrt(4)"), "2");
        assert_eq!(norm("exp(x)*exp(x)"), "exp(2*x)");
        assert_eq!(norm("e^x"), "exp(x)");
        assert_eq!(norm("exp(1)"), "e");
        assert_eq!(norm("exp(log(x))"), "x");
        assert_eq!(norm("exp(x)*exp(-x)"), "1");
    }

    #[test]
    fn test_factor_order() {
        assert_eq!(norm("exp(x)*x^2"), "x^2*exp(x)");
        assert_eq!(norm("cos(x)*exp(x)"), "exp(x)*cos(x)");
        assert_eq!(norm("sin(x)*2*x"), "2*x*sin(x)");
    }

    #[test]
    fn test_division_by_zero_is_undefined() {
        assert_eq!(norm("1/0"), "nan");
        assert_eq!(norm("x + 1/0"), "nan");
    }

    #[test]
    fn test_infinity_absorbs_finite_terms() {
        assert_eq!(norm("oo + 1"), "oo");
        assert_eq!(norm("-oo + 3"), "-oo");
        assert_eq!(norm("oo - oo"), "nan");
    }

    #[test]
    fn test_expand() {
        let mut ctx = Context::new();
        let expr = parse("(x + 1)^2", &mut ctx).unwrap();
        let out = expand(&mut ctx, expr);
        assert_eq!(
            DisplayExpr {
                context: &ctx,
                id: out
            }
            .to_string(),
            "x^2 + 2*x + 1"
        );
    }
}
