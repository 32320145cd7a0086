//! Limit rules.
//!
//! Tried in order on every sub-limit:
//! 1. Constant: the expression does not mention the variable
//! 2. Variable: the variable itself
//! 3. Substitution: the expression is defined at the point
//! 4. Rational function: degree comparison at ±∞, cancellation of
//!    `(x - a)` factors at a point
//! 5. Composition over the canonical terms: sums, products, quotients,
//!    powers and elementary functions, with L'Hôpital for `0/0` and `∞/∞`
//!    and `0·∞` rewritten as a quotient

use calc_ast::{collect_variables, Constant, Context, Expr, ExprId};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use tracing::debug;

use crate::budget::{Metric, Operation};
use crate::calculus::differentiate;
use crate::canonical::{build_sum, build_term, normalize, sum_terms, Exponent, Factor, Term};
use crate::evaluator::eval_f64;
use crate::helpers::{contains_non_finite, inf_sign, is_zero, substitute_var, InfSign};
use crate::poly::{rational_function, sign_of};
use crate::{Budget, CasError};

use super::helpers::{depends_on, exp_of, finite_sign, is_zero_value, sample_sign};
use super::types::{Approach, LimitValue};

/// Nested applications of L'Hôpital's rule.
const MAX_LHOPITAL_DEPTH: usize = 6;

type LimitOutcome = Result<Option<LimitValue>, CasError>;

fn sign_product(a: InfSign, b: InfSign) -> InfSign {
    if a == b {
        InfSign::Pos
    } else {
        InfSign::Neg
    }
}

fn sign_from_i8(s: i8) -> Option<InfSign> {
    match s {
        1 => Some(InfSign::Pos),
        -1 => Some(InfSign::Neg),
        _ => None,
    }
}

/// Rule 1: Constant - lim c = c
pub(crate) fn apply_constant_rule(ctx: &Context, expr: ExprId, var: &str) -> Option<LimitValue> {
    if depends_on(ctx, expr, var) {
        return None;
    }
    Some(match inf_sign(ctx, expr) {
        Some(sign) => LimitValue::Infinite(sign),
        None => LimitValue::Finite(expr),
    })
}

/// Rule 2: Variable - lim x = ±∞ or a
pub(crate) fn apply_variable_rule(
    ctx: &Context,
    expr: ExprId,
    var: &str,
    approach: Approach,
) -> Option<LimitValue> {
    if !matches!(ctx.get(expr), Expr::Variable(v) if v == var) {
        return None;
    }
    Some(match approach {
        Approach::PosInfinity => LimitValue::Infinite(InfSign::Pos),
        Approach::NegInfinity => LimitValue::Infinite(InfSign::Neg),
        Approach::Point(a) => LimitValue::Finite(a),
    })
}

/// Rule 3: Substitution - lim f = f(a) when `f(a)` is defined.
///
/// Closed values must also evaluate numerically, which rejects poles and
/// points outside a function's domain (`log(0)`, `0^-1`).
pub(crate) fn apply_substitution_rule(
    ctx: &mut Context,
    expr: ExprId,
    var: &str,
    point: ExprId,
) -> Option<LimitValue> {
    if has_zero_power_zero(ctx, expr, var, point) {
        return None;
    }
    let substituted = substitute_var(ctx, expr, var, point);
    if collect_variables(ctx, substituted).is_empty()
        && eval_f64(ctx, substituted, &Default::default()).is_none()
    {
        return None;
    }
    let value = normalize(ctx, substituted);
    if contains_non_finite(ctx, value) {
        return None;
    }
    Some(LimitValue::Finite(value))
}

/// A power whose base and exponent both vanish at the point, such as
/// `0^x` or `x^x` at `0`.
fn has_zero_power_zero(ctx: &mut Context, expr: ExprId, var: &str, point: ExprId) -> bool {
    let mut stack = vec![expr];
    while let Some(current) = stack.pop() {
        match ctx.get(current).clone() {
            Expr::Pow(b, e) => {
                if depends_on(ctx, current, var) {
                    let b_at = substitute_var(ctx, b, var, point);
                    let e_at = substitute_var(ctx, e, var, point);
                    if is_zero_value(ctx, b_at) && is_zero_value(ctx, e_at) {
                        return true;
                    }
                }
                stack.push(b);
                stack.push(e);
            }
            Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r) => {
                stack.push(l);
                stack.push(r);
            }
            Expr::Neg(inner) => stack.push(inner),
            Expr::Function(_, args) => stack.extend(args),
            Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => {}
        }
    }
    false
}

/// Rule 4: Rational function P(x)/Q(x) with numeric coefficients.
///
/// At ±∞ compares degrees:
/// - deg(P) < deg(Q) → 0
/// - deg(P) = deg(Q) → lc(P)/lc(Q)
/// - deg(P) > deg(Q) → ±∞ (sign from the leading coefficients and the
///   parity of the degree gap)
///
/// At a numeric point cancels common `(x - a)` factors, then evaluates or
/// reads the sign of the pole from the right.
pub(crate) fn try_rational_function_rule(
    ctx: &mut Context,
    expr: ExprId,
    var: &str,
    approach: Approach,
) -> Option<LimitValue> {
    let (num, den) = rational_function(ctx, expr, var)?;
    if num.is_zero() {
        return Some(LimitValue::Finite(ctx.num(0)));
    }

    let a = match approach {
        Approach::PosInfinity | Approach::NegInfinity => {
            let (dn, dd) = (num.degree(), den.degree());
            if dn < dd {
                return Some(LimitValue::Finite(ctx.num(0)));
            }
            let ratio = num.leading() / den.leading();
            if dn == dd {
                return Some(LimitValue::Finite(ctx.number(ratio)));
            }
            let mut sign = sign_from_i8(sign_of(&ratio))?;
            if approach == Approach::NegInfinity && (dn - dd) % 2 == 1 {
                sign = sign.flip();
            }
            return Some(LimitValue::Infinite(sign));
        }
        Approach::Point(a) => ctx.as_number(a)?.clone(),
    };

    let (mut n, mut d) = (num, den);
    while !n.is_zero() && n.eval(&a).is_zero() && d.eval(&a).is_zero() {
        n = n.div_linear(&a);
        d = d.div_linear(&a);
    }
    if n.is_zero() {
        return Some(LimitValue::Finite(ctx.num(0)));
    }
    let dv = d.eval(&a);
    if !dv.is_zero() {
        return Some(LimitValue::Finite(ctx.number(n.eval(&a) / dv)));
    }

    // Pole: (x - a)^m*q(x) with q(a) != 0 is positive-times-q(a) on the right
    let mut q = d;
    while q.eval(&a).is_zero() {
        q = q.div_linear(&a);
    }
    let sign = sign_of(&n.eval(&a)) * sign_of(&q.eval(&a));
    sign_from_i8(sign).map(LimitValue::Infinite)
}

/// Composes sub-limits under a shared budget.
pub(crate) struct Limiter<'a> {
    var: &'a str,
    approach: Approach,
    budget: &'a mut Budget,
}

impl<'a> Limiter<'a> {
    pub fn new(var: &'a str, approach: Approach, budget: &'a mut Budget) -> Self {
        Self {
            var,
            approach,
            budget,
        }
    }

    pub fn limit_of(&mut self, ctx: &mut Context, expr: ExprId, depth: usize) -> LimitOutcome {
        self.budget
            .charge(Operation::Limit, Metric::RewriteSteps, 1)?;

        if let Some(v) = apply_constant_rule(ctx, expr, self.var) {
            return Ok(Some(v));
        }
        if let Some(v) = apply_variable_rule(ctx, expr, self.var, self.approach) {
            return Ok(Some(v));
        }
        if let Approach::Point(a) = self.approach {
            if let Some(v) = apply_substitution_rule(ctx, expr, self.var, a) {
                return Ok(Some(v));
            }
        }
        if let Some(v) = try_rational_function_rule(ctx, expr, self.var, self.approach) {
            return Ok(Some(v));
        }

        let terms = sum_terms(ctx, expr);
        match terms.as_slice() {
            [] => Ok(Some(LimitValue::Finite(ctx.num(0)))),
            [term] => self.term_limit(ctx, term, depth),
            _ => self.sum_limit(ctx, &terms, depth),
        }
    }

    fn sum_limit(&mut self, ctx: &mut Context, terms: &[Term], depth: usize) -> LimitOutcome {
        let mut finite = Vec::new();
        let mut positive = Vec::new();
        let mut negative = Vec::new();

        for term in terms {
            let expr = build_term(ctx, term);
            match self.limit_of(ctx, expr, depth)? {
                None => return Ok(None),
                Some(LimitValue::Finite(v)) => finite.push(v),
                Some(LimitValue::Infinite(InfSign::Pos)) => positive.push(term.clone()),
                Some(LimitValue::Infinite(InfSign::Neg)) => negative.push(term.clone()),
            }
        }

        match (positive.is_empty(), negative.is_empty()) {
            (true, true) => {
                let sum = finite
                    .into_iter()
                    .reduce(|acc, v| ctx.add(Expr::Add(acc, v)))
                    .unwrap_or_else(|| ctx.num(0));
                Ok(Some(LimitValue::Finite(sum)))
            }
            (false, true) => Ok(Some(LimitValue::Infinite(InfSign::Pos))),
            (true, false) => Ok(Some(LimitValue::Infinite(InfSign::Neg))),
            (false, false) => {
                let p = build_sum(ctx, &positive);
                let m = build_sum(ctx, &negative);
                self.competing_infinities(ctx, p, m, depth)
            }
        }
    }

    /// `P + M` with `P → +∞` and `M → -∞`, written as `P*(1 + M/P)`.
    fn competing_infinities(
        &mut self,
        ctx: &mut Context,
        p: ExprId,
        m: ExprId,
        depth: usize,
    ) -> LimitOutcome {
        if depth >= MAX_LHOPITAL_DEPTH {
            return Ok(None);
        }
        let ratio = ctx.add(Expr::Div(m, p));
        let ratio = normalize(ctx, ratio);
        match self.limit_of(ctx, ratio, depth + 1)? {
            Some(LimitValue::Finite(l)) => {
                let one = ctx.num(1);
                let factor = ctx.add(Expr::Add(one, l));
                let factor = normalize(ctx, factor);
                Ok(finite_sign(ctx, factor).map(LimitValue::Infinite))
            }
            // |M| outgrows P
            Some(LimitValue::Infinite(_)) => Ok(Some(LimitValue::Infinite(InfSign::Neg))),
            None => Ok(None),
        }
    }

    fn term_limit(&mut self, ctx: &mut Context, term: &Term, depth: usize) -> LimitOutcome {
        let (denominator, numerator): (Vec<Factor>, Vec<Factor>) = term
            .factors
            .iter()
            .cloned()
            .partition(|f| matches!(&f.exp, Exponent::Rational(q) if q.is_negative()));

        if denominator.is_empty() {
            return self.product_limit(ctx, term, depth);
        }

        let num = build_term(
            ctx,
            &Term {
                coef: term.coef.clone(),
                factors: numerator,
            },
        );
        let flipped: Vec<Factor> = denominator
            .into_iter()
            .map(|f| match f.exp {
                Exponent::Rational(q) => Factor::new(f.base, Exponent::Rational(-q)),
                exp => Factor::new(f.base, exp),
            })
            .collect();
        let den = build_term(
            ctx,
            &Term {
                coef: BigRational::one(),
                factors: flipped,
            },
        );
        self.quotient_limit(ctx, num, den, depth)
    }

    fn quotient_limit(
        &mut self,
        ctx: &mut Context,
        num: ExprId,
        den: ExprId,
        depth: usize,
    ) -> LimitOutcome {
        let Some(ln) = self.limit_of(ctx, num, depth)? else {
            return Ok(None);
        };
        let Some(ld) = self.limit_of(ctx, den, depth)? else {
            return Ok(None);
        };
        let quotient = ctx.add(Expr::Div(num, den));

        match (ln, ld) {
            (LimitValue::Finite(n), LimitValue::Finite(d)) => {
                match (is_zero_value(ctx, n), is_zero_value(ctx, d)) {
                    (_, false) => Ok(Some(LimitValue::Finite(ctx.add(Expr::Div(n, d))))),
                    (true, true) => self.lhopital(ctx, num, den, depth),
                    (false, true) => Ok(sample_sign(ctx, quotient, self.var, self.approach)
                        .map(LimitValue::Infinite)),
                }
            }
            (LimitValue::Finite(_), LimitValue::Infinite(_)) => {
                Ok(Some(LimitValue::Finite(ctx.num(0))))
            }
            (LimitValue::Infinite(s), LimitValue::Finite(d)) => {
                if is_zero_value(ctx, d) {
                    return Ok(sample_sign(ctx, quotient, self.var, self.approach)
                        .map(LimitValue::Infinite));
                }
                let sign = finite_sign(ctx, d)
                    .map(|ds| sign_product(s, ds))
                    .or_else(|| sample_sign(ctx, quotient, self.var, self.approach));
                Ok(sign.map(LimitValue::Infinite))
            }
            (LimitValue::Infinite(_), LimitValue::Infinite(_)) => {
                self.lhopital(ctx, num, den, depth)
            }
        }
    }

    /// lim f/g = lim f'/g' for `0/0` and `∞/∞`.
    fn lhopital(&mut self, ctx: &mut Context, num: ExprId, den: ExprId, depth: usize) -> LimitOutcome {
        if depth >= MAX_LHOPITAL_DEPTH {
            debug!(depth, "L'Hôpital depth exhausted");
            return Ok(None);
        }
        let (Some(dn), Some(dd)) = (
            differentiate(ctx, num, self.var),
            differentiate(ctx, den, self.var),
        ) else {
            return Ok(None);
        };
        let dn = normalize(ctx, dn);
        let dd = normalize(ctx, dd);
        let next = ctx.add(Expr::Div(dn, dd));
        let next = normalize(ctx, next);
        debug!(depth, "applying L'Hôpital's rule");
        self.limit_of(ctx, next, depth + 1)
    }

    fn product_limit(&mut self, ctx: &mut Context, term: &Term, depth: usize) -> LimitOutcome {
        let mut finite = vec![ctx.number(term.coef.clone())];
        let mut zeros = Vec::new();
        let mut infinite = Vec::new();

        for f in &term.factors {
            let factor_expr = build_term(
                ctx,
                &Term {
                    coef: BigRational::one(),
                    factors: vec![f.clone()],
                },
            );
            match self.factor_limit(ctx, f, depth)? {
                None => return Ok(None),
                Some(LimitValue::Finite(v)) => {
                    if is_zero_value(ctx, v) {
                        zeros.push((factor_expr, f.clone()));
                    } else {
                        finite.push(v);
                    }
                }
                Some(LimitValue::Infinite(s)) => infinite.push((factor_expr, s, f.clone())),
            }
        }

        let c = product(ctx, &finite);
        match (zeros.is_empty(), infinite.is_empty()) {
            (true, true) => Ok(Some(LimitValue::Finite(c))),
            (false, true) => Ok(Some(LimitValue::Finite(ctx.num(0)))),
            (true, false) => {
                let sign = infinite
                    .iter()
                    .fold(InfSign::Pos, |acc, (_, s, _)| sign_product(acc, *s));
                let sign = match finite_sign(ctx, c) {
                    Some(cs) => Some(sign_product(sign, cs)),
                    None => {
                        let whole = build_term(ctx, term);
                        sample_sign(ctx, whole, self.var, self.approach)
                    }
                };
                Ok(sign.map(LimitValue::Infinite))
            }
            (false, false) => {
                let zero_exprs: Vec<ExprId> = zeros.iter().map(|(e, _)| *e).collect();
                let z = product(ctx, &zero_exprs);
                let inf_exprs: Vec<ExprId> = infinite.iter().map(|(e, _, _)| *e).collect();
                let i = product(ctx, &inf_exprs);
                // x^k*log(..) keeps the logarithm on top; exponential decay
                // goes to the bottom as a growing exponential
                let powers_of_var = infinite.iter().all(|(_, _, f)| {
                    matches!(ctx.get(f.base), Expr::Variable(v) if v == self.var)
                });
                let exponential_decay = zeros
                    .iter()
                    .any(|(_, f)| matches!(f.exp, Exponent::Symbolic(_)));
                let value = if powers_of_var && !exponential_decay {
                    match self.zero_over_reciprocal(ctx, z, i, depth)? {
                        Some(v) => Some(v),
                        None => self.zero_over_reciprocal(ctx, i, z, depth)?,
                    }
                } else {
                    match self.zero_over_reciprocal(ctx, i, z, depth)? {
                        Some(v) => Some(v),
                        None => self.zero_over_reciprocal(ctx, z, i, depth)?,
                    }
                };
                Ok(value.and_then(|v| scale_value(ctx, v, c)))
            }
        }
    }

    /// `a*b` as `a / b^-1`.
    fn zero_over_reciprocal(
        &mut self,
        ctx: &mut Context,
        a: ExprId,
        b: ExprId,
        depth: usize,
    ) -> LimitOutcome {
        let m1 = ctx.num(-1);
        let inv = ctx.add(Expr::Pow(b, m1));
        let inv = normalize(ctx, inv);
        self.quotient_limit(ctx, a, inv, depth)
    }

    fn factor_limit(&mut self, ctx: &mut Context, f: &Factor, depth: usize) -> LimitOutcome {
        match &f.exp {
            Exponent::Symbolic(g) if is_zero(ctx, f.base) => self.zero_base_limit(ctx, *g, depth),
            Exponent::Symbolic(g) => {
                // b^g = exp(g*log(b))
                let exponent = if matches!(ctx.get(f.base), Expr::Constant(Constant::E)) {
                    *g
                } else {
                    let ln = ctx.call("log", vec![f.base]);
                    let prod = ctx.add(Expr::Mul(*g, ln));
                    normalize(ctx, prod)
                };
                let value = self.limit_of(ctx, exponent, depth)?;
                Ok(value.map(|v| exp_of(ctx, v)))
            }
            Exponent::Rational(q) => {
                let Some(base) = self.base_limit(ctx, f.base, depth)? else {
                    return Ok(None);
                };
                if q.is_one() {
                    return Ok(Some(base));
                }
                Ok(power_of_value(ctx, base, q, f, self.var, self.approach))
            }
        }
    }

    /// `0^g` is `0` while `g` stays positive and undefined otherwise.
    fn zero_base_limit(&mut self, ctx: &mut Context, g: ExprId, depth: usize) -> LimitOutcome {
        let positive = match self.limit_of(ctx, g, depth)? {
            Some(LimitValue::Infinite(s)) => s == InfSign::Pos,
            Some(LimitValue::Finite(v)) if is_zero_value(ctx, v) => {
                sample_sign(ctx, g, self.var, self.approach) == Some(InfSign::Pos)
            }
            Some(LimitValue::Finite(v)) => finite_sign(ctx, v) == Some(InfSign::Pos),
            None => false,
        };
        Ok(positive.then(|| LimitValue::Finite(ctx.num(0))))
    }

    fn base_limit(&mut self, ctx: &mut Context, base: ExprId, depth: usize) -> LimitOutcome {
        match ctx.get(base).clone() {
            Expr::Function(name, args) => self.function_limit(ctx, &name, &args, depth),
            _ => self.limit_of(ctx, base, depth),
        }
    }

    fn function_limit(
        &mut self,
        ctx: &mut Context,
        name: &str,
        args: &[ExprId],
        depth: usize,
    ) -> LimitOutcome {
        let [arg] = args else {
            return Ok(None);
        };
        let Some(inner) = self.limit_of(ctx, *arg, depth)? else {
            return Ok(None);
        };

        match inner {
            LimitValue::Finite(v) => {
                let v = normalize(ctx, v);
                let call = ctx.call(name, vec![v]);
                let value = normalize(ctx, call);
                if contains_non_finite(ctx, value) {
                    return Ok(None);
                }
                let closed = collect_variables(ctx, value).is_empty();
                if closed && eval_f64(ctx, value, &Default::default()).is_none() {
                    // log(u) with u → 0⁺
                    let arg_sign = sample_sign(ctx, *arg, self.var, self.approach);
                    if name == "log" && is_zero_value(ctx, v) && arg_sign == Some(InfSign::Pos) {
                        return Ok(Some(LimitValue::Infinite(InfSign::Neg)));
                    }
                    return Ok(None);
                }
                Ok(Some(LimitValue::Finite(value)))
            }
            LimitValue::Infinite(s) => Ok(function_at_infinity(ctx, name, s)),
        }
    }
}

/// Behaviour of elementary functions when the argument grows without bound.
fn function_at_infinity(ctx: &mut Context, name: &str, s: InfSign) -> Option<LimitValue> {
    let value = match (name, s) {
        ("exp", InfSign::Neg) => LimitValue::Finite(ctx.num(0)),
        ("exp" | "log" | "sqrt", InfSign::Pos) | ("cosh" | "abs", _) => {
            LimitValue::Infinite(InfSign::Pos)
        }
        ("sinh", s) => LimitValue::Infinite(s),
        ("atan", s) => {
            let pi = ctx.constant(Constant::Pi);
            let two = ctx.num(if s == InfSign::Pos { 2 } else { -2 });
            LimitValue::Finite(ctx.add(Expr::Div(pi, two)))
        }
        ("tanh", s) => LimitValue::Finite(ctx.num(if s == InfSign::Pos { 1 } else { -1 })),
        _ => return None,
    };
    Some(value)
}

/// `L^q` for a base limit `L` and a rational exponent.
fn power_of_value(
    ctx: &mut Context,
    base: LimitValue,
    q: &BigRational,
    f: &Factor,
    var: &str,
    approach: Approach,
) -> Option<LimitValue> {
    match base {
        LimitValue::Finite(b) if is_zero_value(ctx, b) => {
            if q.is_positive() {
                return Some(LimitValue::Finite(ctx.num(0)));
            }
            let factor = build_term(
                ctx,
                &Term {
                    coef: BigRational::one(),
                    factors: vec![f.clone()],
                },
            );
            sample_sign(ctx, factor, var, approach).map(LimitValue::Infinite)
        }
        LimitValue::Finite(b) => {
            let exp = ctx.number(q.clone());
            Some(LimitValue::Finite(ctx.add(Expr::Pow(b, exp))))
        }
        LimitValue::Infinite(_) if q.is_negative() => Some(LimitValue::Finite(ctx.num(0))),
        LimitValue::Infinite(InfSign::Pos) => Some(LimitValue::Infinite(InfSign::Pos)),
        LimitValue::Infinite(InfSign::Neg) => {
            if !q.is_integer() {
                return None;
            }
            let even = (q.to_integer() % 2u32).is_zero();
            Some(LimitValue::Infinite(if even {
                InfSign::Pos
            } else {
                InfSign::Neg
            }))
        }
    }
}

fn product(ctx: &mut Context, factors: &[ExprId]) -> ExprId {
    match factors.split_first() {
        Some((first, rest)) => rest
            .iter()
            .fold(*first, |acc, f| ctx.add(Expr::Mul(acc, *f))),
        None => ctx.num(1),
    }
}

/// Multiply a limit value by a finite non-zero constant.
fn scale_value(ctx: &mut Context, value: LimitValue, c: ExprId) -> Option<LimitValue> {
    match value {
        LimitValue::Finite(v) => Some(LimitValue::Finite(ctx.add(Expr::Mul(c, v)))),
        LimitValue::Infinite(s) => {
            let c = normalize(ctx, c);
            finite_sign(ctx, c).map(|cs| LimitValue::Infinite(sign_product(s, cs)))
        }
    }
}
