//! Dense univariate polynomials with rational coefficients.
//!
//! Used by the rational-function limit rules and by integration patterns
//! that need to read coefficients (`1/(a*x^2 + c)`).

use calc_ast::{Context, Expr, ExprId};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::canonical::{build_sum, sum_terms, Exponent, Term};

/// Largest power of a polynomial sum expanded while reading a rational
/// function.
const MAX_POLY_POWER: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Poly {
    /// `coeffs[i]` multiplies `x^i`. No trailing zeros.
    coeffs: Vec<BigRational>,
}

impl Poly {
    pub fn new(mut coeffs: Vec<BigRational>) -> Self {
        while coeffs.last().is_some_and(|c| c.is_zero()) {
            coeffs.pop();
        }
        Self { coeffs }
    }

    pub fn constant(c: BigRational) -> Self {
        Self::new(vec![c])
    }

    pub fn one() -> Self {
        Self::constant(BigRational::one())
    }

    /// `x^k`
    pub fn monomial(k: usize) -> Self {
        let mut coeffs = vec![BigRational::zero(); k + 1];
        coeffs[k] = BigRational::one();
        Self::new(coeffs)
    }

    pub fn coeffs(&self) -> &[BigRational] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn leading(&self) -> BigRational {
        self.coeffs.last().cloned().unwrap_or_else(BigRational::zero)
    }

    pub fn eval(&self, x: &BigRational) -> BigRational {
        // Horner
        self.coeffs
            .iter()
            .rev()
            .fold(BigRational::zero(), |acc, c| acc * x + c)
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let n = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..n)
            .map(|i| {
                let a = self.coeffs.get(i).cloned().unwrap_or_else(BigRational::zero);
                let b = other.coeffs.get(i).cloned().unwrap_or_else(BigRational::zero);
                a + b
            })
            .collect();
        Poly::new(coeffs)
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        if self.is_zero() || other.is_zero() {
            return Poly::new(Vec::new());
        }
        let mut coeffs = vec![BigRational::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Poly::new(coeffs)
    }

    pub fn scale(&self, k: &BigRational) -> Poly {
        Poly::new(self.coeffs.iter().map(|c| c * k).collect())
    }

    pub fn pow(&self, k: usize) -> Poly {
        (0..k).fold(Poly::one(), |acc, _| acc.mul(self))
    }

    /// Quotient of synthetic division by `(x - a)`; the remainder is
    /// dropped, so callers check `eval(a) == 0` first.
    pub fn div_linear(&self, a: &BigRational) -> Poly {
        if self.coeffs.len() < 2 {
            return Poly::new(Vec::new());
        }
        let n = self.coeffs.len();
        let mut quotient = vec![BigRational::zero(); n - 1];
        let mut carry = BigRational::zero();
        for i in (1..n).rev() {
            carry = &self.coeffs[i] + carry * a;
            quotient[i - 1] = carry.clone();
        }
        Poly::new(quotient)
    }

    /// Read a polynomial in `var` with numeric coefficients.
    pub fn from_expr(ctx: &mut Context, expr: ExprId, var: &str) -> Option<Poly> {
        let terms = sum_terms(ctx, expr);
        let mut acc = Poly::new(Vec::new());
        for term in &terms {
            let mut p = Poly::constant(term.coef.clone());
            for f in &term.factors {
                let k = var_power(ctx, f.base, &f.exp, var)?;
                let k = usize::try_from(k).ok()?;
                p = p.mul(&Poly::monomial(k));
            }
            acc = acc.add(&p);
        }
        Some(acc)
    }

    pub fn to_expr(&self, ctx: &mut Context, var: &str) -> ExprId {
        let terms: Vec<Term> = self
            .coeffs
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(i, c)| {
                let mut term = Term::constant(c.clone());
                if i > 0 {
                    let x = ctx.var(var);
                    term.factors.push(crate::canonical::Factor::new(
                        x,
                        Exponent::Rational(BigRational::from_integer((i as i64).into())),
                    ));
                }
                term
            })
            .collect();
        build_sum(ctx, &terms)
    }
}

/// Integer power of `var` carried by a factor, if it is `var^k`.
fn var_power(ctx: &Context, base: ExprId, exp: &Exponent, var: &str) -> Option<i64> {
    match (ctx.get(base), exp) {
        (Expr::Variable(v), Exponent::Rational(q)) if v == var && q.is_integer() => {
            q.to_integer().to_i64()
        }
        _ => None,
    }
}

/// Read `expr` as `N(x)/D(x)` with numeric coefficients.
pub fn rational_function(ctx: &mut Context, expr: ExprId, var: &str) -> Option<(Poly, Poly)> {
    let terms = sum_terms(ctx, expr);
    let mut parts: Vec<(Poly, Poly)> = Vec::with_capacity(terms.len());

    for term in &terms {
        let mut num = Poly::constant(term.coef.clone());
        let mut den = Poly::one();
        for f in &term.factors {
            if let Some(k) = var_power(ctx, f.base, &f.exp, var) {
                let m = Poly::monomial(k.unsigned_abs() as usize);
                if k >= 0 {
                    num = num.mul(&m);
                } else {
                    den = den.mul(&m);
                }
                continue;
            }
            let Exponent::Rational(q) = &f.exp else {
                return None;
            };
            if !q.is_integer() {
                return None;
            }
            let k = q.to_integer().to_i64()?;
            let power = usize::try_from(k.unsigned_abs()).ok()?;
            if power > MAX_POLY_POWER || !matches!(ctx.get(f.base), Expr::Add(..) | Expr::Sub(..)) {
                return None;
            }
            let p = Poly::from_expr(ctx, f.base, var)?.pow(power);
            if k > 0 {
                num = num.mul(&p);
            } else {
                den = den.mul(&p);
            }
        }
        parts.push((num, den));
    }

    let mut num = Poly::new(Vec::new());
    let mut den = Poly::one();
    for (n, d) in parts {
        // n/d + num/den = (n*den + num*d) / (d*den)
        num = n.mul(&den).add(&num.mul(&d));
        den = d.mul(&den);
    }
    if den.is_zero() {
        return None;
    }
    Some((num, den))
}

/// Sign of a rational as ±1 (0 for zero).
pub fn sign_of(q: &BigRational) -> i8 {
    if q.is_positive() {
        1
    } else if q.is_negative() {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calc_ast::DisplayExpr;
    use calc_parser::parse;
    use num_bigint::BigInt;

    fn q(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    #[test]
    fn test_from_expr_and_eval() {
        let mut ctx = Context::new();
        let e = parse("x^2 - 3*x + 2", &mut ctx).unwrap();
        let p = Poly::from_expr(&mut ctx, e, "x").unwrap();
        assert_eq!(p.degree(), 2);
        assert_eq!(p.leading(), q(1));
        assert!(p.eval(&q(1)).is_zero());
        assert!(p.eval(&q(2)).is_zero());
        assert_eq!(p.eval(&q(0)), q(2));
    }

    #[test]
    fn test_not_a_polynomial() {
        let mut ctx = Context::new();
        let e = parse("x + sin(x)", &mut ctx).unwrap();
        assert!(Poly::from_expr(&mut ctx, e, "x").is_none());
        let e = parse("x^(1/2)", &mut ctx).unwrap();
        assert!(Poly::from_expr(&mut ctx, e, "x").is_none());
    }

    #[test]
    fn test_div_linear() {
        // (x^2 - 1) / (x - 1) = x + 1
        let p = Poly::new(vec![q(-1), q(0), q(1)]);
        assert_eq!(p.div_linear(&q(1)), Poly::new(vec![q(1), q(1)]));
    }

    #[test]
    fn test_rational_function() {
        let mut ctx = Context::new();
        let e = parse("(x^2 - 1)/(x - 1)", &mut ctx).unwrap();
        let (n, d) = rational_function(&mut ctx, e, "x").unwrap();
        assert_eq!(n.degree(), 2);
        assert_eq!(d.degree(), 1);

        let e = parse("1 - 1/x", &mut ctx).unwrap();
        let (n, d) = rational_function(&mut ctx, e, "x").unwrap();
        assert_eq!(n, Poly::new(vec![q(-1), q(1)]));
        assert_eq!(d, Poly::new(vec![q(0), q(1)]));
    }

    #[test]
    fn test_to_expr() {
        let mut ctx = Context::new();
        let p = Poly::new(vec![q(1), q(-2), q(3)]);
        let e = p.to_expr(&mut ctx, "x");
        assert_eq!(
            DisplayExpr {
                context: &ctx,
                id: e
            }
            .to_string(),
            "3*x^2 - 2*x + 1"
        );
    }
}
