use num_bigint::BigInt;
use num_rational::BigRational;

/// Handle to a node stored in a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    Pi,
    E,
    Infinity,
    Undefined,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Number(BigRational),
    Constant(Constant),
    Variable(String),
    Add(ExprId, ExprId),
    Sub(ExprId, ExprId),
    Mul(ExprId, ExprId),
    Div(ExprId, ExprId),
    Pow(ExprId, ExprId),
    Neg(ExprId),
    Function(String, Vec<ExprId>), // e.g., sin(x), limit(f, x, 0)
}

/// Append-only arena owning every expression node of a computation.
///
/// Nodes are never removed; rewriting an expression allocates new nodes and
/// returns a new root id.
#[derive(Debug, Clone, Default)]
pub struct Context {
    nodes: Vec<Expr>,
}

impl Context {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn add(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr);
        id
    }

    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn num(&mut self, n: i64) -> ExprId {
        self.add(Expr::Number(BigRational::from_integer(BigInt::from(n))))
    }

    pub fn rational(&mut self, numer: i64, denom: i64) -> ExprId {
        self.add(Expr::Number(BigRational::new(
            BigInt::from(numer),
            BigInt::from(denom),
        )))
    }

    pub fn number(&mut self, n: BigRational) -> ExprId {
        self.add(Expr::Number(n))
    }

    pub fn var(&mut self, name: &str) -> ExprId {
        self.add(Expr::Variable(name.to_string()))
    }

    pub fn constant(&mut self, c: Constant) -> ExprId {
        self.add(Expr::Constant(c))
    }

    pub fn call(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        self.add(Expr::Function(name.to_string(), args))
    }

    /// Rational value of a number node, if `id` is one.
    pub fn as_number(&self, id: ExprId) -> Option<&BigRational> {
        match self.get(id) {
            Expr::Number(n) => Some(n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{One, Zero};

    #[test]
    fn test_arena_ids_are_sequential() {
        let mut ctx = Context::new();
        let a = ctx.num(1);
        let b = ctx.var("x");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(ctx.node_count(), 2);
    }

    #[test]
    fn test_rational_is_reduced() {
        let mut ctx = Context::new();
        let half = ctx.rational(2, 4);
        let n = ctx.as_number(half).unwrap();
        assert_eq!(*n.numer(), BigInt::from(1));
        assert_eq!(*n.denom(), BigInt::from(2));
    }

    #[test]
    fn test_as_number() {
        let mut ctx = Context::new();
        let zero = ctx.num(0);
        let one = ctx.num(1);
        let x = ctx.var("x");
        assert!(ctx.as_number(zero).unwrap().is_zero());
        assert!(ctx.as_number(one).unwrap().is_one());
        assert!(ctx.as_number(x).is_none());
    }
}
