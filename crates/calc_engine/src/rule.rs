use calc_ast::{Context, ExprId};

/// Result of a rule application containing the new expression and metadata
pub struct Rewrite {
    /// The transformed expression
    pub new_expr: ExprId,
    /// Human-readable description of the transformation
    pub description: String,
}

impl Rewrite {
    pub fn simple(new_expr: ExprId, description: impl Into<String>) -> Self {
        Rewrite {
            new_expr,
            description: description.into(),
        }
    }
}

/// A local rewrite applied by the simplifier at a single node.
pub trait SimpleRule: Send + Sync {
    fn name(&self) -> &str;

    fn apply_simple(&self, context: &mut Context, expr: ExprId) -> Option<Rewrite>;

    // Optional: Return list of Expr variant names this rule targets.
    // If None, the rule is applied to all nodes.
    // Variants: "Add", "Sub", "Mul", "Div", "Pow", "Neg", "Function", "Variable", "Number", "Constant"
    fn target_types(&self) -> Option<Vec<&str>> {
        None
    }
}
