use calc_ast::{Context, DisplayExpr, ExprId};

/// Importance level for step filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImportanceLevel {
    Low = 1,    // Special values, canonical reordering
    Medium = 2, // Other rewrites
    High = 3,   // Differentiate, integrate, limits
}

#[derive(Debug, Clone)]
pub struct Step {
    pub description: String,
    pub rule_name: String,
    pub before: ExprId,
    pub after: ExprId,
    pub after_str: Option<String>,
}

impl Step {
    pub fn new(
        description: &str,
        rule_name: &str,
        before: ExprId,
        after: ExprId,
        context: Option<&Context>,
    ) -> Self {
        let after_str = context.map(|ctx| {
            format!(
                "{}",
                DisplayExpr {
                    context: ctx,
                    id: after
                }
            )
        });
        Self {
            description: description.to_string(),
            rule_name: rule_name.to_string(),
            before,
            after,
            after_str,
        }
    }

    /// Classify the importance/significance of this step
    pub fn importance(&self) -> ImportanceLevel {
        if self.rule_name.contains("Evaluate") || self.rule_name.contains("Canonicalize") {
            return ImportanceLevel::Low;
        }

        if self.rule_name.contains("Integrat")
            || self.rule_name.contains("Differentiat")
            || self.rule_name.contains("Limit")
        {
            return ImportanceLevel::High;
        }

        ImportanceLevel::Medium
    }
}
