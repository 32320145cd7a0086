//! Rewrite engine core: `LocalSimplificationTransformer`.
//!
//! Children are simplified first, then matching rules are applied at the
//! node until none fires. Every accepted rewrite is charged to the budget
//! and optionally recorded as a step.

use crate::budget::{Budget, Metric, Operation};
use crate::error::CasError;
use crate::rule::SimpleRule;
use crate::step::Step;
use calc_ast::{expr_eq, Context, Expr, ExprId};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

/// Maximum recursion depth for simplification.
const MAX_SIMPLIFY_DEPTH: usize = 50;

/// Rewrites accepted at a single node before moving on.
const MAX_REWRITES_PER_NODE: usize = 16;

pub(super) struct LocalSimplificationTransformer<'a> {
    pub(super) context: &'a mut Context,
    pub(super) rules: &'a HashMap<String, Vec<Arc<dyn SimpleRule>>>,
    pub(super) global_rules: &'a [Arc<dyn SimpleRule>],
    pub(super) budget: &'a mut Budget,
    pub(super) collect_steps: bool,
    pub(super) steps: Vec<Step>,
    pub(super) current_depth: usize,
}

impl<'a> LocalSimplificationTransformer<'a> {
    pub(super) fn transform(&mut self, id: ExprId) -> Result<ExprId, CasError> {
        if self.current_depth >= MAX_SIMPLIFY_DEPTH {
            debug!(depth = self.current_depth, "simplify depth limit reached");
            return Ok(id);
        }
        self.current_depth += 1;
        let result = self.transform_children(id).and_then(|id| self.apply_rules(id));
        self.current_depth -= 1;
        result
    }

    fn transform_children(&mut self, id: ExprId) -> Result<ExprId, CasError> {
        let expr = self.context.get(id).clone();
        let rebuilt = match expr {
            Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => return Ok(id),
            Expr::Add(l, r) => self.transform_binary(id, l, r, Expr::Add)?,
            Expr::Sub(l, r) => self.transform_binary(id, l, r, Expr::Sub)?,
            Expr::Mul(l, r) => self.transform_binary(id, l, r, Expr::Mul)?,
            Expr::Div(l, r) => self.transform_binary(id, l, r, Expr::Div)?,
            Expr::Pow(b, e) => self.transform_binary(id, b, e, Expr::Pow)?,
            Expr::Neg(inner) => {
                let new_inner = self.transform(inner)?;
                if new_inner == inner {
                    id
                } else {
                    self.context.add(Expr::Neg(new_inner))
                }
            }
            Expr::Function(name, args) => {
                let mut changed = false;
                let mut new_args = Vec::with_capacity(args.len());
                for arg in args {
                    let new_arg = self.transform(arg)?;
                    changed |= new_arg != arg;
                    new_args.push(new_arg);
                }
                if changed {
                    self.context.add(Expr::Function(name, new_args))
                } else {
                    id
                }
            }
        };
        Ok(rebuilt)
    }

    fn transform_binary(
        &mut self,
        id: ExprId,
        left: ExprId,
        right: ExprId,
        build: fn(ExprId, ExprId) -> Expr,
    ) -> Result<ExprId, CasError> {
        let new_left = self.transform(left)?;
        let new_right = self.transform(right)?;
        if new_left == left && new_right == right {
            Ok(id)
        } else {
            Ok(self.context.add(build(new_left, new_right)))
        }
    }

    fn apply_rules(&mut self, mut id: ExprId) -> Result<ExprId, CasError> {
        for _ in 0..MAX_REWRITES_PER_NODE {
            let Some((rule_name, rewrite)) = self.first_match(id) else {
                return Ok(id);
            };
            self.budget
                .charge(Operation::Simplify, Metric::RewriteSteps, 1)?;
            debug!(rule = %rule_name, "{}", rewrite.description);
            if self.collect_steps {
                self.steps.push(Step::new(
                    &rewrite.description,
                    &rule_name,
                    id,
                    rewrite.new_expr,
                    Some(&*self.context),
                ));
            }
            // The rewrite may expose new redexes below the node.
            id = self.transform_children(rewrite.new_expr)?;
        }
        Ok(id)
    }

    fn first_match(&mut self, id: ExprId) -> Option<(String, crate::rule::Rewrite)> {
        let rules = self.rules;
        let global_rules = self.global_rules;
        let variant = get_variant_name(self.context.get(id));
        let targeted = rules.get(variant).map(Vec::as_slice).unwrap_or(&[]);

        for rule in targeted.iter().chain(global_rules.iter()) {
            if let Some(rewrite) = rule.apply_simple(self.context, id) {
                if expr_eq(self.context, rewrite.new_expr, id) {
                    continue;
                }
                return Some((rule.name().to_string(), rewrite));
            }
        }
        None
    }
}

pub(super) fn get_variant_name(expr: &Expr) -> &'static str {
    match expr {
        Expr::Number(_) => "Number",
        Expr::Constant(_) => "Constant",
        Expr::Variable(_) => "Variable",
        Expr::Add(_, _) => "Add",
        Expr::Sub(_, _) => "Sub",
        Expr::Mul(_, _) => "Mul",
        Expr::Div(_, _) => "Div",
        Expr::Pow(_, _) => "Pow",
        Expr::Neg(_) => "Neg",
        Expr::Function(_, _) => "Function",
    }
}
