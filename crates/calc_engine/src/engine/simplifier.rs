//! Simplifier struct definition, construction, and the simplify loop.
//!
//! The `Simplifier` is the main entry point of the engine. It owns the
//! expression context, the registered rules and the budget for the requests
//! it serves.

use super::transform::LocalSimplificationTransformer;
use crate::budget::{Budget, Metric, Operation};
use crate::canonical::normalize;
use crate::error::CasError;
use crate::rule::SimpleRule;
use crate::step::Step;
use calc_ast::{expr_eq, Context, ExprId};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

/// Rule/canonicalize rounds before the result is accepted as stable.
const MAX_PASSES: usize = 4;

pub struct Simplifier {
    pub context: Context,
    rules: HashMap<String, Vec<Arc<dyn SimpleRule>>>,
    global_rules: Vec<Arc<dyn SimpleRule>>,
    /// Record a `Step` for every rewrite.
    pub collect_steps: bool,
    budget: Budget,
}

impl Default for Simplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Simplifier {
    /// Create a new Simplifier without rules registered.
    ///
    /// Usually you want `Simplifier::with_default_rules()` instead.
    pub fn new() -> Self {
        Self {
            context: Context::new(),
            rules: HashMap::new(),
            global_rules: Vec::new(),
            collect_steps: true,
            budget: Budget::with_defaults(),
        }
    }

    /// Create a Simplifier with the calculus and function rules registered.
    ///
    /// # Example
    ///
    /// ```
    /// use calc_engine::Simplifier;
    /// use calc_ast::DisplayExpr;
    /// use calc_parser::parse;
    ///
    /// let mut s = Simplifier::with_default_rules();
    /// let expr = parse("diff(x^2, x)", &mut s.context).unwrap();
    /// let (result, _steps) = s.simplify(expr).unwrap();
    /// let shown = DisplayExpr { context: &s.context, id: result }.to_string();
    /// assert_eq!(shown, "2*x");
    /// ```
    pub fn with_default_rules() -> Self {
        let mut s = Self::new();
        s.register_default_rules();
        s
    }

    pub fn register_default_rules(&mut self) {
        crate::rules::calculus::register(self);
        crate::rules::functions::register(self);
    }

    pub fn add_rule(&mut self, rule: Box<dyn SimpleRule>) {
        let rule: Arc<dyn SimpleRule> = rule.into();
        match rule.target_types() {
            Some(targets) => {
                for target in targets {
                    self.rules
                        .entry(target.to_string())
                        .or_default()
                        .push(Arc::clone(&rule));
                }
            }
            None => self.global_rules.push(rule),
        }
    }

    /// Names of every registered rule, sorted and deduplicated.
    pub fn rule_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let targeted = self.rules.values().flatten();
        for rule in targeted.chain(self.global_rules.iter()) {
            let name = rule.name().to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names.sort();
        names
    }

    /// Replace the budget used by subsequent `simplify` calls.
    pub fn set_budget(&mut self, budget: Budget) {
        self.budget = budget;
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// Apply the registered rules bottom-up and canonicalize, repeating until
    /// the expression is stable.
    ///
    /// The budget is reset on entry. Fails only when it runs out.
    pub fn simplify(&mut self, expr: ExprId) -> Result<(ExprId, Vec<Step>), CasError> {
        let mut current = expr;
        let mut steps = Vec::new();
        self.budget.reset();

        for pass in 0..MAX_PASSES {
            let nodes_before = self.context.node_count();

            let rewritten = {
                let mut transformer = LocalSimplificationTransformer {
                    context: &mut self.context,
                    rules: &self.rules,
                    global_rules: &self.global_rules,
                    budget: &mut self.budget,
                    collect_steps: self.collect_steps,
                    steps: Vec::new(),
                    current_depth: 0,
                };
                let rewritten = transformer.transform(current)?;
                steps.append(&mut transformer.steps);
                rewritten
            };

            let normalized = normalize(&mut self.context, rewritten);
            if self.collect_steps && !expr_eq(&self.context, normalized, rewritten) {
                steps.push(Step::new(
                    "Collect and order terms",
                    "Canonicalize",
                    rewritten,
                    normalized,
                    Some(&self.context),
                ));
            }

            let created = self.context.node_count().saturating_sub(nodes_before);
            self.budget
                .charge(Operation::Simplify, Metric::NodesCreated, created as u64)?;

            if expr_eq(&self.context, normalized, current) {
                debug!(pass, steps = steps.len(), "simplify reached a fixed point");
                return Ok((normalized, steps));
            }
            current = normalized;
        }

        Ok((current, steps))
    }
}
