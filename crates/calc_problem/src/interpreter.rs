//! Restricted-namespace interpreter for generated scripts.
//!
//! Only the predefined names, the names a script assigns, and a fixed set
//! of callables resolve; anything else fails the run like an undefined name
//! would. Printed text is captured instead of written to stdout.

use calc_ast::{DisplayExpr, Expr, ExprId};
use calc_engine::{ImportanceLevel, Simplifier, Step};
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::SolveError;
use crate::script::{Script, Statement};

/// Callables visible to scripts.
pub const CALLABLES: [&str; 16] = [
    "sin", "cos", "tan", "asin", "acos", "atan", "exp", "log", "ln", "sqrt", "abs", "symbol",
    "sympify", "diff", "integrate", "limit",
];

static RE_STRING_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(symbol|sympify)\(\s*"([^"]*)"\s*\)"#).expect("valid regex literal")
});

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex literal"));

static RE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex literal"));

/// A simplifier step, detached from the expression arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepSummary {
    pub rule: String,
    pub description: String,
    pub result: Option<String>,
}

impl From<&Step> for StepSummary {
    fn from(step: &Step) -> Self {
        Self {
            rule: step.rule_name.clone(),
            description: step.description.clone(),
            result: step.after_str.clone(),
        }
    }
}

/// What a script run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionOutput {
    /// Everything the script printed, one line per `print`.
    pub output: String,
    /// Significant engine steps, in order.
    pub steps: Vec<StepSummary>,
}

fn name_error(name: &str) -> SolveError {
    SolveError::Ejecucion(format!("name '{}' is not defined", name))
}

pub struct Interpreter {
    simplifier: Simplifier,
    namespace: HashMap<String, ExprId>,
    output: String,
    steps: Vec<StepSummary>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let mut simplifier = Simplifier::with_default_rules();
        let ctx = &mut simplifier.context;
        let namespace = HashMap::from([
            ("x".to_string(), ctx.var("x")),
            ("e".to_string(), ctx.constant(calc_ast::Constant::E)),
            ("pi".to_string(), ctx.constant(calc_ast::Constant::Pi)),
            ("oo".to_string(), ctx.constant(calc_ast::Constant::Infinity)),
        ]);
        Self {
            simplifier,
            namespace,
            output: String::new(),
            steps: Vec::new(),
        }
    }

    /// Record engine steps; on by default.
    pub fn with_steps(mut self, collect: bool) -> Self {
        self.simplifier.collect_steps = collect;
        self
    }

    pub fn run(mut self, script: &Script) -> Result<ExecutionOutput, SolveError> {
        for statement in script.statements() {
            match statement {
                Statement::Comment(_) => {}
                Statement::Assign { name, value } => {
                    let id = self.evaluate(value)?;
                    self.namespace.insert(name.clone(), id);
                }
                Statement::Print(template) => {
                    let line = self.render(template)?;
                    self.output.push_str(&line);
                    self.output.push('\n');
                }
            }
        }
        Ok(ExecutionOutput {
            output: self.output,
            steps: self.steps,
        })
    }

    fn evaluate(&mut self, source: &str) -> Result<ExprId, SolveError> {
        let mut literals: HashMap<String, ExprId> = HashMap::new();
        let mut failure = None;

        // String-argument calls become placeholders bound to their value.
        let rewritten = RE_STRING_CALL.replace_all(source, |caps: &Captures| {
            let placeholder = format!("__literal{}", literals.len());
            let ctx = &mut self.simplifier.context;
            let value = match &caps[1] {
                "symbol" if RE_IDENTIFIER.is_match(&caps[2]) => Ok(ctx.var(&caps[2])),
                "symbol" => Err(SolveError::Ejecucion(format!(
                    "symbol() necesita un nombre, no '{}'",
                    &caps[2]
                ))),
                _ => calc_parser::parse(&caps[2], ctx).map_err(|e| {
                    SolveError::Ejecucion(format!("sympify('{}'): {}", &caps[2], e))
                }),
            };
            match value {
                Ok(id) => {
                    literals.insert(placeholder.clone(), id);
                }
                Err(e) => failure = Some(e),
            }
            placeholder
        });
        if let Some(e) = failure {
            return Err(e);
        }

        let parsed = calc_parser::parse(&rewritten, &mut self.simplifier.context)
            .map_err(|e| SolveError::Ejecucion(format!("sintaxis no válida en '{}': {}", source, e)))?;
        let resolved = self.resolve(parsed, &literals)?;

        let (result, steps) = self
            .simplifier
            .simplify(resolved)
            .map_err(|e| SolveError::Ejecucion(e.to_string()))?;
        self.steps.extend(
            steps
                .iter()
                .filter(|s| s.importance() >= ImportanceLevel::Medium)
                .map(StepSummary::from),
        );
        debug!(
            source,
            result = %DisplayExpr { context: &self.simplifier.context, id: result },
            "statement evaluated"
        );
        Ok(result)
    }

    /// Replace names with their bindings and reject anything outside the
    /// namespace.
    fn resolve(
        &mut self,
        id: ExprId,
        literals: &HashMap<String, ExprId>,
    ) -> Result<ExprId, SolveError> {
        let expr = self.simplifier.context.get(id).clone();
        let resolved = match expr {
            Expr::Number(_) | Expr::Constant(_) => id,
            Expr::Variable(name) => match literals.get(&name).or(self.namespace.get(&name)) {
                Some(bound) => *bound,
                None => return Err(name_error(&name)),
            },
            Expr::Add(l, r) => self.resolve_binary(l, r, literals, Expr::Add)?,
            Expr::Sub(l, r) => self.resolve_binary(l, r, literals, Expr::Sub)?,
            Expr::Mul(l, r) => self.resolve_binary(l, r, literals, Expr::Mul)?,
            Expr::Div(l, r) => self.resolve_binary(l, r, literals, Expr::Div)?,
            Expr::Pow(b, e) => self.resolve_binary(b, e, literals, Expr::Pow)?,
            Expr::Neg(inner) => {
                let inner = self.resolve(inner, literals)?;
                self.simplifier.context.add(Expr::Neg(inner))
            }
            Expr::Function(name, args) => {
                if !CALLABLES.contains(&name.as_str()) {
                    return Err(name_error(&name));
                }
                let args = args
                    .into_iter()
                    .map(|a| self.resolve(a, literals))
                    .collect::<Result<Vec<_>, _>>()?;
                if name == "sympify" && args.len() == 1 {
                    args[0]
                } else if name == "symbol" || name == "sympify" {
                    return Err(SolveError::Ejecucion(format!(
                        "{}() espera un texto entre comillas",
                        name
                    )));
                } else {
                    self.simplifier.context.add(Expr::Function(name, args))
                }
            }
        };
        Ok(resolved)
    }

    fn resolve_binary(
        &mut self,
        left: ExprId,
        right: ExprId,
        literals: &HashMap<String, ExprId>,
        build: fn(ExprId, ExprId) -> Expr,
    ) -> Result<ExprId, SolveError> {
        let left = self.resolve(left, literals)?;
        let right = self.resolve(right, literals)?;
        Ok(self.simplifier.context.add(build(left, right)))
    }

    fn render(&self, template: &str) -> Result<String, SolveError> {
        let mut missing = None;
        let line = RE_PLACEHOLDER.replace_all(template, |caps: &Captures| {
            match self.namespace.get(&caps[1]) {
                Some(id) => DisplayExpr {
                    context: &self.simplifier.context,
                    id: *id,
                }
                .to_string(),
                None => {
                    missing.get_or_insert_with(|| caps[1].to_string());
                    String::new()
                }
            }
        });
        match missing {
            Some(name) => Err(name_error(&name)),
            None => Ok(line.into_owned()),
        }
    }
}

/// Run a script in a fresh namespace and capture what it prints.
pub fn execute_script(script: &Script) -> Result<ExecutionOutput, SolveError> {
    Interpreter::new().run(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{LimitPoint, Operation};
    use crate::script::generate_script;

    fn run(source: &str) -> Result<String, SolveError> {
        let script = Script::parse(source)?;
        execute_script(&script).map(|out| out.output)
    }

    fn run_generated(op: Operation, expr: &str, point: Option<LimitPoint>) -> String {
        let script = generate_script(Some(op), Some(expr), point.as_ref()).unwrap();
        execute_script(&script).unwrap().output
    }

    #[test]
    fn test_derivative_script() {
        assert_eq!(
            run_generated(Operation::Derivative, "x^2 + 2x", None),
            "La derivada de x^2 + 2*x es: 2*x + 2\n"
        );
    }

    #[test]
    fn test_integral_script() {
        assert_eq!(
            run_generated(Operation::Integral, "cos(x)", None),
            "La integral de cos(x) es: sin(x)\n"
        );
    }

    #[test]
    fn test_limit_scripts() {
        assert_eq!(
            run_generated(Operation::Limit, "sin(x)/x", Some(LimitPoint::Value("0".into()))),
            "El límite de sin(x)/x cuando x → 0 es: 1\n"
        );
        assert_eq!(
            run_generated(Operation::Limit, "1/x", Some(LimitPoint::PosInfinity)),
            "El límite de 1/x cuando x → oo es: 0\n"
        );
        assert_eq!(
            run_generated(Operation::Limit, "x^2", Some(LimitPoint::Value("(1/2)".into()))),
            "El límite de x^2 cuando x → (1/2) es: 1/4\n"
        );
    }

    #[test]
    fn test_symbolic_limit_point() {
        assert_eq!(
            run_generated(Operation::Limit, "x^2", Some(LimitPoint::Value("a".into()))),
            "El límite de x^2 cuando x → a es: a^2\n"
        );
    }

    #[test]
    fn test_unknown_name_fails() {
        let err = run("expr = y + 1").unwrap_err();
        assert_eq!(err, SolveError::Ejecucion("name 'y' is not defined".into()));
    }

    #[test]
    fn test_unknown_function_fails() {
        let err = run("expr = system(x)").unwrap_err();
        assert_eq!(
            err,
            SolveError::Ejecucion("name 'system' is not defined".into())
        );
    }

    #[test]
    fn test_print_of_unbound_name_fails() {
        let err = run("print(\"{nada}\")").unwrap_err();
        assert_eq!(err, SolveError::Ejecucion("name 'nada' is not defined".into()));
    }

    #[test]
    fn test_predefined_constants() {
        assert_eq!(run("r = log(e)\nprint(\"{r}\")").unwrap(), "1\n");
        assert_eq!(run("r = cos(pi)\nprint(\"{r}\")").unwrap(), "-1\n");
    }

    #[test]
    fn test_sympify_binds_free_symbols() {
        assert_eq!(
            run("r = sympify(\"b + 1\")\nprint(\"{r}\")").unwrap(),
            "b + 1\n"
        );
    }

    #[test]
    fn test_steps_are_collected() {
        let script = generate_script(Some(Operation::Derivative), Some("x^3"), None).unwrap();
        let out = execute_script(&script).unwrap();
        assert!(out
            .steps
            .iter()
            .any(|s| s.rule == "Symbolic Differentiation"));

        let quiet = Interpreter::new().with_steps(false).run(&script).unwrap();
        assert!(quiet.steps.is_empty());
    }
}
