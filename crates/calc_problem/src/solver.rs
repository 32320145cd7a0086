use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::analysis::analyze_problem;
use crate::error::SolveError;
use crate::explain::explain;
use crate::interpreter::{Interpreter, StepSummary};
use crate::latex::output_to_latex;
use crate::llm::{extract_with_model, ExpressionModel};
use crate::operation::{LimitPoint, Operation};
use crate::script::{generate_script, Script};

/// Everything produced while solving one problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub problem: String,
    pub operation: Operation,
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_point: Option<LimitPoint>,
    /// Source text of the generated script.
    pub script: String,
    /// What the script printed.
    pub output: String,
    pub latex: String,
    pub explanation: String,
    pub steps: Vec<StepSummary>,
}

/// A problem analyzed into a script that has not run yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedProblem {
    pub problem: String,
    pub operation: Operation,
    pub expression: String,
    pub limit_point: Option<LimitPoint>,
    pub script: Script,
    /// Explanation without engine steps.
    pub explanation: String,
}

/// Runs the whole pipeline for a problem statement.
///
/// Without a model, problems that state no expression fail with
/// `SolveError::SinExpresion`.
#[derive(Clone)]
pub struct Solver {
    model: Option<Arc<dyn ExpressionModel>>,
    collect_steps: bool,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self {
            model: None,
            collect_steps: true,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn ExpressionModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_steps(mut self, collect: bool) -> Self {
        self.collect_steps = collect;
        self
    }

    pub async fn solve_problem(&self, problem: &str) -> Result<Solution, SolveError> {
        let prepared = self.prepare(problem).await?;
        self.execute(prepared)
    }

    /// Analyze the problem and generate its script, without running it.
    pub async fn prepare(&self, problem: &str) -> Result<PreparedProblem, SolveError> {
        let parsed = analyze_problem(problem)?;
        let operation = parsed.operation.ok_or(SolveError::OperacionNoReconocida)?;

        let expression = match (parsed.expression, &self.model) {
            (Some(expr), _) => expr,
            (None, Some(model)) => extract_with_model(model.as_ref(), problem).await?,
            (None, None) => return Err(SolveError::SinExpresion),
        };

        let script = generate_script(
            Some(operation),
            Some(&expression),
            parsed.limit_point.as_ref(),
        )?;
        let explanation = explain(operation, &expression, parsed.limit_point.as_ref(), &[]);

        Ok(PreparedProblem {
            problem: problem.to_string(),
            operation,
            expression,
            limit_point: parsed.limit_point,
            script,
            explanation,
        })
    }

    /// Run a prepared script. On failure the prepared script and
    /// explanation are still available to the caller.
    pub fn execute(&self, prepared: PreparedProblem) -> Result<Solution, SolveError> {
        let execution = Interpreter::new()
            .with_steps(self.collect_steps)
            .run(&prepared.script)
            .inspect_err(|e| warn!(error = %e, "script execution failed"))?;

        let output = execution.output.trim().to_string();
        let latex = output_to_latex(&output);
        let explanation = explain(
            prepared.operation,
            &prepared.expression,
            prepared.limit_point.as_ref(),
            &execution.steps,
        );
        info!(
            operation = %prepared.operation,
            expression = %prepared.expression,
            result = %output,
            "problem solved"
        );

        Ok(Solution {
            problem: prepared.problem,
            operation: prepared.operation,
            expression: prepared.expression,
            limit_point: prepared.limit_point,
            script: prepared.script.to_string(),
            output,
            latex,
            explanation,
            steps: execution.steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl ExpressionModel for Fixed {
        async fn extract_expression(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_solve_derivative() {
        let solution = Solver::new()
            .solve_problem("Calcula la derivada de f(x) = x^3 + 2x")
            .await
            .unwrap();
        assert_eq!(solution.operation, Operation::Derivative);
        assert_eq!(solution.expression, "x**3+2*x");
        assert_eq!(solution.output, "La derivada de x^3 + 2*x es: 3*x^2 + 2");
        assert!(solution.latex.starts_with(r"La derivada de \( "));
        assert!(solution.explanation.starts_with("1. Tipo de operación: derivada"));
    }

    #[tokio::test]
    async fn test_solve_limit() {
        let solution = Solver::new()
            .solve_problem("Calcula el límite de sin(x)/x cuando x tiende a 0")
            .await
            .unwrap();
        assert_eq!(solution.output, "El límite de sin(x)/x cuando x → 0 es: 1");
        assert_eq!(solution.limit_point, Some(LimitPoint::Value("0".into())));
    }

    #[tokio::test]
    async fn test_model_fallback() {
        let solver = Solver::new().with_model(Arc::new(Fixed("x**2")));
        let solution = solver
            .solve_problem("Integra el área bajo la parábola unidad (integral)")
            .await
            .unwrap();
        assert_eq!(solution.expression, "x**2");
        assert_eq!(solution.output, "La integral de x^2 es: x^3/3");
    }

    #[tokio::test]
    async fn test_prepared_script_survives_execution_failure() {
        let solver = Solver::new();
        let prepared = solver
            .prepare("Calcula la derivada de f(x) = foo(x)")
            .await
            .unwrap();
        assert!(prepared.script.to_string().contains("expr = foo(x)"));
        assert!(prepared.explanation.starts_with("1. Tipo de operación: derivada"));

        let err = solver.execute(prepared.clone()).unwrap_err();
        assert_eq!(err, SolveError::Ejecucion("name 'foo' is not defined".into()));
        assert_eq!(
            solver
                .solve_problem("Calcula la derivada de f(x) = foo(x)")
                .await
                .unwrap_err(),
            err
        );
    }

    #[tokio::test]
    async fn test_errors() {
        let solver = Solver::new();
        assert_eq!(
            solver.solve_problem("").await.unwrap_err(),
            SolveError::ProblemaVacio
        );
        assert_eq!(
            solver.solve_problem("Hola, ¿qué tal?").await.unwrap_err(),
            SolveError::OperacionNoReconocida
        );
        assert_eq!(
            solver
                .solve_problem("Quiero una integral bonita")
                .await
                .unwrap_err(),
            SolveError::SinExpresion
        );
    }
}
