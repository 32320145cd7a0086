//! Generated scripts: a few assignments and a print in a tiny statement
//! language the interpreter runs.

use calc_ast::{collect_variables, Context};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::error::SolveError;
use crate::expression::{clean_expression, validate_expression};
use crate::operation::{LimitPoint, Operation};

static RE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("valid regex literal"));

/// Names bound before any statement runs.
pub const PREDEFINED_NAMES: [&str; 4] = ["x", "e", "pi", "oo"];

/// One line of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `# text`
    Comment(String),
    /// `name = expression`
    Assign { name: String, value: String },
    /// `print("... {name} ...")`
    Print(String),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment(text) => write!(f, "# {}", text),
            Self::Assign { name, value } => write!(f, "{} = {}", name, value),
            Self::Print(template) => write!(f, "print(\"{}\")", template),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    statements: Vec<Statement>,
}

impl Script {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Read a script back from its source text.
    pub fn parse(source: &str) -> Result<Self, SolveError> {
        let mut statements = Vec::new();
        for (n, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                statements.push(Statement::Comment(comment.trim().to_string()));
            } else if let Some(body) = line
                .strip_prefix("print(\"")
                .and_then(|rest| rest.strip_suffix("\")"))
            {
                statements.push(Statement::Print(body.to_string()));
            } else if let Some((name, value)) = line.split_once('=') {
                let name = name.trim();
                if !RE_IDENTIFIER.is_match(name) {
                    return Err(SolveError::Ejecucion(format!(
                        "línea {}: nombre no válido '{}'",
                        n + 1,
                        name
                    )));
                }
                statements.push(Statement::Assign {
                    name: name.to_string(),
                    value: value.trim().to_string(),
                });
            } else {
                return Err(SolveError::Ejecucion(format!(
                    "línea {}: sintaxis no válida",
                    n + 1
                )));
            }
        }
        Ok(Self { statements })
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}

/// The limit point as an argument of `limit(...)`.
fn limit_argument(point: &LimitPoint) -> String {
    match point {
        LimitPoint::PosInfinity => "oo".to_string(),
        LimitPoint::NegInfinity => "-oo".to_string(),
        LimitPoint::Value(v) if v.parse::<f64>().is_ok() || RE_IDENTIFIER.is_match(v) => {
            v.clone()
        }
        LimitPoint::Value(v) => format!("sympify(\"{}\")", v),
    }
}

/// Free symbols other than the predefined names: the expression's first, sorted.
fn free_symbols(expr: &str, point: Option<&LimitPoint>) -> Vec<String> {
    let mut ctx = Context::new();
    let mut names = Vec::new();
    let sources = std::iter::once(expr).chain(point.map(LimitPoint::display));
    for source in sources {
        if let Ok(id) = calc_parser::parse(source, &mut ctx) {
            for name in collect_variables(&ctx, id) {
                if !PREDEFINED_NAMES.contains(&name.as_str()) && !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names
}

/// Build the script that computes `operation` on `expression`.
///
/// ```
/// use calc_problem::{generate_script, Operation};
///
/// let script = generate_script(Some(Operation::Derivative), Some("x^2"), None).unwrap();
/// assert!(script.to_string().contains("resultado = diff(expr, x)"));
/// ```
pub fn generate_script(
    operation: Option<Operation>,
    expression: Option<&str>,
    limit_point: Option<&LimitPoint>,
) -> Result<Script, SolveError> {
    let expression = expression
        .filter(|e| !e.trim().is_empty())
        .ok_or(SolveError::SinExpresion)?;

    let expr = clean_expression(expression);
    if !validate_expression(&expr) {
        return Err(SolveError::ExpresionInvalida(expr));
    }
    let operation = operation.ok_or(SolveError::OperacionNoSoportada)?;

    let point = match operation {
        Operation::Limit => Some(limit_point.cloned().unwrap_or(LimitPoint::PosInfinity)),
        _ => None,
    };

    let mut statements = vec![
        Statement::Comment(format!("{} de la expresión", capitalize(operation.display_name()))),
        Statement::Assign {
            name: "x".to_string(),
            value: "symbol(\"x\")".to_string(),
        },
    ];
    for name in free_symbols(&expr, point.as_ref()) {
        statements.push(Statement::Assign {
            value: format!("symbol(\"{}\")", name),
            name,
        });
    }
    statements.push(Statement::Assign {
        name: "expr".to_string(),
        value: expr,
    });

    let (call, sentence) = match (operation, &point) {
        (Operation::Limit, Some(point)) => (
            format!("limit(expr, x, {})", limit_argument(point)),
            format!(
                "El límite de {{expr}} cuando x → {} es: {{resultado}}",
                point.display()
            ),
        ),
        _ => (
            format!("{}(expr, x)", operation.engine_name()),
            format!("La {} de {{expr}} es: {{resultado}}", operation.display_name()),
        ),
    };
    statements.push(Statement::Assign {
        name: "resultado".to_string(),
        value: call,
    });
    statements.push(Statement::Print(sentence));

    Ok(Script::new(statements))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivative_template() {
        let script = generate_script(Some(Operation::Derivative), Some("x^2 + 2x"), None).unwrap();
        assert_eq!(
            script.to_string(),
            "# Derivada de la expresión\n\
             x = symbol(\"x\")\n\
             expr = x**2+2*x\n\
             resultado = diff(expr, x)\n\
             print(\"La derivada de {expr} es: {resultado}\")\n"
        );
    }

    #[test]
    fn test_integral_template() {
        let script = generate_script(Some(Operation::Integral), Some("cos(x)"), None).unwrap();
        let text = script.to_string();
        assert!(text.contains("resultado = integrate(expr, x)"));
        assert!(text.contains("print(\"La integral de {expr} es: {resultado}\")"));
    }

    #[test]
    fn test_limit_templates() {
        let point = LimitPoint::PosInfinity;
        let script = generate_script(Some(Operation::Limit), Some("1/x"), Some(&point)).unwrap();
        let text = script.to_string();
        assert!(text.contains("resultado = limit(expr, x, oo)"));
        assert!(text.contains("El límite de {expr} cuando x → oo es: {resultado}"));

        let point = LimitPoint::Value("(1/2)".into());
        let script = generate_script(Some(Operation::Limit), Some("x"), Some(&point)).unwrap();
        assert!(script
            .to_string()
            .contains("resultado = limit(expr, x, sympify(\"(1/2)\"))"));
    }

    #[test]
    fn test_limit_defaults_to_infinity() {
        let script = generate_script(Some(Operation::Limit), Some("1/x"), None).unwrap();
        assert!(script.to_string().contains("limit(expr, x, oo)"));
    }

    #[test]
    fn test_free_symbols_are_declared() {
        let point = LimitPoint::Value("a".into());
        let script =
            generate_script(Some(Operation::Limit), Some("k*x^2"), Some(&point)).unwrap();
        let text = script.to_string();
        assert!(text.contains("k = symbol(\"k\")"));
        assert!(text.contains("a = symbol(\"a\")"));
        assert!(text.contains("resultado = limit(expr, x, a)"));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            generate_script(Some(Operation::Derivative), None, None),
            Err(SolveError::SinExpresion)
        );
        assert_eq!(
            generate_script(None, Some("x"), None),
            Err(SolveError::OperacionNoSoportada)
        );
        assert_eq!(
            generate_script(Some(Operation::Integral), Some("x+*"), None),
            Err(SolveError::ExpresionInvalida("x+*".into()))
        );
    }

    #[test]
    fn test_parse_round_trip() {
        let script = generate_script(Some(Operation::Integral), Some("x"), None).unwrap();
        let reparsed = Script::parse(&script.to_string()).unwrap();
        assert_eq!(reparsed, script);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Script::parse("import os").is_err());
        assert!(Script::parse("1x = 2").is_err());
    }
}
