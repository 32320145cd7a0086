//! Pattern-based reading of a natural-language problem: which operation is
//! asked for, on which expression, and (for limits) towards which point.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::SolveError;
use crate::expression::{clean_expression, validate_expression};
use crate::operation::{LimitPoint, Operation};

static RE_LIMIT_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"x(?:\s+tiende\s+a\s+|\s+(?:approaches|tends\s+to)\s+|\s*(?:->|→)\s*)([+-]?\d+/\d+|[+-]?\d+(?:\.\d+)?|[+-]?infinit[oy]|[+-]?inf|[+-]?oo|[+-]?∞|[a-z]+)",
    )
    .expect("valid regex literal")
});

static RE_FUNCTION_DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"f\(x\)\s*=\s*([^\n]+)").expect("valid regex literal"));

static RE_OPERATION_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:integral|derivada|límite|limite|derivative|limit)\s+(?:de|del|la|lo|of)\s+([^\n]+)")
        .expect("valid regex literal")
});

static RE_TRAILING_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:cuando|si|para|donde|when|as)\b").expect("valid regex literal")
});

static RE_LEADING_NOUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:la|the)\s+)?(?:función|funcion|expresión|expresion|function|expression)\s+")
        .expect("valid regex literal")
});

/// What the pattern matchers could read from a problem statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedProblem {
    pub operation: Option<Operation>,
    pub expression: Option<String>,
    pub limit_point: Option<LimitPoint>,
}

/// Classify the requested operation from keywords.
pub fn detect_operation(text: &str) -> Option<Operation> {
    let text = text.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| text.contains(w));

    if has_any(&["derivar", "derivada", "derivative", "differentiate", "derive"]) {
        Some(Operation::Derivative)
    } else if has_any(&["integrar", "integral", "integrate"]) {
        Some(Operation::Integral)
    } else if has_any(&["limite", "límite", "limit"]) {
        Some(Operation::Limit)
    } else {
        None
    }
}

/// Read the point in "x tiende a 0", "x approaches oo", "x -> 1/2".
pub fn extract_limit_point(text: &str) -> Option<LimitPoint> {
    let text = text.to_lowercase();
    let caps = RE_LIMIT_POINT.captures(&text)?;
    let value = caps[1].trim();

    let (negative, magnitude) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    if matches!(magnitude, "infinito" | "infinity" | "inf" | "oo" | "∞") {
        return Some(if negative {
            LimitPoint::NegInfinity
        } else {
            LimitPoint::PosInfinity
        });
    }

    if value.parse::<f64>().is_ok() {
        return Some(LimitPoint::Value(value.to_string()));
    }
    if let Some((numerator, denominator)) = value.split_once('/') {
        return Some(LimitPoint::Value(format!(
            "({}/{})",
            numerator.trim(),
            denominator.trim()
        )));
    }
    Some(LimitPoint::Value(value.to_string()))
}

/// Find the expression written in the problem, if any.
///
/// `Ok(None)` means no explicit expression is present; an expression that
/// is present but malformed is an error.
pub fn extract_expression(problem: &str) -> Result<Option<String>, SolveError> {
    let raw = if let Some(caps) = RE_FUNCTION_DEFINITION.captures(problem) {
        caps[1].to_string()
    } else {
        let lowered = problem.to_lowercase();
        match RE_OPERATION_OBJECT.captures(&lowered) {
            Some(caps) => {
                let object = caps[1].trim();
                RE_LEADING_NOUN.replace(object, "").into_owned()
            }
            None => return Ok(None),
        }
    };

    let raw = RE_TRAILING_CLAUSE
        .split(raw.trim())
        .next()
        .unwrap_or_default()
        .to_string();

    let expr = clean_expression(&raw);
    if !validate_expression(&expr) {
        return Err(SolveError::ExpresionInvalida(expr));
    }
    debug!(expr = %expr, "expression found in problem text");
    Ok(Some(expr))
}

/// Run every pattern matcher over a problem statement.
pub fn analyze_problem(problem: &str) -> Result<ParsedProblem, SolveError> {
    if problem.trim().is_empty() {
        return Err(SolveError::ProblemaVacio);
    }

    let operation = detect_operation(problem);
    let limit_point = match operation {
        Some(Operation::Limit) => extract_limit_point(problem),
        _ => None,
    };
    let expression = extract_expression(problem)?;

    Ok(ParsedProblem {
        operation,
        expression,
        limit_point,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_operation() {
        assert_eq!(
            detect_operation("Calcula la derivada de x^2"),
            Some(Operation::Derivative)
        );
        assert_eq!(detect_operation("Derivar sin(x)"), Some(Operation::Derivative));
        assert_eq!(
            detect_operation("Resuelve la INTEGRAL de x"),
            Some(Operation::Integral)
        );
        assert_eq!(
            detect_operation("Calcula el límite de 1/x"),
            Some(Operation::Limit)
        );
        assert_eq!(
            detect_operation("Find the derivative of x^3"),
            Some(Operation::Derivative)
        );
        assert_eq!(detect_operation("Suma 2 y 3"), None);
    }

    #[test]
    fn test_derivative_wins_over_later_keywords() {
        assert_eq!(
            detect_operation("la derivada de la integral"),
            Some(Operation::Derivative)
        );
    }

    #[test]
    fn test_extract_limit_point_numbers() {
        assert_eq!(
            extract_limit_point("cuando x tiende a 0"),
            Some(LimitPoint::Value("0".into()))
        );
        assert_eq!(
            extract_limit_point("cuando x tiende a -1.5"),
            Some(LimitPoint::Value("-1.5".into()))
        );
        assert_eq!(
            extract_limit_point("cuando x tiende a 1/2"),
            Some(LimitPoint::Value("(1/2)".into()))
        );
        assert_eq!(
            extract_limit_point("as x -> 3"),
            Some(LimitPoint::Value("3".into()))
        );
    }

    #[test]
    fn test_extract_limit_point_infinity() {
        assert_eq!(
            extract_limit_point("cuando x tiende a infinito"),
            Some(LimitPoint::PosInfinity)
        );
        assert_eq!(
            extract_limit_point("cuando x tiende a -inf"),
            Some(LimitPoint::NegInfinity)
        );
        assert_eq!(
            extract_limit_point("as x approaches infinity"),
            Some(LimitPoint::PosInfinity)
        );
        assert_eq!(
            extract_limit_point("x → -oo"),
            Some(LimitPoint::NegInfinity)
        );
    }

    #[test]
    fn test_extract_limit_point_identifier() {
        assert_eq!(
            extract_limit_point("cuando x tiende a A"),
            Some(LimitPoint::Value("a".into()))
        );
        assert_eq!(extract_limit_point("sin punto"), None);
    }

    #[test]
    fn test_extract_expression_from_definition() {
        assert_eq!(
            extract_expression("Deriva f(x) = 3x^2 + 2x").unwrap(),
            Some("3*x**2+2*x".to_string())
        );
        assert_eq!(
            extract_expression("Calcula el límite de f(x) = sin(x)/x cuando x tiende a 0")
                .unwrap(),
            Some("sin(x)/x".to_string())
        );
    }

    #[test]
    fn test_extract_expression_from_phrase() {
        assert_eq!(
            extract_expression("Calcula la integral de x^2 sin(x)").unwrap(),
            Some("x**2*sin(x)".to_string())
        );
        assert_eq!(
            extract_expression("Calcula el límite de (x^2-1)/(x-1) cuando x tiende a 1")
                .unwrap(),
            Some("(x**2-1)/(x-1)".to_string())
        );
        assert_eq!(
            extract_expression("Calcula la derivada de la función e^x cos(x)").unwrap(),
            Some("exp(x)*cos(x)".to_string())
        );
    }

    #[test]
    fn test_extract_expression_absent() {
        assert_eq!(
            extract_expression("¿Cuánto crece el área de un círculo?").unwrap(),
            None
        );
    }

    #[test]
    fn test_extract_expression_invalid() {
        let err = extract_expression("f(x) = (x+1").unwrap_err();
        assert_eq!(err, SolveError::ExpresionInvalida("(x+1".to_string()));
    }

    #[test]
    fn test_analyze_problem() {
        let parsed =
            analyze_problem("Calcula el límite de 1/x cuando x tiende a infinito").unwrap();
        assert_eq!(parsed.operation, Some(Operation::Limit));
        assert_eq!(parsed.expression.as_deref(), Some("1/x"));
        assert_eq!(parsed.limit_point, Some(LimitPoint::PosInfinity));

        let parsed = analyze_problem("Integra x^2").unwrap();
        assert_eq!(parsed.operation, None);

        assert_eq!(analyze_problem("   "), Err(SolveError::ProblemaVacio));
    }
}
