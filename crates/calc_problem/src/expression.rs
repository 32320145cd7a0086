//! Normalization of informal math notation into the expression language.

use calc_ast::Context;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

static RE_FX_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[fgh]\(x\)=").expect("valid regex literal"));

// `e**x` and `e**(x+1)`, but not the tail of a longer name such as `sec**2`
static RE_EXP_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^A-Za-z_])e\*\*([^(*])").expect("valid regex literal")
});
static RE_EXP_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^A-Za-z_])e\*\*(\([^)]+\))").expect("valid regex literal")
});

static RE_NUM_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)([a-z])").expect("valid regex literal"));
static RE_PAREN_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\)([a-z])").expect("valid regex literal"));
static RE_NUM_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\(").expect("valid regex literal"));

static RE_FUNCTION_NAMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(asin|acos|atan|sinh|cosh|tanh|sin|cos|tan|exp|log|ln|sqrt|abs|pi)\b")
        .expect("valid regex literal")
});
static RE_CAPITAL_E: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bE\b").expect("valid regex literal"));

/// Rewrite an expression typed by a person (or a model) into the form the
/// parser and the generated scripts expect.
///
/// ```
/// use calc_problem::clean_expression;
///
/// assert_eq!(clean_expression("3x^2 + 2x"), "3*x**2+2*x");
/// assert_eq!(clean_expression("e^(2x)"), "exp(2*x)");
/// ```
pub fn clean_expression(expr: &str) -> String {
    let mut expr: String = expr.chars().filter(|c| !c.is_whitespace()).collect();

    expr = RE_FX_PREFIX.replace(&expr, "").into_owned();
    while expr.ends_with('.') || expr.ends_with(',') || expr.ends_with(';') {
        expr.pop();
    }

    expr = expr.replace('^', "**");

    expr = RE_EXP_GROUP
        .replace_all(&expr, |caps: &Captures| format!("{}exp{}", &caps[1], &caps[2]))
        .into_owned();
    expr = RE_EXP_SINGLE
        .replace_all(&expr, |caps: &Captures| format!("{}exp({})", &caps[1], &caps[2]))
        .into_owned();

    expr = RE_NUM_LETTER.replace_all(&expr, "$1*$2").into_owned();
    expr = RE_PAREN_LETTER.replace_all(&expr, ")*$1").into_owned();
    expr = RE_NUM_PAREN.replace_all(&expr, "$1*(").into_owned();

    if expr == "e" {
        expr = "E".to_string();
    }

    expr
}

/// Best-effort check that `expr` is a well-formed expression.
pub fn validate_expression(expr: &str) -> bool {
    let expr = expr.replace("sp.", "");
    let mut ctx = Context::new();
    match calc_parser::parse(&expr, &mut ctx) {
        Ok(_) => true,
        Err(e) => {
            debug!(expr = %expr, error = %e, "expression rejected");
            false
        }
    }
}

/// Lowercase function names and constants (`SIN(x)` → `sin(x)`, `PI` → `pi`).
pub fn format_expression(expr: &str) -> String {
    let expr = RE_FUNCTION_NAMES.replace_all(expr, |caps: &Captures| caps[1].to_lowercase());
    RE_CAPITAL_E.replace_all(&expr, "e").into_owned()
}
