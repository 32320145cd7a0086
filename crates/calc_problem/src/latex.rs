//! Conversion of printed script output into MathJax-ready text.

use calc_ast::{Context, LaTeXExpr};
use regex::Regex;
use std::sync::LazyLock;

static RE_OPERATION_SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"La (.+?) de (.+?) es: (.+)").expect("valid regex literal"));
static RE_LIMIT_SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"El límite de (.+?) cuando x → (.+?) es: (.+)").expect("valid regex literal")
});

static RE_ABS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\babs\(([^)]+)\)").expect("valid regex literal"));
static RE_ARC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\ba(sin|cos|tan)\b").expect("valid regex literal"));
static RE_NAMED_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(sin|cos|tan|exp|log|sqrt)\b").expect("valid regex literal")
});
static RE_PI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpi\b").expect("valid regex literal"));
static RE_INFINITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\boo\b").expect("valid regex literal"));
static RE_EULER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\be\b").expect("valid regex literal"));
static RE_COMMAND_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([a-z]+)\(([^)]+)\)").expect("valid regex literal"));

/// Textual LaTeX conversion for fragments the parser does not accept.
pub fn plain_to_latex(expr: &str) -> String {
    let expr = expr.replace("**", "^").replace('*', r"\cdot ");
    let expr = RE_ABS.replace_all(&expr, r"\left|${1}\right|");
    let expr = RE_ARC.replace_all(&expr, r"\arc${1}");
    let expr = RE_NAMED_FUNCTION.replace_all(&expr, r"\${1}");
    let expr = RE_PI.replace_all(&expr, r"\pi");
    let expr = RE_INFINITY.replace_all(&expr, r"\infty");
    let expr = RE_EULER.replace_all(&expr, r"\mathrm{e}");
    RE_COMMAND_CALL
        .replace_all(&expr, r"\${1}{${2}}")
        .into_owned()
}

/// LaTeX for one expression fragment of printed output.
pub fn fragment_to_latex(fragment: &str) -> String {
    let mut ctx = Context::new();
    match calc_parser::parse(fragment, &mut ctx) {
        Ok(id) => LaTeXExpr { context: &ctx, id }.to_latex(),
        Err(_) => plain_to_latex(fragment),
    }
}

/// Typeset the sentences a generated script prints; other text is returned
/// unchanged.
///
/// ```
/// use calc_problem::output_to_latex;
///
/// assert_eq!(
///     output_to_latex("La derivada de x^2 es: 2*x"),
///     r"La derivada de \( {x}^{2} \) es \( 2 \cdot x \)"
/// );
/// ```
pub fn output_to_latex(text: &str) -> String {
    if let Some(caps) = RE_OPERATION_SENTENCE.captures(text) {
        return format!(
            r"La {} de \( {} \) es \( {} \)",
            &caps[1],
            fragment_to_latex(&caps[2]),
            fragment_to_latex(&caps[3])
        );
    }
    if let Some(caps) = RE_LIMIT_SENTENCE.captures(text) {
        return format!(
            r"El límite de \( {} \) cuando \( x \to {} \) es \( {} \)",
            fragment_to_latex(&caps[1]),
            fragment_to_latex(&caps[2]),
            fragment_to_latex(&caps[3])
        );
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_sentence() {
        assert_eq!(
            output_to_latex("La integral de cos(x) es: sin(x)"),
            r"La integral de \( \cos\left(x\right) \) es \( \sin\left(x\right) \)"
        );
    }

    #[test]
    fn test_limit_sentence() {
        assert_eq!(
            output_to_latex("El límite de 1/x cuando x → oo es: 0"),
            r"El límite de \( \frac{1}{x} \) cuando \( x \to \infty \) es \( 0 \)"
        );
        assert_eq!(
            output_to_latex("El límite de x cuando x → (1/2) es: 1/2"),
            r"El límite de \( x \) cuando \( x \to \frac{1}{2} \) es \( \frac{1}{2} \)"
        );
    }

    #[test]
    fn test_other_text_unchanged() {
        assert_eq!(output_to_latex("nada que ver"), "nada que ver");
        assert_eq!(output_to_latex(""), "");
    }

    #[test]
    fn test_unparseable_fragment_falls_back() {
        assert_eq!(
            output_to_latex("La integral de foo[x] es: 1"),
            r"La integral de \( foo[x] \) es \( 1 \)"
        );
    }

    #[test]
    fn test_plain_to_latex() {
        assert_eq!(plain_to_latex("x**2*sin(x)"), r"x^2\cdot \sin{x}");
        assert_eq!(plain_to_latex("exp(x) + pi"), r"\exp{x} + \pi");
        assert_eq!(plain_to_latex("abs(x)"), r"\left|x\right|");
        assert_eq!(plain_to_latex("atan(x)"), r"\arctan{x}");
        assert_eq!(plain_to_latex("e + oo"), r"\mathrm{e} + \infty");
    }
}
