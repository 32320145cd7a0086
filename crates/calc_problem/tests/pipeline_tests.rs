//! End-to-end tests over the public pipeline: analysis, script generation,
//! execution and LaTeX output.

use calc_problem::{
    analyze_problem, execute_script, generate_script, output_to_latex, LimitPoint, Operation,
    Script, SolveError, Solver,
};

fn solve_text(problem: &str) -> String {
    let parsed = analyze_problem(problem).expect("analysis failed");
    let script = generate_script(
        parsed.operation,
        parsed.expression.as_deref(),
        parsed.limit_point.as_ref(),
    )
    .expect("script generation failed");
    execute_script(&script)
        .expect("execution failed")
        .output
        .trim()
        .to_string()
}

#[test]
fn derivative_problems() {
    assert_eq!(
        solve_text("Calcula la derivada de x^2 sin(x)"),
        "La derivada de x^2*sin(x) es: x^2*cos(x) + 2*x*sin(x)"
    );
    assert_eq!(
        solve_text("Deriva la función: derivada de e^(2x)"),
        "La derivada de exp(2*x) es: 2*exp(2*x)"
    );
}

#[test]
fn integral_problems() {
    assert_eq!(
        solve_text("Calcula la integral de 3x^2 + 2x + 1"),
        "La integral de 3*x^2 + 2*x + 1 es: x^3 + x^2 + x"
    );
    assert_eq!(
        solve_text("Resuelve la integral de f(x) = x*e^x"),
        "La integral de x*exp(x) es: x*exp(x) - exp(x)"
    );
}

#[test]
fn integral_without_closed_form_stays_unevaluated() {
    assert_eq!(
        solve_text("Calcula la integral de e^(x^2)"),
        "La integral de exp(x^2) es: integrate(exp(x^2), x)"
    );
}

#[test]
fn power_rule_integrals() {
    assert_eq!(
        solve_text("Calcula la integral de f(x) = (x+1)^10"),
        "La integral de (x + 1)^10 es: (x + 1)^11/11"
    );
    assert_eq!(
        solve_text("Calcula la integral de f(x) = x^(2/3)"),
        "La integral de x^(2/3) es: 3*x^(5/3)/5"
    );
    assert_eq!(
        solve_text("Calcula la integral de f(x) = (x+1)^(1/3)"),
        "La integral de (x + 1)^(1/3) es: 3*(x + 1)^(4/3)/4"
    );
}

#[test]
fn undefined_inputs_stay_undefined() {
    assert_eq!(
        solve_text("Calcula la derivada de f(x) = 1/0"),
        "La derivada de nan es: nan"
    );
    assert_eq!(
        solve_text("Calcula la integral de f(x) = 0^x"),
        "La integral de 0^x es: integrate(0^x, x)"
    );
    assert_eq!(
        solve_text("Calcula el límite de f(x) = 0^x cuando x tiende a 0"),
        "El límite de 0^x cuando x → 0 es: 0"
    );
}

#[test]
fn limit_problems() {
    assert_eq!(
        solve_text("Calcula el límite de (x^2 - 1)/(x - 1) cuando x tiende a 1"),
        "El límite de (x^2 - 1)/(x - 1) cuando x → 1 es: 2"
    );
    assert_eq!(
        solve_text("Calcula el límite de (1 + 1/x)^x cuando x tiende a infinito"),
        "El límite de (1 + 1/x)^x cuando x → oo es: e"
    );
    assert_eq!(
        solve_text("Calcula el límite de exp(x) cuando x tiende a -infinito"),
        "El límite de exp(x) cuando x → -oo es: 0"
    );
}

#[test]
fn generated_script_survives_a_text_round_trip() {
    let point = LimitPoint::Value("(1/2)".into());
    let script = generate_script(Some(Operation::Limit), Some("4x^2"), Some(&point)).unwrap();
    let reparsed = Script::parse(&script.to_string()).unwrap();
    let out = execute_script(&reparsed).unwrap();
    assert_eq!(out.output, "El límite de 4*x^2 cuando x → (1/2) es: 1\n");
}

#[test]
fn hand_written_scripts_cannot_escape_the_namespace() {
    let script = Script::parse("x = symbol(\"x\")\nresultado = open(x)\n").unwrap();
    assert_eq!(
        execute_script(&script).unwrap_err(),
        SolveError::Ejecucion("name 'open' is not defined".into())
    );
}

#[test]
fn latex_of_solver_output() {
    let text = solve_text("Calcula la derivada de x^3");
    assert_eq!(
        output_to_latex(&text),
        r"La derivada de \( {x}^{3} \) es \( 3 \cdot {x}^{2} \)"
    );
}

#[tokio::test]
async fn solver_serializes_to_json() {
    let solution = Solver::new()
        .solve_problem("Calcula la integral de cos(x)")
        .await
        .unwrap();
    let json = serde_json::to_value(&solution).unwrap();
    assert_eq!(json["operation"], "integral");
    assert_eq!(json["output"], "La integral de cos(x) es: sin(x)");
    assert!(json.get("limit_point").is_none());
}
