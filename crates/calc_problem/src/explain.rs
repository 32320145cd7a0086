use crate::interpreter::StepSummary;
use crate::operation::{LimitPoint, Operation};

/// Numbered explanation of how a problem was solved.
pub fn explain(
    operation: Operation,
    expr: &str,
    limit_point: Option<&LimitPoint>,
    steps: &[StepSummary],
) -> String {
    let mut lines = vec![
        format!("Tipo de operación: {}", operation.display_name()),
        format!("Expresión: {}", expr),
        format!("Se usó el motor simbólico con: {}", operation.engine_name()),
    ];
    if operation == Operation::Limit {
        let point = limit_point.map_or("oo", LimitPoint::display);
        lines.push(format!("Límite: x → {}", point));
    }
    for step in steps {
        match &step.result {
            Some(result) => lines.push(format!("{}: {} ⇒ {}", step.rule, step.description, result)),
            None => lines.push(format!("{}: {}", step.rule, step.description)),
        }
    }

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_derivative() {
        let text = explain(Operation::Derivative, "x**2", None, &[]);
        assert_eq!(
            text,
            "1. Tipo de operación: derivada\n\
             2. Expresión: x**2\n\
             3. Se usó el motor simbólico con: diff"
        );
    }

    #[test]
    fn test_explain_limit_with_steps() {
        let steps = vec![StepSummary {
            rule: "Limit".into(),
            description: "limit(1/x, x, oo) = 0".into(),
            result: Some("0".into()),
        }];
        let text = explain(
            Operation::Limit,
            "1/x",
            Some(&LimitPoint::PosInfinity),
            &steps,
        );
        assert!(text.contains("4. Límite: x → oo"));
        assert!(text.ends_with("5. Limit: limit(1/x, x, oo) = 0 ⇒ 0"));
    }
}
