use approx::assert_relative_eq;
use multifit_rs::parameters::{Expression, ExpressionError};
use std::collections::HashMap;

fn context(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn test_precedence_and_associativity() {
    let ctx = HashMap::new();
    let cases = [
        ("1 + 2 * 3", 7.0),
        ("10 - 4 - 3", 3.0),
        ("24 / 4 / 2", 3.0),
        ("2 ^ 3 ^ 2", 512.0),
        ("-2 ^ 2", -4.0),
        ("(1 + 2) * 3", 9.0),
        ("2 * -3", -6.0),
    ];
    for (text, expected) in cases {
        let value = Expression::parse(text).unwrap().evaluate(&ctx).unwrap();
        assert_relative_eq!(value, expected, epsilon = 1e-12);
    }
}

#[test]
fn test_functions_and_qualified_names() {
    let ctx = context(&[("sphere.radius", 4.0), ("scale", 0.5)]);

    let expr = Expression::parse("sqrt(sphere.radius) * scale + sin(0)").unwrap();
    assert_relative_eq!(expr.evaluate(&ctx).unwrap(), 1.0, epsilon = 1e-12);
    assert_eq!(expr.variables(), vec!["scale".to_string(), "sphere.radius".to_string()]);
}

#[test]
fn test_errors() {
    let ctx = context(&[("a", 0.0)]);

    assert!(matches!(
        Expression::parse("1 / a").unwrap().evaluate(&ctx),
        Err(ExpressionError::DivisionByZero)
    ));
    assert!(matches!(
        Expression::parse("b + 1").unwrap().evaluate(&ctx),
        Err(ExpressionError::UndefinedVariable { .. })
    ));
    assert!(matches!(
        Expression::parse("nosuch(1)").unwrap().evaluate(&ctx),
        Err(ExpressionError::UndefinedFunction { .. })
    ));
    assert!(Expression::parse("1 +").is_err());
    assert!(Expression::parse("(1").is_err());
}
