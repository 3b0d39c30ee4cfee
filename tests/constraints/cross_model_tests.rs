use crate::test_helpers::{line_model, line_through, unit};
use approx::assert_relative_eq;
use multifit_rs::model::{read_model, write_model};
use multifit_rs::{FitEngine, FitError, Model, ModelRef, ParameterStatus};

fn constrain(model: &ModelRef, name: &str, expr: &str) {
    write_model(model)
        .unwrap()
        .parameters_mut()
        .get_mut(name)
        .unwrap()
        .set_expr(Some(expr));
}

#[test]
fn test_shared_slope_joint_fit() {
    let m1 = line_model(1.0, 0.0);
    let m2 = line_model(1.0, 0.0);
    constrain(&m2, "A", "m1.A");

    let mut engine = FitEngine::new();
    engine.put("m1", unit(m1.clone(), vec![line_through(2.0, 1.0)], &["A", "B"]));
    // Selecting the constrained slope has no effect
    engine.put("m2", unit(m2.clone(), vec![line_through(3.0, -1.0)], &["A", "B"]));

    let result = engine.fit_default().unwrap();
    assert_eq!(result.parameters.len(), 3);

    let slope = result.value("m1.A").unwrap();
    assert_relative_eq!(result.derived_value("m2.A").unwrap(), slope, epsilon = 1e-12);
    // Equal weights on both curves put the common slope half way
    assert_relative_eq!(slope, 2.5, epsilon = 1e-4);

    // The constrained parameter keeps its status and value in the live model
    let guard = read_model(&m2).unwrap();
    let a = guard.parameters().get("A").unwrap();
    assert_eq!(a.status(), ParameterStatus::Computed);
    assert_eq!(a.value(), 1.0);
}

#[test]
fn test_scaled_link_within_one_model() {
    let model = line_model(1.0, 0.0);
    constrain(&model, "B", "A / 2");

    let mut engine = FitEngine::new();
    engine.put("line", unit(model, vec![line_through(4.0, 2.0)], &["A"]));

    let result = engine.fit_default().unwrap();
    assert_relative_eq!(result.value("line.A").unwrap(), 4.0, epsilon = 1e-4);
    assert_relative_eq!(result.derived_value("line.B").unwrap(), 2.0, epsilon = 1e-4);
    assert!(result.cost < 1e-8);
}

#[test]
fn test_disabled_unit_supplies_a_constant() {
    let reference = line_model(3.0, 0.0);
    let target = line_model(1.0, 0.0);
    constrain(&target, "A", "ref.A");

    let mut engine = FitEngine::new();
    engine.put("ref", unit(reference, vec![line_through(2.0, 0.0)], &["A"]));
    engine.put("target", unit(target, vec![line_through(3.0, 5.0)], &["B"]));
    engine.set_enabled("ref", false).unwrap();

    let result = engine.fit_default().unwrap();
    assert_eq!(result.derived_value("target.A"), Some(3.0));
    assert_relative_eq!(result.value("target.B").unwrap(), 5.0, epsilon = 1e-4);
}

#[test]
fn test_cycles_are_rejected_before_fitting() {
    let m1 = line_model(1.0, 0.0);
    let m2 = line_model(1.0, 0.0);
    constrain(&m1, "A", "m2.A + 1");
    constrain(&m2, "A", "m1.A - 1");

    let mut engine = FitEngine::new();
    engine.put("m1", unit(m1.clone(), vec![line_through(1.0, 0.0)], &["B"]));
    engine.put("m2", unit(m2.clone(), vec![line_through(1.0, 0.0)], &["B"]));

    // Mark the live state so any write during the failed fit would show
    write_model(&m1).unwrap().parameters_mut().get_mut("B").unwrap().set_value(0.25);
    let m1_before = read_model(&m1).unwrap().parameters().clone();
    let m2_before = read_model(&m2).unwrap().parameters().clone();

    match engine.fit_default() {
        Err(FitError::Expression(msg)) => assert!(msg.contains("Circular")),
        other => panic!("Expected circular dependency error, got {:?}", other.map(|r| r.cost)),
    }
    assert_eq!(read_model(&m1).unwrap().parameters(), &m1_before);
    assert_eq!(read_model(&m2).unwrap().parameters(), &m2_before);
}

#[test]
fn test_bad_expressions_fail_assembly() {
    let model = line_model(1.0, 0.0);
    constrain(&model, "B", "A +");

    let mut engine = FitEngine::new();
    engine.put("line", unit(model.clone(), vec![line_through(1.0, 0.0)], &["A"]));
    assert!(matches!(engine.assemble(), Err(FitError::Expression(_))));

    constrain(&model, "B", "nowhere.A");
    assert!(matches!(engine.assemble(), Err(FitError::Expression(_))));
}
