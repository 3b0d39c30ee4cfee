use crate::test_helpers::{line_data, line_model, unit};
use multifit_rs::model::{read_model, write_model};
use multifit_rs::{
    CancelAfter, Dataset, FitEngine, FitError, FunctionModel, Model, ParameterSet,
    ParameterStatus, Problem,
};
use std::sync::Arc;

#[test]
fn test_one_entry_per_enabled_unit() {
    let mut engine = FitEngine::new();
    engine.put("a", unit(line_model(1.0, 0.0), vec![line_data()], &["A"]));
    engine.put("b", unit(line_model(1.0, 0.0), vec![line_data()], &["B"]));
    engine.put("c", unit(line_model(1.0, 0.0), vec![line_data()], &["A", "B"]));

    let assembly = engine.assemble().unwrap();
    let ids: Vec<_> = assembly.contributions().iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(assembly.slot_names(), vec!["a.A", "b.B", "c.A", "c.B"]);

    engine.set_enabled("b", false).unwrap();
    let assembly = engine.assemble().unwrap();
    assert_eq!(assembly.contributions().len(), 2);
    assert_eq!(assembly.slot_names(), vec!["a.A", "c.A", "c.B"]);
}

#[test]
fn test_nothing_scheduled_before_optimizer() {
    let mut engine = FitEngine::new();
    engine.put("a", unit(line_model(1.0, 0.0), vec![line_data()], &["A"]));
    engine.set_enabled("a", false).unwrap();

    let mut handler = CancelAfter::new(10);
    match engine.fit(&mut handler) {
        Err(FitError::NothingScheduled) => {}
        other => panic!("Expected NothingScheduled, got {:?}", other.map(|r| r.cost)),
    }
    assert_eq!(handler.seen(), 0);
    assert!(!handler.completed());
}

#[test]
fn test_two_datasets_concatenate() {
    let mut engine = FitEngine::new();
    engine.put(
        "line",
        unit(line_model(1.0, 0.0), vec![line_data(), line_data()], &["A", "B"]),
    );

    let assembly = engine.assemble().unwrap();
    assert_eq!(assembly.residual_count(), 8);
    assert_eq!(assembly.eval(&assembly.initial_values()).unwrap().len(), 8);

    let result = engine.fit_default().unwrap();
    assert_eq!(result.unit_cost("line").unwrap().residual_count, 8);
}

#[test]
fn test_out_of_range_start_is_clamped() {
    let model = line_model(9.0, 0.0);
    write_model(&model)
        .unwrap()
        .parameters_mut()
        .get_mut("A")
        .unwrap()
        .set_bounds(0.0, 5.0)
        .unwrap();

    let mut engine = FitEngine::new();
    engine.put("line", unit(model.clone(), vec![line_data()], &["A", "B"]));

    let assembly = engine.assemble().unwrap();
    assert_eq!(assembly.initial_values()[0], 5.0);
    assert_eq!(read_model(&model).unwrap().get_parameter("A").unwrap(), 9.0);

    let result = engine.fit_default().unwrap();
    let a = result.value("line.A").unwrap();
    assert!((0.0..=5.0).contains(&a));
    assert!((a - 2.0).abs() < 1e-4);
}

#[test]
fn test_computed_parameters_stay_out_of_the_vector() {
    let mut params = ParameterSet::new();
    params.add_param("scale", 1.0).unwrap();
    params.add_computed("volume", 12.0, None).unwrap();
    let model = multifit_rs::shared(FunctionModel::new("scaled", params, |p, x| {
        let scale = p.value("scale").unwrap_or(0.0);
        Ok(x.mapv(|xi| scale * xi))
    }));

    let data = Arc::new(Dataset::from_slices(&[1.0, 2.0, 3.0], &[3.0, 6.0, 9.0]).unwrap());
    let mut engine = FitEngine::new();
    engine.put("m", unit(model.clone(), vec![data], &["scale", "volume"]));

    let result = engine.fit_default().unwrap();
    assert_eq!(result.params.len(), 1);
    assert_eq!(result.parameters[0].name, "m.scale");
    assert_eq!(result.derived_value("m.volume"), Some(12.0));

    let guard = read_model(&model).unwrap();
    let volume = guard.parameters().get("volume").unwrap();
    assert_eq!(volume.value(), 12.0);
    assert_eq!(volume.status(), ParameterStatus::Computed);
}

#[test]
fn test_unselected_and_disabled_models_are_untouched() {
    let fitted = line_model(1.0, 0.25);
    let idle = line_model(-3.0, 4.0);

    let mut engine = FitEngine::new();
    engine.put("fitted", unit(fitted.clone(), vec![line_data()], &["A"]));
    engine.put("idle", unit(idle.clone(), vec![line_data()], &["A", "B"]));
    engine.set_enabled("idle", false).unwrap();

    let before = read_model(&idle).unwrap().parameters().clone();
    engine.fit_default().unwrap();

    assert_eq!(read_model(&fitted).unwrap().get_parameter("B").unwrap(), 0.25);
    assert_eq!(read_model(&idle).unwrap().parameters(), &before);
}

#[test]
fn test_failed_fit_leaves_models_untouched() {
    let mut params = ParameterSet::new();
    params.add_param("k", 1.0).unwrap();
    let broken = multifit_rs::shared(FunctionModel::new("broken", params, |_, x| {
        Ok(x.mapv(|_| f64::NAN))
    }));
    let healthy = line_model(1.0, 0.0);

    let mut engine = FitEngine::with_config(multifit_rs::FitConfig::default().with_max_iterations(50));
    engine.put("healthy", unit(healthy.clone(), vec![line_data()], &["A", "B"]));
    engine.put("broken", unit(broken.clone(), vec![line_data()], &["k"]));

    let healthy_before = read_model(&healthy).unwrap().parameters().clone();
    let broken_before = read_model(&broken).unwrap().parameters().clone();

    assert!(matches!(engine.fit_default(), Err(FitError::Convergence(_))));
    assert_eq!(read_model(&healthy).unwrap().parameters(), &healthy_before);
    assert_eq!(read_model(&broken).unwrap().parameters(), &broken_before);
}

#[test]
fn test_commit_records_statuses() {
    let model = line_model(1.0, 0.0);
    let mut engine = FitEngine::new();
    engine.put("line", unit(model.clone(), vec![line_data()], &["B"]));
    engine.seed_parameter("line", "A", 2.0).unwrap();

    let result = engine.fit_default().unwrap();
    assert!((result.value("line.B").unwrap() - 1.0).abs() < 1e-4);

    let guard = read_model(&model).unwrap();
    assert_eq!(guard.parameters().get("A").unwrap().status(), ParameterStatus::Fixed);
    assert_eq!(guard.parameters().get("B").unwrap().status(), ParameterStatus::Fitted);
    assert!(guard.parameters().get("B").unwrap().stderr().is_some());
}

#[test]
fn test_selection_made_before_the_model_is_checked() {
    let mut engine = FitEngine::new();
    engine.set_data("u", vec![line_data()]);
    engine.select_parameters("u", &["A", "C"]).unwrap();

    assert!(matches!(
        engine.set_model("u", line_model(1.0, 0.0)),
        Err(FitError::ParameterBinding { ref name, .. }) if name == "C"
    ));
    // The unit never received a model, so nothing can be fitted silently
    assert!(matches!(
        engine.fit(&mut CancelAfter::new(10)),
        Err(FitError::IncompleteUnit { .. })
    ));

    engine.select_parameters("u", &["A"]).unwrap();
    engine.set_model("u", line_model(1.0, 0.0)).unwrap();
    assert_eq!(engine.assemble().unwrap().slot_names(), vec!["u.A"]);
}
