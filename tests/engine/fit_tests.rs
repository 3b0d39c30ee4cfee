use crate::test_helpers::{init_logger, line_data, line_model, noisy_power_law, unit};
use approx::assert_relative_eq;
use multifit_rs::model::read_model;
use multifit_rs::{
    shared, Dataset, FitConfig, FitEngine, FitError, Model, NoopHandler, PowerLawModel,
};
use ndarray::array;
use std::sync::Arc;

#[test]
fn test_linear_recovery() {
    init_logger();
    let model = line_model(1.0, 0.0);
    let mut engine = FitEngine::new();
    engine.put("line", unit(model.clone(), vec![line_data()], &["A", "B"]));

    let result = engine.fit(&mut NoopHandler).unwrap();

    assert_relative_eq!(result.value("line.A").unwrap(), 2.0, epsilon = 1e-5);
    assert_relative_eq!(result.value("line.B").unwrap(), 1.0, epsilon = 1e-5);
    assert!(result.cost < 1e-10);
    assert!(result.converged);
    assert_eq!(result.starts_run, 1);

    // Values are committed to the live model
    let guard = read_model(&model).unwrap();
    assert_relative_eq!(guard.get_parameter("A").unwrap(), 2.0, epsilon = 1e-5);
    assert_relative_eq!(guard.get_parameter("B").unwrap(), 1.0, epsilon = 1e-5);
}

#[test]
fn test_unscaled_covariance_matches_normal_equations() {
    // Perturb the data so that the optimum is not exact
    let data = Dataset::new(array![0.0, 1.0, 2.0, 3.0], array![1.1, 2.9, 5.2, 6.8])
        .unwrap()
        .with_dy(array![1.0, 1.0, 1.0, 1.0])
        .unwrap();

    let mut engine = FitEngine::with_config(FitConfig::default().with_scale_covariance(false));
    engine.put("line", unit(line_model(1.0, 0.0), vec![Arc::new(data)], &["A", "B"]));
    let result = engine.fit_default().unwrap();

    // inv([[14, 6], [6, 4]]) = [[0.2, -0.3], [-0.3, 0.7]]
    let cov = result.covariance.as_ref().unwrap();
    assert_relative_eq!(cov[[0, 0]], 0.2, epsilon = 1e-4);
    assert_relative_eq!(cov[[0, 1]], -0.3, epsilon = 1e-4);
    assert_relative_eq!(cov[[1, 1]], 0.7, epsilon = 1e-4);
    assert_relative_eq!(result.parameter("line.A").unwrap().stderr, 0.2_f64.sqrt(), epsilon = 1e-4);

    let correl = result.correlation.as_ref().unwrap();
    assert_relative_eq!(correl[[0, 1]], -0.3 / (0.2_f64 * 0.7).sqrt(), epsilon = 1e-3);
    assert_eq!(result.nfree, 2);
}

#[test]
fn test_noisy_power_law() {
    init_logger();
    let data = noisy_power_law(2.0, 3.0, 0.1, 0.01, 42);
    let model = shared(PowerLawModel::new(1.0, 4.0, 0.0));

    let mut engine = FitEngine::with_config(FitConfig::default().with_starts(3).with_seed(5));
    engine.put(
        "porod",
        unit(model, vec![Arc::new(data)], &["scale", "exponent", "background"]),
    );
    let result = engine.fit_default().unwrap();

    let exponent = result.parameter("porod.exponent").unwrap();
    assert!((exponent.value - 3.0).abs() < 0.1, "exponent {}", exponent.value);
    assert!(exponent.stderr > 0.0);
    assert!((result.value("porod.scale").unwrap() - 2.0).abs() < 0.1);
    assert!(result.redchi > 0.2 && result.redchi < 3.0, "redchi {}", result.redchi);
    assert_eq!(result.starts_run, 3);
}

#[test]
fn test_parallel_starts_match_sequential() {
    let run = |parallel: bool| {
        let config = FitConfig::default()
            .with_starts(4)
            .with_seed(17)
            .with_perturbation(0.5)
            .with_parallel(parallel);
        let mut engine = FitEngine::with_config(config);
        engine.put("line", unit(line_model(1.0, 0.0), vec![line_data()], &["A", "B"]));
        engine.fit(&mut NoopHandler).unwrap()
    };

    let sequential = run(false);
    let parallel = run(true);

    assert_eq!(sequential.starts_run, 4);
    assert_eq!(parallel.starts_run, 4);
    assert_relative_eq!(sequential.params[0], parallel.params[0], epsilon = 1e-12);
    assert_relative_eq!(sequential.params[1], parallel.params[1], epsilon = 1e-12);
    assert_eq!(sequential.func_evals, parallel.func_evals);
}

#[test]
fn test_required_convergence() {
    let config = FitConfig::default()
        .with_max_iterations(1)
        .with_require_convergence(true);
    let model = line_model(1.0, 0.0);
    let mut engine = FitEngine::with_config(config);
    engine.put("line", unit(model.clone(), vec![line_data()], &["A", "B"]));

    assert!(matches!(engine.fit_default(), Err(FitError::Convergence(_))));
    assert_eq!(read_model(&model).unwrap().get_parameter("A").unwrap(), 1.0);

    // Without the requirement the best point so far is committed
    let mut config = engine.config().clone();
    config.require_convergence = false;
    engine.set_config(config);
    let result = engine.fit_default().unwrap();
    assert!(!result.converged);
    assert_eq!(result.message, "maximum iterations reached");
}
