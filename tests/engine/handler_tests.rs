use crate::test_helpers::{init_logger, line_data, line_model, unit};
use multifit_rs::model::read_model;
use multifit_rs::{
    spawn_fit, CancelAfter, ConsoleUpdate, FitConfig, FitEngine, FitHandler, FitResult,
    HandlerControl, Model, ModelRef,
};
use std::sync::{Arc, Mutex};

/// Records the live slope of a model at every notification
struct SlopeWatcher {
    model: ModelRef,
    seen: Vec<f64>,
    costs: Vec<f64>,
}

impl FitHandler for SlopeWatcher {
    fn on_improvement(&mut self, cost: f64, _delta: f64) -> HandlerControl {
        let slope = read_model(&self.model)
            .and_then(|m| m.get_parameter("A"))
            .unwrap_or(f64::NAN);
        self.seen.push(slope);
        self.costs.push(cost);
        HandlerControl::Continue
    }
}

fn engine_for(model: ModelRef, config: FitConfig) -> FitEngine {
    let mut engine = FitEngine::with_config(config);
    engine.put("line", unit(model, vec![line_data()], &["A", "B"]));
    engine
}

#[test]
fn test_stop_ends_the_search_early() {
    let model = line_model(1.0, 0.0);
    let mut engine = engine_for(model.clone(), FitConfig::default().with_starts(5).with_seed(1));

    let mut handler = CancelAfter::new(1);
    let result = engine.fit(&mut handler).unwrap();

    assert!(result.stopped_early);
    assert_eq!(result.starts_run, 1);
    assert_eq!(result.message, "stopped by handler");
    assert_eq!(handler.seen(), 1);
    assert!(handler.completed());

    // The best point so far is committed
    let a = read_model(&model).unwrap().get_parameter("A").unwrap();
    assert_eq!(a, result.value("line.A").unwrap());
}

#[test]
fn test_improvements_exceed_the_delta() {
    let model = line_model(1.0, 0.0);
    let mut engine = engine_for(model.clone(), FitConfig::default());

    let mut watcher = SlopeWatcher {
        model: model.clone(),
        seen: Vec::new(),
        costs: Vec::new(),
    };
    engine.fit(&mut watcher).unwrap();

    assert!(!watcher.costs.is_empty());
    for pair in watcher.costs.windows(2) {
        assert!(pair[1] < 0.9 * pair[0]);
    }
    // Commit-on-success: nothing is written while the search runs
    assert!(watcher.seen.iter().all(|&a| a == 1.0));
}

#[test]
fn test_incremental_preview_writes_best_so_far() {
    let model = line_model(1.0, 0.0);
    let mut engine = engine_for(
        model.clone(),
        FitConfig::default().with_incremental_preview(true),
    );

    let mut watcher = SlopeWatcher {
        model: model.clone(),
        seen: Vec::new(),
        costs: Vec::new(),
    };
    engine.fit(&mut watcher).unwrap();

    assert!(watcher.seen.iter().any(|&a| a != 1.0));
}

#[test]
fn test_console_update_on_worker() {
    init_logger();
    let engine = Arc::new(Mutex::new(engine_for(line_model(1.0, 0.0), FitConfig::default())));

    let task = spawn_fit(engine.clone(), ConsoleUpdate::new());
    let result: FitResult = task.join().unwrap();
    assert!((result.value("line.A").unwrap() - 2.0).abs() < 1e-4);

    // The engine is free again once the task has been joined
    let guard = engine.lock().unwrap();
    assert_eq!(guard.registry().len(), 1);
}
