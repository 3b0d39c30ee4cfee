use multifit_rs::model::read_model;
use multifit_rs::parameters::{Parameter, ParameterBinding, ParameterSet, ParameterStatus};
use multifit_rs::{shared, FitError, Model, PowerLawModel};

#[test]
fn test_expression_pins_status() {
    let mut p = Parameter::new("radius", 10.0);
    assert_eq!(p.status(), ParameterStatus::Fixed);

    p.set_expr(Some("other.radius"));
    assert!(p.is_computed());
    assert!(p.set_status(ParameterStatus::Fitted).is_err());

    p.set_expr(None);
    assert_eq!(p.status(), ParameterStatus::Fixed);
    p.set_status(ParameterStatus::Fitted).unwrap();
}

#[test]
fn test_parameter_set_serializes() {
    let mut set = ParameterSet::new();
    set.add_param_with_bounds("scale", 1.0, 0.0, f64::INFINITY).unwrap();
    set.add_computed("volume", 2.0, Some("scale * 2")).unwrap();

    let json = serde_json::to_string(&set).unwrap();
    let back: ParameterSet = serde_json::from_str(&json).unwrap();
    assert_eq!(back, set);
    assert_eq!(back.get("scale").unwrap().max(), f64::INFINITY);
}

#[test]
fn test_binding_on_power_law() {
    let model = shared(PowerLawModel::default());

    let exponent = ParameterBinding::bind(model.clone(), "exponent", 3.5).unwrap();
    assert_eq!(exponent.get().unwrap(), 3.5);

    // Out of range values are accepted; the range is enforced at assembly time
    exponent.set(42.0).unwrap();
    assert_eq!(read_model(&model).unwrap().get_parameter("exponent").unwrap(), 42.0);

    match ParameterBinding::bind(model, "radius", 1.0) {
        Err(FitError::ParameterBinding { model, name }) => {
            assert_eq!(model, "PowerLawModel");
            assert_eq!(name, "radius");
        }
        other => panic!("Expected ParameterBinding error, got {:?}", other),
    }
}
