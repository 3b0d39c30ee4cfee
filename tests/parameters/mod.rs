//! Integration tests for the parameter system

// Constraint expression parsing and evaluation
mod expression_tests;

// Parameter bookkeeping and bindings on shared models
mod parameter_tests;
