//! Integration tests for constraint expressions linking parameters across
//! models

mod cross_model_tests;
