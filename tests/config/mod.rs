//! Integration tests for engine configuration

mod config_tests;
