//! Integration tests for fits driven through `FitEngine`

// Assembly layout and commit behaviour
mod assembly_tests;

// Optimizer behaviour seen from the caller
mod fit_tests;

// Progress handlers and background fits
mod handler_tests;
