//! Numerical helpers.

pub mod finite_difference;
