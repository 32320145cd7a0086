//! Symbolic differentiation and integration.

mod differentiation;
mod integration;

pub use differentiation::differentiate;
pub use integration::{integrate, linear_coeffs};
