pub mod calculus;
pub mod functions;
