mod simplifier;
mod transform;

pub use simplifier::Simplifier;
