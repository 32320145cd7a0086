use serde::Serialize;
use std::fmt;

/// The three supported calculus operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Derivative,
    Integral,
    Limit,
}

impl Operation {
    /// Spanish name used in printed sentences and explanations.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Derivative => "derivada",
            Self::Integral => "integral",
            Self::Limit => "límite",
        }
    }

    /// Name of the engine callable that performs the operation.
    pub fn engine_name(self) -> &'static str {
        match self {
            Self::Derivative => "diff",
            Self::Integral => "integrate",
            Self::Limit => "limit",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The point `x` tends to in a limit problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LimitPoint {
    PosInfinity,
    NegInfinity,
    /// An expression such as `3`, `-1.5`, `(1/2)` or `a`.
    Value(String),
}

impl LimitPoint {
    /// The point as written after `x →` in printed output.
    pub fn display(&self) -> &str {
        match self {
            Self::PosInfinity => "oo",
            Self::NegInfinity => "-oo",
            Self::Value(v) => v,
        }
    }
}

impl fmt::Display for LimitPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}
