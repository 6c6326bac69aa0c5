mod linear;
mod log_linear;
mod polynomial;
mod quadratic;

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub use linear::Linear;
pub use log_linear::LogLinear;
pub use polynomial::Polynomial;
pub use quadratic::Quadratic;

#[enum_dispatch]
/// Model of how the memory cost of an operation grows with the data it touches.
///
/// Implementations must be monotonically non-decreasing in `raw`, otherwise a
/// larger batch could be estimated cheaper than a smaller one.
pub trait ScaleFunctionTrait {
    /// Adjusted cost estimate for a raw per-configuration byte cost
    fn scale(&self, raw: f64) -> f64;
}

#[enum_dispatch(ScaleFunctionTrait)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScaleFunction {
    Linear,
    LogLinear,
    Quadratic,
    Polynomial,
}

/// Names of the built-in scale functions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleKind {
    Linear,
    LogLinear,
    Quadratic,
    Polynomial,
}
impl ScaleKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScaleKind::Linear => "linear",
            ScaleKind::LogLinear => "log-linear",
            ScaleKind::Quadratic => "quadratic",
            ScaleKind::Polynomial => "polynomial",
        }
    }
    fn accepts(&self, parameter: &str) -> bool {
        match self {
            ScaleKind::Polynomial => parameter == "scale_factor" || parameter == "degree",
            _ => parameter == "scale_factor",
        }
    }
}
impl FromStr for ScaleKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(ScaleKind::Linear),
            "log-linear" | "linearithmic" => Ok(ScaleKind::LogLinear),
            "quadratic" => Ok(ScaleKind::Quadratic),
            "polynomial" => Ok(ScaleKind::Polynomial),
            other => Err(Error::UnknownScaleFunction(String::from(other))),
        }
    }
}
impl Display for ScaleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.name().fmt(f)
    }
}

/// A scale function by name plus its keyword parameters.
///
/// Every kind takes `scale_factor` (default 1), `polynomial` also takes
/// `degree` (default 2). Any other parameter name is rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleFunctionSpec {
    pub kind: ScaleKind,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}
impl ScaleFunctionSpec {
    pub fn new(kind: ScaleKind) -> Self {
        Self {
            kind,
            parameters: BTreeMap::new(),
        }
    }
    /// Look a kind up by name, e.g. `"log-linear"`
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }
    pub fn linear(scale_factor: f64) -> Self {
        Self::new(ScaleKind::Linear).with_parameter("scale_factor", scale_factor)
    }
    pub fn with_parameter(mut self, name: &str, value: f64) -> Self {
        self.parameters.insert(String::from(name), value);
        self
    }

    /// Validate the parameters and build the cost function
    pub fn resolve(&self) -> Result<ScaleFunction> {
        if let Some(name) = self.parameters.keys().find(|k| !self.kind.accepts(k)) {
            return Err(Error::invalid_parameter(
                name,
                format!("not a parameter of the {} scale function", self.kind),
            ));
        }
        let scale_factor = self.parameter("scale_factor", 1.0);
        if !(scale_factor.is_finite() && scale_factor > 0.0) {
            return Err(Error::invalid_parameter(
                "scale_factor",
                format!("should be positive, found {}", scale_factor),
            ));
        }

        let function: ScaleFunction = match self.kind {
            ScaleKind::Linear => Linear::new(scale_factor).into(),
            ScaleKind::LogLinear => LogLinear::new(scale_factor).into(),
            ScaleKind::Quadratic => Quadratic::new(scale_factor).into(),
            ScaleKind::Polynomial => {
                let degree = self.parameter("degree", 2.0);
                if !(degree.is_finite() && degree >= 1.0) {
                    return Err(Error::invalid_parameter(
                        "degree",
                        format!("should be at least 1, found {}", degree),
                    ));
                }
                Polynomial::new(degree, scale_factor).into()
            }
        };
        Ok(function)
    }

    fn parameter(&self, name: &str, default: f64) -> f64 {
        self.parameters.get(name).copied().unwrap_or(default)
    }
}
impl Default for ScaleFunctionSpec {
    fn default() -> Self {
        Self::linear(10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(name: &str) -> ScaleFunction {
        ScaleFunctionSpec::from_name(name).unwrap().resolve().unwrap()
    }

    #[test]
    fn builtin_formulas() {
        assert_eq!(resolve("linear").scale(8.0), 8.0);
        assert_eq!(resolve("quadratic").scale(8.0), 64.0);
        assert!((resolve("log-linear").scale(8.0) - 8.0 * 8f64.ln()).abs() < 1e-12);

        let cubic = ScaleFunctionSpec::new(ScaleKind::Polynomial)
            .with_parameter("degree", 3.0)
            .with_parameter("scale_factor", 2.0)
            .resolve()
            .unwrap();
        assert_eq!(cubic.scale(2.0), 16.0);
    }

    #[test]
    fn log_linear_is_guarded_below_e() {
        let f = ScaleFunctionSpec::new(ScaleKind::LogLinear)
            .with_parameter("scale_factor", 3.0)
            .resolve()
            .unwrap();
        assert_eq!(f.scale(0.5), 1.5);
        assert_eq!(f.scale(1.0), 3.0);
        assert_eq!(f.scale(1.5), 4.5);

        let mut previous = 0.0;
        for step in 1..=400 {
            let raw = step as f64 * 0.01;
            assert!(f.scale(raw) >= previous, "decreasing at {}", raw);
            previous = f.scale(raw);
        }
    }

    #[test]
    fn ordering_above_e() {
        let linear = resolve("linear");
        let log_linear = resolve("log-linear");
        let quadratic = resolve("quadratic");
        for raw in [3.0, 10.0, 4800.0, 1e7] {
            assert!(linear.scale(raw) <= log_linear.scale(raw));
            assert!(log_linear.scale(raw) <= quadratic.scale(raw));
        }
    }

    #[test]
    fn default_is_linear_times_ten() {
        let f = ScaleFunctionSpec::default().resolve().unwrap();
        assert_eq!(f, ScaleFunction::Linear(Linear::new(10.0)));
        assert_eq!(f.scale(2.0), 20.0);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(matches!(
            ScaleFunctionSpec::from_name("cubic"),
            Err(Error::UnknownScaleFunction(name)) if name == "cubic"
        ));
        let spec = ScaleFunctionSpec::linear(1.0).with_parameter("degree", 2.0);
        assert!(matches!(spec.resolve(), Err(Error::InvalidParameter { .. })));
        let spec = ScaleFunctionSpec::linear(-1.0);
        assert!(matches!(spec.resolve(), Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn kinds_use_kebab_case() {
        let spec: ScaleFunctionSpec =
            serde_json::from_str(r#"{"kind": "log-linear", "parameters": {"scale_factor": 5}}"#)
                .unwrap();
        assert_eq!(spec.kind, ScaleKind::LogLinear);
        assert_eq!(spec.resolve().unwrap().scale(1.0), 5.0);
    }
}
