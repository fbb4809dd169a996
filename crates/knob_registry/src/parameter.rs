//! [`Parameter`] records and their values.
//!
//! A parameter's value is never observed outside its domain: scalars and
//! structured sub-weights stay within `[min, max]`, enum values stay within
//! the declared variants. [`Parameter::resolve`] is the single place where a
//! request is turned into a new in-domain value.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::request::{DIRECTIVE_STEP, Directive, UpdateRequest};

/// Provenance tag written by resets and used for never-updated parameters.
pub const SYSTEM_DEFAULT_SOURCE: &str = "system-default";

/// The kind of a parameter, fixed by its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// A bounded floating-point value.
    Scalar,
    /// An ordered mapping of named sub-weights, each bounded.
    Structured,
    /// One of a declared set of string variants.
    Enum,
}

impl ParameterKind {
    /// Returns the lowercase name used in payloads and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Structured => "structured",
            Self::Enum => "enum",
        }
    }
}

/// A parameter value of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f64),
    Structured(IndexMap<String, f64>),
    Enum(String),
}

impl ParamValue {
    /// Returns the kind this value belongs to.
    #[must_use]
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Scalar(_) => ParameterKind::Scalar,
            Self::Structured(_) => ParameterKind::Structured,
            Self::Enum(_) => ParameterKind::Enum,
        }
    }

    #[must_use]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_weights(&self) -> Option<&IndexMap<String, f64>> {
        match self {
            Self::Structured(w) => Some(w),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Self::Enum(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Enum(v.to_string())
    }
}

/// One tunable control in a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Unique key within the registry.
    pub id: String,
    pub kind: ParameterKind,
    /// Current value, always in domain.
    pub value: ParamValue,
    /// Lower bound for scalars and every structured sub-weight.
    pub min: f64,
    /// Upper bound for scalars and every structured sub-weight.
    pub max: f64,
    pub default: ParamValue,
    /// Human-readable effect summary for help/introspection consumers.
    pub description: String,
    /// Declared variants, only populated for enum parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
    /// Milliseconds since the Unix epoch of the last accepted write.
    pub last_updated: Option<u64>,
    /// Provenance of the last accepted write.
    pub last_source: String,
}

/// The introspection view of a [`Parameter`], without runtime state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    pub id: String,
    pub kind: ParameterKind,
    pub min: f64,
    pub max: f64,
    pub default: ParamValue,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

/// A request resolved against a parameter: the in-domain value to store.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolved {
    pub value: ParamValue,
    /// The pre-clamp value, present only when clamping changed it.
    pub clamped_from: Option<ParamValue>,
}

impl Parameter {
    /// Returns the metadata describing this parameter.
    #[must_use]
    pub fn metadata(&self) -> ParameterMetadata {
        ParameterMetadata {
            id: self.id.clone(),
            kind: self.kind,
            min: self.min,
            max: self.max,
            default: self.default.clone(),
            description: self.description.clone(),
            variants: self.variants.clone(),
        }
    }

    /// Turn a request into a new in-domain value.
    ///
    /// Returns the rejection reason when the request does not fit this
    /// parameter's kind. Numeric results are clamped, never rejected, unless
    /// they are non-finite.
    pub(crate) fn resolve(&self, request: &UpdateRequest) -> Result<Resolved, String> {
        if let UpdateRequest::Directive(Directive::Reset) = request {
            return Ok(Resolved {
                value: self.default.clone(),
                clamped_from: None,
            });
        }

        match (&self.value, request) {
            (ParamValue::Scalar(current), _) => {
                let target = match request {
                    UpdateRequest::Absolute(ParamValue::Scalar(v)) => *v,
                    UpdateRequest::Relative(delta) => current + delta,
                    UpdateRequest::Directive(Directive::Increase) => current + DIRECTIVE_STEP,
                    UpdateRequest::Directive(Directive::Decrease) => current - DIRECTIVE_STEP,
                    UpdateRequest::Absolute(other) => {
                        return Err(format!(
                            "expected a scalar value, got {}",
                            other.kind().as_str()
                        ));
                    }
                    UpdateRequest::Directive(Directive::Reset) => {
                        self.default.as_scalar().unwrap_or(*current)
                    }
                };
                if !target.is_finite() {
                    return Err("value is not a finite number".to_string());
                }
                let clamped = target.clamp(self.min, self.max);
                Ok(Resolved {
                    value: ParamValue::Scalar(clamped),
                    clamped_from: (clamped != target).then_some(ParamValue::Scalar(target)),
                })
            }
            (ParamValue::Structured(current), UpdateRequest::Absolute(ParamValue::Structured(patch))) => {
                let mut merged = current.clone();
                let mut requested = current.clone();
                let mut clamped_any = false;
                for (key, weight) in patch {
                    let Some(slot) = merged.get_mut(key) else {
                        return Err(format!("unknown sub-weight '{key}'"));
                    };
                    if !weight.is_finite() {
                        return Err(format!("sub-weight '{key}' is not a finite number"));
                    }
                    let clamped = weight.clamp(self.min, self.max);
                    clamped_any |= clamped != *weight;
                    *slot = clamped;
                    requested.insert(key.clone(), *weight);
                }
                Ok(Resolved {
                    value: ParamValue::Structured(merged),
                    clamped_from: clamped_any.then_some(ParamValue::Structured(requested)),
                })
            }
            (ParamValue::Enum(_), UpdateRequest::Absolute(ParamValue::Enum(choice))) => {
                if self.variants.iter().any(|v| v == choice) {
                    Ok(Resolved {
                        value: ParamValue::Enum(choice.clone()),
                        clamped_from: None,
                    })
                } else {
                    Err(format!("'{choice}' is not one of {:?}", self.variants))
                }
            }
            (_, UpdateRequest::Relative(_)) => {
                Err("relative deltas only apply to scalar parameters".to_string())
            }
            (_, UpdateRequest::Directive(d)) => Err(format!(
                "directive '{}' only applies to scalar parameters",
                d.as_str()
            )),
            (_, UpdateRequest::Absolute(other)) => Err(format!(
                "expected a {} value, got {}",
                self.kind.as_str(),
                other.kind().as_str()
            )),
        }
    }

    /// Returns `true` when `value` is inside this parameter's domain.
    #[must_use]
    pub fn admits(&self, value: &ParamValue) -> bool {
        match (self.kind, value) {
            (ParameterKind::Scalar, ParamValue::Scalar(v)) => {
                v.is_finite() && *v >= self.min && *v <= self.max
            }
            (ParameterKind::Structured, ParamValue::Structured(weights)) => {
                let Some(declared) = self.default.as_weights() else {
                    return false;
                };
                weights.len() == declared.len()
                    && weights.iter().all(|(k, v)| {
                        declared.contains_key(k) && v.is_finite() && *v >= self.min && *v <= self.max
                    })
            }
            (ParameterKind::Enum, ParamValue::Enum(choice)) => {
                self.variants.iter().any(|v| v == choice)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(value: f64, min: f64, max: f64) -> Parameter {
        Parameter {
            id: "p".to_string(),
            kind: ParameterKind::Scalar,
            value: ParamValue::Scalar(value),
            min,
            max,
            default: ParamValue::Scalar(value),
            description: String::new(),
            variants: Vec::new(),
            last_updated: None,
            last_source: SYSTEM_DEFAULT_SOURCE.to_string(),
        }
    }

    fn weights() -> Parameter {
        let mut w = IndexMap::new();
        w.insert("personnel".to_string(), 0.4);
        w.insert("equipment".to_string(), 0.6);
        Parameter {
            id: "budget".to_string(),
            kind: ParameterKind::Structured,
            value: ParamValue::Structured(w.clone()),
            min: 0.0,
            max: 1.0,
            default: ParamValue::Structured(w),
            description: String::new(),
            variants: Vec::new(),
            last_updated: None,
            last_source: SYSTEM_DEFAULT_SOURCE.to_string(),
        }
    }

    #[test]
    fn test_scalar_absolute_within_bounds() {
        let p = scalar(0.5, 0.0, 1.0);
        let r = p.resolve(&UpdateRequest::Absolute(0.8.into())).unwrap();
        assert_eq!(r.value, ParamValue::Scalar(0.8));
        assert!(r.clamped_from.is_none());
    }

    #[test]
    fn test_scalar_clamps_and_reports() {
        let p = scalar(0.5, 0.3, 1.0);
        let r = p.resolve(&UpdateRequest::Relative(-0.9)).unwrap();
        assert_eq!(r.value, ParamValue::Scalar(0.3));
        let requested = r.clamped_from.unwrap().as_scalar().unwrap();
        assert!((requested - (-0.4)).abs() < 1e-12);
    }

    #[test]
    fn test_scalar_directives() {
        let p = scalar(0.5, 0.0, 1.0);
        let up = p.resolve(&UpdateRequest::Directive(Directive::Increase)).unwrap();
        assert!((up.value.as_scalar().unwrap() - 0.6).abs() < 1e-12);
        let down = p.resolve(&UpdateRequest::Directive(Directive::Decrease)).unwrap();
        assert!((down.value.as_scalar().unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_scalar_rejects_nan() {
        let p = scalar(0.5, 0.0, 1.0);
        assert!(p.resolve(&UpdateRequest::Absolute(f64::NAN.into())).is_err());
    }

    #[test]
    fn test_structured_merge_keeps_unnamed_weights() {
        let p = weights();
        let mut patch = IndexMap::new();
        patch.insert("equipment".to_string(), 1.4);
        let r = p
            .resolve(&UpdateRequest::Absolute(ParamValue::Structured(patch)))
            .unwrap();
        let merged = r.value.as_weights().unwrap();
        assert_eq!(merged["personnel"], 0.4);
        assert_eq!(merged["equipment"], 1.0);
        assert!(r.clamped_from.is_some());
    }

    #[test]
    fn test_structured_rejects_unknown_sub_weight() {
        let p = weights();
        let mut patch = IndexMap::new();
        patch.insert("morale".to_string(), 0.1);
        assert!(p.resolve(&UpdateRequest::Absolute(ParamValue::Structured(patch))).is_err());
    }

    #[test]
    fn test_structured_rejects_relative() {
        assert!(weights().resolve(&UpdateRequest::Relative(0.1)).is_err());
    }

    #[test]
    fn test_admits() {
        let p = scalar(0.5, 0.3, 1.0);
        assert!(p.admits(&ParamValue::Scalar(0.3)));
        assert!(!p.admits(&ParamValue::Scalar(0.2)));
        assert!(!p.admits(&ParamValue::Enum("x".to_string())));
    }
}
