//! Declared registry schemas.
//!
//! A [`RegistrySchema`] lists every parameter a subsystem exposes, in the
//! order they should be described. It is validated once when the
//! [`Registry`](crate::Registry) is built and is fixed for the registry's
//! lifetime.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::parameter::{ParamValue, Parameter, ParameterKind, SYSTEM_DEFAULT_SOURCE};

/// The declaration of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub id: String,
    pub kind: ParameterKind,
    pub default: ParamValue,
    pub min: f64,
    pub max: f64,
    pub description: String,
    pub variants: Vec<String>,
}

impl ParameterSpec {
    /// Declare a scalar with the default `[0.0, 1.0]` bounds.
    #[must_use]
    pub fn scalar(id: impl Into<String>, default: f64, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ParameterKind::Scalar,
            default: ParamValue::Scalar(default),
            min: 0.0,
            max: 1.0,
            description: description.into(),
            variants: Vec::new(),
        }
    }

    /// Declare a structured parameter from named default sub-weights.
    #[must_use]
    pub fn structured<K, I>(id: impl Into<String>, weights: I, description: impl Into<String>) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        let weights: IndexMap<String, f64> = weights.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            id: id.into(),
            kind: ParameterKind::Structured,
            default: ParamValue::Structured(weights),
            min: 0.0,
            max: 1.0,
            description: description.into(),
            variants: Vec::new(),
        }
    }

    /// Declare an enum parameter.
    #[must_use]
    pub fn choice<V, I>(
        id: impl Into<String>,
        variants: I,
        default: impl Into<String>,
        description: impl Into<String>,
    ) -> Self
    where
        V: Into<String>,
        I: IntoIterator<Item = V>,
    {
        Self {
            id: id.into(),
            kind: ParameterKind::Enum,
            default: ParamValue::Enum(default.into()),
            min: 0.0,
            max: 0.0,
            description: description.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Override the bounds.
    #[must_use]
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.default.kind() != self.kind {
            return Err(SchemaError::KindMismatch(self.id.clone()));
        }
        match &self.default {
            ParamValue::Scalar(v) => {
                self.validate_bounds()?;
                if !v.is_finite() {
                    return Err(SchemaError::NonFinite(self.id.clone()));
                }
                self.check_in_bounds(*v)?;
            }
            ParamValue::Structured(weights) => {
                self.validate_bounds()?;
                if weights.is_empty() {
                    return Err(SchemaError::EmptyStructure(self.id.clone()));
                }
                for v in weights.values() {
                    if !v.is_finite() {
                        return Err(SchemaError::NonFinite(self.id.clone()));
                    }
                    self.check_in_bounds(*v)?;
                }
            }
            ParamValue::Enum(default) => {
                if self.variants.is_empty() {
                    return Err(SchemaError::EmptyEnum(self.id.clone()));
                }
                if !self.variants.contains(default) {
                    return Err(SchemaError::UnknownEnumDefault {
                        id: self.id.clone(),
                        default: default.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_bounds(&self) -> Result<(), SchemaError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(SchemaError::NonFinite(self.id.clone()));
        }
        if self.min > self.max {
            return Err(SchemaError::InvalidBounds {
                id: self.id.clone(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    fn check_in_bounds(&self, v: f64) -> Result<(), SchemaError> {
        if v < self.min || v > self.max {
            return Err(SchemaError::DefaultOutOfBounds {
                id: self.id.clone(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    fn into_parameter(self) -> Parameter {
        Parameter {
            value: self.default.clone(),
            id: self.id,
            kind: self.kind,
            min: self.min,
            max: self.max,
            default: self.default,
            description: self.description,
            variants: self.variants,
            last_updated: None,
            last_source: SYSTEM_DEFAULT_SOURCE.to_string(),
        }
    }
}

/// The full, ordered parameter declaration for one subsystem.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistrySchema {
    /// Subsystem name, used in log fields.
    pub name: String,
    pub specs: Vec<ParameterSpec>,
}

impl RegistrySchema {
    /// Create an empty schema for the named subsystem.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            specs: Vec::new(),
        }
    }

    /// Append a parameter declaration.
    #[must_use]
    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Validate every declaration and build the initial parameter records.
    pub(crate) fn build(self) -> Result<IndexMap<String, Parameter>, SchemaError> {
        let mut seen = HashSet::new();
        let mut params = IndexMap::with_capacity(self.specs.len());
        for spec in self.specs {
            if !seen.insert(spec.id.clone()) {
                return Err(SchemaError::DuplicateId(spec.id));
            }
            spec.validate()?;
            params.insert(spec.id.clone(), spec.into_parameter());
        }
        Ok(params)
    }
}
