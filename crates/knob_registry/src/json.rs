//! Interpretation of loosely-typed JSON knob payloads.
//!
//! Controllers send knob updates in whatever shape is convenient: bare
//! numbers, signed strings, directive words, enum variant names, objects of
//! sub-weights, or explicit `{"value": ..}` / `{"delta": ..}` /
//! `{"directive": ..}` wrappers. [`interpret`] turns one such entry into a
//! typed [`UpdateRequest`] using the target parameter's kind to resolve
//! ambiguity (a bare string is an enum variant only for enum parameters).

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::parameter::{ParamValue, ParameterKind};
use crate::request::{Directive, UpdateRequest};

/// Interpret one JSON entry for a parameter of the given kind.
///
/// # Errors
///
/// Returns a human-readable reason when the entry has no sensible reading
/// for that kind. Callers report it as a `rejected-wrong-kind` outcome.
pub fn interpret(value: &Value, kind: ParameterKind) -> Result<UpdateRequest, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(UpdateRequest::from)
            .ok_or_else(|| format!("number {n} is not representable as f64")),
        Value::String(s) => interpret_str(s, kind),
        Value::Object(obj) => interpret_object(obj, kind),
        Value::Bool(_) => Err("booleans are not valid knob values".to_string()),
        Value::Null => Err("null is not a valid knob value".to_string()),
        Value::Array(_) => Err("arrays are not valid knob values".to_string()),
    }
}

fn interpret_str(raw: &str, kind: ParameterKind) -> Result<UpdateRequest, String> {
    let s = raw.trim();

    if s.starts_with('+') || s.starts_with('-') {
        if let Ok(delta) = s.parse::<f64>() {
            return Ok(UpdateRequest::Relative(delta));
        }
    }
    if let Ok(directive) = s.parse::<Directive>() {
        return Ok(UpdateRequest::Directive(directive));
    }
    match kind {
        ParameterKind::Enum => Ok(UpdateRequest::Absolute(ParamValue::Enum(s.to_string()))),
        ParameterKind::Scalar => s
            .parse::<f64>()
            .map(UpdateRequest::from)
            .map_err(|_| format!("unknown directive '{s}' (expected increase, decrease or reset)")),
        ParameterKind::Structured => {
            Err(format!("'{s}' is not a directive and structured values need an object"))
        }
    }
}

fn interpret_object(obj: &Map<String, Value>, kind: ParameterKind) -> Result<UpdateRequest, String> {
    if obj.len() == 1 {
        if let Some(inner) = obj.get("value") {
            return interpret_absolute(inner, kind);
        }
        if let Some(delta) = obj.get("delta") {
            return delta
                .as_f64()
                .map(UpdateRequest::Relative)
                .ok_or_else(|| "delta must be a number".to_string());
        }
        if let Some(directive) = obj.get("directive") {
            let word = directive
                .as_str()
                .ok_or_else(|| "directive must be a string".to_string())?;
            return word
                .parse::<Directive>()
                .map(UpdateRequest::Directive)
                .map_err(|e| e.to_string());
        }
    }
    match kind {
        ParameterKind::Structured => weights(obj).map(|w| UpdateRequest::Absolute(ParamValue::Structured(w))),
        _ => Err(format!("objects are only valid for structured parameters, not {}", kind.as_str())),
    }
}

fn interpret_absolute(value: &Value, kind: ParameterKind) -> Result<UpdateRequest, String> {
    match (kind, value) {
        (_, Value::Number(n)) => n
            .as_f64()
            .map(UpdateRequest::from)
            .ok_or_else(|| format!("number {n} is not representable as f64")),
        (ParameterKind::Enum, Value::String(s)) => Ok(UpdateRequest::Absolute(ParamValue::Enum(s.clone()))),
        (ParameterKind::Structured, Value::Object(obj)) => {
            weights(obj).map(|w| UpdateRequest::Absolute(ParamValue::Structured(w)))
        }
        _ => Err(format!("value does not fit a {} parameter", kind.as_str())),
    }
}

fn weights(obj: &Map<String, Value>) -> Result<IndexMap<String, f64>, String> {
    obj.iter()
        .map(|(k, v)| {
            v.as_f64()
                .map(|w| (k.clone(), w))
                .ok_or_else(|| format!("sub-weight '{k}' must be a number"))
        })
        .collect()
}
