//! # Parameter Resolution
//!
//! Every entity carries three tiers of parameters:
//!
//! ```text
//!   class defaults   (fixed per kind)
//!        │  build_defaults(overrides)
//!        ▼
//!   instance defaults (persist across calls, changed by assign_defaults)
//!        │  resolve_call(call overrides)
//!        ▼
//!   current          (valid for one call only)
//! ```
//!
//! The key set is closed: an override may only name keys that exist in the
//! class defaults. A key can be present but unset (`None`), which is how a
//! parameter without a meaningful default (e.g. Arithmetic weights) is
//! declared.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointRef;
use crate::error::CoreError;
use crate::value::Value;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Number(f64),
    Keyword(String),
    Value(Value),
    Endpoint(EndpointRef),
    Set(ParamSet),
}

impl ParamValue {
    fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Flag(_) => "flag",
            ParamValue::Number(_) => "number",
            ParamValue::Keyword(_) => "keyword",
            ParamValue::Value(_) => "value",
            ParamValue::Endpoint(_) => "endpoint",
            ParamValue::Set(_) => "parameter set",
        }
    }

    /// Numeric content, accepting a bare number or a scalar value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(x) => Some(*x),
            ParamValue::Value(Value::Scalar(x)) => Some(*x),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Number(x)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Flag(b)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Keyword(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Keyword(s)
    }
}

impl From<Value> for ParamValue {
    fn from(v: Value) -> Self {
        ParamValue::Value(v)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        ParamValue::Value(Value::Vector(v))
    }
}

impl From<Vec<Vec<f64>>> for ParamValue {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        ParamValue::Value(Value::Matrix(rows))
    }
}

impl From<EndpointRef> for ParamValue {
    fn from(e: EndpointRef) -> Self {
        ParamValue::Endpoint(e)
    }
}

impl From<ParamSet> for ParamValue {
    fn from(s: ParamSet) -> Self {
        ParamValue::Set(s)
    }
}

/// An ordered map from parameter name to an optional value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet {
    entries: BTreeMap<String, Option<ParamValue>>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add or replace a parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.entries.insert(key.into(), Some(value.into()));
        self
    }

    /// Builder: declare a parameter without a value.
    pub fn with_unset(mut self, key: impl Into<String>) -> Self {
        self.entries.insert(key.into(), None);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), Some(value.into()));
    }

    pub fn unset(&mut self, key: impl Into<String>) {
        self.entries.insert(key.into(), None);
    }

    /// Parse a parameter set from a JSON object (`null` declares an unset key).
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::config("parameter set", format!("invalid JSON: {}", e)))
    }

    /// True if the key is declared, set or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The value for `key`, or `None` if it is absent or unset.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ParamValue>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn require(&self, entity: &str, key: &str) -> Result<&ParamValue, CoreError> {
        self.get(key)
            .ok_or_else(|| CoreError::config(entity, format!("parameter '{}' has no value", key)))
    }

    fn wrong_kind(entity: &str, key: &str, wanted: &str, got: &ParamValue) -> CoreError {
        CoreError::config(
            entity,
            format!("parameter '{}' must be a {}, got a {}", key, wanted, got.kind_name()),
        )
    }

    pub fn number(&self, entity: &str, key: &str) -> Result<f64, CoreError> {
        let v = self.require(entity, key)?;
        v.as_number()
            .ok_or_else(|| Self::wrong_kind(entity, key, "number", v))
    }

    pub fn flag(&self, entity: &str, key: &str) -> Result<bool, CoreError> {
        match self.require(entity, key)? {
            ParamValue::Flag(b) => Ok(*b),
            other => Err(Self::wrong_kind(entity, key, "flag", other)),
        }
    }

    pub fn keyword(&self, entity: &str, key: &str) -> Result<&str, CoreError> {
        match self.require(entity, key)? {
            ParamValue::Keyword(s) => Ok(s),
            other => Err(Self::wrong_kind(entity, key, "keyword", other)),
        }
    }

    pub fn value(&self, entity: &str, key: &str) -> Result<&Value, CoreError> {
        match self.require(entity, key)? {
            ParamValue::Value(v) => Ok(v),
            other => Err(Self::wrong_kind(entity, key, "value", other)),
        }
    }

    pub fn set(&self, entity: &str, key: &str) -> Result<&ParamSet, CoreError> {
        match self.require(entity, key)? {
            ParamValue::Set(s) => Ok(s),
            other => Err(Self::wrong_kind(entity, key, "parameter set", other)),
        }
    }

    pub fn endpoint(&self, entity: &str, key: &str) -> Result<EndpointRef, CoreError> {
        match self.require(entity, key)? {
            ParamValue::Endpoint(e) => Ok(*e),
            other => Err(Self::wrong_kind(entity, key, "endpoint", other)),
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParamSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

// ============================================================================
// Merging
// ============================================================================

fn merge(entity: &str, base: &ParamSet, overrides: Option<&ParamSet>) -> Result<ParamSet, CoreError> {
    let mut merged = base.clone();
    let Some(overrides) = overrides else {
        return Ok(merged);
    };
    for (key, value) in &overrides.entries {
        if !base.entries.contains_key(key) {
            return Err(CoreError::config(
                entity,
                format!(
                    "unknown parameter '{}' (valid parameters: {})",
                    key,
                    base.keys().collect::<Vec<_>>().join(", ")
                ),
            ));
        }
        merged.entries.insert(key.clone(), value.clone());
    }
    Ok(merged)
}

/// Merge instance overrides over class defaults.
pub fn build_defaults(
    entity: &str,
    class_defaults: &ParamSet,
    instance_overrides: Option<&ParamSet>,
) -> Result<ParamSet, CoreError> {
    merge(entity, class_defaults, instance_overrides)
}

/// Merge one call's overrides over the instance defaults, without touching them.
pub fn resolve_call(
    entity: &str,
    instance_defaults: &ParamSet,
    call_overrides: Option<&ParamSet>,
) -> Result<ParamSet, CoreError> {
    merge(entity, instance_defaults, call_overrides)
}

// ============================================================================
// Validation hook
// ============================================================================

/// Per-entity validation of a merged parameter set.
///
/// Structural checks run first and may rewrite values in place; semantic
/// (cross-field) checks run on the rewritten set.
pub trait ValidateParams {
    fn validate_structure(&self, _params: &mut ParamSet) -> Result<(), CoreError> {
        Ok(())
    }

    fn validate_semantics(&self, _params: &ParamSet) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Accepts every merged set unchanged.
pub struct NoValidation;

impl ValidateParams for NoValidation {}

/// Run both validation passes, structure first.
pub fn validate<V: ValidateParams + ?Sized>(hook: &V, params: &mut ParamSet) -> Result<(), CoreError> {
    hook.validate_structure(params)?;
    hook.validate_semantics(params)
}

/// The class and instance tiers for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamStore {
    entity: String,
    class_defaults: ParamSet,
    instance_defaults: ParamSet,
}

impl ParamStore {
    /// Merge and validate instance defaults.
    pub fn new<V: ValidateParams + ?Sized>(
        entity: impl Into<String>,
        class_defaults: ParamSet,
        overrides: Option<&ParamSet>,
        hook: &V,
    ) -> Result<Self, CoreError> {
        let entity = entity.into();
        let mut instance_defaults = build_defaults(&entity, &class_defaults, overrides)?;
        validate(hook, &mut instance_defaults)?;
        Ok(Self {
            entity,
            class_defaults,
            instance_defaults,
        })
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn class_defaults(&self) -> &ParamSet {
        &self.class_defaults
    }

    pub fn instance_defaults(&self) -> &ParamSet {
        &self.instance_defaults
    }

    /// The validated parameter set for a single call.
    pub fn current<V: ValidateParams + ?Sized>(
        &self,
        call_overrides: Option<&ParamSet>,
        hook: &V,
    ) -> Result<ParamSet, CoreError> {
        let mut current = resolve_call(&self.entity, &self.instance_defaults, call_overrides)?;
        validate(hook, &mut current)?;
        Ok(current)
    }

    /// Replace instance defaults; on error the previous defaults stay in place.
    pub fn assign_defaults<V: ValidateParams + ?Sized>(
        &mut self,
        overrides: &ParamSet,
        hook: &V,
    ) -> Result<(), CoreError> {
        let mut next = build_defaults(&self.entity, &self.instance_defaults, Some(overrides))?;
        validate(hook, &mut next)?;
        self.instance_defaults = next;
        Ok(())
    }
}
