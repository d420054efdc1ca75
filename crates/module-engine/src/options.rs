//! Typed module options.
//!
//! Each module declares its options as [`OptionSpec`]s. Values are checked in
//! two stages: [`OptionSet::set`] rejects unknown names and wrong types at
//! once, [`OptionSet::validate`] checks numeric ranges when the module is
//! created.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sphereframe_common::{SphereError, SphereResult};

/// Value type and constraints of an option.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptionKind {
    Int { min: i64, max: i64 },
    Float { min: f64, max: f64 },
    Bool,
    Text,
}

impl OptionKind {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Int { .. } => "int",
            Self::Float { .. } => "float",
            Self::Bool => "bool",
            Self::Text => "text",
        }
    }
}

/// Concrete option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Declaration of one option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub default: OptionValue,
}

impl OptionSpec {
    pub fn int(
        name: &'static str,
        description: &'static str,
        min: i64,
        max: i64,
        default: i64,
    ) -> Self {
        Self {
            name,
            description,
            kind: OptionKind::Int { min, max },
            default: OptionValue::Int(default),
        }
    }

    pub fn float(
        name: &'static str,
        description: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            name,
            description,
            kind: OptionKind::Float { min, max },
            default: OptionValue::Float(default),
        }
    }

    pub fn boolean(name: &'static str, description: &'static str, default: bool) -> Self {
        Self {
            name,
            description,
            kind: OptionKind::Bool,
            default: OptionValue::Bool(default),
        }
    }

    pub fn text(name: &'static str, description: &'static str, default: impl Into<String>) -> Self {
        Self {
            name,
            description,
            kind: OptionKind::Text,
            default: OptionValue::Text(default.into()),
        }
    }

    /// Coerce `value` to this option's type, or describe the mismatch.
    fn coerce(&self, value: OptionValue) -> Result<OptionValue, OptionValue> {
        match (&self.kind, value) {
            (OptionKind::Int { .. }, v @ OptionValue::Int(_)) => Ok(v),
            (OptionKind::Float { .. }, OptionValue::Int(v)) => Ok(OptionValue::Float(v as f64)),
            (OptionKind::Float { .. }, v @ OptionValue::Float(_)) => Ok(v),
            (OptionKind::Bool, v @ OptionValue::Bool(_)) => Ok(v),
            (OptionKind::Text, v @ OptionValue::Text(_)) => Ok(v),
            (_, other) => Err(other),
        }
    }

    /// Parse command-line text into a value of this option's type.
    fn parse_text(&self, text: &str) -> Option<OptionValue> {
        let text = text.trim();
        match self.kind {
            OptionKind::Int { .. } => text.parse().ok().map(OptionValue::Int),
            OptionKind::Float { .. } => text.parse().ok().map(OptionValue::Float),
            OptionKind::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(OptionValue::Bool(true)),
                "false" | "0" | "no" | "off" => Some(OptionValue::Bool(false)),
                _ => None,
            },
            OptionKind::Text => Some(OptionValue::Text(text.to_string())),
        }
    }

    fn check_range(&self, value: &OptionValue) -> SphereResult<()> {
        let out_of_range = match (&self.kind, value) {
            (OptionKind::Int { min, max }, OptionValue::Int(v)) => !(*min..=*max).contains(v),
            (OptionKind::Float { min, max }, OptionValue::Float(v)) => {
                !v.is_finite() || *v < *min || *v > *max
            }
            _ => false,
        };
        if out_of_range {
            let (min, max) = match &self.kind {
                OptionKind::Int { min, max } => (min.to_string(), max.to_string()),
                OptionKind::Float { min, max } => (min.to_string(), max.to_string()),
                _ => (String::new(), String::new()),
            };
            return Err(SphereError::configuration(format!(
                "option '{}' = {value} is outside {min}..={max}",
                self.name
            )));
        }
        Ok(())
    }
}

/// The declared options of one module together with their current values.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSet {
    module: &'static str,
    specs: Vec<OptionSpec>,
    values: Vec<OptionValue>,
}

impl OptionSet {
    pub fn new(module: &'static str, specs: Vec<OptionSpec>) -> Self {
        let values = specs.iter().map(|s| s.default.clone()).collect();
        Self {
            module,
            specs,
            values,
        }
    }

    pub fn specs(&self) -> &[OptionSpec] {
        &self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Declarations paired with their current values.
    pub fn iter(&self) -> impl Iterator<Item = (&OptionSpec, &OptionValue)> {
        self.specs.iter().zip(&self.values)
    }

    fn index(&self, name: &str) -> SphereResult<usize> {
        self.specs
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| SphereError::UnknownOption {
                module: self.module.to_string(),
                option: name.to_string(),
            })
    }

    /// Set an option, rejecting unknown names and mismatched types.
    pub fn set(&mut self, name: &str, value: OptionValue) -> SphereResult<()> {
        let i = self.index(name)?;
        let spec = &self.specs[i];
        let value = spec.coerce(value).map_err(|got| SphereError::OptionType {
            option: name.to_string(),
            expected: spec.kind.type_name().to_string(),
            got: got.type_name().to_string(),
        })?;
        self.values[i] = value;
        Ok(())
    }

    /// Set an option from command-line text such as `"90"` or `"true"`.
    pub fn set_from_str(&mut self, name: &str, text: &str) -> SphereResult<()> {
        let i = self.index(name)?;
        let spec = &self.specs[i];
        let value = spec.parse_text(text).ok_or_else(|| SphereError::OptionType {
            option: name.to_string(),
            expected: spec.kind.type_name().to_string(),
            got: format!("{text:?}"),
        })?;
        self.values[i] = value;
        Ok(())
    }

    pub fn get(&self, name: &str) -> SphereResult<&OptionValue> {
        Ok(&self.values[self.index(name)?])
    }

    pub fn int(&self, name: &str) -> SphereResult<i64> {
        let value = self.get(name)?;
        value.as_int().ok_or_else(|| self.type_error(name, "int", value))
    }

    pub fn float(&self, name: &str) -> SphereResult<f64> {
        let value = self.get(name)?;
        value.as_float().ok_or_else(|| self.type_error(name, "float", value))
    }

    pub fn boolean(&self, name: &str) -> SphereResult<bool> {
        let value = self.get(name)?;
        value.as_bool().ok_or_else(|| self.type_error(name, "bool", value))
    }

    pub fn text(&self, name: &str) -> SphereResult<&str> {
        let value = self.get(name)?;
        value.as_text().ok_or_else(|| self.type_error(name, "text", value))
    }

    fn type_error(&self, name: &str, expected: &str, got: &OptionValue) -> SphereError {
        SphereError::OptionType {
            option: name.to_string(),
            expected: expected.to_string(),
            got: got.type_name().to_string(),
        }
    }

    /// Range-check every numeric option.
    pub fn validate(&self) -> SphereResult<()> {
        for (spec, value) in self.iter() {
            spec.check_range(value)?;
        }
        Ok(())
    }

    /// Restore every option to its default.
    pub fn reset(&mut self) {
        for (spec, value) in self.specs.iter().zip(self.values.iter_mut()) {
            *value = spec.default.clone();
        }
    }

    /// Current values keyed by option name, for persisting or printing.
    pub fn to_map(&self) -> BTreeMap<String, OptionValue> {
        self.iter()
            .map(|(spec, value)| (spec.name.to_string(), value.clone()))
            .collect()
    }

    /// Apply a map produced by [`OptionSet::to_map`].
    pub fn apply_map(&mut self, values: &BTreeMap<String, OptionValue>) -> SphereResult<()> {
        for (name, value) in values {
            self.set(name, value.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OptionSet {
        OptionSet::new(
            "sample",
            vec![
                OptionSpec::int("count", "How many", 1, 8, 2),
                OptionSpec::float("gain", "Scale factor", 0.0, 2.0, 1.0),
                OptionSpec::boolean("enabled", "Toggle", true),
                OptionSpec::text("layout", "Descriptor", "1 1 1 0 0 0 0 100"),
            ],
        )
    }

    #[test]
    fn defaults_are_applied() {
        let set = sample();
        assert_eq!(set.int("count").unwrap(), 2);
        assert_eq!(set.float("gain").unwrap(), 1.0);
        assert!(set.boolean("enabled").unwrap());
        assert_eq!(set.text("layout").unwrap(), "1 1 1 0 0 0 0 100");
    }

    #[test]
    fn unknown_option_is_rejected_immediately() {
        let mut set = sample();
        let err = set.set("colour", OptionValue::Int(1)).unwrap_err();
        assert!(matches!(err, SphereError::UnknownOption { ref option, .. } if option == "colour"));
    }

    #[test]
    fn type_mismatch_is_rejected_immediately() {
        let mut set = sample();
        let err = set.set("count", OptionValue::Text("3".into())).unwrap_err();
        assert!(matches!(err, SphereError::OptionType { .. }));
        assert_eq!(set.int("count").unwrap(), 2);
    }

    #[test]
    fn int_widens_to_float() {
        let mut set = sample();
        set.set("gain", OptionValue::Int(2)).unwrap();
        assert_eq!(set.float("gain").unwrap(), 2.0);
    }

    #[test]
    fn range_is_checked_at_validation() {
        let mut set = sample();
        set.set("count", OptionValue::Int(99)).unwrap();
        let err = set.validate().unwrap_err();
        assert!(err.is_configuration());
        set.reset();
        assert!(set.validate().is_ok());
    }

    #[test]
    fn text_values_parse_per_kind() {
        let mut set = sample();
        set.set_from_str("count", " 5 ").unwrap();
        set.set_from_str("enabled", "off").unwrap();
        set.set_from_str("gain", "0.5").unwrap();
        assert_eq!(set.int("count").unwrap(), 5);
        assert!(!set.boolean("enabled").unwrap());
        assert!(set.set_from_str("count", "many").is_err());
    }

    #[test]
    fn map_round_trips_through_json() {
        let mut set = sample();
        set.set("count", OptionValue::Int(4)).unwrap();
        let json = serde_json::to_string(&set.to_map()).unwrap();
        let map: BTreeMap<String, OptionValue> = serde_json::from_str(&json).unwrap();

        let mut restored = sample();
        restored.apply_map(&map).unwrap();
        assert_eq!(restored, set);
    }
}
