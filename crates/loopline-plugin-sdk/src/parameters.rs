use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterId(String);

impl ParameterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParameterId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub id: ParameterId,
    pub name: String,
    pub kind: ParameterKind,
    pub unit: Option<String>,
}

impl ParameterDefinition {
    pub fn new(id: impl Into<ParameterId>, name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParameterKind {
    Continuous { min: f32, max: f32, default: f32 },
    Toggle { default: bool },
}

impl ParameterKind {
    pub fn continuous(range: std::ops::RangeInclusive<f32>, default: f32) -> Self {
        Self::Continuous {
            min: *range.start(),
            max: *range.end(),
            default,
        }
    }

    pub fn default_value(&self) -> ParameterValue {
        match self {
            ParameterKind::Continuous { default, .. } => ParameterValue::Continuous(*default),
            ParameterKind::Toggle { default } => ParameterValue::Toggle(*default),
        }
    }

    /// Brings a value into this parameter's domain, clamping continuous
    /// values into range. Out-of-range input is never rejected, matching the
    /// engine's clamp-don't-error policy.
    pub fn sanitize(&self, value: ParameterValue) -> Result<ParameterValue, PluginParameterError> {
        match (self, value) {
            (ParameterKind::Continuous { min, max, .. }, ParameterValue::Continuous(v)) => {
                Ok(ParameterValue::Continuous(v.clamp(*min, *max)))
            }
            (ParameterKind::Toggle { .. }, ParameterValue::Toggle(v)) => {
                Ok(ParameterValue::Toggle(v))
            }
            (_, value) => Err(PluginParameterError::TypeMismatch { value }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Continuous(f32),
    Toggle(bool),
}

impl ParameterValue {
    pub fn as_f32(&self) -> f32 {
        match self {
            ParameterValue::Continuous(v) => *v,
            ParameterValue::Toggle(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            ParameterValue::Continuous(v) => *v >= 0.5,
            ParameterValue::Toggle(v) => *v,
        }
    }
}

#[derive(Debug, Error)]
pub enum PluginParameterError {
    #[error("unknown parameter {id}")]
    Unknown { id: ParameterId },
    #[error("value {value:?} does not match the parameter's kind")]
    TypeMismatch { value: ParameterValue },
}

/// Definition-backed store of current parameter values.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    definitions: Vec<ParameterDefinition>,
    values: HashMap<ParameterId, ParameterValue>,
}

impl ParameterSet {
    pub fn new(definitions: Vec<ParameterDefinition>) -> Self {
        let values = definitions
            .iter()
            .map(|def| (def.id.clone(), def.kind.default_value()))
            .collect();
        Self {
            definitions,
            values,
        }
    }

    pub fn definitions(&self) -> &[ParameterDefinition] {
        &self.definitions
    }

    pub fn get(&self, id: &ParameterId) -> Option<ParameterValue> {
        self.values.get(id).copied()
    }

    /// Stores a value, clamped into the parameter's domain.
    pub fn set(
        &mut self,
        id: &ParameterId,
        value: ParameterValue,
    ) -> Result<(), PluginParameterError> {
        let def = self
            .definitions
            .iter()
            .find(|def| &def.id == id)
            .ok_or_else(|| PluginParameterError::Unknown { id: id.clone() })?;
        let sanitized = def.kind.sanitize(value)?;
        self.values.insert(id.clone(), sanitized);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> ParameterSet {
        ParameterSet::new(vec![
            ParameterDefinition::new(
                "delay",
                "Delay",
                ParameterKind::continuous(50.0..=3000.0, 500.0),
            )
            .with_unit("ms"),
            ParameterDefinition::new("bypass", "Bypass", ParameterKind::Toggle { default: false }),
        ])
    }

    #[test]
    fn defaults_populate_on_construction() {
        let params = set();
        assert_eq!(
            params.get(&"delay".into()),
            Some(ParameterValue::Continuous(500.0))
        );
        assert_eq!(
            params.get(&"bypass".into()),
            Some(ParameterValue::Toggle(false))
        );
    }

    #[test]
    fn continuous_values_clamp_into_range() {
        let mut params = set();
        params
            .set(&"delay".into(), ParameterValue::Continuous(99_999.0))
            .expect("set");
        assert_eq!(
            params.get(&"delay".into()),
            Some(ParameterValue::Continuous(3000.0))
        );
    }

    #[test]
    fn unknown_and_mismatched_parameters_error() {
        let mut params = set();
        assert!(params
            .set(&"missing".into(), ParameterValue::Toggle(true))
            .is_err());
        assert!(params
            .set(&"delay".into(), ParameterValue::Toggle(true))
            .is_err());
    }
}
