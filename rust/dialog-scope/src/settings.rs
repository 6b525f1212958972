use serde::{Deserialize, Serialize};

use crate::ScopeResult;

/// Name of the capability parameter unless configured otherwise.
pub const DEFAULT_PARAMETER: &str = "pself";

/// Configuration of capability injection.
///
/// ```
/// use dialog_scope::ScopeSettings;
///
/// let settings = ScopeSettings::from_json(r#"{ "parameter": "priv" }"#).unwrap();
/// assert_eq!(settings.parameter, "priv");
/// assert!(!settings.strict);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeSettings {
    /// Name of the parameter through which callables receive a
    /// [`Capability`](crate::Capability).
    pub parameter: String,
    /// When set, wrapping a callable that does not declare [`Self::parameter`]
    /// fails instead of leaving the callable untouched.
    pub strict: bool,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            parameter: DEFAULT_PARAMETER.to_owned(),
            strict: false,
        }
    }
}

impl ScopeSettings {
    /// Settings injecting through `parameter`.
    pub fn new(parameter: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            ..Self::default()
        }
    }

    /// Same settings, failing on callables without the capability parameter.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Same settings, passing callables without the capability parameter
    /// through unmodified.
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }

    /// Decode settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> ScopeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DialogScopeError;

    #[test]
    fn it_defaults_to_lenient_pself() {
        let settings = ScopeSettings::from_json("{}").unwrap();
        assert_eq!(settings, ScopeSettings::default());
        assert_eq!(settings.parameter, DEFAULT_PARAMETER);
    }

    #[test]
    fn it_reads_strict_settings() {
        let settings = ScopeSettings::from_json(r#"{"parameter":"priv","strict":true}"#).unwrap();
        assert_eq!(settings, ScopeSettings::new("priv").strict());
    }

    #[test]
    fn it_rejects_malformed_settings() {
        let error = ScopeSettings::from_json(r#"{"strict":"yes"}"#).unwrap_err();
        assert!(matches!(error, DialogScopeError::Settings(_)));
    }
}
