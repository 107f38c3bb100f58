use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the evaluator treats a reference to a schema node that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// Evaluate to `Absent` and log the reference at debug level.
    #[default]
    Lenient,
    /// Fail with `ValidationError::UnresolvedReference`.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    pub state_timeout_ms: u64,
    pub unresolved_references: ReferencePolicy,
    pub max_count_depth: usize,
    pub default_error_app_tag: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            state_timeout_ms: 5_000,
            unresolved_references: ReferencePolicy::Lenient,
            max_count_depth: 64,
            default_error_app_tag: "must-violation".to_owned(),
        }
    }
}

impl ValidatorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn state_timeout(&self) -> Duration {
        Duration::from_millis(self.state_timeout_ms)
    }

    pub fn is_strict(&self) -> bool {
        self.unresolved_references == ReferencePolicy::Strict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn partial_json_keeps_defaults() {
        let config = ValidatorConfig::from_json_str(r#"{ "unresolved_references": "strict" }"#).unwrap();
        assert!(config.is_strict());
        assert_eq!(config.state_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_count_depth, 64);
    }

    #[rstest]
    fn unknown_fields_are_rejected() {
        assert!(ValidatorConfig::from_json_str(r#"{ "timeout": 1 }"#).is_err());
    }
}
