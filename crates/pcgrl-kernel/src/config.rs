//! Configuration types for the episode controller.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Free-form options passed through `adjust_param`.
///
/// The controller reads the keys it recognizes and forwards the whole map,
/// untouched, to the problem and the representation.
pub type Params = HashMap<String, Value>;

/// Default fraction of grid cells the agents may change per episode.
pub const DEFAULT_CHANGE_PERCENTAGE: f64 = 0.2;

/// Top-level environment configuration.
///
/// Loaded from JSON at runtime. Keys that are not fields of this struct are
/// collected into `params` and forwarded to the collaborators.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvConfig {
    /// Number of agents taking turns on the shared grid
    #[serde(default = "default_n_agents")]
    pub n_agents: usize,

    /// Seed for the controller RNG (random when absent)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Fraction of the grid area that may be changed before the episode ends
    #[serde(default = "default_change_percentage")]
    pub change_percentage: f64,

    /// Only one agent edits at a time; it hands over on a negative reward
    #[serde(default)]
    pub negative_switch: bool,

    /// Per-agent step lengths, stored for the caller
    #[serde(default)]
    pub step_length: Option<Vec<f64>>,

    /// Options forwarded verbatim to the problem and the representation
    #[serde(flatten)]
    pub params: Params,
}

fn default_n_agents() -> usize {
    2
}

fn default_change_percentage() -> f64 {
    DEFAULT_CHANGE_PERCENTAGE
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            n_agents: default_n_agents(),
            seed: None,
            change_percentage: DEFAULT_CHANGE_PERCENTAGE,
            negative_switch: false,
            step_length: None,
            params: Params::new(),
        }
    }
}

impl EnvConfig {
    /// Create a config for `n_agents` with every other field at its default.
    pub fn with_agents(n_agents: usize) -> Self {
        Self {
            n_agents,
            ..Default::default()
        }
    }

    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Flatten into the option map understood by `adjust_param`.
    pub fn to_params(&self) -> Params {
        let mut params = self.params.clone();
        params.insert("negative_switch".to_string(), Value::from(self.negative_switch));
        params.insert(
            "change_percentage".to_string(),
            Value::from(self.change_percentage),
        );
        if let Some(step_length) = &self.step_length {
            params.insert("step_length".to_string(), Value::from(step_length.clone()));
        }
        params
    }
}

/// Typed accessors over [`Params`].
///
/// Each getter returns `None` both when the key is missing and when the value
/// has the wrong JSON type; callers decide whether that matters.
pub trait ParamsExt {
    fn get_f64(&self, key: &str) -> Option<f64>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_usize(&self, key: &str) -> Option<usize>;
    fn get_f64_vec(&self, key: &str) -> Option<Vec<f64>>;
    fn get_f64_map(&self, key: &str) -> Option<HashMap<String, f64>>;
}

impl ParamsExt for Params {
    fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key)
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
    }

    fn get_f64_vec(&self, key: &str) -> Option<Vec<f64>> {
        self.get(key)?
            .as_array()?
            .iter()
            .map(Value::as_f64)
            .collect()
    }

    fn get_f64_map(&self, key: &str) -> Option<HashMap<String, f64>> {
        self.get(key)?
            .as_object()?
            .iter()
            .map(|(k, v)| v.as_f64().map(|f| (k.clone(), f)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = EnvConfig::default();
        assert_eq!(config.n_agents, 2);
        assert_eq!(config.change_percentage, 0.2);
        assert!(!config.negative_switch);
        assert!(config.params.is_empty());
    }

    #[test]
    fn test_unknown_keys_are_forwarded() {
        let config = EnvConfig::from_json(
            r#"{"n_agents": 3, "negative_switch": true, "width": 8, "random_tile": true}"#,
        )
        .unwrap();

        assert_eq!(config.n_agents, 3);
        assert!(config.negative_switch);
        assert_eq!(config.params.get_usize("width"), Some(8));
        assert_eq!(config.params.get_bool("random_tile"), Some(true));
        assert!(!config.params.contains_key("n_agents"));
    }

    #[test]
    fn test_to_params_includes_controller_options() {
        let mut config = EnvConfig::with_agents(2);
        config.step_length = Some(vec![1.0, 2.0]);
        let params = config.to_params();

        assert_eq!(params.get_bool("negative_switch"), Some(false));
        assert_eq!(params.get_f64("change_percentage"), Some(0.2));
        assert_eq!(params.get_f64_vec("step_length"), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn test_typed_getters_reject_wrong_types() {
        let mut params = Params::new();
        params.insert("flag".to_string(), json!("yes"));
        params.insert("weights".to_string(), json!({"a": 1.5, "b": "x"}));

        assert_eq!(params.get_bool("flag"), None);
        assert_eq!(params.get_f64_map("weights"), None);
        assert_eq!(params.get_f64("missing"), None);
    }
}
