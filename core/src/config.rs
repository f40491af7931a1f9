use serde::{Deserialize, Serialize};

/// How strictly a request is vetted before the grant is simulated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestPolicy {
    /// Only a negative available count after the grant is rejected.
    /// A request above the requester's declared need can still be granted.
    #[default]
    Reference,
    /// Additionally reject states with negative need and requests above
    /// the requester's need, each as its own outcome.
    Strict,
}

/// Keywords of the record grammar. Every token here is compared exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InputGrammar {
    /// Leading token of every record; anything else ends the stream.
    pub case_marker:        String,
    pub process_marker:     String,
    pub available_keyword:  String,
    pub max_keyword:        String,
    pub allocation_keyword: String,
    /// Prefix of the requester label; the rest of the label is its index.
    pub label_prefix:       String,
    /// Largest process count a record may declare.
    pub max_processes:      usize,
    /// Largest resource count a record may declare.
    pub max_resources:      usize,
}

impl Default for InputGrammar {
    fn default() -> Self {
        Self {
            case_marker:        "R".into(),
            process_marker:     "P".into(),
            available_keyword:  "Available".into(),
            max_keyword:        "Max".into(),
            allocation_keyword: "Allocation".into(),
            label_prefix:       "P".into(),
            max_processes:      1024,
            max_resources:      256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BankerConfig {
    pub policy:            RequestPolicy,
    pub grammar:           InputGrammar,
    /// Print the `New Need` block after the simulation line.
    pub print_need_matrix: bool,
}

impl Default for BankerConfig {
    fn default() -> Self {
        Self {
            policy:            RequestPolicy::Reference,
            grammar:           InputGrammar::default(),
            print_need_matrix: true,
        }
    }
}

impl BankerConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: BankerConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        log::debug!("loaded config from {path}: policy={:?}", config.policy);
        Ok(config)
    }

    pub fn strict() -> Self {
        Self {
            policy: RequestPolicy::Strict,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: BankerConfig = serde_json::from_str(r#"{ "policy": "strict" }"#).unwrap();
        assert_eq!(config.policy, RequestPolicy::Strict);
        assert_eq!(config.grammar, InputGrammar::default());
        assert!(config.print_need_matrix);
    }

    #[test]
    fn grammar_keywords_can_be_renamed() {
        let config: BankerConfig =
            serde_json::from_str(r#"{ "grammar": { "label_prefix": "T" } }"#).unwrap();
        assert_eq!(config.grammar.label_prefix, "T");
        assert_eq!(config.grammar.case_marker, "R");
        assert_eq!(config.policy, RequestPolicy::Reference);
    }

    #[test]
    fn record_limits_can_be_raised() {
        let config: BankerConfig =
            serde_json::from_str(r#"{ "grammar": { "max_processes": 100000 } }"#).unwrap();
        assert_eq!(config.grammar.max_processes, 100_000);
        assert_eq!(config.grammar.max_resources, InputGrammar::default().max_resources);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(BankerConfig::load("/nonexistent/banker.json").is_err());
    }
}
