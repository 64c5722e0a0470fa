use serde::Deserialize;

/// Response envelope configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseConfig {
    /// Prefix prepended to every response code (e.g. `PMH-200`)
    #[serde(default = "default_prefix_code")]
    pub prefix_code: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            prefix_code: default_prefix_code(),
        }
    }
}

fn default_prefix_code() -> String {
    "PMH-".to_string()
}
