use serde::Deserialize;

fn default_max_records() -> usize {
    100_000
}

fn default_public_url_base() -> String {
    "https://storage.local/object/public".into()
}

fn default_tables() -> Vec<String> {
    vec!["inventory_logs".into()]
}

fn default_buckets() -> Vec<String> {
    vec!["inventory-files".into()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryBackendConfig {
    /// Per-table row cap; the oldest rows are dropped beyond it.
    #[serde(default = "default_max_records")]
    pub max_records: usize,
    /// Prefix of public object URLs: `{base}/{bucket}/{path}`.
    #[serde(default = "default_public_url_base")]
    pub public_url_base: String,
    /// Deliver every feed change twice (at-least-once delivery).
    #[serde(default)]
    pub duplicate_delivery: bool,
    #[serde(default = "default_tables")]
    pub tables: Vec<String>,
    #[serde(default = "default_buckets")]
    pub buckets: Vec<String>,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
            public_url_base: default_public_url_base(),
            duplicate_delivery: false,
            tables: default_tables(),
            buckets: default_buckets(),
        }
    }
}
