use std::collections::BTreeMap;

use super::{Config, ConfigSource};

fn source_label(source: Option<&ConfigSource>) -> String {
    source.unwrap_or(&ConfigSource::Defaults).to_string()
}

impl Config {
    /// Effective configuration as `key -> (value, source)` pairs, sorted by key.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add = |key: &str, value: String| {
            let source = source_label(self.source_attribution.get(key));
            config.insert(key.to_string(), (value, source));
        };

        add("store_dir", self.store_dir().to_string());
        add(
            "retry_backoff_ms",
            self.retry_backoff().as_millis().to_string(),
        );
        add("job_yield_ms", self.job_yield().as_millis().to_string());
        add(
            "call_timeout_secs",
            self.call_timeout().as_secs().to_string(),
        );
        add("verbose", self.verbose().to_string());
        add("llm.provider", self.provider().to_string());
        add("llm.models", self.models().join(", "));
        if let Some(budget) = self.call_budget() {
            add("llm.call_budget", budget.to_string());
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_config_reports_sources() {
        let config = Config::builder()
            .provider("dry-run")
            .call_budget(12)
            .build()
            .unwrap();
        let effective = config.effective_config();

        assert_eq!(
            effective["llm.provider"],
            ("dry-run".to_string(), "programmatic".to_string())
        );
        assert_eq!(effective["llm.call_budget"].0, "12");
        assert_eq!(effective["retry_backoff_ms"].1, "default");
    }
}
