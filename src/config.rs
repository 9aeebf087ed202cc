use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://staticcdn.duckduckgo.com/";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
const DEFAULT_RUN_TIMEOUT_SECS: u64 = 120;

#[derive(Clone, Debug, PartialEq)]
pub struct SyncConfig {
    pub base_url: Url,
    pub http_timeout: Duration,
    /// `None` waits for every chain however long it takes.
    pub run_timeout: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            run_timeout: Some(Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS)),
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(base) = get("BFEEDS_BASE_URL") {
            cfg.base_url = parse_base_url(&base)?;
        }
        if let Some(secs) = get("BFEEDS_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().context("BFEEDS_HTTP_TIMEOUT_SECS")?;
            cfg.http_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = get("BFEEDS_RUN_TIMEOUT_SECS") {
            cfg.run_timeout = run_timeout_from_secs(secs.parse().context("BFEEDS_RUN_TIMEOUT_SECS")?);
        }
        Ok(cfg)
    }
}

/// `0` disables the run timeout.
pub fn run_timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Endpoint paths are joined onto the base, so it must end in `/`.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).with_context(|| format!("Invalid base URL: {raw}"))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_env() {
        let cfg = SyncConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, SyncConfig::default());
        assert_eq!(cfg.run_timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn env_overrides_and_zero_disables_run_timeout() {
        let cfg = SyncConfig::from_lookup(lookup(&[
            ("BFEEDS_BASE_URL", "http://localhost:8080/feeds"),
            ("BFEEDS_HTTP_TIMEOUT_SECS", "3"),
            ("BFEEDS_RUN_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.base_url.as_str(), "http://localhost:8080/feeds/");
        assert_eq!(cfg.http_timeout, Duration::from_secs(3));
        assert_eq!(cfg.run_timeout, None);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(SyncConfig::from_lookup(lookup(&[("BFEEDS_BASE_URL", "not a url")])).is_err());
        assert!(SyncConfig::from_lookup(lookup(&[("BFEEDS_RUN_TIMEOUT_SECS", "soon")])).is_err());
    }
}
