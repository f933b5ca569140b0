use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, time::Duration};
use url::Url;
use vmprov_client::retry::{RetryConfig, RetryStrategy};

/// Connection settings read from the configuration file. Every field is optional and command
/// line flags take precedence.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct VmprovConfig {
    #[serde(default)]
    pub endpoint: Option<Url>,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub accept_invalid_certificates: Option<bool>,
    #[serde(default)]
    pub proxy: Option<Url>,
    #[serde(default)]
    pub poll_interval_seconds: Option<u64>,
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetrySettings {
    #[serde(default)]
    pub always: Option<bool>,
    #[serde(default)]
    pub max_retry_count: Option<u8>,
    #[serde(default)]
    pub base_wait_seconds: Option<f64>,
    #[serde(default)]
    pub backoff_factor: Option<f64>,
}

impl VmprovConfig {
    /// Retry settings with defaults filled in. Fails if a configured value is out of range.
    pub fn retry_config(&self) -> Result<RetryConfig> {
        let defaults = RetryConfig::default();
        let RetrySettings {
            always,
            max_retry_count,
            base_wait_seconds,
            backoff_factor,
        } = &self.retry;

        let base_wait = match base_wait_seconds {
            Some(seconds) => Duration::try_from_secs_f64(*seconds).with_context(|| {
                format!("Invalid retry.base_wait_seconds `{seconds}` in config file")
            })?,
            None => defaults.base_wait,
        };
        let backoff_factor = match backoff_factor {
            Some(factor) if factor.is_finite() && *factor >= 1.0 => *factor,
            Some(factor) => {
                return Err(anyhow!(
                    "Invalid retry.backoff_factor `{factor}` in config file: expected a number \
                     of at least 1"
                ))
            }
            None => defaults.backoff_factor,
        };

        Ok(RetryConfig {
            strategy: match always {
                Some(true) => RetryStrategy::Always,
                _ => defaults.strategy,
            },
            max_retry_count: max_retry_count.unwrap_or(defaults.max_retry_count),
            base_wait,
            backoff_factor,
        })
    }
}

pub fn read_vmprov_config(path: impl AsRef<Path>) -> Result<VmprovConfig> {
    debug!("Reading config file at `{}`", path.as_ref().display());
    if path.as_ref().exists() {
        let file = File::open(&path)
            .with_context(|| format!("Could not open config file `{}`", path.as_ref().display()))?;
        let config_reader = BufReader::new(file);
        serde_json::from_reader(config_reader)
            .with_context(|| format!("Could not parse config file `{}`", path.as_ref().display()))
    } else {
        Ok(Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_missing_config_is_default() {
        let directory = tempfile::tempdir().unwrap();
        let config = read_vmprov_config(directory.path().join("config.json")).unwrap();
        assert_eq!(config, VmprovConfig::default());
        assert_eq!(config.retry_config().unwrap(), RetryConfig::default());
    }

    #[test]
    fn test_read_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "endpoint": "https://management.usgovcloudapi.net",
                "subscription_id": "00000000-0000-0000-0000-000000000001",
                "poll_interval_seconds": 5,
                "retry": {{"always": true, "max_retry_count": 2, "base_wait_seconds": 0.5}}
            }}"#
        )
        .unwrap();

        let config = read_vmprov_config(file.path()).unwrap();
        assert_eq!(
            config.endpoint,
            Some(Url::parse("https://management.usgovcloudapi.net").unwrap())
        );
        assert_eq!(
            config.subscription_id.as_deref(),
            Some("00000000-0000-0000-0000-000000000001")
        );
        assert_eq!(config.poll_interval_seconds, Some(5));
        assert_eq!(config.accept_invalid_certificates, None);
        assert_eq!(
            config.retry_config().unwrap(),
            RetryConfig {
                strategy: RetryStrategy::Always,
                max_retry_count: 2,
                base_wait: Duration::from_millis(500),
                backoff_factor: 2.0,
            }
        );
    }

    #[test]
    fn test_out_of_range_retry_settings() {
        let with_retry = |retry: &str| {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(file, r#"{{"retry": {retry}}}"#).unwrap();
            read_vmprov_config(file.path()).unwrap()
        };

        for retry in [
            r#"{"base_wait_seconds": 1e30}"#,
            r#"{"base_wait_seconds": -1.0}"#,
            r#"{"backoff_factor": -2.0}"#,
            r#"{"backoff_factor": 0.5}"#,
        ] {
            let config = with_retry(retry);
            let error = config.retry_config().unwrap_err();
            assert!(
                error.to_string().starts_with("Invalid retry."),
                "{retry}: {error}"
            );
        }

        let config = with_retry(r#"{"base_wait_seconds": 0, "backoff_factor": 1.0}"#);
        let retry = config.retry_config().unwrap();
        assert_eq!(retry.base_wait, Duration::ZERO);
        assert_eq!(retry.backoff_factor, 1.0);
    }

    #[test]
    fn test_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"endpoint": "not a url"}}"#).unwrap();

        let error = read_vmprov_config(file.path()).unwrap_err();
        assert!(error.to_string().starts_with("Could not parse config file"));
    }
}
