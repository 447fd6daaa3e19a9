use std::path::PathBuf;
use std::time::Duration;

/// Target language passed to the synthesis service. Fixed.
pub const LANGUAGE: &str = "de";

const DEFAULT_TLD: &str = "com";
const DEFAULT_CLEANUP_MS: u64 = 1500;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ERROR_DISPLAY_SECS: u64 = 4;

/// Runtime settings. Nothing here is persisted; a few operational knobs can
/// be overridden from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub language: &'static str,
    /// Top-level domain of the translate host, e.g. `com` or `de`.
    pub tld: String,
    pub http_timeout: Duration,
    /// Delay between submit and scratch file deletion.
    pub cleanup_delay: Duration,
    pub error_display: Duration,
    pub scratch_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: LANGUAGE,
            tld: DEFAULT_TLD.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cleanup_delay: Duration::from_millis(DEFAULT_CLEANUP_MS),
            error_display: Duration::from_secs(DEFAULT_ERROR_DISPLAY_SECS),
            scratch_dir: std::env::temp_dir(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(tld) = lookup("SPRACHTRAINER_TLD") {
            let tld = tld.trim().trim_start_matches('.');
            if !tld.is_empty() && tld.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
                config.tld = tld.to_string();
            } else {
                tracing::warn!(value = %tld, "Ignoring invalid SPRACHTRAINER_TLD");
            }
        }

        if let Some(ms) = parse_u64(&lookup, "SPRACHTRAINER_CLEANUP_MS") {
            config.cleanup_delay = Duration::from_millis(ms);
        }

        if let Some(secs) = parse_u64(&lookup, "SPRACHTRAINER_TIMEOUT_SECS") {
            if secs > 0 {
                config.http_timeout = Duration::from_secs(secs);
            }
        }

        config
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "Ignoring invalid environment override");
            None
        }
    }
}
