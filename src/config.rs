use core::time::Duration;

use chrono::NaiveDate;

macro_rules! env_or_default {
    ($name:expr, $default:expr) => {
        if let Some(s) = option_env!($name) {
            s
        } else {
            $default
        }
    };
}

pub const DEFAULT_BASE_URL: &str = env_or_default!("WEBCLASS_URL", "https://els.sa.dendai.ac.jp");

/// Messages older than this are not requested unless the caller says otherwise.
pub const DEFAULT_SINCE: &str = "2000-01-01";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub since: NaiveDate,
    /// Per-request deadline. `None` keeps the transport defaults.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            since: DEFAULT_SINCE.parse().unwrap_or_default(),
            timeout: None,
        }
    }
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Joins `path` (which starts with `/`) onto the configured host.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}
