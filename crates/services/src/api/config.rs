use std::env;
use std::time::Duration;

/// Connection settings for the StudyBuddy REST API.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8000/api";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: None,
            refresh_token: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Read `STUDYBUDDY_API_URL`, `STUDYBUDDY_ACCESS_TOKEN`,
    /// `STUDYBUDDY_REFRESH_TOKEN` and `STUDYBUDDY_TIMEOUT_SECS`. Blank or
    /// unparsable values count as unset.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = non_blank_var("STUDYBUDDY_API_URL")
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string());
        let timeout = non_blank_var("STUDYBUDDY_TIMEOUT_SECS")
            .and_then(|v| parse_timeout(&v))
            .unwrap_or(Self::DEFAULT_TIMEOUT);
        Self::new(base_url)
            .with_tokens(
                non_blank_var("STUDYBUDDY_ACCESS_TOKEN"),
                non_blank_var("STUDYBUDDY_REFRESH_TOKEN"),
            )
            .with_timeout(timeout)
    }

    #[must_use]
    pub fn with_tokens(mut self, access: Option<String>, refresh: Option<String>) -> Self {
        self.access_token = access;
        self.refresh_token = refresh;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join an endpoint path onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL)
    }
}

/// Whole seconds, at least one.
#[must_use]
pub fn parse_timeout(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let config = ApiConfig::new("http://example.test/api/");
        assert_eq!(
            config.endpoint("/quizzes/submit/"),
            "http://example.test/api/quizzes/submit/"
        );
        let config = ApiConfig::new("http://example.test/api");
        assert_eq!(config.endpoint("quizzes/"), "http://example.test/api/quizzes/");
    }

    #[test]
    fn timeout_needs_positive_seconds() {
        assert_eq!(parse_timeout(" 12 "), Some(Duration::from_secs(12)));
        assert_eq!(parse_timeout("0"), None);
        assert_eq!(parse_timeout("soon"), None);
        let config = ApiConfig::default().with_timeout(Duration::from_secs(3));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn default_points_at_local_backend() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/api");
        assert!(config.access_token.is_none());
        assert_eq!(config.timeout, ApiConfig::DEFAULT_TIMEOUT);
    }
}
