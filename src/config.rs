//! Store connection settings.

const DEFAULT_REGION: &str = "us-east-1";

/// Static access-key credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl StaticCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

/// Connection settings used to build the store client.
///
/// Values are not validated here. A bad region or key pair only shows up
/// once a request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// AWS region.
    pub region: String,
    /// Static credentials. `None` falls back to the SDK's default provider chain.
    pub credentials: Option<StaticCredentials>,
    /// Custom endpoint URL (for local DynamoDB).
    pub endpoint_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            credentials: None,
            endpoint_url: None,
        }
    }
}

impl StoreConfig {
    /// Reads `AWS_REGION`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
    /// `AWS_SESSION_TOKEN` and `AWS_ENDPOINT_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let credentials = match (
            non_empty("AWS_ACCESS_KEY_ID"),
            non_empty("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(access_key), Some(secret_key)) => {
                let mut credentials = StaticCredentials::new(access_key, secret_key);
                credentials.session_token = non_empty("AWS_SESSION_TOKEN");
                Some(credentials)
            }
            _ => None,
        };

        Self {
            region: non_empty("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            credentials,
            endpoint_url: non_empty("AWS_ENDPOINT_URL"),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_credentials(mut self, credentials: StaticCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({})", url),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = StoreConfig::from_lookup(lookup(&[]));
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn reads_region_credentials_and_endpoint() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("AWS_REGION", "eu-west-1"),
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_SESSION_TOKEN", "token"),
            ("AWS_ENDPOINT_URL", "http://localhost:8000"),
        ]));

        assert_eq!(config.region, "eu-west-1");
        assert_eq!(
            config.credentials,
            Some(StaticCredentials::new("AKIDEXAMPLE", "secret").with_session_token("token"))
        );
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.target_display(), "Local DynamoDB (http://localhost:8000)");
    }

    #[test]
    fn half_a_key_pair_is_ignored() {
        let config = StoreConfig::from_lookup(lookup(&[("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")]));
        assert!(config.credentials.is_none());
    }

    #[test]
    fn debug_output_hides_secret() {
        let credentials = StaticCredentials::new("AKIDEXAMPLE", "very-secret");
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("AKIDEXAMPLE"));
        assert!(!rendered.contains("very-secret"));
    }
}
