use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for [`crate::ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub base_url: String,
    #[serde(with = "millis")]
    pub connect_timeout: Duration,
    /// Analysis calls can run long on the server side.
    #[serde(with = "millis")]
    pub request_timeout: Duration,
    pub token: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.example.com".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            token: None,
        }
    }
}

/// Per-request retry policy for network-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    pub retry: u32,
    pub retry_delay: Duration,
}

impl RequestOptions {
    pub const fn retrying(retry: u32, retry_delay: Duration) -> Self {
        Self { retry, retry_delay }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            retry: 0,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
