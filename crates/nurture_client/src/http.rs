use std::sync::{Arc, RwLock};

use nurture_logging::{nurture_debug, nurture_info, nurture_warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ApiError, ApiErrorKind, ClientSettings, RequestOptions};

/// Notified when the server rejects the stored token.
pub trait SessionListener: Send + Sync {
    fn session_expired(&self);
}

impl<F> SessionListener for F
where
    F: Fn() + Send + Sync,
{
    fn session_expired(&self) {
        self()
    }
}

/// Shared bearer token; cleared by the client on a 401.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token.filter(|t| !t.is_empty()))),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }

    /// A blank token clears the store.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token).filter(|t| !t.is_empty());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }
}

/// `{ code, message, data }` wrapper around every response body.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Thin JSON client over the backend's REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
    session_listener: Option<Arc<dyn SessionListener>>,
}

impl ApiClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(ApiErrorKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiErrorKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            tokens: TokenStore::new(settings.token.clone()),
            session_listener: None,
        })
    }

    pub fn with_session_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.session_listener = Some(listener);
        self
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// GET with `query` serialized into the URL; `None` values are skipped.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, Option<String>)],
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, query)?;
        self.request(Method::GET, url, None, options).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, &[])?;
        let body = serde_json::to_vec(body)
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))?;
        self.request(Method::POST, url, Some(body), options).await
    }

    fn endpoint(&self, path: &str, query: &[(&str, Option<String>)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|err| ApiError::new(ApiErrorKind::InvalidUrl, err.to_string()))?;
        let pairs: Vec<(&str, &str)> = query
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|value| (*key, value)))
            .collect();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let mut retries_left = options.retry;
        let mut attempt = 1u32;
        loop {
            match self.send_once(method.clone(), url.clone(), body.clone()).await {
                Ok(data) => return Ok(data),
                Err(err) if err.is_network_level() && retries_left > 0 => {
                    nurture_warn!(
                        "{} {} failed (attempt {}): {}",
                        method,
                        url.path(),
                        attempt,
                        err
                    );
                    nurture_info!("Retrying ({} retries left)", retries_left);
                    tokio::time::sleep(options.retry_delay).await;
                    retries_left -= 1;
                    attempt += 1;
                }
                Err(err) => {
                    nurture_debug!(
                        "{} {} failed (attempt {}): {}",
                        method,
                        url.path(),
                        attempt,
                        err
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<T, ApiError> {
        let mut builder = self.client.request(method, url);
        if let Some(token) = self.tokens.get() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .map(|body| body.message)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| status.to_string());
            return Err(self.status_error(status, message));
        }

        let envelope: Envelope<T> = serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))?;
        if envelope.code != 0 {
            return Err(ApiError::new(
                ApiErrorKind::Business {
                    code: envelope.code,
                },
                envelope.message,
            ));
        }
        envelope
            .data
            .ok_or_else(|| ApiError::new(ApiErrorKind::Decode, "response carries no data"))
    }

    fn status_error(&self, status: StatusCode, message: String) -> ApiError {
        match status {
            StatusCode::UNAUTHORIZED => {
                nurture_warn!("Session expired; clearing stored token");
                self.tokens.clear();
                if let Some(listener) = &self.session_listener {
                    listener.session_expired();
                }
                ApiError::new(ApiErrorKind::Unauthorized, message)
            }
            StatusCode::NOT_FOUND => ApiError::new(ApiErrorKind::NotFound, message),
            other => ApiError::new(ApiErrorKind::HttpStatus(other.as_u16()), message),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiErrorKind::Timeout, err.to_string());
    }
    ApiError::new(ApiErrorKind::Network, err.to_string())
}
