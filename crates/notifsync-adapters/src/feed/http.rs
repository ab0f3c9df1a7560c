//! HTTP implementation of [`NotificationFeed`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use url::Url;

use notifsync_core::config::ApiConfig;
use notifsync_core::error::{AppError, ErrorKind};
use notifsync_core::result::AppResult;
use notifsync_core::traits::NotificationFeed;
use notifsync_core::types::{NotificationRecord, UserId};

use super::envelope::decode_feed;

/// Longest error body excerpt kept in an error message.
const ERROR_BODY_LIMIT: usize = 200;

/// Stateless client for the backend's notification endpoints.
#[derive(Debug, Clone)]
pub struct HttpNotificationFeed {
    /// Shared connection pool.
    client: reqwest::Client,
    /// Parsed `api.base_url`.
    base_url: Url,
    /// Endpoint templates.
    config: ApiConfig,
    /// Bearer token, if signed in.
    access_token: Option<String>,
}

impl HttpNotificationFeed {
    /// Create a client from configuration.
    pub fn new(config: &ApiConfig, access_token: Option<String>) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::configuration(format!(
                "api.base_url '{}' cannot be used as a base URL",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to build HTTP client: {e}"),
                    e,
                )
            })?;

        Ok(Self {
            client,
            base_url,
            config: config.clone(),
            access_token,
        })
    }

    /// Resolve a path template against the base URL.
    ///
    /// `{name}` segments are replaced with the matching value from `params`
    /// and percent-encoded as a single path segment.
    fn endpoint(&self, template: &str, params: &[(&str, &str)]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::configuration("api.base_url cannot be a base"))?;
            segments.pop_if_empty();
            for part in template.split('/').filter(|p| !p.is_empty()) {
                match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                    Some(name) => {
                        let value = params
                            .iter()
                            .find(|(key, _)| *key == name)
                            .map(|(_, value)| *value)
                            .ok_or_else(|| {
                                AppError::configuration(format!(
                                    "No value for '{{{name}}}' in endpoint '{template}'"
                                ))
                            })?;
                        if value.is_empty() {
                            return Err(AppError::validation(format!(
                                "Empty value for '{{{name}}}' in endpoint '{template}'"
                            )));
                        }
                        segments.push(value);
                    }
                    None => {
                        segments.push(part);
                    }
                }
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and fail on transport errors or non-2xx statuses.
    async fn send(&self, method: Method, url: Url) -> AppResult<Response> {
        let target = url.path().to_string();
        let response = self
            .request(method.clone(), url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            tracing::trace!(%method, path = %target, status = status.as_u16(), "Feed request ok");
            return Ok(response);
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > ERROR_BODY_LIMIT {
            let mut cut = ERROR_BODY_LIMIT;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(status_error(status, format!("{method} {target}: {body}")))
    }
}

#[async_trait]
impl NotificationFeed for HttpNotificationFeed {
    async fn fetch_unread(&self, user: &UserId) -> AppResult<Vec<NotificationRecord>> {
        let url = self.endpoint(&self.config.unread_path, &[("user_id", user.as_str())])?;
        let response = self.send(Method::GET, url).await?;
        let body: serde_json::Value = response.json().await.map_err(map_transport_error)?;
        let feed = decode_feed(body)?;
        if feed.skipped > 0 {
            tracing::warn!(
                user = %user,
                skipped = feed.skipped,
                "Unread feed contained malformed records"
            );
        }
        Ok(feed.records)
    }

    async fn acknowledge_one(&self, remote_id: &str) -> AppResult<()> {
        let url = self.endpoint(&self.config.mark_read_path, &[("id", remote_id)])?;
        self.send(Method::PUT, url).await?;
        Ok(())
    }

    async fn acknowledge_all(&self, user: &UserId) -> AppResult<()> {
        let url = self.endpoint(&self.config.mark_all_read_path, &[("user_id", user.as_str())])?;
        self.send(Method::PUT, url).await?;
        Ok(())
    }

    async fn delete_one(&self, remote_id: &str) -> AppResult<()> {
        let url = self.endpoint(&self.config.delete_path, &[("id", remote_id)])?;
        self.send(Method::DELETE, url).await?;
        Ok(())
    }
}

/// Classify a non-2xx status. Rejected credentials and maintenance windows
/// get their own kinds; everything else is a plain HTTP failure.
fn status_error(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::authentication(format!("status {}: {message}", status.as_u16()))
        }
        StatusCode::SERVICE_UNAVAILABLE => {
            AppError::service_unavailable(format!("status {}: {message}", status.as_u16()))
        }
        _ => AppError::http_status(status.as_u16(), message),
    }
}

fn map_transport_error(err: reqwest::Error) -> AppError {
    if let Some(status) = err.status() {
        let message = err.to_string();
        return AppError {
            source: Some(Box::new(err)),
            ..status_error(status, message)
        };
    }
    if err.is_decode() {
        return AppError::with_source(
            ErrorKind::Serialization,
            format!("Invalid feed response body: {err}"),
            err,
        );
    }
    AppError::with_source(ErrorKind::Network, format!("Feed request failed: {err}"), err)
}
