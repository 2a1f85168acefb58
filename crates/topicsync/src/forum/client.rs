//! Discourse API client.

use std::sync::Arc;
#[cfg(feature = "discourse")]
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Utc;

use super::error::ForumError;
use super::rate_limit::ApiRateLimiter;
use super::types::{
    CategoriesResponse, CategoryTopicsResponse, CreatePostRequest, CreatePostResponse,
    CreateTopicOutcome, ErrorResponse, ForumCategory, ForumTopic, SearchResponse, TopicDraft,
    TopicPage,
};
use super::ForumApi;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::retry::{RetryConfig, send_with_retry, server_retry_delay, short_request_id};
use crate::sync::DEFAULT_TOPIC_PAGE_SIZE;

#[cfg(feature = "discourse")]
use crate::http::reqwest_transport::ReqwestTransport;

/// Error fragments Discourse uses when a topic title is taken.
const DUPLICATE_TITLE_MARKERS: [&str; 2] = ["already been used", "already exists"];

/// Discourse API client.
///
/// Authenticates with an admin API key and acting username. Requests are
/// paced by an optional [`ApiRateLimiter`] and retried on 429/5xx per the
/// client's [`RetryConfig`].
#[derive(Clone)]
pub struct ForumClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_key: String,
    api_username: String,
    retry: RetryConfig,
    rate_limiter: Option<ApiRateLimiter>,
}

impl ForumClient {
    /// Create a new client backed by reqwest.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use topicsync::forum::{ApiRateLimiter, ForumClient};
    ///
    /// let client = ForumClient::new(
    ///     "https://forum.example.com",
    ///     "api-key",
    ///     "system",
    ///     Some(ApiRateLimiter::default()),
    /// )?;
    /// ```
    #[cfg(feature = "discourse")]
    pub fn new(
        base_url: &str,
        api_key: &str,
        api_username: &str,
        rate_limiter: Option<ApiRateLimiter>,
    ) -> Result<Self, ForumError> {
        if base_url.trim().is_empty() {
            return Err(ForumError::Config("forum base URL is empty".to_string()));
        }
        if api_key.trim().is_empty() {
            return Err(ForumError::Config("forum API key is empty".to_string()));
        }

        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))
            .map_err(|e| ForumError::Config(e.to_string()))?;

        Ok(Self::new_with_transport(
            base_url,
            api_key,
            api_username,
            rate_limiter,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        base_url: &str,
        api_key: &str,
        api_username: &str,
        rate_limiter: Option<ApiRateLimiter>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_username: api_username.to_string(),
            retry: RetryConfig::default(),
            rate_limiter,
        }
    }

    /// Replace the request retry policy.
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Get the forum base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Wait for rate limiter if one is configured.
    async fn wait_for_rate_limit(&self) {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }
    }

    fn request(&self, method: HttpMethod, path: &str, body: Vec<u8>) -> HttpRequest {
        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), "topicsync".to_string()),
            ("Api-Key".to_string(), self.api_key.clone()),
            ("Api-Username".to_string(), self.api_username.clone()),
        ];
        if !body.is_empty() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        HttpRequest {
            method,
            url: format!("{}{}", self.base_url, path),
            headers,
            body,
        }
    }

    /// Send one logical request (pacing, retries and logging included).
    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Vec<u8>,
    ) -> Result<HttpResponse, ForumError> {
        self.wait_for_rate_limit().await;
        let request = self.request(method, path, body);
        let request_id = short_request_id();

        let response =
            send_with_retry(self.transport.as_ref(), &request, &self.retry, &request_id).await?;
        Ok(response)
    }

    /// Make an authenticated GET request and decode the JSON body.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ForumError> {
        let response = self.send(HttpMethod::Get, path, Vec::new()).await?;

        if !response.is_success() {
            return Err(error_for_status(&response));
        }

        serde_json::from_slice(&response.body).map_err(ForumError::Json)
    }
}

/// Messages from a Discourse error body, or the raw body when it is not JSON.
fn error_messages(response: &HttpResponse) -> Vec<String> {
    match serde_json::from_slice::<ErrorResponse>(&response.body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors,
        Ok(parsed) => parsed.error_type.into_iter().collect(),
        Err(_) => {
            let text = response.body_text();
            if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        }
    }
}

fn error_for_status(response: &HttpResponse) -> ForumError {
    let message = error_messages(response).join("; ");
    match response.status {
        401 | 403 => ForumError::Auth(message),
        429 => {
            let wait = server_retry_delay(response)
                .and_then(|d| chrono::Duration::from_std(d).ok())
                .unwrap_or_else(|| chrono::Duration::minutes(1));
            ForumError::RateLimited {
                retry_at: Utc::now() + wait,
            }
        }
        status => ForumError::Api { status, message },
    }
}

/// Whether an error response is Discourse rejecting a duplicate title.
///
/// The forum reports this only through human-readable text, so the match
/// lives here and nowhere else.
pub(crate) fn is_duplicate_title(status: u16, messages: &[String]) -> bool {
    status == 422
        && messages.iter().any(|m| {
            let lower = m.to_lowercase();
            DUPLICATE_TITLE_MARKERS.iter().any(|marker| lower.contains(marker))
        })
}

#[async_trait]
impl ForumApi for ForumClient {
    async fn list_categories(&self) -> Result<Vec<ForumCategory>, ForumError> {
        let response: CategoriesResponse = self.get("/categories.json").await?;
        Ok(response.category_list.categories)
    }

    async fn list_category_topics(
        &self,
        category: &ForumCategory,
        page: u32,
    ) -> Result<TopicPage, ForumError> {
        let response: CategoryTopicsResponse = self
            .get(&format!(
                "/c/{}/{}.json?page={}",
                category.slug, category.id, page
            ))
            .await?;

        Ok(TopicPage {
            topics: response.topic_list.topics,
            per_page: response
                .topic_list
                .per_page
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_TOPIC_PAGE_SIZE),
        })
    }

    async fn search_topics(&self, query: &str) -> Result<Vec<ForumTopic>, ForumError> {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("q", query)
            .finish();
        let response: SearchResponse = self.get(&format!("/search.json?{}", encoded)).await?;
        Ok(response.topics)
    }

    async fn create_topic(&self, draft: &TopicDraft) -> CreateTopicOutcome {
        let body = CreatePostRequest {
            title: &draft.title,
            raw: &draft.raw,
            category: draft.category_id,
        };
        let body = match serde_json::to_vec(&body) {
            Ok(body) => body,
            Err(e) => {
                return CreateTopicOutcome::Failed {
                    status: None,
                    message: e.to_string(),
                };
            }
        };

        let response = match self.send(HttpMethod::Post, "/posts.json", body).await {
            Ok(response) => response,
            Err(e) => {
                return CreateTopicOutcome::Failed {
                    status: None,
                    message: e.to_string(),
                };
            }
        };

        if !response.is_success() {
            let messages = error_messages(&response);
            let message = if messages.is_empty() {
                format!("HTTP {}", response.status)
            } else {
                messages.join("; ")
            };

            if is_duplicate_title(response.status, &messages) {
                return CreateTopicOutcome::Conflict { message };
            }
            return CreateTopicOutcome::Failed {
                status: Some(response.status),
                message,
            };
        }

        match serde_json::from_slice::<CreatePostResponse>(&response.body) {
            Ok(created) => CreateTopicOutcome::Created(ForumTopic {
                id: created.topic_id,
                slug: created.topic_slug,
                title: draft.title.clone(),
                category_id: Some(draft.category_id),
            }),
            Err(e) => CreateTopicOutcome::Failed {
                status: Some(response.status),
                message: format!("unexpected create response: {}", e),
            },
        }
    }

    fn topic_url(&self, topic: &ForumTopic) -> String {
        format!("{}/t/{}/{}", self.base_url, topic.slug, topic.id)
    }
}
