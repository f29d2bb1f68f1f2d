//! Data client for the managed backend
//!
//! `PlatformClient` is the single pre-configured handle every repository goes
//! through. It carries the project URL, the anonymous key and, once somebody
//! signs in, the session access token that the platform's row-level security
//! evaluates.

use reqwest::header::{CONTENT_RANGE, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{error, info};

use crate::config::PlatformConfig;
use crate::error::{PlatformError, PlatformResult};
use crate::query::{Query, parse_content_range};

/// Handle to the platform's REST endpoints
#[derive(Clone, Debug)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl PlatformClient {
    /// Create a client from configuration
    pub fn new(config: &PlatformConfig) -> PlatformResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("Platform client initialized for {}", config.url);

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Use `token` as the bearer for subsequent requests (`None` falls back to the anon key)
    pub fn set_access_token(&self, token: Option<String>) {
        match self.access_token.write() {
            Ok(mut slot) => *slot = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    pub fn access_token(&self) -> Option<String> {
        match self.access_token.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request builder with the platform headers already attached
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = self
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());
        self.request_as(method, path, &bearer)
    }

    /// Same as `request` but authenticated with an explicit bearer token
    pub(crate) fn request_as(&self, method: Method, path: &str, bearer: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Send a request and turn non-success statuses into `PlatformError::Api`
    pub(crate) async fn send(&self, builder: RequestBuilder) -> PlatformResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = PlatformError::from_response(status, &body);
        error!("Platform request failed: {}", err);
        Err(err)
    }

    pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> PlatformResult<T> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn rest_path(table: &str) -> String {
        format!("/rest/v1/{}", table)
    }

    /// Every row matching the query
    pub async fn fetch_all<T: DeserializeOwned>(&self, query: &Query) -> PlatformResult<Vec<T>> {
        let builder = self
            .request(Method::GET, &Self::rest_path(query.table_name()))
            .query(&query.to_pairs());
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    /// At most one row; more than one is an error
    pub async fn fetch_optional<T: DeserializeOwned>(
        &self,
        query: &Query,
    ) -> PlatformResult<Option<T>> {
        let bounded = match query.current_limit() {
            Some(_) => query.clone(),
            None => query.clone().limit(2),
        };

        let mut rows: Vec<T> = self.fetch_all(&bounded).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            _ => Err(PlatformError::MultipleRows(query.table_name().to_string())),
        }
    }

    /// Exactly one row; zero rows is `NotFound`
    pub async fn fetch_one<T: DeserializeOwned>(&self, query: &Query) -> PlatformResult<T> {
        self.fetch_optional(query)
            .await?
            .ok_or_else(|| PlatformError::NotFound(query.table_name().to_string()))
    }

    /// Exact number of rows matching the query, without transferring them
    pub async fn count(&self, query: &Query) -> PlatformResult<u64> {
        let builder = self
            .request(Method::HEAD, &Self::rest_path(query.table_name()))
            .header("Prefer", HeaderValue::from_static("count=exact"))
            .query(&query.to_pairs());
        let response = self.send(builder).await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| {
                PlatformError::Configuration(format!(
                    "Count of {} returned no Content-Range header",
                    query.table_name()
                ))
            })
    }

    /// Insert one row (a struct) or many (a slice) and return what was stored
    pub async fn insert<B, T>(&self, table: &str, body: &B) -> PlatformResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self
            .request(Method::POST, &Self::rest_path(table))
            .header("Prefer", HeaderValue::from_static("return=representation"))
            .json(body);
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    /// Insert without reading the stored rows back
    ///
    /// Use this when the caller may insert rows it is not allowed to select.
    pub async fn insert_minimal<B>(&self, table: &str, body: &B) -> PlatformResult<()>
    where
        B: Serialize + ?Sized,
    {
        let builder = self
            .request(Method::POST, &Self::rest_path(table))
            .header("Prefer", HeaderValue::from_static("return=minimal"))
            .json(body);
        self.send(builder).await?;
        Ok(())
    }

    /// Patch every row matching the query's filters and return the new rows
    pub async fn update<B, T>(&self, query: &Query, body: &B) -> PlatformResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut pairs = query.filter_pairs();
        pairs.push(("select".to_string(), query.columns().to_string()));

        let builder = self
            .request(Method::PATCH, &Self::rest_path(query.table_name()))
            .header("Prefer", HeaderValue::from_static("return=representation"))
            .query(&pairs)
            .json(body);
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    /// Delete every row matching the query's filters
    pub async fn delete(&self, query: &Query) -> PlatformResult<()> {
        let builder = self
            .request(Method::DELETE, &Self::rest_path(query.table_name()))
            .query(&query.filter_pairs());
        self.send(builder).await?;
        info!("Deleted rows from {}", query.table_name());
        Ok(())
    }

    /// Check that the data API answers for the configured key
    pub async fn health_check(&self) -> PlatformResult<bool> {
        let query = Query::table("visits").select("id").limit(1);
        match self.fetch_all::<serde_json::Value>(&query).await {
            Ok(_) => {
                info!("Platform health check successful");
                Ok(true)
            }
            Err(e) => {
                error!("Platform health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PlatformClient {
        PlatformClient::new(&PlatformConfig {
            url: "https://project.example.co/".to_string(),
            anon_key: "anon".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = client();
        assert_eq!(client.base_url(), "https://project.example.co");
        assert_eq!(
            client.endpoint("/rest/v1/visits"),
            "https://project.example.co/rest/v1/visits"
        );
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let client = client();
        let request = client
            .request(Method::GET, "/rest/v1/visits")
            .build()
            .unwrap();
        assert_eq!(request.headers()["apikey"], "anon");
        assert_eq!(request.headers()["authorization"], "Bearer anon");
    }

    #[test]
    fn test_access_token_is_shared_between_clones() {
        let client = client();
        let clone = client.clone();
        client.set_access_token(Some("session-token".to_string()));

        let request = clone
            .request(Method::GET, "/rest/v1/visits")
            .build()
            .unwrap();
        assert_eq!(request.headers()["authorization"], "Bearer session-token");

        clone.set_access_token(None);
        assert_eq!(client.access_token(), None);
    }
}
