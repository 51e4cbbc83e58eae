//! Business Profile API client.
//!
//! Wraps the Business API (v4) and the Performance API (v1). Every call needs
//! a session from [`ApiClient::authenticate`]; the access token is refreshed
//! inline when it expires, and a 401 answer triggers one forced refresh and
//! one retry.

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use gbp_core::{Account, DailyMetric, DateRange, FieldMask, Location, PerformanceReport, Review, ReviewReply};

use crate::api::{BoxFuture, BusinessProfileApi};
use crate::auth::{AuthHandler, AuthSession};
use crate::config::GbpConfig;
use crate::error::{GbpError, GbpResult};

const LOCATIONS_SEGMENT: &str = "locations/";

/// One page of a list response.
///
/// List endpoints name their item array after the resource; the aliases cover
/// every list this client issues.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new", alias = "accounts", alias = "locations", alias = "reviews")]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Authenticated client for the Business Profile APIs.
///
/// Requests are issued one at a time; list methods walk every page before
/// returning.
#[derive(Debug)]
pub struct ApiClient {
    config: GbpConfig,
    http_client: reqwest::Client,
    auth: AuthHandler,
    session: Mutex<Option<AuthSession>>,
}

impl ApiClient {
    /// Creates an unauthenticated client.
    pub fn new(config: GbpConfig) -> GbpResult<Self> {
        config.validate()?;
        let http_client = config.http_client()?;
        let auth = AuthHandler::new(config.clone())?;

        Ok(Self {
            config,
            http_client,
            auth,
            session: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &GbpConfig {
        &self.config
    }

    /// Obtains a usable credential; see [`AuthHandler::authenticate`].
    pub async fn authenticate(&self) -> GbpResult<()> {
        let session = self.auth.authenticate().await?;
        *self.session.lock().await = Some(session);
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Revokes the current credential and forgets the session.
    ///
    /// Safe to call repeatedly.
    pub async fn revoke_credentials(&self) -> GbpResult<()> {
        let mut session = self.session.lock().await;
        let credential = session.as_ref().map(|s| s.credential().clone());
        self.auth.revoke_credentials(credential.as_ref()).await?;
        *session = None;
        Ok(())
    }

    pub async fn list_accounts(&self) -> GbpResult<Vec<Account>> {
        self.list_all(self.business_url("accounts"), None).await
    }

    pub async fn get_account(&self, name: &str) -> GbpResult<Account> {
        require_name("account", name)?;
        self.execute(Method::GET, &self.business_url(name), &[], None)
            .await
    }

    pub async fn list_locations(&self, account: &str) -> GbpResult<Vec<Location>> {
        require_name("account", account)?;
        self.list_all(
            self.business_url(&format!("{account}/locations")),
            Some(self.config.locations_page_size),
        )
        .await
    }

    pub async fn get_location(&self, name: &str) -> GbpResult<Location> {
        require_name("location", name)?;
        self.execute(Method::GET, &self.business_url(name), &[], None)
            .await
    }

    /// Patches the fields selected by `mask`.
    ///
    /// Paths in `payload` outside the mask are not sent. Masked paths missing
    /// from `payload` are sent in `updateMask` only, which clears them
    /// upstream.
    pub async fn update_location(
        &self,
        name: &str,
        payload: &Map<String, Value>,
        mask: &FieldMask,
    ) -> GbpResult<Location> {
        require_name("location", name)?;
        if mask.is_empty() {
            return Err(GbpError::invalid_input(
                "update mask must name at least one field",
            ));
        }

        let body = Value::Object(mask.apply(payload));
        let query = [("updateMask".to_string(), mask.to_query())];
        info!(location = name, mask = %mask, "updating location");

        self.execute(Method::PATCH, &self.business_url(name), &query, Some(&body))
            .await
    }

    pub async fn list_reviews(&self, location: &str) -> GbpResult<Vec<Review>> {
        require_name("location", location)?;
        self.list_all(
            self.business_url(&format!("{location}/reviews")),
            Some(self.config.reviews_page_size),
        )
        .await
    }

    /// Creates or replaces the owner reply on a review.
    pub async fn reply_to_review(&self, review: &str, comment: &str) -> GbpResult<ReviewReply> {
        require_name("review", review)?;
        if comment.trim().is_empty() {
            return Err(GbpError::invalid_input("reply comment must not be empty"));
        }

        let body = json!({ "comment": comment });
        info!(review, "replying to review");
        self.execute(
            Method::PUT,
            &self.business_url(&format!("{review}/reply")),
            &[],
            Some(&body),
        )
        .await
    }

    /// Fetches daily metric time series for one location.
    ///
    /// `location` may be the full `accounts/.../locations/{id}` name; the
    /// Performance API is addressed with its trailing `locations/{id}`.
    pub async fn get_performance_report(
        &self,
        location: &str,
        metrics: &[DailyMetric],
        range: DateRange,
    ) -> GbpResult<PerformanceReport> {
        let path = performance_location(location)?;
        if metrics.is_empty() {
            return Err(GbpError::invalid_input("at least one daily metric is required"));
        }
        if range.start > range.end {
            return Err(GbpError::invalid_input(format!(
                "date range starts after it ends ({} > {})",
                range.start, range.end
            )));
        }

        let mut query: Vec<(String, String)> = metrics
            .iter()
            .map(|m| ("dailyMetrics".to_string(), m.as_str().to_string()))
            .collect();
        query.extend(range.query_pairs());

        let url = format!(
            "{}/{}:fetchMultiDailyMetricsTimeSeries",
            self.config.performance_api_url.trim_end_matches('/'),
            path
        );
        let body: Value = self.execute(Method::GET, &url, &query, None).await?;

        Ok(PerformanceReport {
            location: location.to_string(),
            metrics: metrics.to_vec(),
            range,
            body,
        })
    }

    fn business_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.business_api_url.trim_end_matches('/'), path)
    }

    /// Follows `nextPageToken` until it runs out.
    async fn list_all<T: DeserializeOwned>(
        &self,
        url: String,
        page_size: Option<u32>,
    ) -> GbpResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query = Vec::with_capacity(2);
            if let Some(size) = page_size {
                query.push(("pageSize".to_string(), size.to_string()));
            }
            if let Some(token) = page_token.take() {
                query.push(("pageToken".to_string(), token));
            }

            let page: Page<T> = self.execute(Method::GET, &url, &query, None).await?;
            pages += 1;
            items.extend(page.items);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(url = %url, pages, count = items.len(), "listed resources");
        Ok(items)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> GbpResult<T> {
        let token = self.bearer_token().await?;
        let mut response = self.send(method.clone(), url, query, body, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED && self.refresh_after_unauthorized().await? {
            let token = self.bearer_token().await?;
            response = self.send(method, url, query, body, &token).await?;
        }

        decode(response).await
    }

    async fn bearer_token(&self) -> GbpResult<String> {
        let mut session = self.session.lock().await;
        let session = session.as_mut().ok_or_else(GbpError::not_authenticated)?;
        session.bearer_token().await
    }

    /// Returns whether a retry is worth attempting.
    async fn refresh_after_unauthorized(&self) -> GbpResult<bool> {
        let mut session = self.session.lock().await;
        let session = session.as_mut().ok_or_else(GbpError::not_authenticated)?;
        if !session.can_refresh() {
            debug!("access token rejected and no refresh token is available");
            return Ok(false);
        }

        info!("access token rejected, refreshing and retrying once");
        session.force_refresh().await?;
        Ok(true)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        token: &str,
    ) -> GbpResult<reqwest::Response> {
        debug!(%method, url, "sending request");

        let mut request = self.http_client.request(method, url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                GbpError::transport("request timeout")
            } else if e.is_connect() {
                GbpError::transport(format!("connection failed: {}", e))
            } else {
                GbpError::transport(format!("request failed: {}", e))
            }
        })
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> GbpResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| GbpError::transport(format!("failed to read response: {}", e)))?;

    if !status.is_success() {
        warn!(status = status.as_u16(), "API request failed");
        return Err(GbpError::api(status.as_u16(), body));
    }

    let text = if body.trim().is_empty() { "{}" } else { body.as_str() };
    serde_json::from_str(text)
        .map_err(|e| GbpError::invalid_response(status.as_u16(), body.clone(), e.to_string()))
}

fn require_name(kind: &str, name: &str) -> GbpResult<()> {
    if name.trim().is_empty() {
        return Err(GbpError::invalid_input(format!("{kind} name must not be empty")));
    }
    Ok(())
}

/// The trailing `locations/{id}` of a location resource name.
fn performance_location(name: &str) -> GbpResult<&str> {
    let start = if name.starts_with(LOCATIONS_SEGMENT) {
        Some(0)
    } else {
        name.rfind("/locations/").map(|idx| idx + 1)
    };

    match start.map(|idx| &name[idx..]) {
        Some(path) => {
            let id = &path[LOCATIONS_SEGMENT.len()..];
            if id.is_empty() || id.contains('/') {
                Err(missing_location_segment(name))
            } else {
                Ok(path)
            }
        }
        None => Err(missing_location_segment(name)),
    }
}

fn missing_location_segment(name: &str) -> GbpError {
    GbpError::invalid_input(format!(
        "'{name}' does not end with a locations/{{id}} segment"
    ))
}

impl BusinessProfileApi for ApiClient {
    fn list_accounts(&self) -> BoxFuture<'_, GbpResult<Vec<Account>>> {
        Box::pin(self.list_accounts())
    }

    fn get_account<'a>(&'a self, name: &'a str) -> BoxFuture<'a, GbpResult<Account>> {
        Box::pin(self.get_account(name))
    }

    fn list_locations<'a>(&'a self, account: &'a str) -> BoxFuture<'a, GbpResult<Vec<Location>>> {
        Box::pin(self.list_locations(account))
    }

    fn get_location<'a>(&'a self, name: &'a str) -> BoxFuture<'a, GbpResult<Location>> {
        Box::pin(self.get_location(name))
    }

    fn update_location<'a>(
        &'a self,
        name: &'a str,
        payload: &'a Map<String, Value>,
        mask: &'a FieldMask,
    ) -> BoxFuture<'a, GbpResult<Location>> {
        Box::pin(self.update_location(name, payload, mask))
    }

    fn list_reviews<'a>(&'a self, location: &'a str) -> BoxFuture<'a, GbpResult<Vec<Review>>> {
        Box::pin(self.list_reviews(location))
    }

    fn reply_to_review<'a>(
        &'a self,
        review: &'a str,
        comment: &'a str,
    ) -> BoxFuture<'a, GbpResult<ReviewReply>> {
        Box::pin(self.reply_to_review(review, comment))
    }

    fn get_performance_report<'a>(
        &'a self,
        location: &'a str,
        metrics: &'a [DailyMetric],
        range: DateRange,
    ) -> BoxFuture<'a, GbpResult<PerformanceReport>> {
        Box::pin(self.get_performance_report(location, metrics, range))
    }
}
