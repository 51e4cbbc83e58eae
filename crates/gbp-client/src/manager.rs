//! Multi-step workflows over [`BusinessProfileApi`].

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use gbp_core::{
    BusinessHours, DailyMetric, DateRange, FieldMask, Location, PerformanceReport, ReplyTemplate,
    Review, ReviewReply, ValidationReport, recent_reviews, unanswered_reviews, validate_location,
};

use crate::api::BusinessProfileApi;
use crate::client::ApiClient;
use crate::error::{GbpError, GbpResult};

/// Result of replying to one review during a bulk reply.
#[derive(Debug)]
pub struct BulkReplyOutcome {
    /// Resource name of the review.
    pub review: String,
    pub result: GbpResult<ReviewReply>,
}

impl BulkReplyOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Profile workflows: location discovery, review triage, bulk replies,
/// validation and insights.
#[derive(Debug)]
pub struct ProfileManager<A = ApiClient> {
    api: A,
}

impl<A: BusinessProfileApi> ProfileManager<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn into_inner(self) -> A {
        self.api
    }

    /// Every location of every account, in upstream order.
    ///
    /// Each location is tagged with its account name and type. The first
    /// failure aborts the walk.
    pub async fn get_all_locations(&self) -> GbpResult<Vec<Location>> {
        let accounts = self.api.list_accounts().await?;
        let mut locations = Vec::new();

        for account in &accounts {
            let batch = self.api.list_locations(&account.name).await?;
            debug!(account = %account.name, count = batch.len(), "fetched locations");
            locations.extend(batch.into_iter().map(|l| l.with_account(account)));
        }

        info!(accounts = accounts.len(), locations = locations.len(), "fetched all locations");
        Ok(locations)
    }

    /// First location whose `locationName` equals `name` exactly.
    pub async fn find_location_by_name(&self, name: &str) -> GbpResult<Option<Location>> {
        let found = self
            .get_all_locations()
            .await?
            .into_iter()
            .find(|l| l.location_name.as_deref() == Some(name));
        if found.is_none() {
            debug!(name, "no location with that name");
        }
        Ok(found)
    }

    /// Reviews created within the last `days` days.
    pub async fn get_recent_reviews(&self, location: &str, days: u32) -> GbpResult<Vec<Review>> {
        let reviews = self.api.list_reviews(location).await?;
        Ok(recent_reviews(reviews, Utc::now(), days))
    }

    /// Reviews without an owner reply.
    pub async fn get_unanswered_reviews(&self, location: &str) -> GbpResult<Vec<Review>> {
        let reviews = self.api.list_reviews(location).await?;
        Ok(unanswered_reviews(reviews))
    }

    /// Replies to every unanswered review with `template`, one at a time.
    ///
    /// A failed reply is recorded in its outcome and the remaining reviews are
    /// still processed. Failing to list the reviews aborts.
    pub async fn bulk_reply_to_reviews(
        &self,
        location: &str,
        template: &ReplyTemplate,
    ) -> GbpResult<Vec<BulkReplyOutcome>> {
        let pending = self.get_unanswered_reviews(location).await?;
        let mut outcomes = Vec::with_capacity(pending.len());

        for review in pending {
            let comment = template.render(&review);
            let result = self.api.reply_to_review(&review.name, &comment).await;
            if let Err(e) = &result {
                warn!(review = %review.name, error = %e, "reply failed");
            }
            outcomes.push(BulkReplyOutcome {
                review: review.name,
                result,
            });
        }

        let replied = outcomes.iter().filter(|o| o.is_success()).count();
        info!(location, replied, failed = outcomes.len() - replied, "bulk reply finished");
        Ok(outcomes)
    }

    /// Completeness check; never touches the network.
    pub fn validate_location_data(&self, location: &Location) -> ValidationReport {
        validate_location(location)
    }

    /// Default metrics over `[today - days, today]` (UTC dates).
    pub async fn get_location_insights(
        &self,
        location: &str,
        days: u32,
    ) -> GbpResult<PerformanceReport> {
        let range = DateRange::last_days(Utc::now().date_naive(), days).ok_or_else(|| {
            GbpError::invalid_input(format!("insights window of {} days is out of range", days))
        })?;
        self.api
            .get_performance_report(location, &DailyMetric::DEFAULT_SET, range)
            .await
    }

    /// Replaces the regular opening hours.
    pub async fn update_business_hours(
        &self,
        location: &str,
        hours: &BusinessHours,
    ) -> GbpResult<Location> {
        let value = serde_json::to_value(hours)
            .map_err(|e| GbpError::invalid_input(format!("invalid business hours: {}", e)))?;

        let mut payload = Map::new();
        payload.insert("regularHours".to_string(), value);
        let mask = FieldMask::new(["regularHours"]);

        self.api.update_location(location, &payload, &mask).await
    }

    /// Updates the phone number and/or website. Only provided fields are
    /// masked.
    pub async fn update_contact_info(
        &self,
        location: &str,
        phone: Option<&str>,
        website: Option<&str>,
    ) -> GbpResult<Location> {
        let mut payload = Map::new();
        let mut mask = FieldMask::default();

        if let Some(phone) = phone {
            payload.insert("primaryPhone".to_string(), Value::from(phone));
            mask.push("primaryPhone");
        }
        if let Some(website) = website {
            payload.insert("websiteUri".to_string(), Value::from(website));
            mask.push("websiteUri");
        }

        if mask.is_empty() {
            return Err(GbpError::invalid_input(
                "provide a phone number or a website to update",
            ));
        }

        self.api.update_location(location, &payload, &mask).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Duration;
    use gbp_core::{Account, DayOfWeek, ReviewReply, TimePeriod};

    use super::*;
    use crate::api::BoxFuture;

    /// In-memory upstream.
    #[derive(Default)]
    struct FakeApi {
        accounts: Vec<Account>,
        locations: HashMap<String, Vec<Location>>,
        reviews: HashMap<String, Vec<Review>>,
        failing_accounts: Vec<String>,
        failing_reviews: Vec<String>,
        replies: Mutex<Vec<(String, String)>>,
        updates: Mutex<Vec<(String, Map<String, Value>, FieldMask)>>,
        reports: Mutex<Vec<(String, Vec<DailyMetric>, DateRange)>>,
    }

    impl BusinessProfileApi for FakeApi {
        fn list_accounts(&self) -> BoxFuture<'_, GbpResult<Vec<Account>>> {
            let accounts = self.accounts.clone();
            Box::pin(async move { Ok(accounts) })
        }

        fn get_account<'a>(&'a self, name: &'a str) -> BoxFuture<'a, GbpResult<Account>> {
            Box::pin(async move {
                self.accounts
                    .iter()
                    .find(|a| a.name == name)
                    .cloned()
                    .ok_or_else(|| GbpError::api(404, "not found"))
            })
        }

        fn list_locations<'a>(&'a self, account: &'a str) -> BoxFuture<'a, GbpResult<Vec<Location>>> {
            Box::pin(async move {
                if self.failing_accounts.iter().any(|a| a == account) {
                    return Err(GbpError::api(403, "forbidden"));
                }
                Ok(self.locations.get(account).cloned().unwrap_or_default())
            })
        }

        fn get_location<'a>(&'a self, name: &'a str) -> BoxFuture<'a, GbpResult<Location>> {
            Box::pin(async move {
                self.locations
                    .values()
                    .flatten()
                    .find(|l| l.name == name)
                    .cloned()
                    .ok_or_else(|| GbpError::api(404, "not found"))
            })
        }

        fn update_location<'a>(
            &'a self,
            name: &'a str,
            payload: &'a Map<String, Value>,
            mask: &'a FieldMask,
        ) -> BoxFuture<'a, GbpResult<Location>> {
            Box::pin(async move {
                self.updates
                    .lock()
                    .unwrap()
                    .push((name.to_string(), mask.apply(payload), mask.clone()));
                Ok(Location::new(name))
            })
        }

        fn list_reviews<'a>(&'a self, location: &'a str) -> BoxFuture<'a, GbpResult<Vec<Review>>> {
            Box::pin(async move { Ok(self.reviews.get(location).cloned().unwrap_or_default()) })
        }

        fn reply_to_review<'a>(
            &'a self,
            review: &'a str,
            comment: &'a str,
        ) -> BoxFuture<'a, GbpResult<ReviewReply>> {
            Box::pin(async move {
                if self.failing_reviews.iter().any(|r| r == review) {
                    return Err(GbpError::api(500, "backend error"));
                }
                self.replies
                    .lock()
                    .unwrap()
                    .push((review.to_string(), comment.to_string()));
                Ok(ReviewReply {
                    comment: comment.to_string(),
                    update_time: None,
                })
            })
        }

        fn get_performance_report<'a>(
            &'a self,
            location: &'a str,
            metrics: &'a [DailyMetric],
            range: DateRange,
        ) -> BoxFuture<'a, GbpResult<PerformanceReport>> {
            Box::pin(async move {
                self.reports
                    .lock()
                    .unwrap()
                    .push((location.to_string(), metrics.to_vec(), range));
                Ok(PerformanceReport {
                    location: location.to_string(),
                    metrics: metrics.to_vec(),
                    range,
                    body: serde_json::json!({"multiDailyMetricTimeSeries": []}),
                })
            })
        }
    }

    fn account(name: &str, account_type: &str) -> Account {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "accountName": format!("{name} owner"),
            "type": account_type,
        }))
        .unwrap()
    }

    fn location(name: &str, title: &str) -> Location {
        let mut location = Location::new(name);
        location.location_name = Some(title.to_string());
        location
    }

    fn review(name: &str, days_ago: i64, answered: bool) -> Review {
        let mut review = Review::new(name);
        review.create_time = Some((Utc::now() - Duration::days(days_ago)).to_rfc3339());
        if answered {
            review.review_reply = Some(ReviewReply {
                comment: "Thanks".to_string(),
                update_time: None,
            });
        }
        review
    }

    fn two_accounts() -> FakeApi {
        FakeApi {
            accounts: vec![
                account("accounts/1", "PERSONAL"),
                account("accounts/2", "LOCATION_GROUP"),
            ],
            locations: HashMap::from([
                (
                    "accounts/1".to_string(),
                    vec![
                        location("accounts/1/locations/a", "Bakery"),
                        location("accounts/1/locations/b", "Cafe"),
                    ],
                ),
                (
                    "accounts/2".to_string(),
                    vec![location("accounts/2/locations/c", "bakery")],
                ),
            ]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn all_locations_are_tagged_in_order() {
        let manager = ProfileManager::new(two_accounts());
        let locations = manager.get_all_locations().await.unwrap();

        let names: Vec<_> = locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["accounts/1/locations/a", "accounts/1/locations/b", "accounts/2/locations/c"]
        );
        assert_eq!(locations[0].account_name.as_deref(), Some("accounts/1"));
        assert_eq!(locations[0].account_type.as_deref(), Some("PERSONAL"));
        assert_eq!(locations[2].account_type.as_deref(), Some("LOCATION_GROUP"));
    }

    #[tokio::test]
    async fn location_listing_failure_aborts() {
        let mut api = two_accounts();
        api.failing_accounts = vec!["accounts/2".to_string()];

        let err = ProfileManager::new(api).get_all_locations().await.unwrap_err();
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn find_by_name_is_case_sensitive() {
        let manager = ProfileManager::new(two_accounts());

        let found = manager.find_location_by_name("bakery").await.unwrap().unwrap();
        assert_eq!(found.name, "accounts/2/locations/c");

        let found = manager.find_location_by_name("Bakery").await.unwrap().unwrap();
        assert_eq!(found.name, "accounts/1/locations/a");

        assert!(manager.find_location_by_name("Deli").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recent_reviews_window() {
        let loc = "accounts/1/locations/a";
        let api = FakeApi {
            reviews: HashMap::from([(
                loc.to_string(),
                vec![
                    review("r/today", 0, false),
                    review("r/29", 29, true),
                    review("r/31", 31, false),
                ],
            )]),
            ..Default::default()
        };

        let recent = ProfileManager::new(api).get_recent_reviews(loc, 30).await.unwrap();
        let names: Vec<_> = recent.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["r/today", "r/29"]);
    }

    #[tokio::test]
    async fn bulk_reply_continues_after_failure() {
        let loc = "accounts/1/locations/a";
        let mut first = review("accounts/1/locations/a/reviews/1", 1, false);
        first.reviewer = Some(gbp_core::Reviewer {
            display_name: Some("Ana".to_string()),
            ..Default::default()
        });
        let api = FakeApi {
            reviews: HashMap::from([(
                loc.to_string(),
                vec![
                    first,
                    review("accounts/1/locations/a/reviews/2", 2, true),
                    review("accounts/1/locations/a/reviews/3", 3, false),
                    review("accounts/1/locations/a/reviews/4", 4, false),
                ],
            )]),
            failing_reviews: vec!["accounts/1/locations/a/reviews/3".to_string()],
            ..Default::default()
        };

        let manager = ProfileManager::new(api);
        let template = ReplyTemplate::new("Thanks {reviewer_name}!");
        let outcomes = manager.bulk_reply_to_reviews(loc, &template).await.unwrap();

        let summary: Vec<_> = outcomes
            .iter()
            .map(|o| (o.review.as_str(), o.is_success()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("accounts/1/locations/a/reviews/1", true),
                ("accounts/1/locations/a/reviews/3", false),
                ("accounts/1/locations/a/reviews/4", true),
            ]
        );

        let replies = manager.api().replies.lock().unwrap().clone();
        assert_eq!(
            replies,
            vec![
                ("accounts/1/locations/a/reviews/1".to_string(), "Thanks Ana!".to_string()),
                ("accounts/1/locations/a/reviews/4".to_string(), "Thanks Customer!".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn insights_use_default_metrics_and_range() {
        let manager = ProfileManager::new(FakeApi::default());
        let report = manager
            .get_location_insights("accounts/1/locations/a", 30)
            .await
            .unwrap();

        assert_eq!(report.metrics, DailyMetric::DEFAULT_SET.to_vec());
        let today = Utc::now().date_naive();
        assert!(report.range.end == today || report.range.end == today - Duration::days(1));
        assert_eq!(report.range.end - report.range.start, Duration::days(30));

        let calls = manager.api().reports.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "accounts/1/locations/a");
    }

    #[tokio::test]
    async fn insights_window_out_of_range_is_invalid_input() {
        let manager = ProfileManager::new(FakeApi::default());
        let err = manager
            .get_location_insights("accounts/1/locations/a", u32::MAX)
            .await
            .unwrap_err();

        assert!(matches!(err, GbpError::InvalidInput { .. }));
        assert!(manager.api().reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn recent_reviews_with_huge_window() {
        let loc = "accounts/1/locations/a";
        let api = FakeApi {
            reviews: HashMap::from([(
                loc.to_string(),
                vec![review("r/old", 3650, false), Review::new("r/undated")],
            )]),
            ..Default::default()
        };

        let recent = ProfileManager::new(api)
            .get_recent_reviews(loc, 200_000_000)
            .await
            .unwrap();
        let names: Vec<_> = recent.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["r/old"]);
    }

    #[tokio::test]
    async fn contact_update_masks_only_provided_fields() {
        let manager = ProfileManager::new(FakeApi::default());
        manager
            .update_contact_info("accounts/1/locations/a", Some("555-0100"), None)
            .await
            .unwrap();

        let updates = manager.api().updates.lock().unwrap();
        let (name, sent, mask) = &updates[0];
        assert_eq!(name, "accounts/1/locations/a");
        assert_eq!(mask.paths(), ["primaryPhone"]);
        assert_eq!(Value::Object(sent.clone()), serde_json::json!({"primaryPhone": "555-0100"}));
    }

    #[tokio::test]
    async fn contact_update_requires_a_field() {
        let manager = ProfileManager::new(FakeApi::default());
        let err = manager
            .update_contact_info("accounts/1/locations/a", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GbpError::InvalidInput { .. }));
        assert!(manager.api().updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn business_hours_update() {
        let manager = ProfileManager::new(FakeApi::default());
        let hours = BusinessHours {
            periods: vec![TimePeriod::same_day(DayOfWeek::Saturday, "09:00", "13:00")],
        };
        manager
            .update_business_hours("accounts/1/locations/a", &hours)
            .await
            .unwrap();

        let updates = manager.api().updates.lock().unwrap();
        let (_, sent, mask) = &updates[0];
        assert_eq!(mask.to_query(), "regularHours");
        insta::assert_json_snapshot!(Value::Object(sent.clone()), @r#"
        {
          "regularHours": {
            "periods": [
              {
                "openDay": "SATURDAY",
                "openTime": "09:00",
                "closeDay": "SATURDAY",
                "closeTime": "13:00"
              }
            ]
          }
        }
        "#);
    }
}
