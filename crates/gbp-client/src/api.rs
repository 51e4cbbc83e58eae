//! The [`BusinessProfileApi`] trait.
//!
//! The profile manager only talks to upstream through this trait, so it can
//! run against [`ApiClient`](crate::ApiClient) or an in-memory fake.

use std::future::Future;
use std::pin::Pin;

use gbp_core::{Account, DailyMetric, DateRange, FieldMask, Location, PerformanceReport, Review, ReviewReply};
use serde_json::{Map, Value};

use crate::error::GbpResult;

/// A boxed future for async trait methods.
///
/// Boxing keeps the trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One method per upstream resource and verb.
///
/// Resource names are passed verbatim as returned upstream
/// (`accounts/1/locations/2`, `accounts/1/locations/2/reviews/3`). List
/// methods return every page, in order.
///
/// # Example Implementation
///
/// ```ignore
/// impl BusinessProfileApi for Fake {
///     fn list_accounts(&self) -> BoxFuture<'_, GbpResult<Vec<Account>>> {
///         let accounts = self.accounts.clone();
///         Box::pin(async move { Ok(accounts) })
///     }
///     // ... other methods
/// }
/// ```
pub trait BusinessProfileApi: Send + Sync {
    fn list_accounts(&self) -> BoxFuture<'_, GbpResult<Vec<Account>>>;

    fn get_account<'a>(&'a self, name: &'a str) -> BoxFuture<'a, GbpResult<Account>>;

    fn list_locations<'a>(&'a self, account: &'a str) -> BoxFuture<'a, GbpResult<Vec<Location>>>;

    fn get_location<'a>(&'a self, name: &'a str) -> BoxFuture<'a, GbpResult<Location>>;

    /// Sends only the fields selected by `mask`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty mask, without any request.
    fn update_location<'a>(
        &'a self,
        name: &'a str,
        payload: &'a Map<String, Value>,
        mask: &'a FieldMask,
    ) -> BoxFuture<'a, GbpResult<Location>>;

    fn list_reviews<'a>(&'a self, location: &'a str) -> BoxFuture<'a, GbpResult<Vec<Review>>>;

    /// Creates or replaces the owner reply on a review.
    fn reply_to_review<'a>(
        &'a self,
        review: &'a str,
        comment: &'a str,
    ) -> BoxFuture<'a, GbpResult<ReviewReply>>;

    fn get_performance_report<'a>(
        &'a self,
        location: &'a str,
        metrics: &'a [DailyMetric],
        range: DateRange,
    ) -> BoxFuture<'a, GbpResult<PerformanceReport>>;
}
