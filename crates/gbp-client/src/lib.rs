//! Google Business Profile client.
//!
//! This crate provides:
//!
//! - [`AuthHandler`] - OAuth consent, token persistence, refresh and revocation
//! - [`ApiClient`] - Typed calls to the Business and Performance APIs
//! - [`ProfileManager`] - Workflows built on top of [`BusinessProfileApi`]
//! - [`GbpError`] - Error type shared by all of the above
//!
//! # Example
//!
//! ```ignore
//! use gbp_client::{ApiClient, GbpConfig, ProfileManager, ReplyTemplate};
//!
//! let config = GbpConfig::load()?.with_env_overrides();
//! let client = ApiClient::new(config)?;
//! client.authenticate().await?;
//!
//! let manager = ProfileManager::new(client);
//! for location in manager.get_all_locations().await? {
//!     let pending = manager.get_unanswered_reviews(&location.name).await?;
//!     println!("{}: {} unanswered", location.name, pending.len());
//! }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod manager;

pub use api::{BoxFuture, BusinessProfileApi};
pub use auth::{AuthHandler, AuthSession, BUSINESS_MANAGE_SCOPE, ClientSecrets, Credential, TokenStore};
pub use client::ApiClient;
pub use config::GbpConfig;
pub use error::{GbpError, GbpResult};
pub use manager::{BulkReplyOutcome, ProfileManager};

pub use gbp_core::{
    Account, BusinessHours, DailyMetric, DateRange, FieldMask, Location, PerformanceReport,
    ReplyTemplate, Review, ReviewReply, ValidationReport,
};
