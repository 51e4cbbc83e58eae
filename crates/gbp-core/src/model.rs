//! Business Profile resources as returned by the upstream API.
//!
//! All identifiers are full hierarchical resource names (`accounts/123`,
//! `accounts/123/locations/456`, ...) and are kept verbatim. Fields this crate
//! does not model are preserved in `extra` so a record can be handed back to
//! the caller unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Business Profile account (`accounts/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Resource name, e.g. `accounts/123`.
    pub name: String,
    /// Human-readable account name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    /// Account type (`PERSONAL`, `LOCATION_GROUP`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    /// Role of the caller on this account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Upstream fields not modelled here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Account {
    /// Account type, or `UNKNOWN` when upstream did not report one.
    pub fn type_or_unknown(&self) -> &str {
        self.account_type.as_deref().unwrap_or("UNKNOWN")
    }
}

/// A single business location (`accounts/{id}/locations/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Resource name, e.g. `accounts/123/locations/456`.
    pub name: String,
    /// Business display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<PostalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_hours: Option<BusinessHours>,
    /// Upstream fields not modelled here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Owning account, filled in when locations are aggregated across accounts.
    #[serde(skip)]
    pub account_name: Option<String>,
    /// Owning account type, filled in alongside `account_name`.
    #[serde(skip)]
    pub account_type: Option<String>,
}

impl Location {
    /// Creates a location with only its resource name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Records the owning account on this location.
    pub fn with_account(mut self, account: &Account) -> Self {
        self.account_name = Some(account.name.clone());
        self.account_type = Some(account.type_or_unknown().to_string());
        self
    }
}

/// Business category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl Category {
    /// Returns true if neither the id nor the display name is set.
    pub fn is_empty(&self) -> bool {
        is_blank(self.display_name.as_deref()) && is_blank(self.category_id.as_deref())
    }
}

/// Postal address of a location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administrative_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
}

/// Regular opening hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHours {
    #[serde(default)]
    pub periods: Vec<TimePeriod>,
}

impl BusinessHours {
    /// Returns true if no opening period is defined.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// One opening period, e.g. Monday 09:00 to Monday 17:00.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePeriod {
    pub open_day: DayOfWeek,
    /// `HH:MM`, 24 hour clock.
    pub open_time: String,
    pub close_day: DayOfWeek,
    /// `HH:MM`, 24 hour clock; `24:00` closes at midnight.
    pub close_time: String,
}

impl TimePeriod {
    /// Creates a period that opens and closes on the same day.
    pub fn same_day(
        day: DayOfWeek,
        open_time: impl Into<String>,
        close_time: impl Into<String>,
    ) -> Self {
        Self {
            open_day: day,
            open_time: open_time.into(),
            close_day: day,
            close_time: close_time.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    #[serde(other, rename = "DAY_OF_WEEK_UNSPECIFIED")]
    Unspecified,
}

/// A customer review (`accounts/.../locations/.../reviews/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Resource name of the review.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<Reviewer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_rating: Option<StarRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// RFC 3339 creation timestamp, kept as sent by upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    /// The owner's reply; absent when the review is unanswered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_reply: Option<ReviewReply>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Review {
    /// Creates a review with only its resource name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parsed creation time, or `None` when missing or malformed.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.create_time.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Returns true if the owner already replied.
    pub fn is_answered(&self) -> bool {
        self.review_reply.is_some()
    }

    /// Display name of a non-anonymous reviewer.
    pub fn reviewer_name(&self) -> Option<&str> {
        let reviewer = self.reviewer.as_ref()?;
        if reviewer.is_anonymous {
            return None;
        }
        reviewer.display_name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo_url: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StarRating {
    One,
    Two,
    Three,
    Four,
    Five,
    #[serde(other, rename = "STAR_RATING_UNSPECIFIED")]
    Unspecified,
}

impl StarRating {
    /// Number of stars, 0 when unspecified.
    pub fn stars(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Unspecified => 0,
        }
    }
}

/// Owner reply attached to a review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReply {
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
