//! Performance report request and response types.
//!
//! Reports are produced per request and never cached. The upstream body is
//! kept as raw JSON so callers see exactly what the Performance API returned.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Daily metrics understood by the Performance API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DailyMetric {
    BusinessImpressionsDesktopMaps,
    BusinessImpressionsDesktopSearch,
    BusinessImpressionsMobileMaps,
    BusinessImpressionsMobileSearch,
    BusinessConversations,
    BusinessDirectionRequests,
    CallClicks,
    WebsiteClicks,
    BusinessBookings,
    BusinessFoodOrders,
    BusinessFoodMenuClicks,
}

impl DailyMetric {
    /// Metrics requested when the caller does not pick any.
    pub const DEFAULT_SET: [DailyMetric; 9] = [
        Self::BusinessImpressionsDesktopMaps,
        Self::BusinessImpressionsDesktopSearch,
        Self::BusinessImpressionsMobileMaps,
        Self::BusinessImpressionsMobileSearch,
        Self::CallClicks,
        Self::WebsiteClicks,
        Self::BusinessDirectionRequests,
        Self::BusinessConversations,
        Self::BusinessBookings,
    ];

    /// Wire name of the metric.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BusinessImpressionsDesktopMaps => "BUSINESS_IMPRESSIONS_DESKTOP_MAPS",
            Self::BusinessImpressionsDesktopSearch => "BUSINESS_IMPRESSIONS_DESKTOP_SEARCH",
            Self::BusinessImpressionsMobileMaps => "BUSINESS_IMPRESSIONS_MOBILE_MAPS",
            Self::BusinessImpressionsMobileSearch => "BUSINESS_IMPRESSIONS_MOBILE_SEARCH",
            Self::BusinessConversations => "BUSINESS_CONVERSATIONS",
            Self::BusinessDirectionRequests => "BUSINESS_DIRECTION_REQUESTS",
            Self::CallClicks => "CALL_CLICKS",
            Self::WebsiteClicks => "WEBSITE_CLICKS",
            Self::BusinessBookings => "BUSINESS_BOOKINGS",
            Self::BusinessFoodOrders => "BUSINESS_FOOD_ORDERS",
            Self::BusinessFoodMenuClicks => "BUSINESS_FOOD_MENU_CLICKS",
        }
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `[today - days, today]`, or `None` when the start date would fall
    /// before the earliest representable date.
    pub fn last_days(today: NaiveDate, days: u32) -> Option<Self> {
        let start = today.checked_sub_days(Days::new(u64::from(days)))?;
        Some(Self { start, end: today })
    }

    /// Query parameters in the `dailyRange.*` form.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(6);
        for (prefix, date) in [("startDate", self.start), ("endDate", self.end)] {
            pairs.push((format!("dailyRange.{prefix}.year"), date.year().to_string()));
            pairs.push((format!("dailyRange.{prefix}.month"), date.month().to_string()));
            pairs.push((format!("dailyRange.{prefix}.day"), date.day().to_string()));
        }
        pairs
    }
}

/// A performance report for one location, metric set and date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    /// Location resource name the report was requested for.
    pub location: String,
    pub metrics: Vec<DailyMetric>,
    pub range: DateRange,
    /// The response body, unmodified.
    pub body: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_days_range() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let range = DateRange::last_days(today, 30).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        assert_eq!(range.end, today);
    }

    #[test]
    fn last_days_out_of_range() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(DateRange::last_days(today, u32::MAX), None);
        assert_eq!(DateRange::last_days(today, 0).map(|r| r.start), Some(today));
    }

    #[test]
    fn range_query_pairs() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
        );
        let pairs = range.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("dailyRange.startDate.year".to_string(), "2024".to_string()),
                ("dailyRange.startDate.month".to_string(), "1".to_string()),
                ("dailyRange.startDate.day".to_string(), "2".to_string()),
                ("dailyRange.endDate.year".to_string(), "2024".to_string()),
                ("dailyRange.endDate.month".to_string(), "2".to_string()),
                ("dailyRange.endDate.day".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn metric_wire_names_match_serde() {
        for metric in DailyMetric::DEFAULT_SET {
            let json = serde_json::to_value(metric).unwrap();
            assert_eq!(json, Value::from(metric.as_str()));
        }
    }
}
