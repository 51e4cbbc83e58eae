//! Review selection helpers.
//!
//! Both filters keep the upstream listing order.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::model::Review;

/// Keeps reviews created within `[now - days, now]`.
///
/// The lower bound is inclusive. A window reaching past the earliest
/// representable instant has no lower bound. Reviews without a parseable
/// `createTime` are dropped.
pub fn recent_reviews(reviews: Vec<Review>, now: DateTime<Utc>, days: u32) -> Vec<Review> {
    let cutoff = Duration::try_days(i64::from(days)).and_then(|span| now.checked_sub_signed(span));
    reviews
        .into_iter()
        .filter(|review| match review.created_at() {
            Some(created) => cutoff.is_none_or(|cutoff| created >= cutoff) && created <= now,
            None => {
                debug!("skipping review {} without a usable createTime", review.name);
                false
            }
        })
        .collect()
}

/// Keeps reviews that have no owner reply yet.
pub fn unanswered_reviews(reviews: Vec<Review>) -> Vec<Review> {
    reviews.into_iter().filter(|r| !r.is_answered()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReviewReply;

    fn review_at(id: &str, created: DateTime<Utc>) -> Review {
        let mut review = Review::new(format!("accounts/1/locations/2/reviews/{id}"));
        review.create_time = Some(created.to_rfc3339());
        review
    }

    #[test]
    fn recent_reviews_window() {
        let now = Utc::now();
        let reviews = vec![
            review_at("today", now - Duration::hours(1)),
            review_at("29d", now - Duration::days(29)),
            review_at("31d", now - Duration::days(31)),
        ];

        let recent = recent_reviews(reviews, now, 30);
        let names: Vec<_> = recent.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "accounts/1/locations/2/reviews/today",
                "accounts/1/locations/2/reviews/29d"
            ]
        );
    }

    #[test]
    fn lower_bound_is_inclusive() {
        let now = Utc::now();
        let reviews = vec![review_at("edge", now - Duration::days(7))];
        assert_eq!(recent_reviews(reviews, now, 7).len(), 1);
    }

    #[test]
    fn huge_window_keeps_every_dated_review() {
        let now = Utc::now();
        let reviews = vec![
            review_at("now", now),
            review_at("ancient", now - Duration::days(365 * 200)),
            Review::new("missing"),
        ];

        let recent = recent_reviews(reviews, now, 200_000_000);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent_reviews(vec![review_at("now", now)], now, u32::MAX).len(), 1);
    }

    #[test]
    fn future_and_undated_reviews_are_dropped() {
        let now = Utc::now();
        let mut undated = Review::new("undated");
        undated.create_time = Some("not a date".to_string());
        let reviews = vec![
            review_at("future", now + Duration::hours(2)),
            undated,
            Review::new("missing"),
        ];
        assert!(recent_reviews(reviews, now, 30).is_empty());
    }

    #[test]
    fn unanswered_keeps_order() {
        let reply = || {
            Some(ReviewReply {
                comment: "Thanks".to_string(),
                update_time: None,
            })
        };
        let mut reviews: Vec<Review> = (1..=5).map(|i| Review::new(format!("r{i}"))).collect();
        reviews[0].review_reply = reply();
        reviews[2].review_reply = reply();
        reviews[3].review_reply = reply();

        let unanswered = unanswered_reviews(reviews);
        let names: Vec<_> = unanswered.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["r2", "r5"]);
    }
}
