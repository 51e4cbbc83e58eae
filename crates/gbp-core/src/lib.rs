//! Core types: resources, update masks, review filters, validation, tracing

pub mod mask;
pub mod model;
pub mod performance;
pub mod review;
pub mod template;
pub mod tracing;
pub mod validate;

pub use mask::FieldMask;
pub use model::{
    Account, BusinessHours, Category, DayOfWeek, Location, PostalAddress, Review, ReviewReply,
    Reviewer, StarRating, TimePeriod,
};
pub use performance::{DailyMetric, DateRange, PerformanceReport};
pub use review::{recent_reviews, unanswered_reviews};
pub use template::ReplyTemplate;
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use validate::{RequiredField, ValidationReport, validate_location};
