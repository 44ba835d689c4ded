use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::store::{Entity, Filter};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewType {
    Quarterly,
    HalfYearly,
    Annual,
    Probation,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformanceStatus {
    Pending,
    UnderReview,
    Completed,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Performance {
    pub id: u64,
    pub user_id: u64,
    pub reviewer_id: Option<u64>,
    pub review_type: ReviewType,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub goals: Option<String>,
    pub self_assessment: Option<String>,
    /// 1 to 5, set by the reviewer.
    pub rating: Option<u8>,
    pub comments: Option<String>,
    pub rejection_reason: Option<String>,
    pub status: PerformanceStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitPerformance {
    pub review_type: ReviewType,
    #[schema(example = "2026-01-01")]
    pub period_start: NaiveDate,
    #[schema(example = "2026-03-31")]
    pub period_end: NaiveDate,
    #[validate(length(max = 2000))]
    pub goals: Option<String>,
    #[validate(length(max = 4000))]
    pub self_assessment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePerformance {
    pub review_type: Option<ReviewType>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub goals: Option<String>,
    #[validate(length(max = 4000))]
    pub self_assessment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReviewPerformance {
    #[validate(range(min = 1, max = 5))]
    #[schema(example = 4)]
    pub rating: u8,
    #[validate(length(min = 1, max = 4000))]
    pub comments: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RejectPerformance {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct PerformanceFilter {
    pub user_id: Option<u64>,
    pub reviewer_id: Option<u64>,
    pub status: Option<PerformanceStatus>,
    pub review_type: Option<ReviewType>,
}

impl Filter<Performance> for PerformanceFilter {
    fn matches(&self, p: &Performance) -> bool {
        self.user_id.is_none_or(|u| p.user_id == u)
            && self.reviewer_id.is_none_or(|r| p.reviewer_id == Some(r))
            && self.status.is_none_or(|s| p.status == s)
            && self.review_type.is_none_or(|t| p.review_type == t)
    }
}

impl Entity for Performance {
    type Filter = PerformanceFilter;
    const NAME: &'static str = "performance";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn listing_order(a: &Self, b: &Self) -> Ordering {
        b.period_end
            .cmp(&a.period_end)
            .then_with(|| b.id.cmp(&a.id))
    }
}
