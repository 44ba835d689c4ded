use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::store::{Entity, Filter};

/// Feedback left by one user about another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: u64,
    pub employee_id: u64,
    pub reviewer_id: u64,
    pub title: String,
    pub content: String,
    pub rating: u8,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewReview {
    pub employee_id: u64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ReviewUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 4000))]
    pub content: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ReviewFilter {
    pub employee_id: Option<u64>,
    pub reviewer_id: Option<u64>,
    /// Case-insensitive substring over the title
    pub search: Option<String>,
}

impl Filter<Review> for ReviewFilter {
    fn matches(&self, r: &Review) -> bool {
        self.employee_id.is_none_or(|e| r.employee_id == e)
            && self.reviewer_id.is_none_or(|v| r.reviewer_id == v)
            && self
                .search
                .as_deref()
                .is_none_or(|term| super::contains_ignore_case(&[&r.title[..]], term))
    }
}

impl Entity for Review {
    type Filter = ReviewFilter;
    const NAME: &'static str = "review";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn listing_order(a: &Self, b: &Self) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    }
}
