use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::store::{Entity, Filter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: u64,
    pub owner_id: u64,
    pub title: String,
    /// Free-form, e.g. "contract", "payslip", "certificate".
    pub category: String,
    pub description: Option<String>,
    pub file_url: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewDocument {
    /// Defaults to the caller when absent.
    pub owner_id: Option<u64>,
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Employment contract")]
    pub title: String,
    #[validate(length(min = 1, max = 50))]
    #[schema(example = "contract")]
    pub category: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(url)]
    #[schema(example = "https://files.company.com/docs/contract-1.pdf")]
    pub file_url: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct DocumentUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(url)]
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct DocumentFilter {
    pub owner_id: Option<u64>,
    pub category: Option<String>,
    /// Case-insensitive substring over title and description
    pub search: Option<String>,
}

impl Filter<Document> for DocumentFilter {
    fn matches(&self, d: &Document) -> bool {
        self.owner_id.is_none_or(|o| d.owner_id == o)
            && self
                .category
                .as_deref()
                .is_none_or(|c| d.category.eq_ignore_ascii_case(c))
            && self.search.as_deref().is_none_or(|term| {
                super::contains_ignore_case(
                    &[&d.title[..], d.description.as_deref().unwrap_or("")],
                    term,
                )
            })
    }
}

impl Entity for Document {
    type Filter = DocumentFilter;
    const NAME: &'static str = "document";

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
