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
pub enum ProjectStatus {
    Planned,
    Active,
    OnHold,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: u64,
    pub assignee_id: Option<u64>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewProject {
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Payroll revamp")]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub assignee_id: Option<u64>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProjectUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub assignee_id: Option<u64>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ProjectFilter {
    pub owner_id: Option<u64>,
    pub assignee_id: Option<u64>,
    pub status: Option<ProjectStatus>,
    /// Case-insensitive substring over the name
    pub search: Option<String>,
}

impl Filter<Project> for ProjectFilter {
    fn matches(&self, p: &Project) -> bool {
        self.owner_id.is_none_or(|o| p.owner_id == o)
            && self.assignee_id.is_none_or(|a| p.assignee_id == Some(a))
            && self.status.is_none_or(|s| p.status == s)
            && self
                .search
                .as_deref()
                .is_none_or(|term| super::contains_ignore_case(&[&p.name[..]], term))
    }
}

impl Entity for Project {
    type Filter = ProjectFilter;
    const NAME: &'static str = "project";

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
