use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::role::Role;
use crate::store::{Entity, Filter};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Department {
    Engineering,
    Hr,
    Finance,
    Sales,
    Marketing,
    Operations,
    Support,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
    Terminated,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "role": "EMPLOYEE",
        "department": "ENGINEERING",
        "status": "ACTIVE",
        "manager_id": 7,
        "position": "Backend Engineer",
        "base_salary": 50000.0,
        "hire_date": "2024-01-01"
    })
)]
pub struct User {
    pub id: u64,
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Stored lowercase.
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: Role,
    pub department: Department,
    pub status: UserStatus,
    pub manager_id: Option<u64>,
    pub position: Option<String>,
    pub base_salary: f64,
    pub hire_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewUser {
    #[validate(length(min = 1, max = 32))]
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "John")]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Doe")]
    pub last_name: String,
    #[validate(email)]
    #[schema(example = "john@company.com", format = "email")]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub phone: Option<String>,
    pub role: Role,
    pub department: Department,
    pub manager_id: Option<u64>,
    pub position: Option<String>,
    #[validate(range(min = 0.0))]
    #[schema(example = 50000.0)]
    pub base_salary: f64,
    #[schema(example = "2026-01-01")]
    pub hire_date: NaiveDate,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UserUpdate {
    #[validate(length(min = 1, max = 32))]
    pub employee_id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub department: Option<Department>,
    pub manager_id: Option<u64>,
    pub position: Option<String>,
    #[validate(range(min = 0.0))]
    pub base_salary: Option<f64>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub department: Option<Department>,
    pub status: Option<UserStatus>,
    pub manager_id: Option<u64>,
    /// Exact email match (case-insensitive)
    pub email: Option<String>,
    /// Exact employee id match
    pub employee_id: Option<String>,
    /// Case-insensitive substring over first name, last name and email
    pub search: Option<String>,
}

impl Filter<User> for UserFilter {
    fn matches(&self, user: &User) -> bool {
        self.role.is_none_or(|r| user.role == r)
            && self.department.is_none_or(|d| user.department == d)
            && self.status.is_none_or(|s| user.status == s)
            && self.manager_id.is_none_or(|m| user.manager_id == Some(m))
            && self
                .email
                .as_deref()
                .is_none_or(|e| user.email == e.to_lowercase())
            && self
                .employee_id
                .as_deref()
                .is_none_or(|e| user.employee_id == e)
            && self.search.as_deref().is_none_or(|term| {
                super::contains_ignore_case(
                    &[&user.first_name[..], &user.last_name[..], &user.email[..]],
                    term,
                )
            })
    }
}

impl Entity for User {
    type Filter = UserFilter;
    const NAME: &'static str = "user";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![
            ("email", self.email.to_lowercase()),
            ("employee_id", self.employee_id.clone()),
        ]
    }

    fn listing_order(a: &Self, b: &Self) -> Ordering {
        a.last_name
            .cmp(&b.last_name)
            .then_with(|| a.first_name.cmp(&b.first_name))
            .then_with(|| a.id.cmp(&b.id))
    }
}
