use std::cmp::Ordering;

use chrono::NaiveDateTime;
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
pub enum PayrollStatus {
    Pending,
    Processed,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Payroll {
    pub id: u64,
    pub user_id: u64,
    pub month: u32,
    pub year: i32,
    pub base_salary: f64,
    pub allowances: f64,
    pub deductions: f64,
    pub gross_salary: f64,
    pub net_salary: f64,
    pub status: PayrollStatus,
    pub processed_at: Option<NaiveDateTime>,
    pub paid_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Payroll {
    /// Recompute gross and net from the components.
    pub fn recalculate(&mut self) {
        self.gross_salary = self.base_salary + self.allowances;
        self.net_salary = self.gross_salary - self.deductions;
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePayroll {
    #[schema(example = 1001)]
    pub user_id: u64,
    #[validate(range(min = 1, max = 12))]
    #[schema(example = 1)]
    pub month: u32,
    #[validate(range(min = 2000, max = 2100))]
    #[schema(example = 2026)]
    pub year: i32,
    #[validate(range(min = 0.0))]
    #[schema(example = 50000.0)]
    pub base_salary: f64,
    #[validate(range(min = 0.0))]
    #[schema(example = 5000.0)]
    pub allowances: f64,
    #[validate(range(min = 0.0))]
    #[schema(example = 2000.0)]
    pub deductions: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePayroll {
    #[validate(range(min = 0.0))]
    #[schema(example = 52000.0)]
    pub base_salary: Option<f64>,
    #[validate(range(min = 0.0))]
    #[schema(example = 6000.0)]
    pub allowances: Option<f64>,
    #[validate(range(min = 0.0))]
    #[schema(example = 2500.0)]
    pub deductions: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GeneratePayroll {
    #[validate(range(min = 1, max = 12))]
    pub month: u32,
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
}

/// Outcome of a batch generation: every active employee ends up either in
/// `generated` or in `failures`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayrollBatchReport {
    pub month: u32,
    pub year: i32,
    pub generated: Vec<Payroll>,
    pub failures: Vec<PayrollFailure>,
}

impl PayrollBatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayrollFailure {
    pub user_id: u64,
    pub employee_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct PayrollFilter {
    pub user_id: Option<u64>,
    pub status: Option<PayrollStatus>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl Filter<Payroll> for PayrollFilter {
    fn matches(&self, p: &Payroll) -> bool {
        self.user_id.is_none_or(|u| p.user_id == u)
            && self.status.is_none_or(|s| p.status == s)
            && self.month.is_none_or(|m| p.month == m)
            && self.year.is_none_or(|y| p.year == y)
    }
}

impl Entity for Payroll {
    type Filter = PayrollFilter;
    const NAME: &'static str = "payroll";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![(
            "user_period",
            format!("{}:{}-{}", self.user_id, self.year, self.month),
        )]
    }

    /// Latest period first.
    fn listing_order(a: &Self, b: &Self) -> Ordering {
        (b.year, b.month, b.id).cmp(&(a.year, a.month, a.id))
    }
}
