//! Aggregate statistics records.
//!
//! Every `*_rate` field is a ratio in `[0, 1]`; a zero denominator yields 0.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::user::Department;

/// `count / total`, or 0 when there is nothing to divide by.
pub fn rate(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceStatistics {
    pub date: NaiveDate,
    /// Active employees in scope; the denominator of every rate.
    pub total_employees: u64,
    pub present: u64,
    pub half_day: u64,
    pub absent: u64,
    pub on_leave: u64,
    /// Active employees without any record for the day.
    pub not_marked: u64,
    pub attendance_rate: f64,
    pub absentee_rate: f64,
    pub leave_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DepartmentAttendanceStatistics {
    pub department: Department,
    #[serde(flatten)]
    pub attendance: AttendanceStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserAttendanceStatistics {
    pub user_id: u64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_days: u64,
    pub present_days: u64,
    pub half_days: u64,
    pub absent_days: u64,
    pub leave_days: u64,
    pub total_working_hours: f64,
    /// Over days with a complete punch pair.
    pub average_working_hours: f64,
    /// (present + half days) over days in range.
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveStatistics {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub cancelled: u64,
    /// Request count per leave type.
    pub by_type: BTreeMap<String, u64>,
    /// Calendar days covered by approved requests.
    pub approved_days: i64,
    pub approval_rate: f64,
    pub rejection_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PayrollStatistics {
    pub month: u32,
    pub year: i32,
    pub total: u64,
    pub pending: u64,
    pub processed: u64,
    pub paid: u64,
    pub total_gross: f64,
    pub total_deductions: f64,
    pub total_net: f64,
    pub average_net: f64,
    pub paid_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PerformanceStatistics {
    pub total: u64,
    pub pending: u64,
    pub under_review: u64,
    pub completed: u64,
    pub rejected: u64,
    /// Over records carrying a rating; 0 when none do.
    pub average_rating: f64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardStatistics {
    pub total_employees: u64,
    pub active_employees: u64,
    pub employees_by_department: BTreeMap<String, u64>,
    pub attendance: AttendanceStatistics,
    pub pending_leaves: u64,
    pub pending_performance_reviews: u64,
    pub pending_payrolls: u64,
    pub total_projects: u64,
    pub active_projects: u64,
    pub total_documents: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmployeeDashboard {
    pub user_id: u64,
    pub punched_in_today: bool,
    pub punched_out_today: bool,
    pub today_working_hours: f64,
    pub month_to_date: UserAttendanceStatistics,
    pub leaves: LeaveStatistics,
    pub pending_leave_requests: u64,
    pub pending_performance_reviews: u64,
}
