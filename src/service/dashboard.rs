use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use strum::IntoEnumIterator;

use super::{StatisticsService, Stores};
use crate::error::ServiceResult;
use crate::model::attendance::{Attendance, AttendanceFilter};
use crate::model::document::{Document, DocumentFilter};
use crate::model::leave::{Leave, LeaveFilter, LeaveStatus};
use crate::model::payroll::{Payroll, PayrollFilter, PayrollStatus};
use crate::model::performance::{Performance, PerformanceFilter, PerformanceStatus};
use crate::model::project::{Project, ProjectFilter, ProjectStatus};
use crate::model::statistics::{DashboardStatistics, EmployeeDashboard};
use crate::model::user::{Department, User, UserFilter, UserStatus};
use crate::store::SharedStore;

/// Landing-page summaries built from counts and the statistics aggregator.
#[derive(Clone)]
pub struct DashboardService {
    users: SharedStore<User>,
    attendance: SharedStore<Attendance>,
    leaves: SharedStore<Leave>,
    payrolls: SharedStore<Payroll>,
    performances: SharedStore<Performance>,
    projects: SharedStore<Project>,
    documents: SharedStore<Document>,
    statistics: StatisticsService,
}

impl DashboardService {
    pub fn new(stores: &Stores, statistics: StatisticsService) -> Self {
        Self {
            users: stores.users.clone(),
            attendance: stores.attendance.clone(),
            leaves: stores.leaves.clone(),
            payrolls: stores.payrolls.clone(),
            performances: stores.performances.clone(),
            projects: stores.projects.clone(),
            documents: stores.documents.clone(),
            statistics,
        }
    }

    pub async fn organisation_summary(&self, date: NaiveDate) -> ServiceResult<DashboardStatistics> {
        let active = UserFilter {
            status: Some(UserStatus::Active),
            ..Default::default()
        };

        let mut employees_by_department = BTreeMap::new();
        for department in Department::iter() {
            let filter = UserFilter {
                department: Some(department),
                ..active.clone()
            };
            employees_by_department.insert(department.to_string(), self.users.count(&filter).await?);
        }

        Ok(DashboardStatistics {
            total_employees: self.users.count(&UserFilter::default()).await?,
            active_employees: self.users.count(&active).await?,
            employees_by_department,
            attendance: self.statistics.attendance_statistics(Some(date)).await?,
            pending_leaves: self
                .leaves
                .count(&LeaveFilter {
                    status: Some(LeaveStatus::Pending),
                    ..Default::default()
                })
                .await?,
            pending_performance_reviews: self
                .performances
                .count(&PerformanceFilter {
                    status: Some(PerformanceStatus::Pending),
                    ..Default::default()
                })
                .await?,
            pending_payrolls: self
                .payrolls
                .count(&PayrollFilter {
                    status: Some(PayrollStatus::Pending),
                    ..Default::default()
                })
                .await?,
            total_projects: self.projects.count(&ProjectFilter::default()).await?,
            active_projects: self
                .projects
                .count(&ProjectFilter {
                    status: Some(ProjectStatus::Active),
                    ..Default::default()
                })
                .await?,
            total_documents: self.documents.count(&DocumentFilter::default()).await?,
        })
    }

    pub async fn employee_summary(&self, user_id: u64, date: NaiveDate) -> ServiceResult<EmployeeDashboard> {
        let today = self
            .attendance
            .find_one(&AttendanceFilter {
                user_id: Some(user_id),
                date: Some(date),
                ..Default::default()
            })
            .await?;

        let year = date.year();
        Ok(EmployeeDashboard {
            user_id,
            punched_in_today: today.as_ref().is_some_and(|r| r.punch_in.is_some()),
            punched_out_today: today.as_ref().is_some_and(|r| r.punch_out.is_some()),
            today_working_hours: today.as_ref().map_or(0.0, Attendance::working_hours),
            month_to_date: self.statistics.month_to_date(user_id, date).await?,
            leaves: self.statistics.leave_statistics(Some(user_id), Some(year)).await?,
            pending_leave_requests: self
                .leaves
                .count(&LeaveFilter {
                    user_id: Some(user_id),
                    status: Some(LeaveStatus::Pending),
                    ..Default::default()
                })
                .await?,
            pending_performance_reviews: self
                .performances
                .count(&PerformanceFilter {
                    user_id: Some(user_id),
                    status: Some(PerformanceStatus::Pending),
                    ..Default::default()
                })
                .await?,
        })
    }
}
